use serde::{Deserialize, Serialize};

use crate::booking::{
    AgentInfo, Booking, CancellationState, CustomerInfo, PaymentInfo, ServerId, Tour, Traveler,
};
use crate::identity::EphemeralId;
use crate::normalize_reason;

/// Booking as returned by the backend booking-list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WireBooking {
    pub booking_id: String,
    pub tour: Tour,
    #[serde(default)]
    pub customer: CustomerInfo,
    #[serde(default)]
    pub agent: Option<AgentInfo>,
    #[serde(default)]
    pub payment: PaymentInfo,
    #[serde(default)]
    pub travelers: Vec<WireTraveler>,
}

/// Traveler record with the raw, not necessarily exclusive, cancellation flags.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WireTraveler {
    pub server_id: ServerId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub cancellation_requested: bool,
    #[serde(default)]
    pub cancellation_approved: bool,
    #[serde(default)]
    pub cancellation_rejected: bool,
    #[serde(default)]
    pub cancellation_reason: Option<String>,
}

impl WireTraveler {
    pub fn new(server_id: impl Into<ServerId>, name: impl Into<String>) -> Self {
        Self {
            server_id: server_id.into(),
            name: name.into(),
            age: None,
            gender: None,
            cancellation_requested: false,
            cancellation_approved: false,
            cancellation_rejected: false,
            cancellation_reason: None,
        }
    }

    /// The raw flags stop here: everything past this point sees only the enum.
    pub fn into_traveler(self, ephemeral_id: EphemeralId) -> Traveler {
        let cancellation_state = CancellationState::from_flags(
            self.cancellation_requested,
            self.cancellation_approved,
            self.cancellation_rejected,
        );
        let cancellation_reason = match cancellation_state {
            CancellationState::None => None,
            _ => normalize_reason(self.cancellation_reason),
        };

        Traveler {
            server_id: self.server_id,
            ephemeral_id,
            name: self.name,
            age: self.age,
            gender: self.gender,
            cancellation_state,
            cancellation_reason,
        }
    }
}

impl WireBooking {
    /// Materializes the domain booking, drawing one fresh ephemeral id per traveler
    /// in server response order.
    pub fn into_booking(self, mut next_id: impl FnMut() -> EphemeralId) -> Booking {
        let travelers = self
            .travelers
            .into_iter()
            .map(|t| t.into_traveler(next_id()))
            .collect();

        Booking {
            booking_id: self.booking_id,
            tour: self.tour,
            customer: self.customer,
            agent: self.agent,
            payment: self.payment,
            travelers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIST_PAYLOAD: &str = r#"[
        {
            "bookingId": "B1",
            "tour": { "name": "Patagonia Trek", "startDate": "2030-03-14", "pricePerHead": 2400 },
            "customer": { "name": "Ana Ruiz", "email": "ana@example.com" },
            "agent": { "name": "Sam Okafor", "agencyName": "Southern Trails" },
            "payment": { "paidAmount": 4800, "paymentStatus": "PAID" },
            "travelers": [
                { "serverId": "s1", "name": "Ana Ruiz", "age": 41, "gender": "female" },
                {
                    "serverId": "s2", "name": "Leo Ruiz", "age": 12,
                    "cancellationRequested": true,
                    "cancellationReason": "change of plans"
                },
                {
                    "serverId": "s3", "name": "Mia Ruiz",
                    "cancellationRequested": true,
                    "cancellationApproved": true,
                    "cancellationRejected": true,
                    "cancellationReason": "  "
                }
            ]
        }
    ]"#;

    #[test]
    fn test_decode_booking_list() {
        let wire: Vec<WireBooking> = serde_json::from_str(LIST_PAYLOAD).unwrap();
        assert_eq!(wire.len(), 1);
        assert_eq!(wire[0].tour.start_date.to_rfc3339(), "2030-03-14T00:00:00+00:00");
        assert_eq!(wire[0].payment.paid_amount, 4800.0);
        assert_eq!(
            wire[0].customer.email.as_ref().map(|e| e.expose().as_str()),
            Some("ana@example.com")
        );
    }

    #[test]
    fn test_into_booking_assigns_ids_and_resolves_state() {
        let wire: Vec<WireBooking> = serde_json::from_str(LIST_PAYLOAD).unwrap();
        let mut index = 0;
        let booking = wire.into_iter().next().unwrap().into_booking(|| {
            index += 1;
            EphemeralId::new(7, index)
        });

        let states: Vec<_> = booking
            .travelers
            .iter()
            .map(|t| (t.server_id.as_str(), t.ephemeral_id, t.cancellation_state))
            .collect();
        assert_eq!(
            states,
            vec![
                ("s1", EphemeralId::new(7, 1), CancellationState::None),
                ("s2", EphemeralId::new(7, 2), CancellationState::Requested),
                ("s3", EphemeralId::new(7, 3), CancellationState::Approved),
            ]
        );
        assert_eq!(booking.travelers[1].cancellation_reason.as_deref(), Some("change of plans"));
        assert_eq!(booking.travelers[2].cancellation_reason, None);
    }

    #[test]
    fn test_reason_dropped_when_not_cancelled() {
        let mut wire = WireTraveler::new("s9", "Stray Reason");
        wire.cancellation_reason = Some("left over".to_string());
        let traveler = wire.into_traveler(EphemeralId::new(1, 0));
        assert_eq!(traveler.cancellation_state, CancellationState::None);
        assert_eq!(traveler.cancellation_reason, None);
    }

    #[test]
    fn test_missing_travelers_decode_as_empty() {
        let json = r#"{ "bookingId": "B2", "tour": { "name": "Fjords", "startDate": "2030-06-01T08:00:00Z" } }"#;
        let wire: WireBooking = serde_json::from_str(json).unwrap();
        assert!(wire.travelers.is_empty());
        assert!(wire.agent.is_none());
    }
}
