use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use tourdesk_shared::Masked;

use crate::identity::EphemeralId;

// ============================================================================
// Identifiers
// ============================================================================

/// Backend-issued traveler identifier; the only traveler key accepted by write endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerId(String);

impl ServerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ServerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ServerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

// ============================================================================
// Cancellation lifecycle
// ============================================================================

/// Per-traveler cancellation state.
///
/// `None -> Requested -> {Approved | Rejected}` and `Requested -> None` on withdrawal.
/// `Approved` and `Rejected` only change through the backend.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CancellationState {
    #[default]
    None,
    Requested,
    Approved,
    Rejected,
}

impl CancellationState {
    /// Decodes the three independent wire flags.
    ///
    /// The backend does not guarantee the flags are exclusive. Precedence is
    /// approved > rejected > requested > none.
    pub fn from_flags(requested: bool, approved: bool, rejected: bool) -> Self {
        if approved {
            CancellationState::Approved
        } else if rejected {
            CancellationState::Rejected
        } else if requested {
            CancellationState::Requested
        } else {
            CancellationState::None
        }
    }

    /// Only the backend can move a traveler out of these states.
    pub fn is_terminal(&self) -> bool {
        matches!(self, CancellationState::Approved | CancellationState::Rejected)
    }
}

impl fmt::Display for CancellationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CancellationState::None => "NONE",
            CancellationState::Requested => "REQUESTED",
            CancellationState::Approved => "APPROVED",
            CancellationState::Rejected => "REJECTED",
        };
        f.write_str(label)
    }
}

// ============================================================================
// Read-only display blocks
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Tour {
    pub name: String,
    #[serde(deserialize_with = "deserialize_start_date")]
    pub start_date: DateTime<Utc>,
    #[serde(default)]
    pub price_per_head: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomerInfo {
    pub name: String,
    pub email: Option<Masked<String>>,
    pub phone: Option<Masked<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AgentInfo {
    pub name: String,
    pub email: Option<Masked<String>>,
    pub agency_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentInfo {
    pub paid_amount: f64,
    pub payment_status: String,
}

/// Accepts either an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC).
fn deserialize_start_date<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_start_date(&raw).map_err(serde::de::Error::custom)
}

pub fn parse_start_date(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| format!("Invalid tour start date: {}", raw))
}

// ============================================================================
// Booking & Traveler
// ============================================================================

/// One person covered by a booking, independently cancelable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Traveler {
    pub server_id: ServerId,
    pub ephemeral_id: EphemeralId,
    pub name: String,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub cancellation_state: CancellationState,
    pub cancellation_reason: Option<String>,
}

impl Traveler {
    /// Travelers may be picked for a new cancellation request only while untouched.
    pub fn is_selectable(&self) -> bool {
        self.cancellation_state == CancellationState::None
    }

    pub fn can_withdraw(&self) -> bool {
        self.cancellation_state == CancellationState::Requested
    }

    /// Echo of a cancellation request the backend already accepted. Backend-decided
    /// states are left alone. Returns whether the echo was recorded.
    pub fn record_cancellation_request(&mut self, reason: Option<String>) -> bool {
        if self.cancellation_state.is_terminal() {
            return false;
        }
        self.cancellation_state = CancellationState::Requested;
        self.cancellation_reason = reason;
        true
    }

    /// Echo of an accepted withdrawal. Backend-decided states are left alone.
    /// Returns whether anything changed.
    pub fn record_withdrawal(&mut self) -> bool {
        if self.cancellation_state.is_terminal() {
            return false;
        }
        let changed = self.cancellation_state != CancellationState::None
            || self.cancellation_reason.is_some();
        self.cancellation_state = CancellationState::None;
        self.cancellation_reason = None;
        changed
    }
}

/// One customer's reservation for a tour.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub booking_id: String,
    pub tour: Tour,
    pub customer: CustomerInfo,
    pub agent: Option<AgentInfo>,
    pub payment: PaymentInfo,
    pub travelers: Vec<Traveler>,
}

impl Booking {
    pub fn has_traveler_in(&self, state: CancellationState) -> bool {
        self.travelers.iter().any(|t| t.cancellation_state == state)
    }

    pub fn travelers_in(&self, state: CancellationState) -> impl Iterator<Item = &Traveler> {
        self.travelers
            .iter()
            .filter(move |t| t.cancellation_state == state)
    }

    pub fn traveler(&self, server_id: &ServerId) -> Option<&Traveler> {
        self.travelers.iter().find(|t| &t.server_id == server_id)
    }

    pub fn traveler_mut(&mut self, server_id: &ServerId) -> Option<&mut Traveler> {
        self.travelers.iter_mut().find(|t| &t.server_id == server_id)
    }

    /// The "cancel" action is offered only for tours that have not started yet and
    /// that still have at least one traveler without a cancellation on file.
    pub fn can_request_cancellation(&self, now: DateTime<Utc>) -> bool {
        self.tour.start_date > now && self.has_traveler_in(CancellationState::None)
    }
}
