use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::api::{ApiError, ApiMessage, BearerToken, BookingApi, CancelRequest, WithdrawRequest};
use crate::booking::CancellationState;
use crate::wire::WireBooking;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockEndpoint {
    List,
    Cancel,
    Withdraw,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    List,
    Cancel {
        booking_id: String,
        request: CancelRequest,
    },
    Withdraw {
        booking_id: String,
        request: WithdrawRequest,
    },
}

impl MockCall {
    pub fn endpoint(&self) -> MockEndpoint {
        match self {
            MockCall::List => MockEndpoint::List,
            MockCall::Cancel { .. } => MockEndpoint::Cancel,
            MockCall::Withdraw { .. } => MockEndpoint::Withdraw,
        }
    }
}

#[derive(Default)]
struct MockState {
    bookings: Vec<WireBooking>,
    failures: HashMap<MockEndpoint, VecDeque<ApiError>>,
    calls: Vec<MockCall>,
    expected_token: Option<String>,
}

/// In-memory stand-in for the booking backend. Applies cancellations and withdrawals to
/// its own copy of the wire bookings, records every call, and can be scripted to fail.
#[derive(Default)]
pub struct MockBookingApi {
    state: Mutex<MockState>,
}

impl MockBookingApi {
    pub fn new(bookings: Vec<WireBooking>) -> Self {
        Self {
            state: Mutex::new(MockState {
                bookings,
                ..Default::default()
            }),
        }
    }

    /// Reject every call whose bearer token differs from `token` with a 401.
    pub fn with_token(self, token: impl Into<String>) -> Self {
        self.lock().expected_token = Some(token.into());
        self
    }

    /// Queue a failure for the next call to `endpoint`.
    pub fn fail_next(&self, endpoint: MockEndpoint, error: ApiError) {
        self.lock()
            .failures
            .entry(endpoint)
            .or_default()
            .push_back(error);
    }

    pub fn set_bookings(&self, bookings: Vec<WireBooking>) {
        self.lock().bookings = bookings;
    }

    pub fn bookings(&self) -> Vec<WireBooking> {
        self.lock().bookings.clone()
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self, endpoint: MockEndpoint) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.endpoint() == endpoint)
            .count()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MockState {
    fn check(&mut self, token: &BearerToken, endpoint: MockEndpoint) -> Result<(), ApiError> {
        if let Some(expected) = &self.expected_token {
            if expected != token.as_str() {
                return Err(ApiError::Rejected {
                    status: 401,
                    message: Some("Invalid or expired token".to_string()),
                });
            }
        }
        match self.failures.get_mut(&endpoint).and_then(|q| q.pop_front()) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn booking_mut(&mut self, booking_id: &str) -> Result<&mut WireBooking, ApiError> {
        self.bookings
            .iter_mut()
            .find(|b| b.booking_id == booking_id)
            .ok_or_else(|| ApiError::Rejected {
                status: 404,
                message: Some("Booking not found".to_string()),
            })
    }
}

fn traveler_missing() -> ApiError {
    ApiError::Rejected {
        status: 400,
        message: Some("Traveler not found in booking".to_string()),
    }
}

#[async_trait]
impl BookingApi for MockBookingApi {
    async fn list_bookings(&self, token: &BearerToken) -> Result<Vec<WireBooking>, ApiError> {
        let mut state = self.lock();
        state.calls.push(MockCall::List);
        state.check(token, MockEndpoint::List)?;
        Ok(state.bookings.clone())
    }

    async fn request_cancellation(
        &self,
        token: &BearerToken,
        booking_id: &str,
        request: &CancelRequest,
    ) -> Result<ApiMessage, ApiError> {
        let mut state = self.lock();
        state.calls.push(MockCall::Cancel {
            booking_id: booking_id.to_string(),
            request: request.clone(),
        });
        state.check(token, MockEndpoint::Cancel)?;

        let booking = state.booking_mut(booking_id)?;
        if request
            .traveler_ids
            .iter()
            .any(|id| !booking.travelers.iter().any(|t| &t.server_id == id))
        {
            return Err(traveler_missing());
        }

        let reason = Some(request.cancellation_reason.clone()).filter(|r| !r.is_empty());
        for traveler in booking
            .travelers
            .iter_mut()
            .filter(|t| request.traveler_ids.contains(&t.server_id))
        {
            traveler.cancellation_requested = true;
            traveler.cancellation_reason = reason.clone();
        }

        tracing::info!(
            "Mock backend accepted cancellation for {} traveler(s) on booking {}",
            request.traveler_ids.len(),
            booking_id
        );
        Ok(ApiMessage::new(format!(
            "Cancellation request submitted for {} traveler(s)",
            request.traveler_ids.len()
        )))
    }

    async fn withdraw_cancellation(
        &self,
        token: &BearerToken,
        booking_id: &str,
        request: &WithdrawRequest,
    ) -> Result<ApiMessage, ApiError> {
        let mut state = self.lock();
        state.calls.push(MockCall::Withdraw {
            booking_id: booking_id.to_string(),
            request: request.clone(),
        });
        state.check(token, MockEndpoint::Withdraw)?;

        let booking = state.booking_mut(booking_id)?;
        for id in &request.traveler_ids {
            let traveler = booking
                .travelers
                .iter_mut()
                .find(|t| &t.server_id == id)
                .ok_or_else(traveler_missing)?;

            let current = CancellationState::from_flags(
                traveler.cancellation_requested,
                traveler.cancellation_approved,
                traveler.cancellation_rejected,
            );
            if current != CancellationState::Requested {
                return Err(ApiError::Rejected {
                    status: 400,
                    message: Some("No pending cancellation request".to_string()),
                });
            }
            traveler.cancellation_requested = false;
            traveler.cancellation_reason = None;
        }

        Ok(ApiMessage::new("Cancellation request withdrawn"))
    }
}
