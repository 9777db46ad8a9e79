use tourdesk_core::{ApiError, EphemeralId};
use tracing::warn;

use crate::bridge::LookupError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DeskError {
    #[error("Could not load bookings: {0}")]
    Fetch(String),

    #[error("Select at least one traveler to cancel")]
    EmptySelection,

    #[error("Traveler {id} cannot be selected: {reason}")]
    InvalidSelection { id: EphemeralId, reason: String },

    #[error("Traveler key could not be resolved: {0}")]
    Translation(#[from] LookupError),

    #[error("Booking {booking_id} is not eligible: {reason}")]
    NotEligible { booking_id: String, reason: String },

    #[error("Booking not found: {0}")]
    BookingNotFound(String),

    #[error("A request for booking {0} is already in progress")]
    InFlight(String),

    /// Backend or network failure; carries the backend's text when it sent one.
    #[error("{0}")]
    Submit(String),

    /// The backend refused the session token. Reads like the fetch or submit
    /// failure it interrupted.
    #[error("{0}")]
    Unauthorized(String),
}

impl DeskError {
    /// Precondition failures caught before any backend call.
    pub fn is_local(&self) -> bool {
        !matches!(
            self,
            DeskError::Fetch(_) | DeskError::Submit(_) | DeskError::Unauthorized(_)
        )
    }

    pub(crate) fn fetch_failed(error: ApiError) -> Self {
        warn!("Failed to load bookings: {}", error);
        let message = error
            .server_message()
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        if error.is_auth_rejection() {
            return DeskError::Unauthorized(DeskError::Fetch(message).to_string());
        }
        DeskError::Fetch(message)
    }

    pub(crate) fn submit_failed(error: ApiError, fallback: &str) -> Self {
        let message = error.server_message().unwrap_or(fallback).to_string();
        if error.is_auth_rejection() {
            return DeskError::Unauthorized(message);
        }
        DeskError::Submit(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_token_keeps_user_facing_text() {
        let expired = || ApiError::Rejected {
            status: 401,
            message: Some("Invalid or expired token".to_string()),
        };

        let err = DeskError::fetch_failed(expired());
        assert_eq!(
            err,
            DeskError::Unauthorized("Could not load bookings: Invalid or expired token".to_string())
        );
        assert!(!err.is_local());

        assert_eq!(
            DeskError::submit_failed(expired(), "fallback"),
            DeskError::Unauthorized("Invalid or expired token".to_string())
        );
        assert_eq!(
            DeskError::submit_failed(ApiError::Transport("reset".to_string()), "fallback"),
            DeskError::Submit("fallback".to_string())
        );
    }
}
