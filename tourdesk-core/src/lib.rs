pub mod api;
pub mod booking;
pub mod identity;
pub mod mock;
pub mod wire;

pub use api::{ApiError, ApiMessage, BearerToken, BookingApi, CancelRequest, WithdrawRequest};
pub use booking::{
    AgentInfo, Booking, CancellationState, CustomerInfo, PaymentInfo, ServerId, Tour, Traveler,
};
pub use identity::EphemeralId;
pub use mock::MockBookingApi;
pub use wire::{WireBooking, WireTraveler};

/// Trims a free-text cancellation reason; blank input means "no reason".
pub fn normalize_reason(reason: Option<String>) -> Option<String> {
    reason
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
}
