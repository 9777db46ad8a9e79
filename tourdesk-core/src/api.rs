use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tourdesk_shared::Masked;

use crate::booking::ServerId;
use crate::wire::WireBooking;

/// Session bearer token, forwarded opaquely with every backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerToken(Masked<String>);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Masked::new(token.into()))
    }

    pub fn as_str(&self) -> &str {
        self.0.expose()
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CancelRequest {
    pub traveler_ids: Vec<ServerId>,
    pub cancellation_reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawRequest {
    pub traveler_ids: Vec<ServerId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiMessage {
    pub message: String,
}

impl ApiMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    #[error("Backend unreachable: {0}")]
    Transport(String),

    #[error("Backend rejected request ({status}): {}", .message.as_deref().unwrap_or("no message"))]
    Rejected { status: u16, message: Option<String> },

    #[error("Unexpected backend response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Text the backend itself provided, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Rejected { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// The backend refused the bearer token itself.
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self, ApiError::Rejected { status: 401 | 403, .. })
    }
}

// ============================================================================
// Backend port
// ============================================================================

/// The three booking endpoints the dashboard consumes.
#[async_trait]
pub trait BookingApi: Send + Sync {
    async fn list_bookings(&self, token: &BearerToken) -> Result<Vec<WireBooking>, ApiError>;

    async fn request_cancellation(
        &self,
        token: &BearerToken,
        booking_id: &str,
        request: &CancelRequest,
    ) -> Result<ApiMessage, ApiError>;

    async fn withdraw_cancellation(
        &self,
        token: &BearerToken,
        booking_id: &str,
        request: &WithdrawRequest,
    ) -> Result<ApiMessage, ApiError>;
}
