use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tourdesk_booking::DeskError;

/// Marks a response produced because the backend refused the session token.
#[derive(Debug, Clone, Copy)]
pub struct TokenRejected;

#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    ValidationError(String),
    NotFoundError(String),
    ConflictError(String),
    UpstreamError(String),
    /// Reported like any other backend failure, but ends the session.
    SessionRejected(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let rejected = matches!(self, AppError::SessionRejected(_));
        let (status, error_message) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg),
            AppError::UpstreamError(msg) | AppError::SessionRejected(msg) => {
                (StatusCode::BAD_GATEWAY, msg)
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        let mut response = (status, body).into_response();
        if rejected {
            response.extensions_mut().insert(TokenRejected);
        }
        response
    }
}

impl From<DeskError> for AppError {
    fn from(err: DeskError) -> Self {
        let message = err.to_string();
        match err {
            DeskError::EmptySelection
            | DeskError::InvalidSelection { .. }
            | DeskError::Translation(_)
            | DeskError::NotEligible { .. } => AppError::ValidationError(message),
            DeskError::BookingNotFound(_) => AppError::NotFoundError(message),
            DeskError::InFlight(_) => AppError::ConflictError(message),
            DeskError::Fetch(_) | DeskError::Submit(_) => AppError::UpstreamError(message),
            DeskError::Unauthorized(_) => AppError::SessionRejected(message),
        }
    }
}
