use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use std::sync::Arc;
use tourdesk_booking::BookingDesk;

use crate::error::{AppError, TokenRejected};
use crate::state::AppState;

/// The caller's booking desk, injected into request extensions.
#[derive(Clone)]
pub struct Session {
    pub desk: Arc<BookingDesk>,
}

// ============================================================================
// Session Middleware
// ============================================================================

/// Requires a bearer token and attaches the desk for that token.
///
/// The token is not inspected here; the backend validates it on every forwarded call.
/// A desk whose token the backend refused is dropped, so rejected tokens do not
/// accumulate sessions.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let token = match req.headers().typed_get::<Authorization<Bearer>>() {
        Some(Authorization(bearer)) if !bearer.token().is_empty() => bearer.token().to_string(),
        _ => {
            return AppError::AuthenticationError("Missing bearer token".to_string()).into_response()
        }
    };

    let desk = state
        .sessions
        .desk_for(&token, &state.api, &state.settings)
        .await;
    req.extensions_mut().insert(Session { desk });

    let response = next.run(req).await;
    if response.extensions().get::<TokenRejected>().is_some() {
        state.sessions.remove(&token).await;
    }
    response
}
