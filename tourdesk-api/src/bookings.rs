use axum::{
    extract::{Extension, Json, Path},
    routing::{get, post, put},
    Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tourdesk_booking::{Bucket, DeskSnapshot, DashboardSummary, ViewFilter};
use tourdesk_core::{Booking, EphemeralId, Traveler};
use tracing::info;

use crate::error::AppError;
use crate::middleware::auth::Session;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingView {
    #[serde(flatten)]
    pub booking: Booking,
    pub can_request_cancellation: bool,
}

#[derive(Debug, Default, Serialize)]
pub struct BucketIds {
    pub active: Vec<String>,
    pub requested: Vec<String>,
    pub approved: Vec<String>,
    pub rejected: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionResponse {
    pub booking_id: Option<String>,
    pub traveler_ids: Vec<EphemeralId>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingsResponse {
    pub generation: u64,
    pub bookings: Vec<BookingView>,
    pub buckets: BucketIds,
    pub selection: SelectionResponse,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketEntryResponse {
    pub booking_id: String,
    pub tour_name: String,
    pub travelers: Vec<Traveler>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CancellationBody {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings", get(list_bookings))
        .route("/v1/bookings/refresh", post(refresh_bookings))
        .route("/v1/bookings/summary", get(get_summary))
        .route("/v1/bookings/buckets/{bucket}", get(get_bucket))
        .route(
            "/v1/bookings/{booking_id}/selection/{ephemeral_id}",
            put(select_traveler).delete(deselect_traveler),
        )
        .route("/v1/bookings/{booking_id}/cancellation", post(submit_cancellation))
        .route(
            "/v1/bookings/{booking_id}/travelers/{ephemeral_id}/withdrawal",
            post(withdraw_cancellation),
        )
}

fn render(snapshot: DeskSnapshot) -> BookingsResponse {
    let now = Utc::now();

    let buckets = {
        let partition = ViewFilter::partition(&snapshot.bookings);
        let ids = |bucket: Bucket| {
            partition
                .get(bucket)
                .iter()
                .map(|b| b.booking_id.clone())
                .collect::<Vec<_>>()
        };
        BucketIds {
            active: ids(Bucket::Active),
            requested: ids(Bucket::Requested),
            approved: ids(Bucket::Approved),
            rejected: ids(Bucket::Rejected),
        }
    };

    BookingsResponse {
        generation: snapshot.generation,
        bookings: snapshot
            .bookings
            .into_iter()
            .map(|booking| BookingView {
                can_request_cancellation: booking.can_request_cancellation(now),
                booking,
            })
            .collect(),
        buckets,
        selection: SelectionResponse {
            booking_id: snapshot.selected_booking,
            traveler_ids: snapshot.selected_travelers,
        },
    }
}

async fn selection_response(session: &Session) -> SelectionResponse {
    let selection = session.desk.selection().await;
    SelectionResponse {
        booking_id: selection.booking_id().map(str::to_string),
        traveler_ids: selection.iter().collect(),
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /v1/bookings
/// Bookings for the session, fetched on first access
async fn list_bookings(
    Extension(session): Extension<Session>,
) -> Result<Json<BookingsResponse>, AppError> {
    session.desk.ensure_loaded().await?;
    Ok(Json(render(session.desk.snapshot().await)))
}

/// POST /v1/bookings/refresh
/// Re-fetch; every traveler key handed out before is invalidated
async fn refresh_bookings(
    Extension(session): Extension<Session>,
) -> Result<Json<BookingsResponse>, AppError> {
    session.desk.load().await?;
    Ok(Json(render(session.desk.snapshot().await)))
}

/// GET /v1/bookings/summary
async fn get_summary(
    Extension(session): Extension<Session>,
) -> Result<Json<DashboardSummary>, AppError> {
    session.desk.ensure_loaded().await?;
    Ok(Json(session.desk.summary().await))
}

/// GET /v1/bookings/buckets/{bucket}
/// Bookings in one dashboard tab, each with the travelers that put it there
async fn get_bucket(
    Extension(session): Extension<Session>,
    Path(bucket): Path<Bucket>,
) -> Result<Json<Vec<BucketEntryResponse>>, AppError> {
    session.desk.ensure_loaded().await?;
    let bookings = session.desk.bookings().await;

    let entries = ViewFilter::entries(&bookings, bucket)
        .into_iter()
        .map(|entry| BucketEntryResponse {
            booking_id: entry.booking.booking_id.clone(),
            tour_name: entry.booking.tour.name.clone(),
            travelers: entry.travelers.into_iter().cloned().collect(),
        })
        .collect();
    Ok(Json(entries))
}

/// PUT /v1/bookings/{booking_id}/selection/{ephemeral_id}
async fn select_traveler(
    Extension(session): Extension<Session>,
    Path((booking_id, ephemeral_id)): Path<(String, EphemeralId)>,
) -> Result<Json<SelectionResponse>, AppError> {
    session.desk.select_traveler(&booking_id, ephemeral_id).await?;
    Ok(Json(selection_response(&session).await))
}

/// DELETE /v1/bookings/{booking_id}/selection/{ephemeral_id}
async fn deselect_traveler(
    Extension(session): Extension<Session>,
    Path((_booking_id, ephemeral_id)): Path<(String, EphemeralId)>,
) -> Result<Json<SelectionResponse>, AppError> {
    session.desk.deselect_traveler(ephemeral_id).await;
    Ok(Json(selection_response(&session).await))
}

/// POST /v1/bookings/{booking_id}/cancellation
/// Submit the current selection for cancellation
async fn submit_cancellation(
    Extension(session): Extension<Session>,
    Path(booking_id): Path<String>,
    Json(body): Json<CancellationBody>,
) -> Result<Json<MessageResponse>, AppError> {
    let message = session.desk.submit(&booking_id, body.reason).await?;
    info!("Cancellation submitted for booking {}", booking_id);
    Ok(Json(MessageResponse { message }))
}

/// POST /v1/bookings/{booking_id}/travelers/{ephemeral_id}/withdrawal
async fn withdraw_cancellation(
    Extension(session): Extension<Session>,
    Path((booking_id, ephemeral_id)): Path<(String, EphemeralId)>,
) -> Result<Json<MessageResponse>, AppError> {
    let message = session.desk.withdraw(&booking_id, ephemeral_id).await?;
    Ok(Json(MessageResponse { message }))
}
