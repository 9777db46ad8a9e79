use axum::{
    extract::Extension,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Router,
};
use futures_util::{Stream, StreamExt};
use std::convert::Infallible;
use tokio_stream::wrappers::BroadcastStream;

use crate::middleware::auth::Session;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/events", get(event_stream))
}

/// GET /v1/events
/// Desk change notifications for the session. Lagged events are skipped; clients
/// re-read `/v1/bookings` on any event anyway.
async fn event_stream(
    Extension(session): Extension<Session>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = session.desk.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| async move {
        let event = result.ok()?;
        Event::default()
            .event(event.name())
            .json_data(&event)
            .ok()
            .map(Ok::<Event, Infallible>)
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
