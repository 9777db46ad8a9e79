use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use tourdesk_api::{app, AppState};
use tourdesk_booking::DeskSettings;
use tourdesk_core::mock::MockEndpoint;
use tourdesk_core::{ApiError, MockBookingApi, Tour, WireBooking, WireTraveler};
use tower::ServiceExt;

fn fixture() -> Vec<WireBooking> {
    let mut s2 = WireTraveler::new("s2", "Bruno");
    s2.cancellation_requested = true;
    s2.cancellation_reason = Some("change of plans".to_string());
    let mut s3 = WireTraveler::new("s3", "Carla");
    s3.cancellation_approved = true;

    vec![
        WireBooking {
            booking_id: "B1".to_string(),
            tour: Tour {
                name: "Lofoten Islands".to_string(),
                start_date: Utc::now() + Duration::days(60),
                price_per_head: 2100.0,
            },
            customer: Default::default(),
            agent: None,
            payment: Default::default(),
            travelers: vec![WireTraveler::new("s1", "Alice"), s2],
        },
        WireBooking {
            booking_id: "B2".to_string(),
            tour: Tour {
                name: "Sahara Nights".to_string(),
                start_date: Utc::now() - Duration::days(3),
                price_per_head: 900.0,
            },
            customer: Default::default(),
            agent: None,
            payment: Default::default(),
            travelers: vec![s3],
        },
    ]
}

fn setup() -> (Router, Arc<MockBookingApi>) {
    let api = Arc::new(MockBookingApi::new(fixture()).with_token("agent-token"));
    let state = AppState::new(api.clone(), DeskSettings::default());
    (app(state), api)
}

async fn call(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).to_string()))
    };
    (status, value)
}

fn ephemeral_id(listing: &Value, booking_id: &str, server_id: &str) -> String {
    listing["bookings"]
        .as_array()
        .unwrap()
        .iter()
        .find(|b| b["bookingId"] == booking_id)
        .and_then(|b| {
            b["travelers"]
                .as_array()
                .unwrap()
                .iter()
                .find(|t| t["serverId"] == server_id)
        })
        .map(|t| t["ephemeralId"].as_str().unwrap().to_string())
        .unwrap()
}

#[tokio::test]
async fn test_health_needs_no_token() {
    let (app, _api) = setup();
    let (status, body) = call(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("ok".to_string()));
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let (app, api) = setup();
    let (status, body) = call(&app, "GET", "/v1/bookings", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Missing bearer token");
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn test_listing_includes_buckets_and_eligibility() {
    let (app, _api) = setup();
    let (status, body) = call(&app, "GET", "/v1/bookings", Some("agent-token"), None).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(body["buckets"]["active"], json!(["B1"]));
    assert_eq!(body["buckets"]["requested"], json!(["B1"]));
    assert_eq!(body["buckets"]["approved"], json!(["B2"]));
    assert_eq!(body["buckets"]["rejected"], json!([]));
    assert_eq!(body["bookings"][0]["canRequestCancellation"], true);
    assert_eq!(body["bookings"][1]["canRequestCancellation"], false);
    assert_eq!(body["bookings"][0]["travelers"][1]["cancellationState"], "REQUESTED");
}

#[tokio::test]
async fn test_expired_token_surfaces_backend_message() {
    let (app, _api) = setup();
    let (status, body) = call(&app, "GET", "/v1/bookings", Some("expired"), None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "Could not load bookings: Invalid or expired token");
}

#[tokio::test]
async fn test_rejected_token_does_not_keep_a_session() {
    let api = Arc::new(MockBookingApi::new(fixture()).with_token("agent-token"));
    let state = AppState::new(api.clone(), DeskSettings::default());
    let sessions = state.sessions.clone();
    let app = app(state);

    for token in ["expired", "forged", "expired"] {
        let (status, _) = call(&app, "GET", "/v1/bookings", Some(token), None).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }
    assert_eq!(sessions.len().await, 0);

    let (status, _) = call(&app, "GET", "/v1/bookings", Some("agent-token"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sessions.len().await, 1);

    // Unrelated backend failures keep the session.
    api.fail_next(MockEndpoint::List, ApiError::Transport("connection reset".to_string()));
    let (status, _) = call(&app, "POST", "/v1/bookings/refresh", Some("agent-token"), None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(sessions.len().await, 1);
}

#[tokio::test]
async fn test_select_submit_and_withdraw() {
    let (app, api) = setup();
    let (_, listing) = call(&app, "GET", "/v1/bookings", Some("agent-token"), None).await;
    let s1 = ephemeral_id(&listing, "B1", "s1");
    let s2 = ephemeral_id(&listing, "B1", "s2");

    let (status, selection) = call(
        &app,
        "PUT",
        &format!("/v1/bookings/B1/selection/{}", s1),
        Some("agent-token"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(selection, json!({ "bookingId": "B1", "travelerIds": [s1] }));

    let (status, body) = call(
        &app,
        "POST",
        "/v1/bookings/B1/cancellation",
        Some("agent-token"),
        Some(json!({ "reason": "work" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Cancellation request submitted for 1 traveler(s)");

    let (_, summary) = call(&app, "GET", "/v1/bookings/summary", Some("agent-token"), None).await;
    assert_eq!(summary["requested"], json!({ "bookings": 1, "travelers": 2 }));
    assert_eq!(summary["active"], json!({ "bookings": 0, "travelers": 0 }));

    let (status, _) = call(
        &app,
        "POST",
        &format!("/v1/bookings/B1/travelers/{}/withdrawal", s2),
        Some("agent-token"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, entries) = call(&app, "GET", "/v1/bookings/buckets/requested", Some("agent-token"), None).await;
    assert_eq!(entries[0]["bookingId"], "B1");
    assert_eq!(entries[0]["travelers"].as_array().unwrap().len(), 1);
    assert_eq!(entries[0]["travelers"][0]["serverId"], "s1");
    assert_eq!(api.call_count(MockEndpoint::List), 1);
}

#[tokio::test]
async fn test_precondition_failures_map_to_client_errors() {
    let (app, api) = setup();
    let (_, listing) = call(&app, "GET", "/v1/bookings", Some("agent-token"), None).await;

    let (status, body) = call(
        &app,
        "POST",
        "/v1/bookings/B1/cancellation",
        Some("agent-token"),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Select at least one traveler to cancel");

    let s3 = ephemeral_id(&listing, "B2", "s3");
    let (status, _) = call(
        &app,
        "POST",
        &format!("/v1/bookings/B2/travelers/{}/withdrawal", s3),
        Some("agent-token"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(&app, "PUT", "/v1/bookings/B1/selection/not-a-key", Some("agent-token"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(api.call_count(MockEndpoint::Cancel), 0);
    assert_eq!(api.call_count(MockEndpoint::Withdraw), 0);
}

#[tokio::test]
async fn test_backend_rejection_keeps_selection() {
    let (app, api) = setup();
    let (_, listing) = call(&app, "GET", "/v1/bookings", Some("agent-token"), None).await;
    let s1 = ephemeral_id(&listing, "B1", "s1");
    call(&app, "PUT", &format!("/v1/bookings/B1/selection/{}", s1), Some("agent-token"), None).await;

    api.fail_next(
        MockEndpoint::Cancel,
        ApiError::Rejected {
            status: 400,
            message: Some("Booking is locked by finance".to_string()),
        },
    );
    let (status, body) = call(
        &app,
        "POST",
        "/v1/bookings/B1/cancellation",
        Some("agent-token"),
        Some(json!({ "reason": "work" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "Booking is locked by finance");

    let (_, listing) = call(&app, "GET", "/v1/bookings", Some("agent-token"), None).await;
    assert_eq!(listing["selection"]["travelerIds"], json!([s1]));
    assert_eq!(listing["bookings"][0]["travelers"][0]["cancellationState"], "NONE");
}

#[tokio::test]
async fn test_refresh_invalidates_previous_keys() {
    let (app, _api) = setup();
    let (_, listing) = call(&app, "GET", "/v1/bookings", Some("agent-token"), None).await;
    let stale = ephemeral_id(&listing, "B1", "s1");

    let (status, refreshed) = call(&app, "POST", "/v1/bookings/refresh", Some("agent-token"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_ne!(ephemeral_id(&refreshed, "B1", "s1"), stale);

    let (status, body) = call(
        &app,
        "PUT",
        &format!("/v1/bookings/B1/selection/{}", stale),
        Some("agent-token"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Traveler key could not be resolved"));
}

#[tokio::test]
async fn test_sessions_are_isolated_per_token() {
    let api = Arc::new(MockBookingApi::new(fixture()));
    let state = AppState::new(api.clone(), DeskSettings::default());
    let sessions = state.sessions.clone();
    let app = app(state);

    let (_, listing) = call(&app, "GET", "/v1/bookings", Some("agent-a"), None).await;
    let s1 = ephemeral_id(&listing, "B1", "s1");
    call(&app, "PUT", &format!("/v1/bookings/B1/selection/{}", s1), Some("agent-a"), None).await;

    let (_, other) = call(&app, "GET", "/v1/bookings", Some("agent-b"), None).await;
    assert_eq!(other["selection"]["travelerIds"], json!([]));
    assert_eq!(sessions.len().await, 2);
}
