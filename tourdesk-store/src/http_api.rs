use async_trait::async_trait;
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tourdesk_core::{
    ApiError, ApiMessage, BearerToken, BookingApi, CancelRequest, WireBooking, WithdrawRequest,
};
use tracing::{debug, warn};

use crate::app_config::BackendConfig;

const BOOKING_ID_PLACEHOLDER: &str = "{booking_id}";

/// Error body shapes the backend is known to send.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

/// `BookingApi` over the backend REST endpoints.
pub struct HttpBookingApi {
    client: reqwest::Client,
    base_url: Url,
    bookings_path: String,
    cancel_path: String,
    withdraw_path: String,
}

impl HttpBookingApi {
    pub fn new(config: &BackendConfig) -> Result<Self, ApiError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ApiError::Transport(format!("Invalid backend URL {}: {}", config.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::Transport(format!(
                "Backend URL cannot carry paths: {}",
                config.base_url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| ApiError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            bookings_path: config.bookings_path.clone(),
            cancel_path: config.cancel_path.clone(),
            withdraw_path: config.withdraw_path.clone(),
        })
    }

    /// Appends `template` to the base URL, substituting the booking id as a single
    /// percent-encoded path segment.
    fn endpoint(&self, template: &str, booking_id: Option<&str>) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty();
            for part in template.split('/').filter(|p| !p.is_empty()) {
                match (part, booking_id) {
                    (BOOKING_ID_PLACEHOLDER, Some(id)) => segments.push(id),
                    _ => segments.push(part),
                };
            }
        }
        url
    }

    async fn send<B, T>(
        &self,
        method: Method,
        url: Url,
        token: &BearerToken,
        body: Option<&B>,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!("{} {}", method, url);

        let mut request = self
            .client
            .request(method, url)
            .bearer_auth(token.as_str());
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Transport(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&text)
                .ok()
                .and_then(|b| b.message.or(b.error))
                .filter(|m| !m.trim().is_empty());
            warn!("Backend responded {}: {}", status, message.as_deref().unwrap_or("<no message>"));
            return Err(ApiError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(format!("Failed to parse JSON response: {}", e)))
    }
}

#[async_trait]
impl BookingApi for HttpBookingApi {
    async fn list_bookings(&self, token: &BearerToken) -> Result<Vec<WireBooking>, ApiError> {
        let url = self.endpoint(&self.bookings_path, None);
        self.send::<(), _>(Method::GET, url, token, None).await
    }

    async fn request_cancellation(
        &self,
        token: &BearerToken,
        booking_id: &str,
        request: &CancelRequest,
    ) -> Result<ApiMessage, ApiError> {
        let url = self.endpoint(&self.cancel_path, Some(booking_id));
        self.send(Method::PUT, url, token, Some(request)).await
    }

    async fn withdraw_cancellation(
        &self,
        token: &BearerToken,
        booking_id: &str,
        request: &WithdrawRequest,
    ) -> Result<ApiMessage, ApiError> {
        let url = self.endpoint(&self.withdraw_path, Some(booking_id));
        self.send(Method::PUT, url, token, Some(request)).await
    }
}
