use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub backend: BackendConfig,
    #[serde(default)]
    pub desk: DeskConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

/// Where the booking backend lives. Paths may contain a `{booking_id}` placeholder.
#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    pub base_url: String,
    #[serde(default = "default_bookings_path")]
    pub bookings_path: String,
    #[serde(default = "default_cancel_path")]
    pub cancel_path: String,
    #[serde(default = "default_withdraw_path")]
    pub withdraw_path: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DeskConfig {
    #[serde(default = "default_cancel_message")]
    pub default_cancel_message: String,
    #[serde(default = "default_withdraw_message")]
    pub default_withdraw_message: String,
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            default_cancel_message: default_cancel_message(),
            default_withdraw_message: default_withdraw_message(),
            event_buffer: default_event_buffer(),
        }
    }
}

fn default_bookings_path() -> String { "/bookings".to_string() }
fn default_cancel_path() -> String { "/bookings/{booking_id}/cancel".to_string() }
fn default_withdraw_path() -> String { "/bookings/{booking_id}/withdraw-cancellation".to_string() }
fn default_timeout_seconds() -> u64 { 30 }
fn default_cancel_message() -> String { "Failed to submit cancellation request.".to_string() }
fn default_withdraw_message() -> String { "Failed to withdraw cancellation request.".to_string() }
fn default_event_buffer() -> usize { 100 }

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Environment overlay is optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Never checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `TOURDESK__BACKEND__BASE_URL=https://api.example.com`
            .add_source(config::Environment::with_prefix("TOURDESK").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{File, FileFormat};

    #[test]
    fn test_defaults_fill_missing_sections() {
        let raw = r#"
            [server]
            port = 8080

            [backend]
            base_url = "http://localhost:5000/api"
        "#;
        let cfg: Config = config::Config::builder()
            .add_source(File::from_str(raw, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.backend.bookings_path, "/bookings");
        assert_eq!(cfg.backend.cancel_path, "/bookings/{booking_id}/cancel");
        assert_eq!(cfg.backend.timeout_seconds, 30);
        assert_eq!(cfg.desk.event_buffer, 100);
        assert_eq!(cfg.desk.default_cancel_message, "Failed to submit cancellation request.");
    }

    #[test]
    fn test_overrides_are_respected() {
        let raw = r#"
            [server]
            port = 9000

            [backend]
            base_url = "https://backoffice.example.com"
            cancel_path = "/agent/bookings/{booking_id}/cancel-request"
            timeout_seconds = 5

            [desk]
            event_buffer = 16
        "#;
        let cfg: Config = config::Config::builder()
            .add_source(File::from_str(raw, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(cfg.backend.cancel_path, "/agent/bookings/{booking_id}/cancel-request");
        assert_eq!(cfg.backend.timeout_seconds, 5);
        assert_eq!(cfg.desk.event_buffer, 16);
        assert_eq!(cfg.desk.default_withdraw_message, "Failed to withdraw cancellation request.");
    }
}
