pub mod app_config;
pub mod http_api;

pub use http_api::HttpBookingApi;
