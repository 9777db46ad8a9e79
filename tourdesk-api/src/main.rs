use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tourdesk_api::{app, AppState};
use tourdesk_booking::DeskSettings;
use tourdesk_store::HttpBookingApi;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "tourdesk_api=debug,tourdesk_booking=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = tourdesk_store::app_config::Config::load().context("Failed to load config")?;
    tracing::info!("Starting TourDesk API on port {}", config.server.port);
    tracing::info!("Forwarding booking calls to {}", config.backend.base_url);

    let backend = HttpBookingApi::new(&config.backend).context("Failed to create backend client")?;

    let settings = DeskSettings {
        default_cancel_message: config.desk.default_cancel_message.clone(),
        default_withdraw_message: config.desk.default_withdraw_message.clone(),
        event_buffer: config.desk.event_buffer,
    };
    let app_state = AppState::new(Arc::new(backend), settings);

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
