use std::sync::Arc;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rdv_dashboard::config::Config;
use rdv_dashboard::handlers::{self, AppState};

/// Main entry point for the application.
///
/// Initializes tracing, loads configuration from the environment, builds the
/// spreadsheet and webhook clients, and serves the HTTP routes.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rdv_dashboard=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!("Configuration loaded successfully");

    let port = config.port;
    let app_state = Arc::new(AppState::new(config)?);
    if !app_state.relay.is_configured() {
        tracing::warn!("Chat relay disabled until N8N_CHATBOT_WEBHOOK_URL is set");
    }

    // 10 requests/second per IP, burst of 20
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or_else(|| anyhow::anyhow!("Invalid rate limiter configuration"))?,
    );

    // Health check stays outside the rate limiter
    let api = handlers::api_routes().layer(GovernorLayer {
        config: governor_conf,
    });
    let app = handlers::app(app_state, api);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}
