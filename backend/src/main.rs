use std::sync::Arc;
use std::time::Duration;

mod auth;
mod config;
mod db;
mod error;
mod extract;
mod formatter;
mod handlers;
mod models;
mod router;
mod services;
#[cfg(test)]
mod test_support;

use auth::rate_limit::RateLimitState;
use config::Config;
use db::{LogStore, MemoryLogStore, PgLogStore};
use services::recommendation::{RecommendationGateway, WebhookGateway};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn LogStore>,
    pub recommender: Arc<dyn RecommendationGateway>,
    pub config: Arc<Config>,
    /// Shared client for calls to the auth provider.
    pub http: reqwest::Client,
    pub rate_limiter: RateLimitState,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "moodlog_api=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    let config = Arc::new(Config::from_env()?);

    let store: Arc<dyn LogStore> = match &config.database_url {
        Some(url) => Arc::new(PgLogStore::connect(url).await?),
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory log store; entries are lost on restart");
            Arc::new(MemoryLogStore::new())
        }
    };

    let recommender = Arc::new(WebhookGateway::from_config(&config)?);

    let rate_limiter = RateLimitState::new(
        config.submit_rate_limit,
        Duration::from_secs(config.submit_rate_window_secs),
    );
    rate_limiter.spawn_cleanup_worker();

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()?;

    let state = AppState {
        store: store.clone(),
        recommender,
        config: config.clone(),
        http,
        rate_limiter,
    };

    let app = router::build_router(state);

    let addr = config.listen_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
}
