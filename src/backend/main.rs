/**
 * Parlour Server Entry Point
 *
 * Loads `.env`, initializes tracing, reads the configuration and serves the
 * API and the single-page app until Ctrl+C or SIGTERM. After the last
 * connection closes, replies still being generated for clients that left
 * are given time to finish and be saved.
 */

use std::net::SocketAddr;
use std::time::Duration;

use parlour::backend::routes::create_router;
use parlour::backend::server::{build_state, AppConfig};

/// Upper bound on waiting for background replies at shutdown
const TURN_DRAIN_TIMEOUT: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file if present
    dotenv::dotenv().ok();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,parlour=debug"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let config = AppConfig::load(None)?;
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    let state = build_state(config).await?;
    let turns = state.turns.clone();
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    turns.close();
    if !turns.is_empty() {
        tracing::info!("Waiting for {} replies to finish", turns.len());
        if tokio::time::timeout(TURN_DRAIN_TIMEOUT, turns.wait()).await.is_err() {
            tracing::warn!("Gave up on {} unfinished replies", turns.len());
        }
    }

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!("Failed to listen for SIGTERM: {}", e),
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
