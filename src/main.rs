//! modelvault - per-user storage for GLB/GLTF model uploads
//!
//! Serves the upload/list/download/delete/promote API over a local
//! SQLite model store.

use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use modelvault::config::{self, LogFormat};
use modelvault::{api, AppState, Error, Result};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = config::init();

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "modelvault=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    match config.logging.format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    tracing::info!(
        "Starting modelvault on {}:{}",
        config.server.host,
        config.server.port
    );
    if config.identity.ephemeral_secret {
        tracing::warn!(
            "IDENTITY_TOKEN_SECRET not set, using a random secret; no issued token will verify"
        );
    }

    // Initialize application state
    let state = AppState::new(config).await?;
    tracing::info!("Model store opened at {}", config.database.path);

    // Build router
    let app = Router::new()
        .merge(api::routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| Error::InvalidInput(format!("Invalid listen address: {}", e)))?;

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
