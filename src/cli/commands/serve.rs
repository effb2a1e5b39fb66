use anyhow::Context;
use tracing::info;

use crate::app::app;
use crate::config::config;
use crate::database::DatabaseManager;
use crate::state::AppState;

pub async fn handle(port: Option<u16>) -> anyhow::Result<()> {
    let config = config();
    let port = port.unwrap_or(config.api.port);

    if crate::is_production!() && config.security.cors_origins.is_empty() {
        tracing::warn!("No CORS origins configured in production, allowing any origin");
    }

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    info!("BilimTube API listening on http://{} ({:?})", bind_addr, config.environment);

    axum::serve(listener, app(AppState::postgres()))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    DatabaseManager::close().await;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
