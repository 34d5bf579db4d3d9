use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use tokio::net::TcpListener;

use crate::app::{app, AppState};
use crate::config;
use crate::database::{DatabaseManager, PgDatabase};

#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    #[arg(long, help = "Address to bind (defaults to API_BIND)")]
    pub bind: Option<String>,

    #[arg(long, help = "Port to listen on (defaults to API_PORT)")]
    pub port: Option<u16>,
}

pub async fn handle(args: ServeArgs) -> anyhow::Result<()> {
    let config = config::config();
    tracing::info!("Starting Event Manager API in {:?} mode", config.environment);
    if config.security.jwt_secret.is_empty() {
        tracing::warn!("SECURITY_JWT_SECRET is not set; logins will fail");
    }

    let pool = DatabaseManager::connect_lazy(&config.database).context("failed to create database pool")?;
    let state = AppState::new(Arc::new(PgDatabase::new(pool, &config.database)));

    let bind = args.bind.unwrap_or_else(|| config.api.bind.clone());
    let port = args.port.unwrap_or(config.api.port);
    let addr = format!("{}:{}", bind, port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tracing::info!("Event Manager API listening on http://{}", addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
