//! ef-gateway: eventfeed main binary
//!
//! Serves the WebSocket event feed and the static JSON endpoints over TLS.
//!
//! Usage:
//!   ef-gateway                       - Listen on the configured address (default localhost:443)
//!   ef-gateway --addr 0.0.0.0:8443   - Listen on another address
//!   ef-gateway --config gw.toml      - Read settings from a TOML file
//!   ef-gateway --help                - Show help

mod cli;
mod error;
mod server;

use anyhow::Context;
use axum_server::Handle;
use clap::Parser;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// How long open connections get to finish after Ctrl+C
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args = cli::Args::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    // Load .env file
    dotenvy::dotenv().ok();

    let config = args.load_config().context("failed to load configuration")?;
    config.validate().context("invalid configuration")?;

    tracing::info!("Starting ef-gateway {}", env!("CARGO_PKG_VERSION"));

    let handle = Handle::new();
    let shutdown = handle.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutting down...");
            shutdown.graceful_shutdown(Some(SHUTDOWN_GRACE));
        }
    });

    if let Err(e) = server::serve(&config, handle).await {
        tracing::error!("{}", e);
        return Err(e.into());
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
