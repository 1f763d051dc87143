//! HTTPS server
//!
//! One listener serves the WebSocket feed on `/` and the static API
//! endpoints, over TLS.

use axum::Router;
use axum_server::Handle;
use axum_server::tls_rustls::RustlsConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use ef_core::{GatewayConfig, TlsConfig};
use ef_ws::WsState;

use crate::error::{GatewayError, Result};

/// Build the application router
pub fn app(config: &GatewayConfig) -> Router {
    let ws_state = Arc::new(WsState::from_config(config));

    ef_ws::routes(ws_state)
        .merge(ef_api::routes())
        .layer(TraceLayer::new_for_http())
}

/// Resolve a `host:port` bind address; the first result wins
pub async fn resolve_addr(addr: &str) -> Result<SocketAddr> {
    tokio::net::lookup_host(addr)
        .await
        .map_err(|e| GatewayError::Resolve(format!("{}: {}", addr, e)))?
        .next()
        .ok_or_else(|| GatewayError::Resolve(format!("{}: no address found", addr)))
}

/// Load the PEM certificate chain and private key
pub async fn load_tls(tls: &TlsConfig) -> Result<RustlsConfig> {
    RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path)
        .await
        .map_err(|e| {
            GatewayError::Tls(format!(
                "failed to load {} / {}: {}",
                tls.cert_path, tls.key_path, e
            ))
        })
}

/// Serve until `handle` is shut down or the listener fails
pub async fn serve(config: &GatewayConfig, handle: Handle) -> Result<()> {
    let addr = resolve_addr(&config.server.bind_addr).await?;
    let tls = load_tls(&config.tls).await?;
    let app = app(config);

    info!("listen at {}", addr);

    axum_server::bind_rustls(addr, tls)
        .handle(handle)
        .serve(app.into_make_service())
        .await
        .map_err(GatewayError::Serve)
}
