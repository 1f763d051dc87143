//! WebSocket upgrade handler
//!
//! Upgrade failures are answered per request; they never take the
//! server down.

use axum::{
    extract::{
        State,
        ws::{WebSocket, WebSocketUpgrade, rejection::WebSocketUpgradeRejection},
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use futures::StreamExt;
use http::header::ORIGIN;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::server::WsState;
use crate::session::{Session, SessionTiming};

/// Handle WebSocket upgrade request
pub async fn websocket_handler(
    State(state): State<Arc<WsState>>,
    headers: HeaderMap,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => {
            warn!("WebSocket upgrade rejected: {}", rejection);
            return rejection.into_response();
        }
    };

    // a header that is not valid UTF-8 is checked as an empty origin
    let origin = headers
        .get(ORIGIN)
        .map(|value| value.to_str().unwrap_or_default());
    if !state.origin_policy.allows(origin) {
        warn!("WebSocket origin not allowed: {:?}", origin);
        return StatusCode::FORBIDDEN.into_response();
    }

    let timing = state.timing;
    ws.on_failed_upgrade(|e| warn!("WebSocket upgrade failed: {}", e))
        .on_upgrade(move |socket| handle_socket(socket, timing))
}

/// Drive an established WebSocket connection
async fn handle_socket(socket: WebSocket, timing: SessionTiming) {
    let (ws_tx, ws_rx) = socket.split();
    let session = Session::new(ws_tx, timing);
    let session_id = session.id().to_string();

    let end = session.run(ws_rx).await;
    debug!(session_id = %session_id, "WebSocket connection released: {}", end);
}
