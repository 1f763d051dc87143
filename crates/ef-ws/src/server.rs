//! WebSocket routes and shared state

use axum::{Router, routing::get};
use std::sync::Arc;
use tracing::{info, warn};

use ef_core::GatewayConfig;

use crate::handler::websocket_handler;
use crate::origin::OriginPolicy;
use crate::session::SessionTiming;

/// State shared by every upgrade request
#[derive(Debug, Clone, Default)]
pub struct WsState {
    /// Which origins may open the feed
    pub origin_policy: OriginPolicy,
    /// Timing handed to each new session
    pub timing: SessionTiming,
}

impl WsState {
    pub fn from_config(config: &GatewayConfig) -> Self {
        let origin_policy = OriginPolicy::from_config(&config.ws);
        match &origin_policy {
            OriginPolicy::AllowAny => {
                warn!("WebSocket origin check disabled: every origin is accepted")
            }
            OriginPolicy::AllowList(origins) => {
                info!("WebSocket origins allowed: {:?}", origins)
            }
        }

        Self {
            origin_policy,
            timing: SessionTiming::from_config(&config.session),
        }
    }
}

/// Router serving the event feed on `/`
pub fn routes(state: Arc<WsState>) -> Router {
    Router::new()
        .route("/", get(websocket_handler))
        .with_state(state)
}
