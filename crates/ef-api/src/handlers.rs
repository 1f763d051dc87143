//! HTTP API handlers
//!
//! Both endpoints answer with constants; nothing is read or stored.

use axum::{Json, http::Method};
use serde::Serialize;
use tracing::debug;

use crate::{ApiError, Result};

/// Balance reported by `GET /getBalance`
pub const BALANCE: u64 = 100;

// ============================================================================
// Response types
// ============================================================================

/// `POST /postEvent` response: `{"status":"ok"}`
#[derive(Debug, Serialize)]
pub struct EventAck {
    pub status: &'static str,
}

/// `GET /getBalance` response: `{"balance":"100"}`
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    /// Balance rendered as a string
    pub balance: String,
}

// ============================================================================
// Handler functions
// ============================================================================

/// Acknowledge a submitted event without reading it
pub async fn post_event(method: Method) -> Result<Json<EventAck>> {
    if method != Method::POST {
        debug!("postEvent called with {}", method);
        return Err(ApiError::MethodNotAllowed(method));
    }

    Ok(Json(EventAck { status: "ok" }))
}

/// Report the fixed balance
pub async fn get_balance(method: Method) -> Result<Json<BalanceResponse>> {
    if method != Method::GET {
        debug!("getBalance called with {}", method);
        return Err(ApiError::MethodNotAllowed(method));
    }

    Ok(Json(BalanceResponse {
        balance: BALANCE.to_string(),
    }))
}
