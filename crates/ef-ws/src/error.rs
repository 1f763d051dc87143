//! Error types for ef-ws

use std::time::Duration;
use thiserror::Error;

/// WebSocket error type
#[derive(Error, Debug)]
pub enum WsError {
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("Write deadline of {0:?} exceeded")]
    WriteTimeout(Duration),

    #[error("Connection closed")]
    Closed,

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for ef-ws
pub type Result<T> = std::result::Result<T, WsError>;
