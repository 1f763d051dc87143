//! ef-core: eventfeed core library
//!
//! Configuration and error types shared by the WebSocket feed,
//! the static API endpoints and the gateway binary.

pub mod config;
pub mod error;

pub use config::{GatewayConfig, ServerConfig, SessionConfig, TlsConfig, WsConfig};
pub use error::{Error, Result};
