//! Error types for ef-gateway

use std::fmt;

/// Startup and serving errors of the gateway binary
#[derive(Debug)]
pub enum GatewayError {
    /// Configuration could not be loaded or is invalid
    Config(ef_core::Error),
    /// The bind address could not be resolved
    Resolve(String),
    /// Certificate or key could not be loaded
    Tls(String),
    /// The listener failed
    Serve(std::io::Error),
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "Config error: {}", e),
            Self::Resolve(e) => write!(f, "Address error: {}", e),
            Self::Tls(e) => write!(f, "TLS error: {}", e),
            Self::Serve(e) => write!(f, "Server error: {}", e),
        }
    }
}

impl std::error::Error for GatewayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Serve(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ef_core::Error> for GatewayError {
    fn from(e: ef_core::Error) -> Self {
        Self::Config(e)
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, GatewayError>;
