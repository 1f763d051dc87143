//! Error types for ef-core

use thiserror::Error;

/// Main error type for ef-core
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for ef-core
pub type Result<T> = std::result::Result<T, Error>;
