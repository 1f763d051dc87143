//! Error types for ef-api

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// ef-api error type
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ApiError {
    /// The endpoint does not serve this method
    #[error("Method not allowed: {0}")]
    MethodNotAllowed(http::Method),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            // answered with an empty body
            Self::MethodNotAllowed(_) => StatusCode::FORBIDDEN.into_response(),
        }
    }
}

/// Result type alias for ef-api
pub type Result<T> = std::result::Result<T, ApiError>;
