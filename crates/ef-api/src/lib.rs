//! ef-api: static JSON endpoints
//!
//! `POST /postEvent` acknowledges an event and `GET /getBalance` reports a
//! fixed balance. Neither reads the request body.

pub mod error;
pub mod handlers;
pub mod routes;

pub use error::{ApiError, Result};
pub use routes::routes;
