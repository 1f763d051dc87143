//! Route definitions
//!
//! Every method reaches the handlers, which answer 403 for the ones they
//! do not serve.

use axum::{Router, routing::any};

use crate::handlers::{get_balance, post_event};

/// Create the API router
pub fn routes() -> Router {
    Router::new()
        .route("/postEvent", any(post_event))
        .route("/getBalance", any(get_balance))
}
