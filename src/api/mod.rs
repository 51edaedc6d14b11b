//! API module for all HTTP handlers
//!
//! Landing page, webhook endpoints, repository listing and status page

pub mod handlers;
pub mod repositories;
pub mod request_log;
pub mod stats;
pub mod webhook;

use axum::{Router, middleware, routing};

use crate::SharedState;

// Re-export handlers
pub use handlers::{builder, hubot, not_found, root};
pub use repositories::list_repositories;
pub use request_log::log_requests;
pub use stats::status;
pub use webhook::handle_webhook;

/// Composition root for every route.
pub fn router(state: SharedState) -> Router {
    Router::new()
        // landing page
        .route("/", routing::get(root))
        // GitHub post-receive hooks
        .route("/_github", routing::any(handle_webhook))
        // chat-bot API
        .route("/_hubot", routing::any(hubot))
        // Jenkins callback
        .route("/_builder", routing::any(builder))
        .route("/repositories", routing::get(list_repositories))
        .route("/status", routing::get(status))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state.clone(), log_requests))
        .with_state(state)
}
