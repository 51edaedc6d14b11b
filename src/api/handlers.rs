//! Landing page and the not-yet-implemented endpoints

use axum::{
    extract::{Query, State as AxumState},
    http::StatusCode,
    response::Html,
};
use serde::Deserialize;
use tracing::error;

use crate::SharedState;
use crate::error::{LankyError, Result};
use crate::feed::Order;

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    /// `date` or `status`; anything else sorts by status
    pub by: Option<String>,
}

/// GET / - build feed sorted by `?by=`
pub async fn root(
    AxumState(state): AxumState<SharedState>,
    Query(params): Query<FeedQuery>,
) -> Result<Html<String>> {
    let jenkins = state.jenkins.as_ref().ok_or_else(|| {
        LankyError::ConfigError("Jenkins configuration is invalid.".to_string())
    })?;

    let order = Order::from_query(params.by.as_deref());
    let projects = jenkins.tray_feed(order).await.map_err(|e| {
        error!("Tray feed unavailable: {}", e);
        e
    })?;

    Ok(Html(state.pages.projects(&projects)?))
}

/// /_hubot - chat-bot API
pub async fn hubot() -> LankyError {
    LankyError::NotImplemented
}

/// /_builder - Jenkins build callback
pub async fn builder() -> LankyError {
    LankyError::NotImplemented
}

/// Any unrouted path
pub async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not found.")
}
