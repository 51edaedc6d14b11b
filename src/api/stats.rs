//! Status page

use axum::{extract::State as AxumState, response::Html};

use crate::SharedState;
use crate::error::Result;

/// GET /status - runtime statistics; requests to it are not counted
pub async fn status(AxumState(state): AxumState<SharedState>) -> Result<Html<String>> {
    Ok(Html(state.pages.status(&state.stats.snapshot())?))
}
