//! Organisation repository listing

use axum::{
    extract::{Query, State as AxumState},
    response::Html,
};
use serde::Deserialize;
use tracing::error;

use crate::SharedState;
use crate::error::{LankyError, Result};

#[derive(Debug, Deserialize)]
pub struct RepositoriesQuery {
    /// `now` requests a refresh, honoured at most once per refresh interval
    pub update: Option<String>,
}

/// GET /repositories - currently published list, optionally refreshed first
pub async fn list_repositories(
    AxumState(state): AxumState<SharedState>,
    Query(params): Query<RepositoriesQuery>,
) -> Result<Html<String>> {
    let invalid = || LankyError::ConfigError("Github configuration is invalid.".to_string());
    let github = state.github.as_ref().ok_or_else(invalid)?;

    if params.update.as_deref() == Some("now") {
        let organization = state
            .config
            .github
            .as_ref()
            .map(|g| g.organization.as_str())
            .filter(|o| !o.is_empty())
            .ok_or_else(invalid)?;

        state
            .repositories
            .refresh(github, organization, github.page_size())
            .await
            .map_err(|e| {
                error!("Repository refresh failed: {}", e);
                e
            })?;
    }

    Ok(Html(state.pages.repositories(&state.repositories.snapshot())?))
}
