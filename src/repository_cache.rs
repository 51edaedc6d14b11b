//! Published organisation repository list with rate-limited refresh

use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::Result;
use crate::github::{GithubClient, Repository};

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Two locks: `last_refresh` serializes refresh attempts across the network
/// calls, `published` only guards the pointer swap against readers.
pub struct RepositoryCache {
    last_refresh: Mutex<Option<Instant>>,
    published: RwLock<Arc<Vec<Repository>>>,
    refresh_interval: Duration,
}

impl RepositoryCache {
    pub fn new(refresh_interval: Duration) -> Self {
        Self {
            last_refresh: Mutex::new(None),
            published: RwLock::new(Arc::new(Vec::new())),
            refresh_interval,
        }
    }

    /// Currently published list.
    pub fn snapshot(&self) -> Arc<Vec<Repository>> {
        self.published
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn publish(&self, repos: Vec<Repository>) {
        let mut slot = self
            .published
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *slot = Arc::new(repos);
    }

    /// Refetches unless the last successful refresh is younger than the interval.
    /// Returns whether a new list was published.
    pub async fn refresh(
        &self,
        client: &GithubClient,
        organization: &str,
        capacity: usize,
    ) -> Result<bool> {
        let mut last_refresh = self.last_refresh.lock().await;
        if let Some(at) = *last_refresh {
            if at.elapsed() < self.refresh_interval {
                debug!(
                    "Repository list refreshed {:?} ago, skipping",
                    at.elapsed()
                );
                return Ok(false);
            }
        }

        let repos = client.list_repositories(organization, capacity).await?;
        *last_refresh = Some(Instant::now());
        info!("Publishing {} repositories", repos.len());
        self.publish(repos);
        Ok(true)
    }
}

impl Default for RepositoryCache {
    fn default() -> Self {
        Self::new(DEFAULT_REFRESH_INTERVAL)
    }
}
