use std::sync::Arc;
use tracing::{debug, error};

use crate::LankyConfig;
use crate::error::{LankyError, Result};
use crate::feed::{Order, ProjectList, read_tray_feed};
use crate::web_client::{HttpClient, WebClient};

/// Fetches and orders the Jenkins CCTray feed.
#[derive(Clone)]
pub struct JenkinsClient {
    config: Arc<LankyConfig>,
    web: Arc<dyn WebClient>,
    feed_url: String,
}

impl JenkinsClient {
    /// Client over an explicit HTTP collaborator.
    pub fn new(config: Arc<LankyConfig>, web: Arc<dyn WebClient>) -> Result<Self> {
        let feed_url = config.tray_feed_url().ok_or_else(|| {
            LankyError::ConfigError(
                "Jenkins configuration is invalid: base_url and tray_feed are required."
                    .to_string(),
            )
        })?;
        Ok(Self {
            config,
            web,
            feed_url,
        })
    }

    /// Client over a reqwest client using the configured timeout.
    pub fn from_config(config: Arc<LankyConfig>) -> Result<Self> {
        let web = HttpClient::new(config.client_timeout())?;
        Self::new(config, Arc::new(web))
    }

    pub fn feed_url(&self) -> &str {
        &self.feed_url
    }

    /// Pulls the feed and sorts it by `order`.
    #[tracing::instrument(skip(self), fields(url = %self.feed_url))]
    pub async fn tray_feed(&self, order: Order) -> Result<ProjectList> {
        let response = self.web.get(&self.feed_url).await.map_err(|e| match e {
            LankyError::Fetch { url, message, .. } => LankyError::Fetch {
                url,
                timeout: self.config.client_timeout(),
                message,
            },
            other => other,
        })?;

        let text = std::str::from_utf8(&response.body).map_err(|e| LankyError::Parse {
            url: self.feed_url.clone(),
            message: e.to_string(),
        })?;
        let mut projects = read_tray_feed(text).map_err(|e| {
            error!("Could not parse tray feed: {}", e);
            LankyError::Parse {
                url: self.feed_url.clone(),
                message: e.to_string(),
            }
        })?;

        projects.sort_by(order);
        debug!("{} projects sorted by {}", projects.len(), projects.order);
        Ok(projects)
    }
}
