//! GitHub API client and payload types

use axum::http::{HeaderMap, HeaderValue, header};
use regex::Regex;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{LankyError, Result};
use crate::web_client::{HttpClient, WebClient};
use crate::{GithubConfig, LankyConfig};

const LINK_HEADER: &str = "link";
const MAX_PAGES: usize = 100;

/// Repository metadata; only `full_name` drives sorting and display.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
pub struct Repository {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub name: String,
    pub full_name: String,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub fork: bool,
    pub html_url: Option<String>,
    pub description: Option<String>,
    pub language: Option<String>,
    pub default_branch: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
pub struct HookConfig {
    pub url: Option<String>,
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
pub struct Hook {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub events: Vec<String>,
    #[serde(default)]
    pub config: HookConfig,
}

/// Body of a `ping` delivery, decoded only for logging.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct PingPayload {
    #[serde(default)]
    pub zen: String,
    #[serde(default)]
    pub hook_id: u64,
    pub hook: Option<Hook>,
    pub repository: Option<Repository>,
}

pub struct GithubClient {
    web: Arc<dyn WebClient>,
    api_url: String,
    page_size: usize,
}

impl GithubClient {
    pub fn new(github: &GithubConfig, web: Arc<dyn WebClient>) -> Result<Self> {
        if github.token.is_empty() {
            return Err(LankyError::ConfigError(
                "Github configuration is invalid: token is required.".to_string(),
            ));
        }
        Ok(Self {
            web,
            api_url: github.api_url().to_string(),
            page_size: github.page_size(),
        })
    }

    /// Client authenticating every request with the configured token.
    pub fn from_config(config: Arc<LankyConfig>) -> Result<Self> {
        let github = config.github.as_ref().ok_or_else(|| {
            LankyError::ConfigError("Github configuration is invalid: missing section.".to_string())
        })?;

        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("token {}", github.token))
            .map_err(|e| LankyError::ConfigError(format!("Invalid github token: {}", e)))?;
        headers.insert(header::AUTHORIZATION, auth);
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            header::USER_AGENT,
            HeaderValue::from_static(concat!("lanky/", env!("CARGO_PKG_VERSION"))),
        );
        let web = HttpClient::with_default_headers(config.client_timeout(), headers)?;
        Self::new(github, Arc::new(web))
    }

    /// Default capacity hint for listings.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Extracts the URL for `rel` from a `Link` header, empty when absent.
    pub fn pagination(link_header: &str, rel: &str) -> String {
        let pattern = format!(r#"<([^>]*)>\s*;\s*rel="{}""#, regex::escape(rel));
        let Ok(re) = Regex::new(&pattern) else {
            return String::new();
        };
        re.captures(link_header)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default()
    }

    /// All repositories of `organization`, sorted by full name.
    #[tracing::instrument(skip(self))]
    pub async fn list_repositories(
        &self,
        organization: &str,
        capacity: usize,
    ) -> Result<Vec<Repository>> {
        let url = format!(
            "{}/orgs/{}/repos?per_page={}",
            self.api_url, organization, capacity
        );
        let mut repos: Vec<Repository> = self.fetch_all(url, capacity).await?;
        repos.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        info!("Listed {} repositories for {}", repos.len(), organization);
        Ok(repos)
    }

    /// All hooks configured on `repo` (`owner/name`), in API order.
    #[tracing::instrument(skip(self))]
    pub async fn list_hooks(&self, repo: &str, capacity: usize) -> Result<Vec<Hook>> {
        let url = format!("{}/repos/{}/hooks?per_page={}", self.api_url, repo, capacity);
        self.fetch_all(url, capacity).await
    }

    /// Follows `rel="next"` links, decoding each page. Any failure discards everything.
    async fn fetch_all<T: DeserializeOwned>(&self, first: String, capacity: usize) -> Result<Vec<T>> {
        let mut items = Vec::with_capacity(capacity);
        let mut url = first;

        for page in 1..=MAX_PAGES {
            let response = self.web.get(&url).await?;
            let batch: Vec<T> =
                serde_json::from_slice(&response.body).map_err(|e| LankyError::Parse {
                    url: url.clone(),
                    message: e.to_string(),
                })?;
            debug!("page {} of {} returned {} items", page, url, batch.len());
            items.extend(batch);

            let next = Self::pagination(response.header(LINK_HEADER), "next");
            if next.is_empty() {
                return Ok(items);
            }
            url = next;
        }

        warn!(
            "Stopped paging after {} pages; {} remains unfetched",
            MAX_PAGES, url
        );
        Ok(items)
    }
}
