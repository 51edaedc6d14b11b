pub mod api;
pub mod error;
pub mod feed;
pub mod github;
pub mod jenkins;
pub mod logging;
pub mod render;
pub mod repository_cache;
pub mod stats;
pub mod web_client;
pub mod webhook;

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use error::{LankyError, Result};
use github::GithubClient;
use jenkins::JenkinsClient;
use render::Pages;
use repository_cache::RepositoryCache;
use stats::RuntimeStats;

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:9393";
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
pub const DEFAULT_PAGE_SIZE: usize = 100;
const DEFAULT_CLIENT_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Deserialize, Clone)]
pub struct LankyConfig {
    #[serde(default = "default_address")]
    pub address: String,
    pub client_timeout_secs: Option<u64>,
    pub log_directory: Option<PathBuf>,
    pub jenkins: Option<JenkinsConfig>,
    pub github: Option<GithubConfig>,
    pub hubot: Option<HubotConfig>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct JenkinsConfig {
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub tray_feed: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct GithubConfig {
    #[serde(default)]
    pub token: String,
    pub hook_secret: Option<String>,
    #[serde(default)]
    pub organization: String,
    pub api_url: Option<String>,
    pub page_size: Option<usize>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct HubotConfig {
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
}

fn default_address() -> String {
    DEFAULT_BIND_ADDRESS.to_string()
}

impl Default for LankyConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            client_timeout_secs: None,
            log_directory: None,
            jenkins: None,
            github: None,
            hubot: None,
        }
    }
}

impl LankyConfig {
    /// Timeout applied to every upstream request.
    pub fn client_timeout(&self) -> Duration {
        Duration::from_secs(
            self.client_timeout_secs
                .unwrap_or(DEFAULT_CLIENT_TIMEOUT_SECS),
        )
    }

    /// Full tray feed location, or None when the jenkins section is incomplete.
    pub fn tray_feed_url(&self) -> Option<String> {
        let jenkins = self.jenkins.as_ref()?;
        if jenkins.base_url.is_empty() || jenkins.tray_feed.is_empty() {
            return None;
        }
        Some(format!("{}{}", jenkins.base_url, jenkins.tray_feed))
    }

    /// Returns the webhook secret if one is set and non-empty.
    pub fn hook_secret(&self) -> Option<&str> {
        self.github
            .as_ref()
            .and_then(|g| g.hook_secret.as_deref())
            .filter(|s| !s.is_empty())
    }
}

impl GithubConfig {
    pub fn api_url(&self) -> &str {
        self.api_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .unwrap_or(DEFAULT_GITHUB_API_URL)
            .trim_end_matches('/')
    }

    pub fn page_size(&self) -> usize {
        self.page_size.filter(|n| *n > 0).unwrap_or(DEFAULT_PAGE_SIZE)
    }
}

/// Parse configuration from TOML text
pub fn parse_config(config_str: &str) -> Result<LankyConfig> {
    Ok(toml::from_str(config_str)?)
}

/// Load and parse the configuration file
pub fn load_config(path: impl AsRef<Path>) -> Result<LankyConfig> {
    let path = path.as_ref();
    let config_str = std::fs::read_to_string(path).map_err(|e| {
        LankyError::ConfigError(format!(
            "Failed to read config file '{}': {}",
            path.display(),
            e
        ))
    })?;

    parse_config(&config_str).map_err(|e| {
        LankyError::ConfigError(format!(
            "Failed to parse config file '{}': {}",
            path.display(),
            e
        ))
    })
}

pub struct AppState {
    pub config: Arc<LankyConfig>,
    /// None when the jenkins section is incomplete; reported per request.
    pub jenkins: Option<JenkinsClient>,
    pub github: Option<GithubClient>,
    pub repositories: RepositoryCache,
    pub stats: RuntimeStats,
    pub pages: Pages,
}

impl AppState {
    /// Builds the clients the configuration allows for.
    pub fn from_config(config: LankyConfig) -> Result<Self> {
        let config = Arc::new(config);
        let jenkins = match JenkinsClient::from_config(config.clone()) {
            Ok(client) => Some(client),
            Err(LankyError::ConfigError(msg)) => {
                tracing::warn!("Feed client disabled: {}", msg);
                None
            }
            Err(e) => return Err(e),
        };
        let github = match GithubClient::from_config(config.clone()) {
            Ok(client) => Some(client),
            Err(LankyError::ConfigError(msg)) => {
                tracing::warn!("Repository listing disabled: {}", msg);
                None
            }
            Err(e) => return Err(e),
        };

        Ok(Self {
            config,
            jenkins,
            github,
            repositories: RepositoryCache::default(),
            stats: RuntimeStats::new(),
            pages: Pages::new()?,
        })
    }
}

pub type SharedState = Arc<AppState>;

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_TOML: &str = r#"
address = "0.0.0.0:9393"
client_timeout_secs = 3

[jenkins]
base_url = "http://jenkins.local:8080"
tray_feed = "/cc.xml"

[hubot]
user = "hubot"
password = "secret"

[github]
token = "t0ken"
hook_secret = "abc123"
organization = "hailocab"
"#;

    #[test]
    fn parses_valid_config() {
        let config = parse_config(VALID_TOML).unwrap();
        assert_eq!(config.address, "0.0.0.0:9393");
        assert_eq!(config.client_timeout(), Duration::from_secs(3));
        assert_eq!(config.hook_secret(), Some("abc123"));
        assert_eq!(config.hubot.as_ref().unwrap().password, "secret");
        assert_eq!(
            config.tray_feed_url().as_deref(),
            Some("http://jenkins.local:8080/cc.xml")
        );
        let github = config.github.unwrap();
        assert_eq!(github.api_url(), DEFAULT_GITHUB_API_URL);
        assert_eq!(github.page_size(), DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn rejects_malformed_config() {
        let err = parse_config("address = \":9393\"\nbase_url = ").unwrap_err();
        assert!(matches!(err, LankyError::TomlParseError(_)));
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.address, DEFAULT_BIND_ADDRESS);
        assert_eq!(config.client_timeout(), Duration::from_secs(5));
        assert!(config.tray_feed_url().is_none());
        assert!(config.hook_secret().is_none());
    }

    #[test]
    fn empty_hook_secret_counts_as_missing() {
        let config = parse_config("[github]\nhook_secret = \"\"").unwrap();
        assert!(config.hook_secret().is_none());
    }

    #[test]
    fn load_config_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(dir.path().join("absent.toml")).unwrap_err();
        assert!(err.to_string().starts_with("Configuration error"));
    }

    #[test]
    fn load_config_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lanky.toml");
        std::fs::write(&path, VALID_TOML).unwrap();
        let config = load_config(&path).unwrap();
        assert_eq!(config.github.unwrap().organization, "hailocab");
    }

    #[test]
    fn state_without_sections_disables_clients() {
        let state = AppState::from_config(LankyConfig::default()).unwrap();
        assert!(state.jenkins.is_none());
        assert!(state.github.is_none());
    }
}
