//! HTTP collaborator used by the feed and repository clients

use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::{HeaderMap, StatusCode};
use std::time::Duration;
use tracing::debug;

use crate::error::{LankyError, Result};

/// A fully buffered upstream response.
#[derive(Debug, Clone)]
pub struct WebResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl WebResponse {
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Value of a header as text, empty when absent or not valid UTF-8.
    pub fn header(&self, name: &str) -> &str {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
    }
}

/// Trait abstracting outbound HTTP for testability.
#[async_trait]
pub trait WebClient: Send + Sync {
    async fn get(&self, url: &str) -> Result<WebResponse>;

    async fn post(&self, url: &str, content_type: &str, body: Bytes) -> Result<WebResponse>;
}

/// reqwest-backed client with a fixed per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
    timeout: Duration,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        Self::with_default_headers(timeout, HeaderMap::new())
    }

    /// Client that sends `headers` with every request.
    pub fn with_default_headers(timeout: Duration, headers: HeaderMap) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| LankyError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { inner, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn fetch_error(&self, url: &str, message: impl Into<String>) -> LankyError {
        LankyError::Fetch {
            url: url.to_string(),
            timeout: self.timeout,
            message: message.into(),
        }
    }

    async fn finish(&self, url: &str, response: reqwest::Response) -> Result<WebResponse> {
        let status = response.status();
        let headers = response.headers().clone();
        // the body is consumed (and the connection released) before any status check
        let body = response
            .bytes()
            .await
            .map_err(|e| self.fetch_error(url, e.to_string()))?;

        debug!("{} answered {} with {} bytes", url, status, body.len());
        if !status.is_success() {
            return Err(self.fetch_error(url, format!("unexpected status {}", status)));
        }

        Ok(WebResponse {
            status,
            headers,
            body,
        })
    }
}

#[async_trait]
impl WebClient for HttpClient {
    async fn get(&self, url: &str) -> Result<WebResponse> {
        let response = self
            .inner
            .get(url)
            .send()
            .await
            .map_err(|e| self.fetch_error(url, e.to_string()))?;
        self.finish(url, response).await
    }

    async fn post(&self, url: &str, content_type: &str, body: Bytes) -> Result<WebResponse> {
        let response = self
            .inner
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await
            .map_err(|e| self.fetch_error(url, e.to_string()))?;
        self.finish(url, response).await
    }
}
