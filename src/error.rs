use std::io;
use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Custom error type for lanky operations
#[derive(Debug, thiserror::Error)]
pub enum LankyError {
    /// Upstream unreachable, timed out or answered with a non-success status.
    #[error("{message} with a timeout of {timeout:?} fetching {url}")]
    Fetch {
        url: String,
        timeout: Duration,
        message: String,
    },

    #[error("{message} from {url}")]
    Parse { url: String, message: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Method not allowed.")]
    MethodNotAllowed,

    #[error("Unauthorized.")]
    Unauthorized,

    // Encoding and HMAC mismatches share one message.
    #[error("Invalid signature.")]
    InvalidSignature,

    #[error("Unable to read message body.")]
    UnreadableBody,

    #[error("Invalid event type specified.")]
    UnsupportedEvent(String),

    #[error("Not implemented yet")]
    NotImplemented,

    #[error("Unexpected response code {0}.")]
    UnexpectedStatus(u16),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),
}

impl LankyError {
    /// HTTP status a handler answers with when this error reaches the client.
    pub fn status_code(&self) -> StatusCode {
        match self {
            LankyError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            LankyError::Unauthorized => StatusCode::UNAUTHORIZED,
            LankyError::InvalidSignature | LankyError::UnsupportedEvent(_) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for LankyError {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}

/// Helper type for Results that use LankyError
pub type Result<T> = std::result::Result<T, LankyError>;
