use thiserror::Error;

use crate::parser::ParseError;

/// Errors raised while talking to a switch.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid switch URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(reqwest::Error),

    #[error("HTTP transport error: {0}")]
    Transport(reqwest::Error),

    #[error("Request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Switch answered with HTTP {status}")]
    Status { status: u16 },

    #[error("Status page parse error: {0}")]
    Parse(#[from] ParseError),
}

impl Error {
    /// Classify a `reqwest` failure, keeping timeouts and HTTP status
    /// rejections apart from other transport errors.
    pub(crate) fn from_request(err: reqwest::Error, timeout_ms: u64) -> Self {
        if err.is_timeout() {
            Self::Timeout { timeout_ms }
        } else if let Some(status) = err.status() {
            Self::Status {
                status: status.as_u16(),
            }
        } else {
            Self::Transport(err)
        }
    }
}

/// Result type alias using the switch [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
