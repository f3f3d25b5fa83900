//! Client error types.

use thiserror::Error;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend error: {0}")]
    Api(String),

    #[error("Unexpected status {status}: {body}")]
    UnexpectedStatus {
        status: reqwest::StatusCode,
        body: String,
    },
}

impl ClientError {
    pub fn api(msg: impl Into<String>) -> Self {
        Self::Api(msg.into())
    }

    /// True when the underlying transport timed out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ClientError::Http(e) if e.is_timeout())
    }
}
