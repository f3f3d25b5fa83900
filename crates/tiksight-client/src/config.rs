//! Client configuration.

use std::time::Duration;

/// Backend API client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL
    pub base_url: String,
    /// Per-request timeout; a hung backend degrades into an ordinary
    /// per-request failure instead of stalling the caller
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl ClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("API_BASE_URL").unwrap_or(defaults.base_url),
            request_timeout: Duration::from_secs(
                std::env::var("REQUEST_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.request_timeout.as_secs()),
            ),
        }
    }

    /// Override the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}
