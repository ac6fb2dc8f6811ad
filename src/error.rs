// Error taxonomy for one poll cycle.
// Per-item failures (one blobstore's capacity) never surface here; they are logged and skipped.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollectError {
    /// A required connection parameter (url, username, password) is absent.
    #[error("configuration missing: {0} must be set")]
    ConfigurationMissing(&'static str),

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} returned status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("response from {url} is not valid JSON: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid Nexus base url: {0}")]
    InvalidUrl(String),

    #[error("http client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("publishing metrics: {0}")]
    Publish(#[from] prometheus::Error),
}

impl CollectError {
    /// Connection, timeout, and non-2xx failures.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Status { .. })
    }
}
