use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("rate limited by {source_name}{}", retry_after_suffix(.retry_after_secs))]
    RateLimited {
        source_name: String,
        retry_after_secs: Option<u64>,
    },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("invalid base URL \"{base_url}\": {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },

    #[error("{source_name} requires an API key but none is configured")]
    MissingApiKey { source_name: &'static str },
}

impl SourceError {
    /// Explicit back-off requested by the upstream, if any.
    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            SourceError::RateLimited {
                retry_after_secs: Some(secs),
                ..
            } => Some(Duration::from_secs(*secs)),
            _ => None,
        }
    }

    /// HTTP status carried by this error, whether it came from our own status
    /// check or from `reqwest`.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            SourceError::UnexpectedStatus { status, .. } => Some(*status),
            SourceError::RateLimited { .. } => Some(429),
            SourceError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[allow(clippy::ref_option)]
fn retry_after_suffix(retry_after_secs: &Option<u64>) -> String {
    retry_after_secs.map_or_else(String::new, |secs| format!(" (retry after {secs}s)"))
}
