//! Shared rate-limited, retried GET path used by every source client.

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::error::SourceError;
use crate::rate_limit::RateLimiter;
use crate::retry::{with_retry, RetryEvent, RetryOptions};

/// Settings shared by all source clients.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub timeout_secs: u64,
    pub user_agent: String,
    pub retry: RetryOptions,
}

impl ClientSettings {
    #[must_use]
    pub fn from_app_config(config: &steamsync_core::AppConfig) -> Self {
        Self {
            timeout_secs: config.http_timeout_secs,
            user_agent: config.user_agent.clone(),
            retry: RetryOptions::from_app_config(config),
        }
    }
}

/// A successful response body plus the URL it was finally served from
/// (after redirects).
#[derive(Debug, Clone)]
pub struct FetchedBody {
    pub url: Url,
    pub body: String,
}

/// `reqwest` client plus retry policy. Cheap to clone.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    retry: RetryOptions,
}

impl HttpFetcher {
    /// # Errors
    ///
    /// Returns [`SourceError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(settings: &ClientSettings) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(settings.user_agent.as_str())
            .build()?;
        Ok(Self {
            client,
            retry: settings.retry,
        })
    }

    #[must_use]
    pub fn retry_options(&self) -> &RetryOptions {
        &self.retry
    }

    /// GETs `url` once a token is available from `limiter`, retrying
    /// transient failures. Every attempt, including retries, consumes a token.
    ///
    /// # Errors
    ///
    /// - [`SourceError::RateLimited`] on HTTP 429 once retries are exhausted.
    /// - [`SourceError::UnexpectedStatus`] for any other non-2xx status.
    /// - [`SourceError::Http`] on network failure.
    pub async fn get(&self, limiter: &RateLimiter, url: &Url) -> Result<FetchedBody, SourceError> {
        let source_name = limiter.name();
        let log_retry = |event: &RetryEvent<'_>| {
            tracing::warn!(
                source = source_name,
                attempt = event.attempt,
                max_retries = event.max_retries,
                delay_ms = u64::try_from(event.delay.as_millis()).unwrap_or(u64::MAX),
                error = %event.error,
                "transient upstream error, retrying after back-off"
            );
        };

        let client = &self.client;
        with_retry(&self.retry, Some(&log_retry), move || async move {
            limiter.acquire().await;

            let response = client
                .get(url.clone())
                .send()
                .await
                .map_err(|e| scrub_secret_url(e, url))?;
            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                let retry_after_secs = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.trim().parse::<u64>().ok());
                return Err(SourceError::RateLimited {
                    source_name: source_name.to_owned(),
                    retry_after_secs,
                });
            }

            if !status.is_success() {
                return Err(SourceError::UnexpectedStatus {
                    status: status.as_u16(),
                    url: redact_url(url),
                });
            }

            let final_url = response.url().clone();
            let body = response.text().await?;
            Ok(FetchedBody {
                url: final_url,
                body,
            })
        })
        .await
    }
}

/// Deserializes a JSON response body, tagging failures with `context`.
///
/// # Errors
///
/// Returns [`SourceError::Deserialize`] if `body` does not match `T`.
pub fn decode_json<T: DeserializeOwned>(body: &str, context: &str) -> Result<T, SourceError> {
    serde_json::from_str(body).map_err(|source| SourceError::Deserialize {
        context: context.to_owned(),
        source,
    })
}

/// Query parameters that must never reach logs or stored error messages.
const SECRET_PARAMS: [&str; 1] = ["key"];

fn has_secret(url: &Url) -> bool {
    url.query_pairs()
        .any(|(k, _)| SECRET_PARAMS.contains(&k.as_ref()))
}

/// Renders `url` with secret query values replaced.
fn redact_url(url: &Url) -> String {
    if !has_secret(url) {
        return url.to_string();
    }
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let value = if SECRET_PARAMS.contains(&k.as_ref()) {
                "REDACTED".to_owned()
            } else {
                v.into_owned()
            };
            (k.into_owned(), value)
        })
        .collect();
    let mut redacted = url.clone();
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted.to_string()
}

/// `reqwest` embeds the request URL in its error message; drop it when the
/// URL carries an API key.
fn scrub_secret_url(err: reqwest::Error, url: &Url) -> SourceError {
    if has_secret(url) {
        SourceError::Http(err.without_url())
    } else {
        SourceError::Http(err)
    }
}

/// Parses a base URL, normalising it to end with exactly one slash so that
/// `Url::join` appends rather than replaces the last path segment.
///
/// # Errors
///
/// Returns [`SourceError::InvalidBaseUrl`] if `base_url` does not parse.
pub fn parse_base_url(base_url: &str) -> Result<Url, SourceError> {
    let normalised = format!("{}/", base_url.trim_end_matches('/'));
    Url::parse(&normalised).map_err(|e| SourceError::InvalidBaseUrl {
        base_url: base_url.to_owned(),
        reason: e.to_string(),
    })
}

/// Joins a relative path onto a base produced by [`parse_base_url`].
///
/// # Errors
///
/// Returns [`SourceError::InvalidBaseUrl`] if the join fails.
pub fn join_path(base: &Url, path: &str) -> Result<Url, SourceError> {
    base.join(path.trim_start_matches('/'))
        .map_err(|e| SourceError::InvalidBaseUrl {
            base_url: base.to_string(),
            reason: e.to_string(),
        })
}
