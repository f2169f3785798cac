//! Retry with exponential back-off and jitter for upstream calls.
//!
//! [`with_retry`] wraps any fallible async operation. On failure it asks the
//! configured predicate whether the error is transient; if so and attempts
//! remain, it sleeps and tries again. Exhausting retries returns the last
//! error unchanged. The executor itself never logs: callers pass a retry
//! observer when they want a log line or a metric per attempt.

use std::error::Error as _;
use std::future::Future;
use std::io;
use std::time::Duration;

use crate::error::SourceError;

/// HTTP statuses that indicate a transient upstream condition.
pub const RETRYABLE_STATUSES: [u16; 6] = [408, 429, 500, 502, 503, 504];

/// Jitter applied to computed back-off, as a fraction of the delay.
const JITTER_FRACTION: f64 = 0.1;

/// Retry policy for [`with_retry`].
#[derive(Debug, Clone, Copy)]
pub struct RetryOptions {
    /// Additional attempts after the first failure. `0` disables retries.
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
    pub should_retry: fn(&SourceError) -> bool,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            should_retry: is_retryable,
        }
    }
}

impl RetryOptions {
    /// No delay between attempts. Used by tests.
    #[must_use]
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn from_app_config(config: &steamsync_core::AppConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_delay: Duration::from_millis(config.retry_initial_delay_ms),
            max_delay: Duration::from_millis(config.retry_max_delay_ms),
            backoff_multiplier: config.retry_backoff_multiplier,
            should_retry: is_retryable,
        }
    }

    /// Delay before retry number `attempt` (zero-based).
    ///
    /// An explicit retry-after hint overrides the computed back-off. Either
    /// way the result never exceeds `max_delay` before jitter is applied.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss,
        clippy::cast_possible_wrap
    )]
    pub fn delay_for(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        if let Some(hint) = retry_after {
            return hint.min(self.max_delay);
        }

        let max_ms = self.max_delay.as_millis() as f64;
        let computed_ms = self.initial_delay.as_millis() as f64
            * self.backoff_multiplier.powi(attempt.min(64) as i32);
        let capped_ms = computed_ms.min(max_ms);
        let jitter = 1.0 + JITTER_FRACTION * (rand::random::<f64>() * 2.0 - 1.0);
        Duration::from_millis((capped_ms * jitter).max(0.0) as u64)
    }
}

/// Details handed to the retry observer before each back-off sleep.
#[derive(Debug)]
pub struct RetryEvent<'a> {
    /// One-based retry number.
    pub attempt: u32,
    pub max_retries: u32,
    pub delay: Duration,
    pub error: &'a SourceError,
}

/// Network-level failure categories that are always worth retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkFailure {
    ConnectionReset,
    DnsFailure,
    ConnectionRefused,
    Timeout,
    BrokenPipe,
}

/// Classifies a transport error into one of the retryable network categories.
#[must_use]
pub fn network_failure(err: &reqwest::Error) -> Option<NetworkFailure> {
    if err.is_timeout() {
        return Some(NetworkFailure::Timeout);
    }

    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            match io_err.kind() {
                io::ErrorKind::ConnectionReset | io::ErrorKind::ConnectionAborted => {
                    return Some(NetworkFailure::ConnectionReset);
                }
                io::ErrorKind::ConnectionRefused => return Some(NetworkFailure::ConnectionRefused),
                io::ErrorKind::BrokenPipe => return Some(NetworkFailure::BrokenPipe),
                io::ErrorKind::TimedOut => return Some(NetworkFailure::Timeout),
                _ => {}
            }
        }
        if cause.to_string().contains("dns error") {
            return Some(NetworkFailure::DnsFailure);
        }
        source = cause.source();
    }

    // hyper reports refused and unresolvable hosts as connect errors even when
    // the io cause is not exposed.
    if err.is_connect() {
        return Some(NetworkFailure::ConnectionRefused);
    }
    None
}

/// Default retryability predicate.
///
/// Retryable: rate-limit signals, HTTP 408/429/500/502/503/504, and the
/// [`NetworkFailure`] categories. Everything else (4xx, parse failures,
/// configuration problems) is returned immediately.
#[must_use]
pub fn is_retryable(err: &SourceError) -> bool {
    match err {
        SourceError::RateLimited { .. } => true,
        SourceError::UnexpectedStatus { status, .. } => RETRYABLE_STATUSES.contains(status),
        SourceError::Http(e) => {
            network_failure(e).is_some()
                || e.status()
                    .is_some_and(|s| RETRYABLE_STATUSES.contains(&s.as_u16()))
        }
        SourceError::Deserialize { .. }
        | SourceError::InvalidBaseUrl { .. }
        | SourceError::MissingApiKey { .. } => false,
    }
}

/// Runs `operation`, retrying transient failures per `options`.
///
/// `on_retry` is invoked once per retry, before the back-off sleep.
///
/// # Errors
///
/// Returns the last error from `operation` once it is non-retryable or
/// `options.max_retries` retries have been spent.
pub async fn with_retry<T, F, Fut>(
    options: &RetryOptions,
    on_retry: Option<&(dyn Fn(&RetryEvent<'_>) + Send + Sync)>,
    mut operation: F,
) -> Result<T, SourceError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SourceError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt >= options.max_retries || !(options.should_retry)(&err) {
                    return Err(err);
                }
                let delay = options.delay_for(attempt, err.retry_after());
                attempt += 1;
                if let Some(observer) = on_retry {
                    observer(&RetryEvent {
                        attempt,
                        max_retries: options.max_retries,
                        delay,
                        error: &err,
                    });
                }
                tokio::time::sleep(delay).await;
            }
        }
    }
}
