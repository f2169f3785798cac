//! Per-source token-bucket rate limiting.
//!
//! Every upstream endpoint family gets its own [`RateLimiter`], created once at
//! process start and shared by every call site that hits that family. The
//! bucket holds up to `burst` tokens and refills continuously at
//! `requests_per_second`.
//!
//! [`RateLimiter::acquire`] serializes callers through a fair (FIFO) async
//! mutex, so only one caller at a time observes and decrements the bucket.
//! Without that, two callers racing on a nearly empty bucket could both see a
//! token and burst past the upstream budget.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

/// Requests-per-second budget and burst size for one endpoint family.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimitConfig {
    pub requests_per_second: f64,
    pub burst: u32,
}

impl RateLimitConfig {
    #[must_use]
    pub const fn new(requests_per_second: f64, burst: u32) -> Self {
        Self {
            requests_per_second,
            burst,
        }
    }
}

/// Fixed per-source budgets for the Steam-family endpoints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimits {
    pub catalog: RateLimitConfig,
    pub steamspy_single: RateLimitConfig,
    pub steamspy_bulk: RateLimitConfig,
    pub storefront: RateLimitConfig,
    pub review_summary: RateLimitConfig,
    pub review_histogram: RateLimitConfig,
    pub community: RateLimitConfig,
}

impl RateLimits {
    /// Budgets that stay inside the documented or observed upstream limits.
    ///
    /// `SteamSpy` allows one `appdetails` call per second and one `all` page
    /// per minute. The storefront tolerates roughly 200 calls per five
    /// minutes before answering 429.
    #[must_use]
    pub const fn steam_defaults() -> Self {
        Self {
            catalog: RateLimitConfig::new(1.0, 5),
            steamspy_single: RateLimitConfig::new(1.0, 1),
            steamspy_bulk: RateLimitConfig::new(1.0 / 60.0, 1),
            storefront: RateLimitConfig::new(0.5, 5),
            review_summary: RateLimitConfig::new(1.0, 5),
            review_histogram: RateLimitConfig::new(1.0, 5),
            community: RateLimitConfig::new(0.5, 2),
        }
    }
}

impl Default for RateLimits {
    fn default() -> Self {
        Self::steam_defaults()
    }
}

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

impl Bucket {
    fn refill(&mut self, max_tokens: f64, refill_per_sec: f64, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * refill_per_sec).min(max_tokens);
        self.last_refill = now;
    }
}

/// Token bucket with FIFO-fair blocking acquisition.
#[derive(Debug)]
pub struct RateLimiter {
    name: &'static str,
    max_tokens: f64,
    refill_per_sec: f64,
    bucket: Mutex<Bucket>,
    /// Held by the caller currently allowed to take a token. `tokio::sync::Mutex`
    /// queues waiters in arrival order.
    turn: tokio::sync::Mutex<()>,
}

impl RateLimiter {
    /// Creates a full bucket holding `burst` tokens that refills at
    /// `requests_per_second`.
    ///
    /// A non-positive or non-finite rate falls back to one request per second;
    /// a zero burst is raised to one.
    #[must_use]
    pub fn new(name: &'static str, requests_per_second: f64, burst: u32) -> Self {
        let refill_per_sec = if requests_per_second.is_finite() && requests_per_second > 0.0 {
            requests_per_second
        } else {
            1.0
        };
        let max_tokens = f64::from(burst.max(1));

        Self {
            name,
            max_tokens,
            refill_per_sec,
            bucket: Mutex::new(Bucket {
                tokens: max_tokens,
                last_refill: Instant::now(),
            }),
            turn: tokio::sync::Mutex::new(()),
        }
    }

    #[must_use]
    pub fn from_config(name: &'static str, config: RateLimitConfig) -> Self {
        Self::new(name, config.requests_per_second, config.burst)
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Waits until a token is available, then consumes it.
    ///
    /// Never fails; only delays. Concurrent callers are admitted strictly in
    /// the order they arrived.
    pub async fn acquire(&self) {
        let _turn = self.turn.lock().await;

        loop {
            let wait = {
                let mut bucket = self.lock_bucket();
                bucket.refill(self.max_tokens, self.refill_per_sec, Instant::now());
                if bucket.tokens >= 1.0 {
                    bucket.tokens -= 1.0;
                    return;
                }
                self.deficit_wait(bucket.tokens)
            };

            tracing::trace!(
                limiter = self.name,
                wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
                "waiting for rate-limit token"
            );
            tokio::time::sleep(wait).await;
        }
    }

    /// Consumes a token if one is available right now.
    ///
    /// Returns `false` without waiting when the bucket is empty or another
    /// caller is already queued in [`Self::acquire`].
    pub fn try_acquire(&self) -> bool {
        let Ok(_turn) = self.turn.try_lock() else {
            return false;
        };

        let mut bucket = self.lock_bucket();
        bucket.refill(self.max_tokens, self.refill_per_sec, Instant::now());
        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Tokens currently in the bucket (fractional while refilling).
    #[must_use]
    pub fn available_tokens(&self) -> f64 {
        let mut bucket = self.lock_bucket();
        bucket.refill(self.max_tokens, self.refill_per_sec, Instant::now());
        bucket.tokens
    }

    /// Milliseconds until the next token would be available; `0` if one is
    /// available now.
    #[must_use]
    pub fn wait_time_ms(&self) -> u64 {
        let mut bucket = self.lock_bucket();
        bucket.refill(self.max_tokens, self.refill_per_sec, Instant::now());
        if bucket.tokens >= 1.0 {
            0
        } else {
            u64::try_from(self.deficit_wait(bucket.tokens).as_millis()).unwrap_or(u64::MAX)
        }
    }

    /// Time needed to refill from `tokens` to one whole token, rounded up to
    /// the next millisecond so the caller never wakes just short of it.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn deficit_wait(&self, tokens: f64) -> Duration {
        let secs = (1.0 - tokens).max(0.0) / self.refill_per_sec;
        let millis = (secs * 1000.0).ceil().max(1.0) as u64;
        Duration::from_millis(millis)
    }

    fn lock_bucket(&self) -> MutexGuard<'_, Bucket> {
        self.bucket.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
