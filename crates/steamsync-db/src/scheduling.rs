//! Due-app selection through the `get_apps_for_sync` and
//! `get_apps_for_price_sync` SQL functions.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use steamsync_core::SyncSource;

use crate::DbError;

/// Default staleness window for price refreshes.
pub const DEFAULT_PRICE_FRESHNESS_HOURS: i32 = 24;

/// An app selected for sync, with the state that made it due.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct DueApp {
    pub appid: i32,
    pub priority_score: i32,
    /// `None` when the app has never been synced for this source.
    pub last_synced_at: Option<DateTime<Utc>>,
}

/// Apps due for `source`, highest priority first, at most `limit`.
///
/// An app whose last error came from `source` is skipped until its backoff
/// (1 hour, doubling per consecutive error, capped at 64 hours) has passed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the call fails.
pub async fn get_apps_for_sync(
    pool: &PgPool,
    source: SyncSource,
    limit: i32,
) -> Result<Vec<DueApp>, DbError> {
    let rows = sqlx::query_as::<_, DueApp>(
        "SELECT appid, priority_score, last_synced_at FROM get_apps_for_sync($1, $2)",
    )
    .bind(source.as_str())
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Apps never price-synced or staler than `freshness_hours`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the call fails.
pub async fn get_apps_for_price_sync(
    pool: &PgPool,
    limit: i32,
    freshness_hours: i32,
) -> Result<Vec<DueApp>, DbError> {
    let rows = sqlx::query_as::<_, DueApp>(
        "SELECT appid, priority_score, last_synced_at FROM get_apps_for_price_sync($1, $2)",
    )
    .bind(limit)
    .bind(freshness_hours)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
