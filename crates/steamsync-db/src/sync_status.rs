//! Per-app sync bookkeeping in `sync_status`.
//!
//! Every worker records the outcome of each per-app attempt here: success
//! stamps the source's `last_*` column and clears the error streak, failure
//! bumps `consecutive_errors` and stores the error detail.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use steamsync_core::SyncSource;

use crate::DbError;

/// A row from the `sync_status` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SyncStatusRow {
    pub appid: i32,
    pub last_steamspy_sync: Option<DateTime<Utc>>,
    pub last_storefront_sync: Option<DateTime<Utc>>,
    pub last_reviews_sync: Option<DateTime<Utc>>,
    pub last_histogram_sync: Option<DateTime<Utc>>,
    pub last_page_creation_scrape: Option<DateTime<Utc>>,
    pub last_price_sync: Option<DateTime<Utc>>,
    pub consecutive_errors: i32,
    pub last_error_source: Option<String>,
    pub last_error_message: Option<String>,
    pub last_error_at: Option<DateTime<Utc>>,
    pub is_syncable: bool,
    pub priority_score: i32,
}

impl SyncStatusRow {
    /// Last successful sync time for `source`.
    #[must_use]
    pub fn last_synced(&self, source: SyncSource) -> Option<DateTime<Utc>> {
        match source {
            SyncSource::Steamspy => self.last_steamspy_sync,
            SyncSource::Storefront => self.last_storefront_sync,
            SyncSource::Reviews => self.last_reviews_sync,
            SyncSource::Histogram => self.last_histogram_sync,
            SyncSource::PageCreation => self.last_page_creation_scrape,
            SyncSource::Price => self.last_price_sync,
        }
    }
}

/// Seed for a `sync_status` upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncStatusSeed {
    pub appid: i32,
    pub priority_score: i32,
}

/// Column holding the last successful sync time for `source`.
pub(crate) fn sync_column(source: SyncSource) -> &'static str {
    match source {
        SyncSource::Steamspy => "last_steamspy_sync",
        SyncSource::Storefront => "last_storefront_sync",
        SyncSource::Reviews => "last_reviews_sync",
        SyncSource::Histogram => "last_histogram_sync",
        SyncSource::PageCreation => "last_page_creation_scrape",
        SyncSource::Price => "last_price_sync",
    }
}

/// Fetches the sync state for one app, or `None` if it has none yet.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_sync_status(pool: &PgPool, appid: i32) -> Result<Option<SyncStatusRow>, DbError> {
    let row = sqlx::query_as::<_, SyncStatusRow>(
        "SELECT appid, last_steamspy_sync, last_storefront_sync, last_reviews_sync, \
                last_histogram_sync, last_page_creation_scrape, last_price_sync, \
                consecutive_errors, last_error_source, last_error_message, last_error_at, \
                is_syncable, priority_score \
         FROM sync_status WHERE appid = $1",
    )
    .bind(appid)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Upserts sync state for many apps in one statement.
///
/// With `synced = None` (new apps from the catalog), missing rows are created
/// and existing rows are left untouched. With `Some(source)`, the source's
/// sync time is stamped, the priority score refreshed and the error streak
/// cleared. Returns the number of rows written.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the statement fails.
pub async fn upsert_sync_statuses(
    pool: &PgPool,
    seeds: &[SyncStatusSeed],
    synced: Option<SyncSource>,
) -> Result<u64, DbError> {
    if seeds.is_empty() {
        return Ok(0);
    }
    let appids: Vec<i32> = seeds.iter().map(|s| s.appid).collect();
    let scores: Vec<i32> = seeds.iter().map(|s| s.priority_score).collect();

    let sql = match synced {
        None => "INSERT INTO sync_status (appid, priority_score) \
                 SELECT u.appid, u.priority_score \
                 FROM UNNEST($1::INTEGER[], $2::INTEGER[]) AS u(appid, priority_score) \
                 ON CONFLICT (appid) DO NOTHING"
            .to_owned(),
        Some(source) => {
            let column = sync_column(source);
            format!(
                "INSERT INTO sync_status (appid, priority_score, {column}) \
                 SELECT u.appid, u.priority_score, NOW() \
                 FROM UNNEST($1::INTEGER[], $2::INTEGER[]) AS u(appid, priority_score) \
                 ON CONFLICT (appid) DO UPDATE SET \
                     priority_score = EXCLUDED.priority_score, \
                     {column} = NOW(), \
                     consecutive_errors = 0, \
                     last_error_source = NULL, \
                     last_error_message = NULL, \
                     last_error_at = NULL, \
                     updated_at = NOW()"
            )
        }
    };

    let result = sqlx::query(&sql)
        .bind(&appids)
        .bind(&scores)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Records a successful per-app sync for `source`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the statement fails.
pub async fn mark_sync_success(pool: &PgPool, appid: i32, source: SyncSource) -> Result<(), DbError> {
    let column = sync_column(source);
    sqlx::query(&format!(
        "INSERT INTO sync_status (appid, {column}) VALUES ($1, NOW()) \
         ON CONFLICT (appid) DO UPDATE SET \
             {column} = NOW(), \
             consecutive_errors = 0, \
             last_error_source = NULL, \
             last_error_message = NULL, \
             last_error_at = NULL, \
             updated_at = NOW()"
    ))
    .bind(appid)
    .execute(pool)
    .await?;

    Ok(())
}

/// Records a failed per-app sync for `source`. The source's sync time is not
/// touched, so the app stays due.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the statement fails.
pub async fn mark_sync_error(
    pool: &PgPool,
    appid: i32,
    source: SyncSource,
    message: &str,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO sync_status (appid, consecutive_errors, last_error_source, \
                                  last_error_message, last_error_at) \
         VALUES ($1, 1, $2, $3, NOW()) \
         ON CONFLICT (appid) DO UPDATE SET \
             consecutive_errors = sync_status.consecutive_errors + 1, \
             last_error_source = EXCLUDED.last_error_source, \
             last_error_message = EXCLUDED.last_error_message, \
             last_error_at = NOW(), \
             updated_at = NOW()",
    )
    .bind(appid)
    .bind(source.as_str())
    .bind(message)
    .execute(pool)
    .await?;

    Ok(())
}
