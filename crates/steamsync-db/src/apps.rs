//! Database operations for the `apps` base table.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;

use steamsync_core::{ReviewSummary, StorefrontDetails};

use crate::DbError;

/// Minimal app identity written before any table that references `apps`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppBase {
    pub appid: i32,
    pub name: String,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Insert/update split reported by a batch upsert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertCounts {
    pub inserted: u64,
    pub updated: u64,
}

/// Upserts base app rows in one statement.
///
/// Existing rows get the new name; `last_modified` is only overwritten when
/// the new value is present.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the statement fails.
pub async fn upsert_apps(pool: &PgPool, apps: &[AppBase]) -> Result<UpsertCounts, DbError> {
    if apps.is_empty() {
        return Ok(UpsertCounts::default());
    }

    let appids: Vec<i32> = apps.iter().map(|a| a.appid).collect();
    let names: Vec<&str> = apps.iter().map(|a| a.name.as_str()).collect();
    let modified: Vec<Option<DateTime<Utc>>> = apps.iter().map(|a| a.last_modified).collect();

    // `xmax = 0` is true only for freshly inserted tuples.
    let inserted_flags: Vec<bool> = sqlx::query_scalar(
        "INSERT INTO apps (appid, name, last_modified) \
         SELECT u.appid, u.name, u.last_modified \
         FROM UNNEST($1::INTEGER[], $2::TEXT[], $3::TIMESTAMPTZ[]) AS u(appid, name, last_modified) \
         ON CONFLICT (appid) DO UPDATE SET \
             name = EXCLUDED.name, \
             last_modified = COALESCE(EXCLUDED.last_modified, apps.last_modified), \
             updated_at = NOW() \
         RETURNING (xmax = 0)",
    )
    .bind(&appids)
    .bind(&names)
    .bind(&modified)
    .fetch_all(pool)
    .await?;

    let inserted = inserted_flags.iter().filter(|f| **f).count() as u64;
    Ok(UpsertCounts {
        inserted,
        updated: inserted_flags.len() as u64 - inserted,
    })
}

/// Writes storefront detail onto an existing app row.
///
/// Price columns keep their previous value when the storefront reports no
/// price for the app.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the app does not exist, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn update_app_storefront(
    pool: &PgPool,
    details: &StorefrontDetails,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE apps SET \
             name = $2, \
             app_type = $3, \
             is_free = $4, \
             release_date = $5, \
             release_date_raw = $6, \
             coming_soon = $7, \
             categories = $8, \
             genres = $9, \
             platform_windows = $10, \
             platform_mac = $11, \
             platform_linux = $12, \
             is_workshop_enabled = $13, \
             current_price_cents = COALESCE($14, current_price_cents), \
             current_discount_percent = COALESCE($15, current_discount_percent), \
             metacritic_score = $16, \
             controller_support = $17, \
             updated_at = NOW() \
         WHERE appid = $1",
    )
    .bind(details.appid)
    .bind(&details.name)
    .bind(&details.app_type)
    .bind(details.is_free)
    .bind(details.release_date)
    .bind(details.release_date_raw.as_deref())
    .bind(details.coming_soon)
    .bind(&details.categories)
    .bind(&details.genres)
    .bind(details.platforms.windows)
    .bind(details.platforms.mac)
    .bind(details.platforms.linux)
    .bind(details.is_workshop_enabled)
    .bind(details.price_cents)
    .bind(details.discount_percent)
    .bind(details.metacritic_score)
    .bind(details.controller_support.as_deref())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Flags an app as having at least one developer or publisher link.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn mark_app_has_developer_info(pool: &PgPool, appid: i32) -> Result<(), DbError> {
    sqlx::query("UPDATE apps SET has_developer_info = TRUE, updated_at = NOW() WHERE appid = $1")
        .bind(appid)
        .execute(pool)
        .await?;
    Ok(())
}

/// Writes lifetime review totals onto an app row.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the app does not exist, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn update_review_summary(pool: &PgPool, summary: &ReviewSummary) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE apps SET \
             total_reviews = $2, \
             positive_reviews = $3, \
             negative_reviews = $4, \
             review_score = $5, \
             review_score_desc = $6, \
             updated_at = NOW() \
         WHERE appid = $1",
    )
    .bind(summary.appid)
    .bind(summary.total_reviews)
    .bind(summary.total_positive)
    .bind(summary.total_negative)
    .bind(summary.review_score)
    .bind(&summary.review_score_desc)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Stores the scraped page-creation date. `None` keeps any earlier value.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn set_page_creation_date(
    pool: &PgPool,
    appid: i32,
    date: Option<NaiveDate>,
) -> Result<(), DbError> {
    sqlx::query(
        "UPDATE apps SET \
             page_creation_date = COALESCE($2, page_creation_date), \
             updated_at = NOW() \
         WHERE appid = $1",
    )
    .bind(appid)
    .bind(date)
    .execute(pool)
    .await?;
    Ok(())
}
