//! The persistence seam the sync workers run against.
//!
//! [`PgStore`] forwards to the free functions in this crate. Worker tests
//! substitute an in-memory implementation.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;

use steamsync_core::{
    AppStats, HistogramEntry, JobCompletion, PriceUpdate, ReviewSummary, StorefrontDetails,
    SyncSource,
};

use crate::{
    apps, histogram, links, metrics, prices, scheduling, sync_jobs, sync_status, views, AppBase,
    DbError, DueApp, NewJob, SyncStatusRow, SyncStatusSeed, UpsertCounts,
};

#[async_trait]
pub trait SyncStore: Send + Sync {
    /// Starts a job and returns its id.
    async fn create_job(&self, job: &NewJob) -> Result<i64, DbError>;
    async fn complete_job(&self, id: i64, completion: &JobCompletion) -> Result<(), DbError>;
    async fn fail_job(&self, id: i64, error_message: &str) -> Result<(), DbError>;

    async fn get_apps_for_sync(&self, source: SyncSource, limit: i32)
        -> Result<Vec<DueApp>, DbError>;
    async fn get_apps_for_price_sync(
        &self,
        limit: i32,
        freshness_hours: i32,
    ) -> Result<Vec<DueApp>, DbError>;
    async fn get_sync_status(&self, appid: i32) -> Result<Option<SyncStatusRow>, DbError>;

    async fn upsert_apps(&self, apps: &[AppBase]) -> Result<UpsertCounts, DbError>;
    async fn upsert_sync_statuses(
        &self,
        seeds: &[SyncStatusSeed],
        synced: Option<SyncSource>,
    ) -> Result<u64, DbError>;
    async fn upsert_daily_metrics(
        &self,
        metric_date: NaiveDate,
        stats: &[AppStats],
    ) -> Result<u64, DbError>;
    async fn update_app_storefront(&self, details: &StorefrontDetails) -> Result<(), DbError>;

    async fn upsert_developer(&self, name: &str) -> Result<i64, DbError>;
    async fn upsert_publisher(&self, name: &str) -> Result<i64, DbError>;
    async fn link_app_developer(&self, appid: i32, developer_id: i64) -> Result<(), DbError>;
    async fn link_app_publisher(&self, appid: i32, publisher_id: i64) -> Result<(), DbError>;
    async fn mark_app_has_developer_info(&self, appid: i32) -> Result<(), DbError>;

    async fn batch_update_prices(&self, prices: &[PriceUpdate]) -> Result<u64, DbError>;
    async fn replace_histogram(
        &self,
        appid: i32,
        entries: &[HistogramEntry],
    ) -> Result<u64, DbError>;
    async fn update_review_summary(&self, summary: &ReviewSummary) -> Result<(), DbError>;
    async fn set_page_creation_date(
        &self,
        appid: i32,
        date: Option<NaiveDate>,
    ) -> Result<(), DbError>;

    async fn mark_sync_success(&self, appid: i32, source: SyncSource) -> Result<(), DbError>;
    async fn mark_sync_error(
        &self,
        appid: i32,
        source: SyncSource,
        message: &str,
    ) -> Result<(), DbError>;

    async fn refresh_materialized_view(&self, name: &str) -> Result<(), DbError>;
}

/// Postgres-backed [`SyncStore`].
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SyncStore for PgStore {
    async fn create_job(&self, job: &NewJob) -> Result<i64, DbError> {
        Ok(sync_jobs::create_job(&self.pool, job).await?.id)
    }

    async fn complete_job(&self, id: i64, completion: &JobCompletion) -> Result<(), DbError> {
        sync_jobs::complete_job(&self.pool, id, completion).await
    }

    async fn fail_job(&self, id: i64, error_message: &str) -> Result<(), DbError> {
        sync_jobs::fail_job(&self.pool, id, error_message).await
    }

    async fn get_apps_for_sync(
        &self,
        source: SyncSource,
        limit: i32,
    ) -> Result<Vec<DueApp>, DbError> {
        scheduling::get_apps_for_sync(&self.pool, source, limit).await
    }

    async fn get_apps_for_price_sync(
        &self,
        limit: i32,
        freshness_hours: i32,
    ) -> Result<Vec<DueApp>, DbError> {
        scheduling::get_apps_for_price_sync(&self.pool, limit, freshness_hours).await
    }

    async fn get_sync_status(&self, appid: i32) -> Result<Option<SyncStatusRow>, DbError> {
        sync_status::get_sync_status(&self.pool, appid).await
    }

    async fn upsert_apps(&self, apps: &[AppBase]) -> Result<UpsertCounts, DbError> {
        apps::upsert_apps(&self.pool, apps).await
    }

    async fn upsert_sync_statuses(
        &self,
        seeds: &[SyncStatusSeed],
        synced: Option<SyncSource>,
    ) -> Result<u64, DbError> {
        sync_status::upsert_sync_statuses(&self.pool, seeds, synced).await
    }

    async fn upsert_daily_metrics(
        &self,
        metric_date: NaiveDate,
        stats: &[AppStats],
    ) -> Result<u64, DbError> {
        metrics::upsert_daily_metrics(&self.pool, metric_date, stats).await
    }

    async fn update_app_storefront(&self, details: &StorefrontDetails) -> Result<(), DbError> {
        apps::update_app_storefront(&self.pool, details).await
    }

    async fn upsert_developer(&self, name: &str) -> Result<i64, DbError> {
        links::upsert_developer(&self.pool, name).await
    }

    async fn upsert_publisher(&self, name: &str) -> Result<i64, DbError> {
        links::upsert_publisher(&self.pool, name).await
    }

    async fn link_app_developer(&self, appid: i32, developer_id: i64) -> Result<(), DbError> {
        links::link_app_developer(&self.pool, appid, developer_id).await
    }

    async fn link_app_publisher(&self, appid: i32, publisher_id: i64) -> Result<(), DbError> {
        links::link_app_publisher(&self.pool, appid, publisher_id).await
    }

    async fn mark_app_has_developer_info(&self, appid: i32) -> Result<(), DbError> {
        apps::mark_app_has_developer_info(&self.pool, appid).await
    }

    async fn batch_update_prices(&self, prices: &[PriceUpdate]) -> Result<u64, DbError> {
        prices::batch_update_prices(&self.pool, prices).await
    }

    async fn replace_histogram(
        &self,
        appid: i32,
        entries: &[HistogramEntry],
    ) -> Result<u64, DbError> {
        histogram::replace_histogram(&self.pool, appid, entries).await
    }

    async fn update_review_summary(&self, summary: &ReviewSummary) -> Result<(), DbError> {
        apps::update_review_summary(&self.pool, summary).await
    }

    async fn set_page_creation_date(
        &self,
        appid: i32,
        date: Option<NaiveDate>,
    ) -> Result<(), DbError> {
        apps::set_page_creation_date(&self.pool, appid, date).await
    }

    async fn mark_sync_success(&self, appid: i32, source: SyncSource) -> Result<(), DbError> {
        sync_status::mark_sync_success(&self.pool, appid, source).await
    }

    async fn mark_sync_error(
        &self,
        appid: i32,
        source: SyncSource,
        message: &str,
    ) -> Result<(), DbError> {
        sync_status::mark_sync_error(&self.pool, appid, source, message).await
    }

    async fn refresh_materialized_view(&self, name: &str) -> Result<(), DbError> {
        views::refresh_materialized_view(&self.pool, name).await
    }
}
