use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_MIN_CONNECTIONS: u32 = 1;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 10;

// Path relative to crates/steamsync-db/Cargo.toml; resolves to <workspace-root>/migrations/
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            min_connections: DEFAULT_MIN_CONNECTIONS,
            acquire_timeout_secs: DEFAULT_ACQUIRE_TIMEOUT_SECS,
        }
    }
}

impl PoolConfig {
    #[must_use]
    pub fn from_app_config(config: &steamsync_core::AppConfig) -> Self {
        Self {
            max_connections: config.db_max_connections,
            min_connections: config.db_min_connections,
            acquire_timeout_secs: config.db_acquire_timeout_secs,
        }
    }
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("record not found")]
    NotFound,
    #[error("sync job {id} is not running; it has already been finalized")]
    InvalidJobTransition { id: i64 },
    #[error("unknown materialized view: {0}")]
    UnknownView(String),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Connect to a Postgres pool using explicit URL and config.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the connection cannot be established.
pub async fn connect_pool(database_url: &str, config: PoolConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(database_url)
        .await
}

/// Run all pending migrations against the pool.
///
/// Returns the number of migrations that were applied.
///
/// # Errors
///
/// Returns [`sqlx::migrate::MigrateError`] if any migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<usize, sqlx::migrate::MigrateError> {
    // The _sqlx_migrations table does not exist on a fresh database; treat
    // absence as zero applied.
    let applied_before = count_applied_migrations(pool).await;
    MIGRATOR.run(pool).await?;
    let applied_after = count_applied_migrations(pool).await;

    let delta = (applied_after - applied_before).max(0);
    Ok(usize::try_from(delta).unwrap_or(0))
}

async fn count_applied_migrations(pool: &PgPool) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = true")
        .fetch_one(pool)
        .await
        .unwrap_or(0)
}

/// Send a `SELECT 1` to verify the pool has a live connection.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await?;
    Ok(())
}


pub mod apps;
pub mod histogram;
pub mod links;
pub mod metrics;
pub mod prices;
pub mod scheduling;
pub mod store;
pub mod sync_jobs;
pub mod sync_status;
pub mod views;

pub use apps::{
    mark_app_has_developer_info, set_page_creation_date, update_app_storefront,
    update_review_summary, upsert_apps, AppBase, UpsertCounts,
};
pub use histogram::{list_histogram, replace_histogram};
pub use links::{link_app_developer, link_app_publisher, upsert_developer, upsert_publisher};
pub use metrics::upsert_daily_metrics;
pub use prices::batch_update_prices;
pub use scheduling::{
    get_apps_for_price_sync, get_apps_for_sync, DueApp, DEFAULT_PRICE_FRESHNESS_HOURS,
};
pub use store::{PgStore, SyncStore};
pub use sync_jobs::{
    complete_job, create_job, fail_job, get_job, list_jobs, NewJob, SyncJobRow,
};
pub use sync_status::{
    get_sync_status, mark_sync_error, mark_sync_success, upsert_sync_statuses, SyncStatusRow,
    SyncStatusSeed,
};
pub use views::{refresh_materialized_view, MaterializedView, VIEW_REFRESH_ORDER};
