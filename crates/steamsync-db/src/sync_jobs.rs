//! Database operations for the `sync_jobs` audit log.
//!
//! A job row is inserted `running` when a worker starts and finalized exactly
//! once. Finalizing a row that is no longer `running` is rejected with
//! [`DbError::InvalidJobTransition`].

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use steamsync_core::{JobCompletion, JobType};

use crate::DbError;

/// A row from the `sync_jobs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SyncJobRow {
    pub id: i64,
    pub public_id: Uuid,
    pub job_type: String,
    pub status: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub items_processed: i32,
    pub items_succeeded: i32,
    pub items_failed: i32,
    pub items_created: i32,
    pub items_updated: i32,
    pub batch_size: Option<i32>,
    pub github_run_id: Option<String>,
    pub error_message: Option<String>,
}

/// Parameters recorded when a job starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewJob {
    pub job_type: JobType,
    pub batch_size: Option<i32>,
    /// External orchestration run this job belongs to (e.g. a CI run id).
    pub github_run_id: Option<String>,
}

const JOB_COLUMNS: &str = "id, public_id, job_type, status, started_at, completed_at, \
     items_processed, items_succeeded, items_failed, items_created, items_updated, \
     batch_size, github_run_id, error_message";

/// Inserts a new job in `running` status and returns the full row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_job(pool: &PgPool, job: &NewJob) -> Result<SyncJobRow, DbError> {
    let row = sqlx::query_as::<_, SyncJobRow>(&format!(
        "INSERT INTO sync_jobs (public_id, job_type, status, batch_size, github_run_id) \
         VALUES ($1, $2, 'running', $3, $4) \
         RETURNING {JOB_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(job.job_type.as_str())
    .bind(job.batch_size)
    .bind(job.github_run_id.as_deref())
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Finalizes a running job with its terminal status and counters.
///
/// # Errors
///
/// Returns [`DbError::InvalidJobTransition`] if the job is not `running`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn complete_job(
    pool: &PgPool,
    id: i64,
    completion: &JobCompletion,
) -> Result<(), DbError> {
    let counters = completion.counters;
    let result = sqlx::query(
        "UPDATE sync_jobs \
         SET status = $1, completed_at = NOW(), \
             items_processed = $2, items_succeeded = $3, items_failed = $4, \
             items_created = $5, items_updated = $6, error_message = $7 \
         WHERE id = $8 AND status = 'running'",
    )
    .bind(completion.status.as_str())
    .bind(counters.processed)
    .bind(counters.succeeded)
    .bind(counters.failed)
    .bind(counters.created)
    .bind(counters.updated)
    .bind(completion.error_message.as_deref())
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidJobTransition { id });
    }

    Ok(())
}

/// Marks a running job as `failed` with `error_message`.
///
/// # Errors
///
/// Returns [`DbError::InvalidJobTransition`] if the job is not `running`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn fail_job(pool: &PgPool, id: i64, error_message: &str) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE sync_jobs \
         SET status = 'failed', completed_at = NOW(), error_message = $1 \
         WHERE id = $2 AND status = 'running'",
    )
    .bind(error_message)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidJobTransition { id });
    }

    Ok(())
}

/// Fetches a single job by its internal `id`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists with the given `id`, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_job(pool: &PgPool, id: i64) -> Result<SyncJobRow, DbError> {
    sqlx::query_as::<_, SyncJobRow>(&format!(
        "SELECT {JOB_COLUMNS} FROM sync_jobs WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Returns the most recent `limit` jobs, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_jobs(pool: &PgPool, limit: i64) -> Result<Vec<SyncJobRow>, DbError> {
    let rows = sqlx::query_as::<_, SyncJobRow>(&format!(
        "SELECT {JOB_COLUMNS} FROM sync_jobs ORDER BY started_at DESC, id DESC LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
