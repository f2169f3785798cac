//! Shared job lifecycle and per-app bookkeeping for the sync workers.

use std::future::Future;

use anyhow::Context;
use tracing::Instrument;

use steamsync_core::{JobCompletion, JobType, SyncCounters, SyncSource};
use steamsync_db::{NewJob, SyncStore};
use steamsync_sources::FetchOutcome;

/// Creates the job, drives `body`, and finalizes the job exactly once.
///
/// A body error marks the job `failed` (best effort) and is returned so the
/// process exits non-zero.
///
/// # Errors
///
/// Returns an error if the job cannot be created, the body fails, or the
/// completed job cannot be written back.
pub(super) async fn run_job<S, Fut>(
    store: &S,
    job: &NewJob,
    body: Fut,
) -> anyhow::Result<JobCompletion>
where
    S: SyncStore + ?Sized,
    Fut: Future<Output = anyhow::Result<JobCompletion>>,
{
    let job_id = store
        .create_job(job)
        .await
        .with_context(|| format!("failed to create {} job", job.job_type))?;

    let span = tracing::info_span!("sync_job", job_id, job_type = %job.job_type);
    tracing::info!(parent: &span, batch_size = ?job.batch_size, run_id = ?job.github_run_id, "job started");

    let completion = match body.instrument(span.clone()).await {
        Ok(completion) => completion,
        Err(err) => {
            let message = format!("{err:#}");
            tracing::error!(parent: &span, error = %message, "job failed");
            fail_job_best_effort(store, job_id, job.job_type, &message).await;
            return Err(err);
        }
    };

    if let Err(err) = store.complete_job(job_id, &completion).await {
        fail_job_best_effort(store, job_id, job.job_type, &format!("{err:#}")).await;
        return Err(err).with_context(|| format!("failed to finalize {} job {job_id}", job.job_type));
    }

    let counters = completion.counters;
    tracing::info!(
        parent: &span,
        status = %completion.status,
        processed = counters.processed,
        succeeded = counters.succeeded,
        failed = counters.failed,
        created = counters.created,
        updated = counters.updated,
        "job finished"
    );
    Ok(completion)
}

/// Attempt to mark a job as failed, logging any secondary error.
async fn fail_job_best_effort<S: SyncStore + ?Sized>(
    store: &S,
    job_id: i64,
    job_type: JobType,
    message: &str,
) {
    if let Err(mark_err) = store.fail_job(job_id, message).await {
        tracing::error!(job_id, error = %mark_err, "failed to mark {job_type} job as failed");
    }
}

/// Books one app's result against its sync state and the job counters.
/// Returns `true` when the app synced.
///
/// `NoData` is a soft failure: recorded on the app but not logged as an
/// error.
pub(super) async fn settle<S, T>(
    store: &S,
    source: SyncSource,
    appid: i32,
    result: &anyhow::Result<FetchOutcome<T>>,
    counters: &mut SyncCounters,
) -> bool
where
    S: SyncStore + ?Sized,
{
    match result {
        Ok(FetchOutcome::Data(_)) => {
            if let Err(e) = store.mark_sync_success(appid, source).await {
                tracing::warn!(appid, %source, error = %e, "failed to record sync success");
            }
            counters.record_success();
            true
        }
        Ok(FetchOutcome::NoData(reason)) => {
            tracing::debug!(appid, %source, reason = %reason, "no data");
            record_sync_error(store, source, appid, &format!("no data: {reason}")).await;
            counters.record_failure();
            false
        }
        Err(err) => {
            let message = format!("{err:#}");
            tracing::warn!(appid, %source, error = %message, "app sync failed");
            record_sync_error(store, source, appid, &message).await;
            counters.record_failure();
            false
        }
    }
}

/// Stores a per-app error, logging instead of failing if that write fails.
pub(super) async fn record_sync_error<S: SyncStore + ?Sized>(
    store: &S,
    source: SyncSource,
    appid: i32,
    message: &str,
) {
    if let Err(e) = store.mark_sync_error(appid, source, message).await {
        tracing::warn!(appid, %source, error = %e, "failed to record sync error");
    }
}
