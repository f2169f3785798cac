//! Sync worker dispatch.
//!
//! Every worker runs inside [`runner::run_job`], which owns the job record.
//! Per-app failures are recorded on the app's sync state and counted; only
//! setup failures (job creation, due-batch selection, the catalog fetch)
//! fail the job and the process.

mod applist;
mod histograms;
mod page_dates;
mod prices;
mod reviews;
mod runner;
mod steamspy;
mod storefront;
mod views;

use chrono::Utc;
use clap::ValueEnum;

use steamsync_core::{JobCompletion, JobStatus, JobType};
use steamsync_db::{NewJob, SyncStore, DEFAULT_PRICE_FRESHNESS_HOURS};
use steamsync_sources::SteamClients;

use self::runner::run_job;

/// Worker selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Worker {
    /// Full Steam app list into base app rows
    Applist,
    /// `SteamSpy` `all` pages into daily metrics
    Steamspy,
    /// Store page detail for due apps
    Storefront,
    /// Bulk current prices for due apps
    Prices,
    /// Review totals for due apps
    Reviews,
    /// Monthly review histograms for due apps
    Histogram,
    /// Community hub creation dates for due apps
    PageCreation,
    /// Materialized view refresh in tier order
    RefreshViews,
}

impl Worker {
    #[must_use]
    pub fn job_type(self) -> JobType {
        match self {
            Worker::Applist => JobType::Applist,
            Worker::Steamspy => JobType::Steamspy,
            Worker::Storefront => JobType::Storefront,
            Worker::Prices => JobType::Price,
            Worker::Reviews => JobType::Reviews,
            Worker::Histogram => JobType::Histogram,
            Worker::PageCreation => JobType::PageCreation,
            Worker::RefreshViews => JobType::RefreshViews,
        }
    }

    /// Due-batch size when none is given. Paginated and view workers have
    /// no batch.
    #[must_use]
    pub fn default_batch_size(self) -> Option<i32> {
        match self {
            Worker::Storefront | Worker::Reviews => Some(200),
            Worker::Prices => Some(1000),
            Worker::Histogram => Some(100),
            Worker::PageCreation => Some(50),
            Worker::Applist | Worker::Steamspy | Worker::RefreshViews => None,
        }
    }
}

/// Per-invocation options from flags or the environment.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Due-batch size; for the paginated workers, the page cap.
    pub batch_size: Option<i32>,
    pub run_id: Option<String>,
}

/// Runs `worker` under a job record and returns its completion.
///
/// # Errors
///
/// Returns an error when the job fails during setup or cannot be finalized,
/// and when a view refresh run finishes with failed views.
pub async fn run_worker<S: SyncStore + ?Sized>(
    store: &S,
    clients: &SteamClients,
    worker: Worker,
    options: &RunOptions,
) -> anyhow::Result<JobCompletion> {
    let batch_size = options.batch_size.or(worker.default_batch_size());
    let job = NewJob {
        job_type: worker.job_type(),
        batch_size,
        github_run_id: options.run_id.clone(),
    };
    let limit = batch_size.unwrap_or_default();

    let completion = match worker {
        Worker::Applist => {
            let max_pages = page_cap(options.batch_size, steamsync_sources::catalog::DEFAULT_MAX_PAGES);
            run_job(store, &job, applist::sync_applist(store, &clients.catalog, max_pages)).await?
        }
        Worker::Steamspy => {
            let max_pages = page_cap(options.batch_size, steamsync_sources::steamspy::DEFAULT_MAX_PAGES);
            let today = Utc::now().date_naive();
            run_job(
                store,
                &job,
                steamspy::sync_steamspy(store, &clients.steamspy, max_pages, today),
            )
            .await?
        }
        Worker::Storefront => {
            run_job(store, &job, storefront::sync_storefront(store, &clients.storefront, limit))
                .await?
        }
        Worker::Prices => {
            run_job(
                store,
                &job,
                prices::sync_prices(store, &clients.storefront, limit, DEFAULT_PRICE_FRESHNESS_HOURS),
            )
            .await?
        }
        Worker::Reviews => {
            run_job(store, &job, reviews::sync_reviews(store, &clients.reviews, limit)).await?
        }
        Worker::Histogram => {
            let today = Utc::now().date_naive();
            run_job(
                store,
                &job,
                histograms::sync_histograms(store, &clients.reviews, limit, today),
            )
            .await?
        }
        Worker::PageCreation => {
            run_job(
                store,
                &job,
                page_dates::sync_page_dates(store, &clients.community, limit),
            )
            .await?
        }
        Worker::RefreshViews => run_job(store, &job, views::refresh_views(store)).await?,
    };

    if worker == Worker::RefreshViews && completion.status == JobStatus::CompletedWithErrors {
        anyhow::bail!(
            "view refresh finished with errors: {}",
            completion.error_message.as_deref().unwrap_or("unknown")
        );
    }

    Ok(completion)
}

fn page_cap(requested: Option<i32>, default: u32) -> u32 {
    requested
        .and_then(|n| u32::try_from(n).ok())
        .filter(|n| *n > 0)
        .unwrap_or(default)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[path = "sync_test.rs"]
mod tests;
