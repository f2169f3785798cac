//! `SteamSpy` worker: walks the `all` listing page by page and writes each
//! page as soon as it arrives, then refreshes due apps the listing did not
//! cover one at a time.

use anyhow::Context;
use chrono::NaiveDate;

use steamsync_core::{AppStats, JobCompletion, SyncCounters, SyncSource};
use steamsync_db::{AppBase, DbError, SyncStatusSeed, SyncStore, UpsertCounts};
use steamsync_sources::{FetchOutcome, SteamSpyClient};

use super::runner::settle;

/// Due apps refreshed through the single-app endpoint after the page walk.
const SINGLE_APP_BACKFILL: i32 = 100;

/// Reads pages from zero until an empty page or `max_pages`.
///
/// A page whose writes fail counts all of its apps as failed and the walk
/// continues. A page that cannot be fetched ends the walk and the job is
/// finalized `completed_with_errors`.
///
/// Apps stamped by the walk are no longer due, so the backfill only picks up
/// apps missing from the listing.
pub(super) async fn sync_steamspy<S: SyncStore + ?Sized>(
    store: &S,
    client: &SteamSpyClient,
    max_pages: u32,
    today: NaiveDate,
) -> anyhow::Result<JobCompletion> {
    let mut counters = SyncCounters::default();
    let mut fetch_error = None;

    for page in 0..max_pages {
        let stats = match client.fetch_all_page(page).await {
            Ok(stats) => stats,
            Err(e) => {
                tracing::warn!(page, error = %e, "steamspy page fetch failed; stopping");
                fetch_error = Some(format!("page {page}: {e}"));
                break;
            }
        };
        if stats.is_empty() {
            tracing::info!(page, "reached end of steamspy pages");
            break;
        }

        match upsert_page(store, &stats, today).await {
            Ok(counts) => {
                counters.record_many(stats.len(), 0);
                counters.created = counters
                    .created
                    .saturating_add(i32::try_from(counts.inserted).unwrap_or(i32::MAX));
                counters.updated = counters
                    .updated
                    .saturating_add(i32::try_from(counts.updated).unwrap_or(i32::MAX));
                tracing::info!(page, apps = stats.len(), "steamspy page stored");
            }
            Err(e) => {
                tracing::warn!(page, apps = stats.len(), error = %e, "steamspy page upsert failed");
                counters.record_many(0, stats.len());
            }
        }
    }

    let backfill_error = backfill_due_apps(store, client, today, &mut counters).await;

    let errors: Vec<String> = fetch_error.into_iter().chain(backfill_error).collect();
    if errors.is_empty() {
        return Ok(JobCompletion::completed(counters));
    }
    Ok(JobCompletion::with_errors(counters, errors.join("; ")))
}

/// Returns a message when the due apps could not be selected.
async fn backfill_due_apps<S: SyncStore + ?Sized>(
    store: &S,
    client: &SteamSpyClient,
    today: NaiveDate,
    counters: &mut SyncCounters,
) -> Option<String> {
    let due = match store
        .get_apps_for_sync(SyncSource::Steamspy, SINGLE_APP_BACKFILL)
        .await
    {
        Ok(due) => due,
        Err(e) => {
            tracing::warn!(error = %e, "failed to select apps for steamspy backfill");
            return Some(format!("backfill selection: {e}"));
        }
    };
    if due.is_empty() {
        return None;
    }
    tracing::info!(apps = due.len(), "refreshing apps missing from steamspy pages");

    for app in &due {
        let result = refresh_app(store, client, app.appid, today).await;
        if settle(store, SyncSource::Steamspy, app.appid, &result, counters).await {
            counters.updated += 1;
        }
    }
    None
}

async fn refresh_app<S: SyncStore + ?Sized>(
    store: &S,
    client: &SteamSpyClient,
    appid: i32,
    today: NaiveDate,
) -> anyhow::Result<FetchOutcome<()>> {
    let stats = match client.fetch_app(appid).await? {
        FetchOutcome::Data(stats) => stats,
        FetchOutcome::NoData(reason) => return Ok(FetchOutcome::NoData(reason)),
    };
    upsert_page(store, std::slice::from_ref(&stats), today)
        .await
        .context("failed to write steamspy stats")?;
    Ok(FetchOutcome::Data(()))
}

/// Base app rows first, then sync state and the day's metrics together.
async fn upsert_page<S: SyncStore + ?Sized>(
    store: &S,
    stats: &[AppStats],
    today: NaiveDate,
) -> Result<UpsertCounts, DbError> {
    let apps: Vec<AppBase> = stats
        .iter()
        .map(|s| AppBase {
            appid: s.appid,
            name: s.name.clone(),
            last_modified: None,
        })
        .collect();
    let counts = store.upsert_apps(&apps).await?;

    let seeds: Vec<SyncStatusSeed> = stats
        .iter()
        .map(|s| SyncStatusSeed {
            appid: s.appid,
            priority_score: s.priority_score(),
        })
        .collect();
    futures::try_join!(
        store.upsert_sync_statuses(&seeds, Some(SyncSource::Steamspy)),
        store.upsert_daily_metrics(today, stats),
    )?;

    Ok(counts)
}
