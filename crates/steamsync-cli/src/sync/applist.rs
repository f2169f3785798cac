//! Catalog worker: seeds base app rows and their sync state from the full
//! Steam app list.

use steamsync_core::{CatalogEntry, JobCompletion, SyncCounters};
use steamsync_db::{AppBase, DbError, SyncStatusSeed, SyncStore, UpsertCounts};
use steamsync_sources::{CatalogClient, FetchOutcome};

/// Apps written per upsert statement.
const UPSERT_CHUNK: usize = 5_000;

pub(super) async fn sync_applist<S: SyncStore + ?Sized>(
    store: &S,
    client: &CatalogClient,
    max_pages: u32,
) -> anyhow::Result<JobCompletion> {
    let entries = match client.fetch_all(max_pages).await? {
        FetchOutcome::Data(entries) => entries,
        FetchOutcome::NoData(reason) => {
            tracing::info!(reason = %reason, "catalog returned nothing to sync");
            return Ok(JobCompletion::completed(SyncCounters::default()));
        }
    };
    tracing::info!(apps = entries.len(), "fetched app list");

    let mut counters = SyncCounters::default();
    for chunk in entries.chunks(UPSERT_CHUNK) {
        match upsert_chunk(store, chunk).await {
            Ok(counts) => {
                counters.record_many(chunk.len(), 0);
                counters.created = counters
                    .created
                    .saturating_add(i32::try_from(counts.inserted).unwrap_or(i32::MAX));
                counters.updated = counters
                    .updated
                    .saturating_add(i32::try_from(counts.updated).unwrap_or(i32::MAX));
            }
            Err(e) => {
                tracing::warn!(
                    first_appid = chunk.first().map(|c| c.appid),
                    apps = chunk.len(),
                    error = %e,
                    "app list chunk upsert failed"
                );
                counters.record_many(0, chunk.len());
            }
        }
    }

    Ok(JobCompletion::completed(counters))
}

/// Base rows first; `sync_status` references `apps`.
async fn upsert_chunk<S: SyncStore + ?Sized>(
    store: &S,
    chunk: &[CatalogEntry],
) -> Result<UpsertCounts, DbError> {
    let apps: Vec<AppBase> = chunk
        .iter()
        .map(|entry| AppBase {
            appid: entry.appid,
            name: entry.name.clone(),
            last_modified: entry.last_modified,
        })
        .collect();
    let counts = store.upsert_apps(&apps).await?;

    let seeds: Vec<SyncStatusSeed> = chunk
        .iter()
        .map(|entry| SyncStatusSeed {
            appid: entry.appid,
            priority_score: 0,
        })
        .collect();
    store.upsert_sync_statuses(&seeds, None).await?;

    Ok(counts)
}
