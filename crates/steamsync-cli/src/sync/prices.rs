//! Price worker: bulk price lookups written with one statement per chunk.

use anyhow::Context;

use steamsync_core::{JobCompletion, SyncCounters, SyncSource};
use steamsync_db::SyncStore;
use steamsync_sources::{StorefrontClient, MAX_PRICE_BATCH};

use super::runner::record_sync_error;

pub(super) async fn sync_prices<S: SyncStore + ?Sized>(
    store: &S,
    client: &StorefrontClient,
    batch_size: i32,
    freshness_hours: i32,
) -> anyhow::Result<JobCompletion> {
    let due = store
        .get_apps_for_price_sync(batch_size, freshness_hours)
        .await
        .context("failed to select apps due for price sync")?;
    if due.is_empty() {
        tracing::info!("no apps due for price sync");
        return Ok(JobCompletion::completed(SyncCounters::default()));
    }

    let appids: Vec<i32> = due.iter().map(|d| d.appid).collect();
    let mut counters = SyncCounters::default();

    // One request and one bulk write per sub-batch.
    for chunk in appids.chunks(MAX_PRICE_BATCH) {
        let batch = match client.fetch_prices(chunk).await {
            Ok(batch) => batch,
            Err(e) => {
                let message = format!("{e:#}");
                tracing::warn!(apps = chunk.len(), error = %message, "price chunk fetch failed");
                for &appid in chunk {
                    record_sync_error(store, SyncSource::Price, appid, &message).await;
                }
                counters.record_many(0, chunk.len());
                continue;
            }
        };

        // Also stamps each app's price sync time.
        match store.batch_update_prices(&batch.prices).await {
            Ok(_) => {
                counters.record_many(batch.prices.len(), 0);
                counters.updated = counters
                    .updated
                    .saturating_add(i32::try_from(batch.prices.len()).unwrap_or(i32::MAX));
            }
            Err(e) => {
                let message = format!("{e:#}");
                tracing::warn!(apps = batch.prices.len(), error = %message, "price chunk write failed");
                for price in &batch.prices {
                    record_sync_error(store, SyncSource::Price, price.appid, &message).await;
                }
                counters.record_many(0, batch.prices.len());
            }
        }

        for &appid in &batch.unavailable {
            tracing::debug!(appid, "price unavailable");
            record_sync_error(store, SyncSource::Price, appid, "no data: price unavailable").await;
        }
        counters.record_many(0, batch.unavailable.len());
    }

    Ok(JobCompletion::completed(counters))
}
