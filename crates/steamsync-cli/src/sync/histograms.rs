//! Review histogram worker. Only updates existing apps, so `created` stays
//! zero.

use anyhow::Context;
use chrono::NaiveDate;

use steamsync_core::{JobCompletion, SyncCounters, SyncSource};
use steamsync_db::SyncStore;
use steamsync_sources::trend::DEFAULT_RECENT_DAYS;
use steamsync_sources::{analyze_trend, FetchOutcome, ReviewsClient};

use super::runner::settle;

pub(super) async fn sync_histograms<S: SyncStore + ?Sized>(
    store: &S,
    client: &ReviewsClient,
    batch_size: i32,
    today: NaiveDate,
) -> anyhow::Result<JobCompletion> {
    let due = store
        .get_apps_for_sync(SyncSource::Histogram, batch_size)
        .await
        .context("failed to select apps due for histogram sync")?;
    if due.is_empty() {
        tracing::info!("no apps due for histogram sync");
        return Ok(JobCompletion::completed(SyncCounters::default()));
    }

    let mut counters = SyncCounters::default();
    for app in &due {
        let result = sync_app(store, client, app.appid, today).await;
        if settle(store, SyncSource::Histogram, app.appid, &result, &mut counters).await {
            counters.updated += 1;
        }
    }

    Ok(JobCompletion::completed(counters))
}

/// An app with no monthly history comes back as `NoData` and is counted as
/// failed.
async fn sync_app<S: SyncStore + ?Sized>(
    store: &S,
    client: &ReviewsClient,
    appid: i32,
    today: NaiveDate,
) -> anyhow::Result<FetchOutcome<()>> {
    let entries = match client.fetch_histogram(appid).await? {
        FetchOutcome::Data(entries) => entries,
        FetchOutcome::NoData(reason) => return Ok(FetchOutcome::NoData(reason)),
    };

    store
        .replace_histogram(appid, &entries)
        .await
        .context("failed to write review histogram")?;

    match analyze_trend(&entries, DEFAULT_RECENT_DAYS, today) {
        Some(trend) => tracing::debug!(
            appid,
            months = entries.len(),
            direction = %trend.direction,
            change_percent = trend.change_percent,
            "review trend"
        ),
        None => tracing::debug!(appid, months = entries.len(), "not enough history for a trend"),
    }

    Ok(FetchOutcome::Data(()))
}
