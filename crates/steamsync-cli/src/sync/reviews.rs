//! Review summary worker.

use anyhow::Context;

use steamsync_core::{JobCompletion, SyncCounters, SyncSource};
use steamsync_db::SyncStore;
use steamsync_sources::{FetchOutcome, ReviewsClient};

use super::runner::settle;

pub(super) async fn sync_reviews<S: SyncStore + ?Sized>(
    store: &S,
    client: &ReviewsClient,
    batch_size: i32,
) -> anyhow::Result<JobCompletion> {
    let due = store
        .get_apps_for_sync(SyncSource::Reviews, batch_size)
        .await
        .context("failed to select apps due for review sync")?;
    if due.is_empty() {
        tracing::info!("no apps due for review sync");
        return Ok(JobCompletion::completed(SyncCounters::default()));
    }

    let mut counters = SyncCounters::default();
    for app in &due {
        let result = sync_app(store, client, app.appid).await;
        if settle(store, SyncSource::Reviews, app.appid, &result, &mut counters).await {
            counters.updated += 1;
        }
    }

    Ok(JobCompletion::completed(counters))
}

async fn sync_app<S: SyncStore + ?Sized>(
    store: &S,
    client: &ReviewsClient,
    appid: i32,
) -> anyhow::Result<FetchOutcome<()>> {
    let summary = match client.fetch_summary(appid).await? {
        FetchOutcome::Data(summary) => summary,
        FetchOutcome::NoData(reason) => return Ok(FetchOutcome::NoData(reason)),
    };
    store
        .update_review_summary(&summary)
        .await
        .context("failed to write review summary")?;
    Ok(FetchOutcome::Data(()))
}
