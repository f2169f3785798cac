//! Community hub scrape for page creation dates.

use anyhow::Context;

use steamsync_core::{JobCompletion, SyncCounters, SyncSource};
use steamsync_db::SyncStore;
use steamsync_sources::{CommunityClient, FetchOutcome};

use super::runner::settle;

/// Apps scraped for the first time count as `created`, re-scrapes as
/// `updated`. A page without a recognisable date is still a successful
/// scrape so the app is not retried until it is due again.
pub(super) async fn sync_page_dates<S: SyncStore + ?Sized>(
    store: &S,
    client: &CommunityClient,
    batch_size: i32,
) -> anyhow::Result<JobCompletion> {
    let due = store
        .get_apps_for_sync(SyncSource::PageCreation, batch_size)
        .await
        .context("failed to select apps due for page creation scrape")?;
    if due.is_empty() {
        tracing::info!("no apps due for page creation scrape");
        return Ok(JobCompletion::completed(SyncCounters::default()));
    }

    let mut counters = SyncCounters::default();
    for app in &due {
        let result = scrape_app(store, client, app.appid).await;
        if settle(store, SyncSource::PageCreation, app.appid, &result, &mut counters).await {
            if app.last_synced_at.is_none() {
                counters.created += 1;
            } else {
                counters.updated += 1;
            }
        }
    }

    Ok(JobCompletion::completed(counters))
}

async fn scrape_app<S: SyncStore + ?Sized>(
    store: &S,
    client: &CommunityClient,
    appid: i32,
) -> anyhow::Result<FetchOutcome<()>> {
    let date = match client.fetch_page_creation_date(appid).await? {
        FetchOutcome::Data(date) => date,
        FetchOutcome::NoData(reason) => return Ok(FetchOutcome::NoData(reason)),
    };
    if date.is_none() {
        tracing::debug!(appid, "community hub shows no date");
    }

    store
        .set_page_creation_date(appid, date)
        .await
        .context("failed to write page creation date")?;
    Ok(FetchOutcome::Data(()))
}
