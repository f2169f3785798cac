//! Storefront worker: store page detail plus developer/publisher links.

use anyhow::Context;

use steamsync_core::{JobCompletion, StorefrontDetails, SyncCounters, SyncSource};
use steamsync_db::{DbError, SyncStore};
use steamsync_sources::{FetchOutcome, StorefrontClient};

use super::runner::settle;

pub(super) async fn sync_storefront<S: SyncStore + ?Sized>(
    store: &S,
    client: &StorefrontClient,
    batch_size: i32,
) -> anyhow::Result<JobCompletion> {
    let due = store
        .get_apps_for_sync(SyncSource::Storefront, batch_size)
        .await
        .context("failed to select apps due for storefront sync")?;
    if due.is_empty() {
        tracing::info!("no apps due for storefront sync");
        return Ok(JobCompletion::completed(SyncCounters::default()));
    }

    let mut counters = SyncCounters::default();
    for app in &due {
        let result = sync_app(store, client, app.appid).await;
        if settle(store, SyncSource::Storefront, app.appid, &result, &mut counters).await {
            counters.updated += 1;
        }
    }

    Ok(JobCompletion::completed(counters))
}

async fn sync_app<S: SyncStore + ?Sized>(
    store: &S,
    client: &StorefrontClient,
    appid: i32,
) -> anyhow::Result<FetchOutcome<()>> {
    let details = match client.fetch_details(appid).await? {
        FetchOutcome::Data(details) => details,
        FetchOutcome::NoData(reason) => return Ok(FetchOutcome::NoData(reason)),
    };

    store
        .update_app_storefront(&details)
        .await
        .context("failed to write storefront fields")?;

    if link_companies(store, &details).await > 0 {
        store
            .mark_app_has_developer_info(appid)
            .await
            .context("failed to flag developer info")?;
    }

    Ok(FetchOutcome::Data(()))
}

/// Links every developer and publisher name. A failed link is logged and
/// skipped. Returns the number of links written.
async fn link_companies<S: SyncStore + ?Sized>(store: &S, details: &StorefrontDetails) -> usize {
    let mut linked = 0;

    for name in &details.developers {
        match link_developer(store, details.appid, name).await {
            Ok(()) => linked += 1,
            Err(e) => {
                tracing::warn!(appid = details.appid, developer = %name, error = %e, "failed to link developer");
            }
        }
    }
    for name in &details.publishers {
        match link_publisher(store, details.appid, name).await {
            Ok(()) => linked += 1,
            Err(e) => {
                tracing::warn!(appid = details.appid, publisher = %name, error = %e, "failed to link publisher");
            }
        }
    }

    linked
}

async fn link_developer<S: SyncStore + ?Sized>(
    store: &S,
    appid: i32,
    name: &str,
) -> Result<(), DbError> {
    let developer_id = store.upsert_developer(name).await?;
    store.link_app_developer(appid, developer_id).await
}

async fn link_publisher<S: SyncStore + ?Sized>(
    store: &S,
    appid: i32,
    name: &str,
) -> Result<(), DbError> {
    let publisher_id = store.upsert_publisher(name).await?;
    store.link_app_publisher(appid, publisher_id).await
}
