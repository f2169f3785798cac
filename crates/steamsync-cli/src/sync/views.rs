//! Materialized view refresh in dependency tier order.

use std::time::Instant;

use steamsync_core::{JobCompletion, SyncCounters};
use steamsync_db::{SyncStore, VIEW_REFRESH_ORDER};

/// Refreshes every view in order. A failed view is recorded and the
/// remaining views are still attempted; any failure finalizes the job as
/// `completed_with_errors`.
pub(super) async fn refresh_views<S: SyncStore + ?Sized>(
    store: &S,
) -> anyhow::Result<JobCompletion> {
    let mut counters = SyncCounters::default();
    let mut failures = Vec::new();

    for view in VIEW_REFRESH_ORDER {
        let started = Instant::now();
        match store.refresh_materialized_view(view.name).await {
            Ok(()) => {
                tracing::info!(
                    view = view.name,
                    tier = view.tier,
                    elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                    "refreshed view"
                );
                counters.record_success();
            }
            Err(e) => {
                tracing::warn!(view = view.name, tier = view.tier, error = %e, "view refresh failed");
                counters.record_failure();
                failures.push(format!("{}: {e}", view.name));
            }
        }
    }

    if failures.is_empty() {
        return Ok(JobCompletion::completed(counters));
    }
    let message = format!(
        "{} of {} views failed: {}",
        failures.len(),
        VIEW_REFRESH_ORDER.len(),
        failures.join("; ")
    );
    Ok(JobCompletion::with_errors(counters, message))
}
