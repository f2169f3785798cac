//! Materialized view refresh.
//!
//! Views are refreshed in dependency tiers: a tier may read from any view in
//! an earlier tier, so tiers must run in ascending order.

use sqlx::PgPool;

use crate::DbError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaterializedView {
    pub name: &'static str,
    pub tier: u8,
}

/// Every refreshable view, in refresh order.
pub const VIEW_REFRESH_ORDER: [MaterializedView; 4] = [
    MaterializedView {
        name: "latest_daily_metrics",
        tier: 1,
    },
    MaterializedView {
        name: "developer_metrics",
        tier: 2,
    },
    MaterializedView {
        name: "publisher_metrics",
        tier: 2,
    },
    MaterializedView {
        name: "monthly_release_metrics",
        tier: 3,
    },
];

fn known_view(name: &str) -> Option<&'static MaterializedView> {
    VIEW_REFRESH_ORDER.iter().find(|v| v.name == name)
}

/// Refreshes one view without blocking readers.
///
/// Only names in [`VIEW_REFRESH_ORDER`] are accepted; the name is spliced
/// into the statement, so anything else is rejected before reaching SQL.
///
/// # Errors
///
/// Returns [`DbError::UnknownView`] for an unlisted name, or
/// [`DbError::Sqlx`] if the refresh fails.
pub async fn refresh_materialized_view(pool: &PgPool, name: &str) -> Result<(), DbError> {
    let view = known_view(name).ok_or_else(|| DbError::UnknownView(name.to_string()))?;
    sqlx::query(&format!(
        "REFRESH MATERIALIZED VIEW CONCURRENTLY {}",
        view.name
    ))
    .execute(pool)
    .await?;
    Ok(())
}
