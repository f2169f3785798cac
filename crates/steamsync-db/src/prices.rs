//! Bulk price writes through the `batch_update_prices` SQL function.

use sqlx::PgPool;

use steamsync_core::PriceUpdate;

use crate::DbError;

/// Writes current price and discount for many apps in one round trip and
/// stamps their price sync time. Returns the number of apps updated.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the call fails.
pub async fn batch_update_prices(pool: &PgPool, prices: &[PriceUpdate]) -> Result<u64, DbError> {
    if prices.is_empty() {
        return Ok(0);
    }

    let appids: Vec<i32> = prices.iter().map(|p| p.appid).collect();
    let cents: Vec<i32> = prices.iter().map(|p| p.price_cents).collect();
    let discounts: Vec<i32> = prices.iter().map(|p| p.discount_percent).collect();

    let updated = sqlx::query_scalar::<_, i32>("SELECT batch_update_prices($1, $2, $3)")
        .bind(&appids)
        .bind(&cents)
        .bind(&discounts)
        .fetch_one(pool)
        .await?;

    Ok(u64::try_from(updated).unwrap_or(0))
}
