//! Daily time-series rows in `daily_metrics`, keyed by (appid, date).

use chrono::NaiveDate;
use sqlx::PgPool;

use steamsync_core::AppStats;

use crate::DbError;

/// Upserts one `daily_metrics` row per app for `metric_date`. Re-running on
/// the same day overwrites that day's values.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the statement fails.
pub async fn upsert_daily_metrics(
    pool: &PgPool,
    metric_date: NaiveDate,
    stats: &[AppStats],
) -> Result<u64, DbError> {
    if stats.is_empty() {
        return Ok(0);
    }

    let appids: Vec<i32> = stats.iter().map(|s| s.appid).collect();
    let owners_min: Vec<i64> = stats.iter().map(|s| s.owners.min).collect();
    let owners_max: Vec<i64> = stats.iter().map(|s| s.owners.max).collect();
    let ccu: Vec<i32> = stats.iter().map(|s| s.ccu).collect();
    let avg_forever: Vec<i32> = stats.iter().map(|s| s.average_playtime_forever).collect();
    let avg_2weeks: Vec<i32> = stats.iter().map(|s| s.average_playtime_2weeks).collect();
    let median_forever: Vec<i32> = stats.iter().map(|s| s.median_playtime_forever).collect();
    let median_2weeks: Vec<i32> = stats.iter().map(|s| s.median_playtime_2weeks).collect();
    let positive: Vec<i32> = stats.iter().map(|s| s.positive).collect();
    let negative: Vec<i32> = stats.iter().map(|s| s.negative).collect();
    let price: Vec<Option<i32>> = stats.iter().map(|s| s.price_cents).collect();
    let discount: Vec<Option<i32>> = stats.iter().map(|s| s.discount_percent).collect();

    let result = sqlx::query(
        "INSERT INTO daily_metrics ( \
             appid, metric_date, owners_min, owners_max, ccu, \
             average_playtime_forever, average_playtime_2weeks, \
             median_playtime_forever, median_playtime_2weeks, \
             positive_reviews, negative_reviews, price_cents, discount_percent) \
         SELECT u.appid, $1, u.owners_min, u.owners_max, u.ccu, \
                u.avg_forever, u.avg_2weeks, u.median_forever, u.median_2weeks, \
                u.positive, u.negative, u.price, u.discount \
         FROM UNNEST($2::INTEGER[], $3::BIGINT[], $4::BIGINT[], $5::INTEGER[], \
                     $6::INTEGER[], $7::INTEGER[], $8::INTEGER[], $9::INTEGER[], \
                     $10::INTEGER[], $11::INTEGER[], $12::INTEGER[], $13::INTEGER[]) \
              AS u(appid, owners_min, owners_max, ccu, avg_forever, avg_2weeks, \
                   median_forever, median_2weeks, positive, negative, price, discount) \
         ON CONFLICT (appid, metric_date) DO UPDATE SET \
             owners_min = EXCLUDED.owners_min, \
             owners_max = EXCLUDED.owners_max, \
             ccu = EXCLUDED.ccu, \
             average_playtime_forever = EXCLUDED.average_playtime_forever, \
             average_playtime_2weeks = EXCLUDED.average_playtime_2weeks, \
             median_playtime_forever = EXCLUDED.median_playtime_forever, \
             median_playtime_2weeks = EXCLUDED.median_playtime_2weeks, \
             positive_reviews = EXCLUDED.positive_reviews, \
             negative_reviews = EXCLUDED.negative_reviews, \
             price_cents = EXCLUDED.price_cents, \
             discount_percent = EXCLUDED.discount_percent",
    )
    .bind(metric_date)
    .bind(&appids)
    .bind(&owners_min)
    .bind(&owners_max)
    .bind(&ccu)
    .bind(&avg_forever)
    .bind(&avg_2weeks)
    .bind(&median_forever)
    .bind(&median_2weeks)
    .bind(&positive)
    .bind(&negative)
    .bind(&price)
    .bind(&discount)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
