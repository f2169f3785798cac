//! Monthly review histogram rows, keyed by (appid, month).

use chrono::NaiveDate;
use sqlx::PgPool;

use steamsync_core::HistogramEntry;

use crate::DbError;

/// Upserts an app's monthly buckets. Months already stored are overwritten
/// with the fresh counts; months not in `entries` are left as they were.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the statement fails.
pub async fn replace_histogram(
    pool: &PgPool,
    appid: i32,
    entries: &[HistogramEntry],
) -> Result<u64, DbError> {
    if entries.is_empty() {
        return Ok(0);
    }

    let months: Vec<NaiveDate> = entries.iter().map(|e| e.month_start).collect();
    let ups: Vec<i32> = entries.iter().map(|e| e.recommendations_up).collect();
    let downs: Vec<i32> = entries.iter().map(|e| e.recommendations_down).collect();

    let result = sqlx::query(
        "INSERT INTO review_histogram (appid, month_start, recommendations_up, recommendations_down) \
         SELECT $1, u.month_start, u.up, u.down \
         FROM UNNEST($2::DATE[], $3::INTEGER[], $4::INTEGER[]) AS u(month_start, up, down) \
         ON CONFLICT (appid, month_start) DO UPDATE SET \
             recommendations_up = EXCLUDED.recommendations_up, \
             recommendations_down = EXCLUDED.recommendations_down, \
             fetched_at = NOW()",
    )
    .bind(appid)
    .bind(&months)
    .bind(&ups)
    .bind(&downs)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// An app's stored histogram, oldest month first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_histogram(pool: &PgPool, appid: i32) -> Result<Vec<HistogramEntry>, DbError> {
    let rows = sqlx::query_as::<_, (NaiveDate, i32, i32)>(
        "SELECT month_start, recommendations_up, recommendations_down \
         FROM review_histogram WHERE appid = $1 ORDER BY month_start",
    )
    .bind(appid)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(month_start, up, down)| HistogramEntry {
            month_start,
            recommendations_up: up,
            recommendations_down: down,
        })
        .collect())
}
