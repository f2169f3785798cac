//! Developer/publisher name entities and their app link rows.

use sqlx::PgPool;

use crate::DbError;

/// Returns the id for developer `name`, creating the row if needed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the statement fails.
pub async fn upsert_developer(pool: &PgPool, name: &str) -> Result<i64, DbError> {
    // The no-op update makes RETURNING yield the id on conflict too.
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO developers (name) VALUES ($1) \
         ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name \
         RETURNING id",
    )
    .bind(name)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

/// Returns the id for publisher `name`, creating the row if needed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the statement fails.
pub async fn upsert_publisher(pool: &PgPool, name: &str) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO publishers (name) VALUES ($1) \
         ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name \
         RETURNING id",
    )
    .bind(name)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

/// Links an app to a developer. Idempotent.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails (including a missing app).
pub async fn link_app_developer(pool: &PgPool, appid: i32, developer_id: i64) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO app_developers (appid, developer_id) VALUES ($1, $2) \
         ON CONFLICT (appid, developer_id) DO NOTHING",
    )
    .bind(appid)
    .bind(developer_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Links an app to a publisher. Idempotent.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails (including a missing app).
pub async fn link_app_publisher(pool: &PgPool, appid: i32, publisher_id: i64) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO app_publishers (appid, publisher_id) VALUES ($1, $2) \
         ON CONFLICT (appid, publisher_id) DO NOTHING",
    )
    .bind(appid)
    .bind(publisher_id)
    .execute(pool)
    .await?;
    Ok(())
}
