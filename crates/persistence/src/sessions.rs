//! Cookie session store.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::StoreError;

/// Record a session token for a business.
pub async fn create_session(
    pool: &SqlitePool,
    token: &str,
    business_id: i64,
    now: DateTime<Utc>,
) -> Result<(), StoreError> {
    sqlx::query("INSERT INTO sessions (id, business_id, created_at) VALUES (?1, ?2, ?3)")
        .bind(token)
        .bind(business_id)
        .bind(now)
        .execute(pool)
        .await?;
    Ok(())
}

/// Resolve a session token to its business id.
pub async fn session_business(
    pool: &SqlitePool,
    token: &str,
) -> Result<Option<i64>, StoreError> {
    let id = sqlx::query_scalar("SELECT business_id FROM sessions WHERE id = ?1")
        .bind(token)
        .fetch_optional(pool)
        .await?;
    Ok(id)
}
