#![deny(warnings)]

//! Persistence layer: SQLite store for the game state.
//!
//! Every mutation is expressed as a single atomic read-modify-write
//! statement (`SET money = money - ?`, state-guarded order transitions,
//! compare-and-swap tick ownership) so concurrent polls and multiple
//! stateless server instances cannot lose updates. Loads return
//! immutable snapshots for the engines.

pub mod apply;
pub mod business;
pub mod orders;
pub mod schema;
pub mod sessions;
pub mod techs;

mod rows;

pub use apply::{apply_build, apply_tick};
pub use business::{
    admin_stats, apply_challenge_completion, apply_skill_spend, create_business,
    finalize_business, leaderboard, load_business, load_snapshot, network_overview,
    toggle_automation, AdminStats, LeaderboardEntry, NetworkEntry,
};
pub use orders::{apply_shipment, reputation_counts};
pub use sessions::{create_session, session_business};
pub use techs::{
    acquired_technologies, available_technologies, make_new_technology_available,
    purchase_technology, PurchaseOutcome,
};

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use thiserror::Error;

/// Storage-layer errors. `Insufficient*` variants are expected
/// preconditions the API maps to `{success:false}`; the rest are faults.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
    /// A row the flow requires is missing; fatal for the request.
    #[error("missing row: {0}")]
    NotFound(&'static str),
    /// A guarded update found the row in another state.
    #[error("conflict: {0}")]
    Conflict(&'static str),
    /// Stored text failed to parse back into a domain value.
    #[error("invalid stored value: {0}")]
    InvalidStored(String),
    #[error("Not enough money")]
    InsufficientFunds,
}

/// Returns the default SQLite URL used for local games.
pub fn default_sqlite_url() -> &'static str {
    "sqlite://./data/freight.db"
}

/// Connect, create the schema when absent, and seed static data.
pub async fn init_db(url: &str) -> Result<SqlitePool, StoreError> {
    let pool = SqlitePoolOptions::new().connect(url).await?;
    schema::create_all(&pool).await?;
    schema::seed(&pool).await?;
    Ok(pool)
}

/// An in-memory database for tests; a single connection so every
/// statement sees the same store.
pub async fn init_memory_db() -> Result<SqlitePool, StoreError> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    schema::create_all(&pool).await?;
    schema::seed(&pool).await?;
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_is_sqlite() {
        assert!(default_sqlite_url().starts_with("sqlite://"));
    }

    #[tokio::test]
    async fn memory_db_boots_with_seeds() {
        let pool = init_memory_db().await.unwrap();
        let template = load_business(&pool, 1).await.unwrap().unwrap();
        assert_eq!(template.id, 1);
        assert_eq!(template.money, sim_core::constants::DEFAULT_MONEY);
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM technologies")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(n as usize, sim_core::TechCode::ALL.len());
    }
}
