//! Schema bootstrap and static seed data.

use chrono::Utc;
use sim_core::{technology_catalog, validate_catalog, Business};
use sqlx::SqlitePool;
use tracing::info;

use crate::StoreError;

const CREATE_TABLES: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS businesses (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        business_name TEXT NOT NULL,
        money INTEGER NOT NULL,
        tech_level INTEGER NOT NULL DEFAULT 0,
        orders_shipped INTEGER NOT NULL DEFAULT 0,
        total_money_earned INTEGER NOT NULL DEFAULT 0,
        building_speed_ms INTEGER NOT NULL,
        shipping_speed_ms INTEGER NOT NULL,
        order_spawn_ms INTEGER NOT NULL,
        products_per_build INTEGER NOT NULL,
        products_per_order INTEGER NOT NULL,
        orders_per_ship INTEGER NOT NULL,
        order_spawn_count INTEGER NOT NULL,
        xp INTEGER NOT NULL DEFAULT 0,
        available_points INTEGER NOT NULL DEFAULT 0,
        points_spent INTEGER NOT NULL DEFAULT 0,
        automation_enabled INTEGER NOT NULL DEFAULT 0,
        logistics_penalty INTEGER NOT NULL DEFAULT 0,
        build_challenge_pending INTEGER NOT NULL DEFAULT 0,
        ship_challenge_pending INTEGER NOT NULL DEFAULT 0,
        active INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL,
        last_game_update TEXT NOT NULL,
        last_order_spawned_at TEXT NOT NULL,
        final_money INTEGER,
        final_tech_level INTEGER,
        final_orders_shipped INTEGER,
        final_reputation INTEGER,
        expiration_reason TEXT,
        acquired_by TEXT
    )",
    "CREATE TABLE IF NOT EXISTS products (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        business_id INTEGER NOT NULL REFERENCES businesses(id),
        name TEXT NOT NULL,
        cost_to_build INTEGER NOT NULL,
        sales_price INTEGER NOT NULL,
        weight INTEGER NOT NULL,
        on_hand INTEGER NOT NULL DEFAULT 0,
        build_active INTEGER NOT NULL DEFAULT 0,
        build_started_at TEXT,
        build_duration_ms INTEGER NOT NULL DEFAULT 0,
        quantity_per_build INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS orders (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        business_id INTEGER NOT NULL REFERENCES businesses(id),
        quantity INTEGER NOT NULL,
        distance_miles INTEGER NOT NULL,
        state TEXT NOT NULL,
        created_at TEXT NOT NULL,
        due_by TEXT NOT NULL,
        started_at TEXT,
        duration_ms INTEGER,
        shipping_cost INTEGER
    )",
    "CREATE INDEX IF NOT EXISTS idx_orders_business_state
        ON orders(business_id, state)",
    "CREATE TABLE IF NOT EXISTS technologies (
        id INTEGER PRIMARY KEY,
        code TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL,
        description TEXT NOT NULL,
        cost INTEGER NOT NULL,
        tech_level_required INTEGER NOT NULL,
        modifier REAL NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS available_technologies (
        business_id INTEGER NOT NULL REFERENCES businesses(id),
        technology_id INTEGER NOT NULL REFERENCES technologies(id),
        offered_at TEXT NOT NULL,
        PRIMARY KEY (business_id, technology_id)
    )",
    "CREATE TABLE IF NOT EXISTS acquired_technologies (
        business_id INTEGER NOT NULL REFERENCES businesses(id),
        technology_id INTEGER NOT NULL REFERENCES technologies(id),
        acquired_at TEXT NOT NULL,
        expires_at TEXT,
        PRIMARY KEY (business_id, technology_id)
    )",
    "CREATE TABLE IF NOT EXISTS sessions (
        id TEXT PRIMARY KEY,
        business_id INTEGER NOT NULL REFERENCES businesses(id),
        created_at TEXT NOT NULL
    )",
];

/// Create every table and index when missing.
pub async fn create_all(pool: &SqlitePool) -> Result<(), StoreError> {
    for statement in CREATE_TABLES {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

/// Seed the technology catalog and the template business (row id 1).
pub async fn seed(pool: &SqlitePool) -> Result<(), StoreError> {
    let catalog = technology_catalog();
    validate_catalog(&catalog)
        .map_err(|e| StoreError::InvalidStored(e.to_string()))?;
    for t in &catalog {
        sqlx::query(
            "INSERT OR IGNORE INTO technologies
             (id, code, name, description, cost, tech_level_required, modifier)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(t.id)
        .bind(t.code.as_str())
        .bind(&t.name)
        .bind(&t.description)
        .bind(t.cost)
        .bind(t.tech_level_required)
        .bind(t.modifier)
        .execute(pool)
        .await?;
    }

    let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM businesses WHERE id = 1")
        .fetch_optional(pool)
        .await?;
    if existing.is_none() {
        let template = Business::template(Utc::now());
        crate::business::insert_business(pool, &template).await?;
        info!("seeded template business");
    }
    Ok(())
}
