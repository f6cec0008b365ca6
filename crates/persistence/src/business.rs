//! Business rows: creation, snapshot loads, action updates, projections.

use chrono::{DateTime, Utc};
use sim_core::constants::*;
use sim_core::{Business, GameSnapshot, SkillCode};
use sqlx::SqlitePool;
use tracing::info;

use crate::rows::{BusinessRow, OrderRow, ProductRow};
use crate::StoreError;

/// Insert a business with its explicit id (template seeding only).
pub(crate) async fn insert_business(
    pool: &SqlitePool,
    b: &Business,
) -> Result<(), StoreError> {
    sqlx::query(
        "INSERT INTO businesses (
            id, name, business_name, money, tech_level, orders_shipped,
            total_money_earned, building_speed_ms, shipping_speed_ms,
            order_spawn_ms, products_per_build, products_per_order,
            orders_per_ship, order_spawn_count, xp, available_points,
            points_spent, automation_enabled, logistics_penalty,
            build_challenge_pending, ship_challenge_pending, active,
            created_at, last_game_update, last_order_spawned_at
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12,
                   ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22,
                   ?23, ?24, ?25)",
    )
    .bind(b.id)
    .bind(&b.name)
    .bind(&b.business_name)
    .bind(b.money)
    .bind(b.tech_level)
    .bind(b.orders_shipped)
    .bind(b.total_money_earned)
    .bind(b.building_speed_ms)
    .bind(b.shipping_speed_ms)
    .bind(b.order_spawn_ms)
    .bind(b.products_per_build)
    .bind(b.products_per_order)
    .bind(b.orders_per_ship)
    .bind(b.order_spawn_count)
    .bind(b.xp)
    .bind(b.available_points)
    .bind(b.points_spent)
    .bind(b.automation_enabled)
    .bind(b.logistics_penalty)
    .bind(b.build_challenge_pending)
    .bind(b.ship_challenge_pending)
    .bind(b.active)
    .bind(b.created_at)
    .bind(b.last_game_update)
    .bind(b.last_order_spawned_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Create a new business from the template row, with its starter product
/// and an initial pool of offered technologies.
pub async fn create_business(
    pool: &SqlitePool,
    name: &str,
    business_name: &str,
    now: DateTime<Utc>,
) -> Result<i64, StoreError> {
    let template = load_business(pool, 1)
        .await?
        .ok_or(StoreError::NotFound("template business"))?;

    let result = sqlx::query(
        "INSERT INTO businesses (
            name, business_name, money, tech_level, orders_shipped,
            total_money_earned, building_speed_ms, shipping_speed_ms,
            order_spawn_ms, products_per_build, products_per_order,
            orders_per_ship, order_spawn_count, xp, available_points,
            points_spent, automation_enabled, logistics_penalty,
            build_challenge_pending, ship_challenge_pending, active,
            created_at, last_game_update, last_order_spawned_at
         ) VALUES (?1, ?2, ?3, ?4, 0, 0, ?5, ?6, ?7, ?8, ?9, ?10, ?11,
                   0, 0, 0, 0, 0, 0, 0, 1, ?12, ?12, ?12)",
    )
    .bind(name)
    .bind(business_name)
    .bind(template.money)
    .bind(template.tech_level)
    .bind(template.building_speed_ms)
    .bind(template.shipping_speed_ms)
    .bind(template.order_spawn_ms)
    .bind(template.products_per_build)
    .bind(template.products_per_order)
    .bind(template.orders_per_ship)
    .bind(template.order_spawn_count)
    .bind(now)
    .execute(pool)
    .await?;
    let business_id = result.last_insert_rowid();

    sqlx::query(
        "INSERT INTO products (
            business_id, name, cost_to_build, sales_price, weight,
            on_hand, build_active, build_duration_ms, quantity_per_build
         ) VALUES (?1, ?2, ?3, ?4, ?5, 0, 0, 0, ?6)",
    )
    .bind(business_id)
    .bind(format!("{business_name} Standard Freight"))
    .bind(DEFAULT_COST_TO_BUILD)
    .bind(DEFAULT_SALES_PRICE)
    .bind(DEFAULT_PRODUCT_WEIGHT)
    .bind(DEFAULT_PRODUCTS_PER_BUILD)
    .execute(pool)
    .await?;

    for _ in 0..AVAILABLE_TECH_POOL_SIZE {
        crate::techs::make_new_technology_available(pool, business_id, now).await?;
    }

    info!(business_id, name, "created business");
    Ok(business_id)
}

/// Load one business row.
pub async fn load_business(
    pool: &SqlitePool,
    id: i64,
) -> Result<Option<Business>, StoreError> {
    let row: Option<BusinessRow> =
        sqlx::query_as("SELECT * FROM businesses WHERE id = ?1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(StoreError::from)?;
    Ok(row.map(Business::from))
}

/// Load the immutable snapshot a tick computes over: the business, its
/// products, open orders, and acquired technologies.
pub async fn load_snapshot(
    pool: &SqlitePool,
    business_id: i64,
) -> Result<GameSnapshot, StoreError> {
    let business = load_business(pool, business_id)
        .await?
        .ok_or(StoreError::NotFound("business"))?;

    let products: Vec<ProductRow> =
        sqlx::query_as("SELECT * FROM products WHERE business_id = ?1 ORDER BY id")
            .bind(business_id)
            .fetch_all(pool)
            .await?;

    let orders: Vec<OrderRow> = sqlx::query_as(
        "SELECT * FROM orders
         WHERE business_id = ?1 AND state IN ('awaiting_shipment', 'in_progress')
         ORDER BY id",
    )
    .bind(business_id)
    .fetch_all(pool)
    .await?;

    let acquired = crate::techs::acquired_technologies(pool, business_id).await?;

    Ok(GameSnapshot {
        business,
        products: products.into_iter().map(Into::into).collect(),
        orders: orders
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<_, _>>()?,
        acquired,
    })
}

/// Flip the automation toggle; returns the new value.
pub async fn toggle_automation(
    pool: &SqlitePool,
    business_id: i64,
) -> Result<bool, StoreError> {
    let enabled: Option<bool> = sqlx::query_scalar(
        "UPDATE businesses SET automation_enabled = NOT automation_enabled
         WHERE id = ?1 AND active = 1
         RETURNING automation_enabled",
    )
    .bind(business_id)
    .fetch_optional(pool)
    .await?;
    enabled.ok_or(StoreError::NotFound("active business"))
}

/// Spend one skill point: write the new rate and move one point from
/// available to spent, guarded so a double-submit cannot spend two.
pub async fn apply_skill_spend(
    pool: &SqlitePool,
    business_id: i64,
    skill: SkillCode,
    new_rate_ms: i64,
) -> Result<(), StoreError> {
    let column = match skill {
        SkillCode::Building => "building_speed_ms",
        SkillCode::Shipping => "shipping_speed_ms",
        SkillCode::Logistics => "order_spawn_ms",
    };
    let sql = format!(
        "UPDATE businesses SET {column} = ?1,
            available_points = available_points - 1,
            points_spent = points_spent + 1
         WHERE id = ?2 AND active = 1 AND available_points > 0"
    );
    let result = sqlx::query(&sql)
        .bind(new_rate_ms)
        .bind(business_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(StoreError::Conflict("no skill point available"));
    }
    Ok(())
}

/// Clear a pending challenge flag and credit its XP, guarded on the flag
/// so a duplicate callback cannot award twice.
pub async fn apply_challenge_completion(
    pool: &SqlitePool,
    business_id: i64,
    ship_challenge: bool,
    xp: i64,
    skill_points: i64,
) -> Result<(), StoreError> {
    let flag = if ship_challenge {
        "ship_challenge_pending"
    } else {
        "build_challenge_pending"
    };
    let sql = format!(
        "UPDATE businesses SET {flag} = 0,
            xp = xp + ?1, available_points = available_points + ?2
         WHERE id = ?3 AND active = 1 AND {flag} = 1"
    );
    let result = sqlx::query(&sql)
        .bind(xp)
        .bind(skill_points)
        .bind(business_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(StoreError::Conflict("no challenge pending"));
    }
    Ok(())
}

/// Snapshot final stats and deactivate, only if still active. Used by
/// game-end and by hostile takeover so a concurrent victim tick can
/// neither resurrect nor double-finalize the row.
pub async fn finalize_business(
    pool: &SqlitePool,
    business_id: i64,
    reputation: i64,
    reason: &str,
    acquired_by: Option<&str>,
) -> Result<bool, StoreError> {
    let result = sqlx::query(
        "UPDATE businesses SET
            active = 0,
            final_money = money,
            final_tech_level = tech_level,
            final_orders_shipped = orders_shipped,
            final_reputation = ?1,
            expiration_reason = ?2,
            acquired_by = ?3
         WHERE id = ?4 AND active = 1",
    )
    .bind(reputation)
    .bind(reason)
    .bind(acquired_by)
    .bind(business_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// One row of the public leaderboard.
#[derive(Debug, sqlx::FromRow, serde::Serialize)]
pub struct LeaderboardEntry {
    pub business_name: String,
    pub money: i64,
    pub tech_level: i64,
    pub orders_shipped: i64,
    pub total_money_earned: i64,
    pub active: bool,
}

/// Top businesses by lifetime earnings; finished games report their
/// final snapshot values.
pub async fn leaderboard(
    pool: &SqlitePool,
    limit: i64,
) -> Result<Vec<LeaderboardEntry>, StoreError> {
    let rows = sqlx::query_as(
        "SELECT business_name,
                COALESCE(final_money, money) AS money,
                COALESCE(final_tech_level, tech_level) AS tech_level,
                COALESCE(final_orders_shipped, orders_shipped) AS orders_shipped,
                total_money_earned,
                active
         FROM businesses
         WHERE id != 1
         ORDER BY total_money_earned DESC
         LIMIT ?1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// One active business in the network overview.
#[derive(Debug, sqlx::FromRow, serde::Serialize)]
pub struct NetworkEntry {
    pub id: i64,
    pub business_name: String,
    pub tech_level: i64,
    pub orders_shipped: i64,
}

/// All active businesses, for the network view.
pub async fn network_overview(pool: &SqlitePool) -> Result<Vec<NetworkEntry>, StoreError> {
    let rows = sqlx::query_as(
        "SELECT id, business_name, tech_level, orders_shipped
         FROM businesses
         WHERE active = 1 AND id != 1
         ORDER BY orders_shipped DESC",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Aggregate counters for the admin projection.
#[derive(Debug, sqlx::FromRow, serde::Serialize)]
pub struct AdminStats {
    pub total_businesses: i64,
    pub active_businesses: i64,
    pub total_orders: i64,
    pub orders_shipped: i64,
    pub money_in_economy: i64,
}

pub async fn admin_stats(pool: &SqlitePool) -> Result<AdminStats, StoreError> {
    let stats = sqlx::query_as(
        "SELECT
            (SELECT COUNT(*) FROM businesses WHERE id != 1) AS total_businesses,
            (SELECT COUNT(*) FROM businesses WHERE id != 1 AND active = 1) AS active_businesses,
            (SELECT COUNT(*) FROM orders) AS total_orders,
            (SELECT COUNT(*) FROM orders WHERE state = 'shipped') AS orders_shipped,
            (SELECT COALESCE(SUM(COALESCE(final_money, money)), 0)
             FROM businesses WHERE id != 1) AS money_in_economy",
    )
    .fetch_one(pool)
    .await?;
    Ok(stats)
}
