//! Applying tick outcomes and build plans as atomic storage operations.

use chrono::{DateTime, Utc};
use sim_core::{CompletedBuild, StartedBuild, TickOutcome};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::warn;

use crate::orders::apply_transition_on;
use crate::StoreError;

/// Apply one tick outcome.
///
/// Ownership of the tick is taken with a compare-and-swap on
/// `last_game_update`; when a concurrent poll already advanced the
/// clock, nothing is applied and `Ok(false)` is returned, leaving the
/// loser's caller to respond from a fresh read. Every mutation inside is
/// a guarded arithmetic update, so a partially raced tick cannot lose or
/// fabricate money, inventory, or order completions.
pub async fn apply_tick(
    pool: &SqlitePool,
    business_id: i64,
    expected_last_update: DateTime<Utc>,
    now: DateTime<Utc>,
    outcome: &TickOutcome,
    final_reputation: i64,
) -> Result<bool, StoreError> {
    let mut tx = pool.begin().await?;

    let owned = sqlx::query(
        "UPDATE businesses SET last_game_update = ?1
         WHERE id = ?2 AND active = 1 AND last_game_update = ?3",
    )
    .bind(now)
    .bind(business_id)
    .bind(expected_last_update)
    .execute(&mut *tx)
    .await?;
    if owned.rows_affected() == 0 {
        warn!(business_id, "tick lost its compare-and-swap, applying nothing");
        return Ok(false);
    }

    if let Some(reason) = outcome.expired {
        sqlx::query(
            "UPDATE businesses SET
                active = 0,
                final_money = money,
                final_tech_level = tech_level,
                final_orders_shipped = orders_shipped,
                final_reputation = ?1,
                expiration_reason = ?2
             WHERE id = ?3 AND active = 1",
        )
        .bind(final_reputation)
        .bind(reason.as_str())
        .bind(business_id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        return Ok(true);
    }

    for code in &outcome.revoked_technologies {
        sqlx::query(
            "DELETE FROM acquired_technologies
             WHERE business_id = ?1 AND technology_id IN
                (SELECT id FROM technologies WHERE code = ?2)",
        )
        .bind(business_id)
        .bind(code.as_str())
        .execute(&mut *tx)
        .await?;
    }

    for t in &outcome.transitions {
        apply_transition_on(&mut tx, business_id, t).await?;
    }

    for o in &outcome.spawned {
        sqlx::query(
            "INSERT INTO orders
                (business_id, quantity, distance_miles, state, created_at, due_by)
             VALUES (?1, ?2, ?3, 'awaiting_shipment', ?4, ?5)",
        )
        .bind(business_id)
        .bind(o.quantity)
        .bind(o.distance_miles)
        .bind(o.created_at)
        .bind(o.due_by)
        .execute(&mut *tx)
        .await?;
    }
    if let Some(clock) = outcome.spawn_clock {
        sqlx::query("UPDATE businesses SET last_order_spawned_at = ?1 WHERE id = ?2")
            .bind(clock)
            .bind(business_id)
            .execute(&mut *tx)
            .await?;
    }

    for c in &outcome.production.completed {
        complete_build_on(&mut tx, c).await?;
    }
    if let Some(auto) = &outcome.production.auto {
        sqlx::query("UPDATE businesses SET money = money - ?1 WHERE id = ?2")
            .bind(auto.cost)
            .bind(business_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE products SET on_hand = on_hand + ?1 WHERE id = ?2")
            .bind(auto.units)
            .bind(auto.product_id)
            .execute(&mut *tx)
            .await?;
    }
    if let Some(started) = &outcome.production.started {
        start_build_on(&mut tx, business_id, started).await?;
    }

    if let Some(ghost) = &outcome.ghost {
        let consumed = sqlx::query(
            "UPDATE products SET on_hand = on_hand - ?1
             WHERE id = ?2 AND on_hand >= ?1",
        )
        .bind(ghost.units)
        .bind(ghost.product_id)
        .execute(&mut *tx)
        .await?;
        if consumed.rows_affected() == 1 {
            sqlx::query(
                "UPDATE businesses SET
                    money = money + ?1,
                    total_money_earned = total_money_earned + ?2,
                    orders_shipped = orders_shipped + ?3
                 WHERE id = ?4",
            )
            .bind(ghost.revenue - ghost.cost)
            .bind(ghost.revenue)
            .bind(ghost.shipments)
            .bind(business_id)
            .execute(&mut *tx)
            .await?;
        }
    }

    if outcome.xp_awarded != 0 {
        sqlx::query(
            "UPDATE businesses SET xp = xp + ?1,
                available_points = available_points + ?2
             WHERE id = ?3",
        )
        .bind(outcome.xp_awarded)
        .bind(outcome.skill_points_earned)
        .bind(business_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(true)
}

/// Apply a manual build start (with its optional folded-in completion).
pub async fn apply_build(
    pool: &SqlitePool,
    business_id: i64,
    completed: Option<&CompletedBuild>,
    started: &StartedBuild,
    sets_build_challenge: bool,
) -> Result<(), StoreError> {
    let mut tx = pool.begin().await?;
    if let Some(c) = completed {
        complete_build_on(&mut tx, c).await?;
    }
    start_build_on(&mut tx, business_id, started).await?;
    if sets_build_challenge {
        sqlx::query("UPDATE businesses SET build_challenge_pending = 1 WHERE id = ?1")
            .bind(business_id)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;
    Ok(())
}

/// Credit a finished build; the `build_active` guard makes a duplicate
/// completion a no-op instead of double-crediting inventory.
async fn complete_build_on(
    tx: &mut Transaction<'_, Sqlite>,
    c: &CompletedBuild,
) -> Result<(), StoreError> {
    sqlx::query(
        "UPDATE products SET build_active = 0, on_hand = on_hand + ?1
         WHERE id = ?2 AND build_active = 1",
    )
    .bind(c.quantity)
    .bind(c.product_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Start a build and pay for it; guarded so two concurrent starts
/// cannot both charge.
async fn start_build_on(
    tx: &mut Transaction<'_, Sqlite>,
    business_id: i64,
    started: &StartedBuild,
) -> Result<(), StoreError> {
    let result = sqlx::query(
        "UPDATE products SET build_active = 1, build_started_at = ?1,
            build_duration_ms = ?2, quantity_per_build = ?3
         WHERE id = ?4 AND build_active = 0",
    )
    .bind(started.started_at)
    .bind(started.duration_ms)
    .bind(started.quantity)
    .bind(started.product_id)
    .execute(&mut **tx)
    .await?;
    if result.rows_affected() == 0 {
        return Err(StoreError::Conflict("product already building"));
    }
    sqlx::query("UPDATE businesses SET money = money - ?1 WHERE id = ?2")
        .bind(started.cost)
        .bind(business_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}
