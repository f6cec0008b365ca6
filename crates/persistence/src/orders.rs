//! Order rows: shipment application and reputation inputs.

use chrono::{DateTime, Utc};
use sim_core::{OrderState, OrderTransition};
use sqlx::{Sqlite, SqlitePool};

use crate::StoreError;

/// Apply an accepted shipment plan.
///
/// The order moves to in-progress only from awaiting (a concurrent ship
/// call loses the guard), the cost is an arithmetic deduction, and a
/// sub-second plan's synchronous completion lands in the same
/// transaction.
#[allow(clippy::too_many_arguments)]
pub async fn apply_shipment(
    pool: &SqlitePool,
    business_id: i64,
    order_id: i64,
    started_at: DateTime<Utc>,
    duration_ms: i64,
    cost_money: i64,
    sets_ship_challenge: bool,
    sync: Option<&OrderTransition>,
) -> Result<(), StoreError> {
    let mut tx = pool.begin().await?;

    let started = sqlx::query(
        "UPDATE orders SET state = 'in_progress', started_at = ?1,
            duration_ms = ?2, shipping_cost = ?3
         WHERE id = ?4 AND business_id = ?5 AND state = 'awaiting_shipment'",
    )
    .bind(started_at)
    .bind(duration_ms)
    .bind(cost_money)
    .bind(order_id)
    .bind(business_id)
    .execute(&mut *tx)
    .await?;
    if started.rows_affected() == 0 {
        return Err(StoreError::Conflict("order is no longer awaiting shipment"));
    }

    sqlx::query("UPDATE businesses SET money = money - ?1 WHERE id = ?2")
        .bind(cost_money)
        .bind(business_id)
        .execute(&mut *tx)
        .await?;
    if sets_ship_challenge {
        sqlx::query("UPDATE businesses SET ship_challenge_pending = 1 WHERE id = ?1")
            .bind(business_id)
            .execute(&mut *tx)
            .await?;
    }

    if let Some(t) = sync {
        apply_transition_on(&mut tx, business_id, t).await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Apply one order transition: the state moves only from its expected
/// source, and money/stock/counters follow only when that guard lands.
pub(crate) async fn apply_transition_on(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    business_id: i64,
    t: &OrderTransition,
) -> Result<bool, StoreError> {
    let moved = sqlx::query("UPDATE orders SET state = ?1 WHERE id = ?2 AND state = ?3")
        .bind(t.to.as_str())
        .bind(t.order_id)
        .bind(t.from.as_str())
        .execute(&mut **tx)
        .await?;
    if moved.rows_affected() == 0 {
        return Ok(false);
    }

    if t.revenue != 0 || t.to == OrderState::Shipped {
        let shipped = i64::from(t.to == OrderState::Shipped);
        sqlx::query(
            "UPDATE businesses SET money = money + ?1,
                total_money_earned = total_money_earned + ?1,
                orders_shipped = orders_shipped + ?2
             WHERE id = ?3",
        )
        .bind(t.revenue)
        .bind(shipped)
        .bind(business_id)
        .execute(&mut **tx)
        .await?;
    }
    if let (Some(product_id), delta) = (t.product_id, t.stock_delta) {
        if delta != 0 {
            let adjusted = sqlx::query(
                "UPDATE products SET on_hand = on_hand + ?1
                 WHERE id = ?2 AND on_hand + ?1 >= 0",
            )
            .bind(delta)
            .bind(product_id)
            .execute(&mut **tx)
            .await?;
            if adjusted.rows_affected() == 0 {
                return Err(StoreError::Conflict("inventory underflow"));
            }
        }
    }
    Ok(true)
}

/// Positive/negative terminal outcome counts for orders created in the
/// trailing reputation window.
pub async fn reputation_counts(
    pool: &SqlitePool,
    business_id: i64,
    window_start: DateTime<Utc>,
) -> Result<(u64, u64), StoreError> {
    let mut conn = pool.acquire().await?;
    reputation_counts_on(&mut *conn, business_id, window_start).await
}

pub(crate) async fn reputation_counts_on<'c, E>(
    executor: E,
    business_id: i64,
    window_start: DateTime<Utc>,
) -> Result<(u64, u64), StoreError>
where
    E: sqlx::Executor<'c, Database = Sqlite>,
{
    let (positive, negative): (i64, i64) = sqlx::query_as(
        "SELECT
            COALESCE(SUM(state = 'shipped'), 0),
            COALESCE(SUM(state IN ('canceled', 'lost', 'returned')), 0)
         FROM orders
         WHERE business_id = ?1 AND created_at >= ?2",
    )
    .bind(business_id)
    .bind(window_start)
    .fetch_one(executor)
    .await?;
    Ok((positive as u64, negative as u64))
}
