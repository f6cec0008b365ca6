//! Order & fulfillment engine: spawn, lifecycle, shipping, idle catch-up.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use sim_core::constants::*;
use sim_core::{
    Business, GhostShipments, NewOrder, Order, OrderState, OrderTransition, Product,
};
use sim_econ::{ghost_shipments, idle_cycles, money_round, shipping_cost, spawnable_orders};
use tracing::debug;

use crate::ledger::Modifiers;
use crate::steps::{ship_duration_ms, ship_steps, Step};
use crate::EngineError;

/// An accepted shipment, ready to be applied to storage.
#[derive(Clone, Debug)]
pub struct ShipmentPlan {
    pub order_id: i64,
    pub product_id: i64,
    pub steps: Vec<Step>,
    pub duration_ms: i64,
    /// Exact cost for display; `cost_money` is the ledger deduction.
    pub cost: Decimal,
    pub cost_money: i64,
    pub started_at: DateTime<Utc>,
    pub sets_ship_challenge: bool,
    /// Sub-second shipments resolve within the same call instead of
    /// waiting out a polling round-trip.
    pub sync_transition: Option<OrderTransition>,
}

/// Result of the spawn pass.
#[derive(Clone, Debug, Default)]
pub struct SpawnOutcome {
    pub spawned: Vec<NewOrder>,
    /// New spawn clock when any spawn events elapsed.
    pub spawn_clock: Option<DateTime<Utc>>,
    pub seconds_until_next: i64,
}

/// Expire and complete outstanding orders.
///
/// Runs before order generation so the queue-size check sees the
/// post-expiry count. Overdue awaiting orders cancel; due in-progress
/// orders resolve against the stock on hand when the pass starts, late
/// deliveries coming back `Returned` and uncovered ones `Lost`.
pub fn lifecycle_pass(
    orders: &[Order],
    products: &[Product],
    now: DateTime<Utc>,
) -> Vec<OrderTransition> {
    let mut transitions = Vec::new();
    let mut stock = products.first().map_or(0, |p| p.on_hand);
    let product = products.first();

    for order in orders {
        if order.is_overdue(now) {
            transitions.push(OrderTransition {
                order_id: order.id,
                from: OrderState::AwaitingShipment,
                to: OrderState::Canceled,
                product_id: None,
                revenue: 0,
                stock_delta: 0,
            });
            continue;
        }
        if !order.shipping_finished_by(now) {
            continue;
        }
        let finished_at = order.started_at.unwrap_or(now)
            + Duration::milliseconds(order.duration_ms.unwrap_or(0));
        let transition = resolve_completion(order, product, &mut stock, finished_at);
        transitions.push(transition);
    }
    transitions
}

fn resolve_completion(
    order: &Order,
    product: Option<&Product>,
    stock: &mut i64,
    finished_at: DateTime<Utc>,
) -> OrderTransition {
    let to = if finished_at > order.due_by {
        OrderState::Returned
    } else if *stock >= order.quantity {
        OrderState::Shipped
    } else {
        OrderState::Lost
    };
    let (revenue, stock_delta) = match to {
        OrderState::Shipped => {
            *stock -= order.quantity;
            let price = product.map_or(0, |p| p.sales_price);
            (order.quantity * price, -order.quantity)
        }
        _ => (0, 0),
    };
    OrderTransition {
        order_id: order.id,
        from: OrderState::InProgress,
        to,
        product_id: product.map(|p| p.id),
        revenue,
        stock_delta,
    }
}

/// Generate new orders from elapsed spawn-clock time.
///
/// One spawn event per interval (advertising shortens it), capped so the
/// active queue never exceeds its limit; missed events beyond the cap
/// are discarded rather than banked.
pub fn spawn_pass<R: Rng>(
    business: &Business,
    mods: &Modifiers,
    active_orders: usize,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Result<SpawnOutcome, EngineError> {
    let interval_ms =
        ((business.order_spawn_ms as f64 * mods.spawn_interval_factor()).round() as i64).max(1);
    let elapsed_ms = (now - business.last_order_spawned_at).num_milliseconds();
    let events = idle_cycles(elapsed_ms, interval_ms)?;
    let to_create = spawnable_orders(
        elapsed_ms,
        interval_ms,
        business.order_spawn_count,
        active_orders,
        MAXIMUM_ORDER_QUEUE_SIZE,
    )?;

    let mut spawned = Vec::new();
    for _ in 0..to_create {
        spawned.push(NewOrder {
            quantity: business.products_per_order,
            distance_miles: rng.gen_range(MIN_ORDER_DISTANCE_MILES..=MAX_ORDER_DISTANCE_MILES),
            created_at: now,
            due_by: now + Duration::seconds(ORDER_DUE_SECONDS),
        });
    }

    let spawn_clock = (events > 0)
        .then(|| business.last_order_spawned_at + Duration::milliseconds(events * interval_ms));
    let next_at =
        spawn_clock.unwrap_or(business.last_order_spawned_at) + Duration::milliseconds(interval_ms);
    Ok(SpawnOutcome {
        spawned,
        spawn_clock,
        seconds_until_next: (next_at - now).num_seconds().max(0),
    })
}

/// Player-initiated shipping of one awaiting order.
///
/// With a route planner the most urgent order ships first; without one
/// the pick is uniformly random, the intended penalty for not owning it.
pub fn ship_order<R: Rng>(
    business: &Business,
    products: &[Product],
    orders: &[Order],
    mods: &Modifiers,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Result<ShipmentPlan, EngineError> {
    if orders.iter().any(|o| o.state == OrderState::InProgress) {
        return Err(EngineError::OrderInProgress);
    }
    let candidates: Vec<&Order> = orders
        .iter()
        .filter(|o| o.state == OrderState::AwaitingShipment)
        .collect();
    if candidates.is_empty() {
        return Err(EngineError::NoOrdersAwaiting);
    }
    let order = if mods.route_planner() {
        candidates
            .iter()
            .min_by_key(|o| o.due_by)
            .copied()
            .ok_or(EngineError::NoOrdersAwaiting)?
    } else {
        candidates[rng.gen_range(0..candidates.len())]
    };

    let Some(product) = products.first() else {
        return Err(EngineError::MissingProduct);
    };
    if product.on_hand < order.quantity && !mods.just_in_time() {
        return Err(EngineError::NotEnoughInventory);
    }

    let cost = shipping_cost(
        order.distance_miles,
        mods.shipping_discount(),
        business.logistics_penalty,
        product.cost_to_build,
    )?;
    let cost_money = money_round(cost);
    if business.money - cost_money < MONEY_SAFETY_FLOOR {
        return Err(EngineError::NotEnoughMoney);
    }

    let duration_ms = ship_duration_ms(business, mods);
    let sync_transition = if duration_ms <= SYNC_COMPLETE_THRESHOLD_MS {
        let mut stock = product.on_hand;
        let finished_at = now + Duration::milliseconds(duration_ms);
        debug!(order = order.id, duration_ms, "sub-second shipment, resolving in-call");
        Some(resolve_completion(order, Some(product), &mut stock, finished_at))
    } else {
        None
    };

    Ok(ShipmentPlan {
        order_id: order.id,
        product_id: product.id,
        steps: ship_steps(mods),
        duration_ms,
        cost,
        cost_money,
        started_at: now,
        sets_ship_challenge: true,
        sync_transition,
    })
}

/// Idle catch-up shipping: convert elapsed time into ghost completions.
///
/// `stock` is the inventory left after this tick's lifecycle and
/// production passes, so same-tick auto-build output is shippable.
/// Deltas are aggregated into one batch to bound write amplification.
pub fn ghost_pass(
    business: &Business,
    products: &[Product],
    stock: i64,
    mods: &Modifiers,
    elapsed_ms: i64,
) -> Result<Option<GhostShipments>, EngineError> {
    if !mods.auto_ship() {
        return Ok(None);
    }
    let Some(product) = products.first() else {
        return Ok(None);
    };
    let duration_ms = ship_duration_ms(business, mods);
    let shipments = ghost_shipments(
        elapsed_ms,
        duration_ms,
        business.orders_per_ship,
        stock,
        business.products_per_order,
    )?;
    if shipments == 0 {
        return Ok(None);
    }

    let midpoint = (MIN_ORDER_DISTANCE_MILES + MAX_ORDER_DISTANCE_MILES) / 2;
    let cost_each = money_round(shipping_cost(
        midpoint,
        mods.shipping_discount(),
        business.logistics_penalty,
        product.cost_to_build,
    )?);
    let units = shipments * business.products_per_order;
    Ok(Some(GhostShipments {
        product_id: product.id,
        shipments,
        units,
        revenue: units * product.sales_price,
        cost: shipments * cost_each,
    }))
}
