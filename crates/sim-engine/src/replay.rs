//! In-memory application of tick outcomes to a snapshot.
//!
//! Mirrors the storage layer's apply semantics for callers that run the
//! simulation without a database: the headless CLI and tests. Keeping
//! this next to the engines pins down what "applying a delta" means
//! independently of SQL.

use chrono::{DateTime, Utc};
use sim_core::{GameSnapshot, Order, OrderState, TickOutcome};

use crate::orders::ShipmentPlan;
use crate::production::BuildPlan;
use crate::progression::XpAward;

/// Apply one tick outcome and stamp the tick clock.
pub fn apply(snapshot: &mut GameSnapshot, outcome: &TickOutcome, now: DateTime<Utc>) {
    let b = &mut snapshot.business;
    b.last_game_update = now;

    if let Some(reason) = outcome.expired {
        b.active = false;
        b.final_money = Some(b.money);
        b.final_tech_level = Some(b.tech_level);
        b.final_orders_shipped = Some(b.orders_shipped);
        b.expiration_reason = Some(reason.as_str().to_string());
        return;
    }

    snapshot
        .acquired
        .retain(|a| !outcome.revoked_technologies.contains(&a.code));

    for t in &outcome.transitions {
        if let Some(order) = snapshot.orders.iter_mut().find(|o| o.id == t.order_id) {
            order.state = t.to;
        }
        b.money += t.revenue;
        b.total_money_earned += t.revenue;
        if t.to == OrderState::Shipped {
            b.orders_shipped += 1;
        }
        if let (Some(pid), delta) = (t.product_id, t.stock_delta) {
            if let Some(p) = snapshot.products.iter_mut().find(|p| p.id == pid) {
                p.on_hand += delta;
            }
        }
    }
    snapshot.orders.retain(|o| o.state.is_active());

    let mut next_id = snapshot.orders.iter().map(|o| o.id).max().unwrap_or(0) + 1;
    for new in &outcome.spawned {
        snapshot.orders.push(Order {
            id: next_id,
            business_id: b.id,
            quantity: new.quantity,
            distance_miles: new.distance_miles,
            state: OrderState::AwaitingShipment,
            created_at: new.created_at,
            due_by: new.due_by,
            started_at: None,
            duration_ms: None,
            shipping_cost: None,
        });
        next_id += 1;
    }
    if let Some(clock) = outcome.spawn_clock {
        b.last_order_spawned_at = clock;
    }

    for c in &outcome.production.completed {
        if let Some(p) = snapshot.products.iter_mut().find(|p| p.id == c.product_id) {
            p.build_active = false;
            p.on_hand += c.quantity;
        }
    }
    if let Some(auto) = &outcome.production.auto {
        b.money -= auto.cost;
        if let Some(p) = snapshot.products.iter_mut().find(|p| p.id == auto.product_id) {
            p.on_hand += auto.units;
        }
    }
    if let Some(started) = &outcome.production.started {
        b.money -= started.cost;
        if let Some(p) = snapshot.products.iter_mut().find(|p| p.id == started.product_id) {
            p.build_active = true;
            p.build_started_at = Some(started.started_at);
            p.build_duration_ms = started.duration_ms;
            p.quantity_per_build = started.quantity;
        }
    }

    if let Some(ghost) = &outcome.ghost {
        b.money += ghost.revenue - ghost.cost;
        b.total_money_earned += ghost.revenue;
        b.orders_shipped += ghost.shipments;
        if let Some(p) = snapshot.products.iter_mut().find(|p| p.id == ghost.product_id) {
            p.on_hand -= ghost.units;
        }
    }

    b.xp += outcome.xp_awarded;
    b.available_points += outcome.skill_points_earned;
}

/// Apply a manual build start.
pub fn apply_build(snapshot: &mut GameSnapshot, plan: &BuildPlan) {
    if let Some(c) = &plan.completed {
        if let Some(p) = snapshot.products.iter_mut().find(|p| p.id == c.product_id) {
            p.build_active = false;
            p.on_hand += c.quantity;
        }
    }
    let b = &mut snapshot.business;
    b.money -= plan.started.cost;
    if plan.sets_build_challenge {
        b.build_challenge_pending = true;
    }
    if let Some(p) = snapshot
        .products
        .iter_mut()
        .find(|p| p.id == plan.started.product_id)
    {
        p.build_active = true;
        p.build_started_at = Some(plan.started.started_at);
        p.build_duration_ms = plan.started.duration_ms;
        p.quantity_per_build = plan.started.quantity;
    }
}

/// Apply an accepted shipment, including its synchronous fast path.
pub fn apply_shipment(snapshot: &mut GameSnapshot, plan: &ShipmentPlan) {
    {
        let b = &mut snapshot.business;
        b.money -= plan.cost_money;
        if plan.sets_ship_challenge {
            b.ship_challenge_pending = true;
        }
    }
    if let Some(order) = snapshot.orders.iter_mut().find(|o| o.id == plan.order_id) {
        order.state = OrderState::InProgress;
        order.started_at = Some(plan.started_at);
        order.duration_ms = Some(plan.duration_ms);
        order.shipping_cost = Some(plan.cost_money);
    }

    if let Some(t) = &plan.sync_transition {
        let b = &mut snapshot.business;
        b.money += t.revenue;
        b.total_money_earned += t.revenue;
        if t.to == OrderState::Shipped {
            b.orders_shipped += 1;
        }
        if let Some(order) = snapshot.orders.iter_mut().find(|o| o.id == t.order_id) {
            order.state = t.to;
        }
        if let Some(pid) = t.product_id {
            if let Some(p) = snapshot.products.iter_mut().find(|p| p.id == pid) {
                p.on_hand += t.stock_delta;
            }
        }
        snapshot.orders.retain(|o| o.state.is_active());
    }
}

/// Apply a challenge completion.
pub fn apply_challenge(
    snapshot: &mut GameSnapshot,
    kind: crate::progression::ChallengeKind,
    award: &XpAward,
) {
    let b = &mut snapshot.business;
    match kind {
        crate::progression::ChallengeKind::Truck => b.ship_challenge_pending = false,
        crate::progression::ChallengeKind::Haystack => b.build_challenge_pending = false,
    }
    b.xp += award.xp;
    b.available_points += award.skill_points;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Modifiers;
    use crate::production::start_build;
    use chrono::{Duration, TimeZone};
    use sim_core::constants::*;
    use sim_core::{Business, Product};

    fn t0() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    fn snapshot() -> GameSnapshot {
        GameSnapshot {
            business: Business::template(t0()),
            products: vec![Product {
                id: 10,
                business_id: 1,
                name: "Widget".to_string(),
                cost_to_build: DEFAULT_COST_TO_BUILD,
                sales_price: DEFAULT_SALES_PRICE,
                weight: DEFAULT_PRODUCT_WEIGHT,
                on_hand: 0,
                build_active: false,
                build_started_at: None,
                build_duration_ms: 0,
                quantity_per_build: DEFAULT_PRODUCTS_PER_BUILD,
            }],
            orders: Vec::new(),
            acquired: Vec::new(),
        }
    }

    #[test]
    fn manual_build_scenario_from_the_rulebook() {
        // money=1000, cost_to_build=10, batch of 5: build then complete
        // leaves money=950 and on_hand up by 5.
        let mut snap = snapshot();
        let mods = Modifiers::at(&[], t0());
        let plan = start_build(&snap.business, &snap.products, &mods, t0()).unwrap();
        apply_build(&mut snap, &plan);
        assert_eq!(snap.business.money, 950);
        assert_eq!(snap.products[0].on_hand, 0);
        assert!(snap.products[0].build_active);

        let done = t0() + Duration::milliseconds(plan.started.duration_ms);
        let outcome = crate::advance(
            &snap,
            done,
            &mut <rand_chacha::ChaCha8Rng as rand::SeedableRng>::seed_from_u64(1),
        )
        .unwrap();
        apply(&mut snap, &outcome, done);
        assert_eq!(snap.business.money, 950);
        assert_eq!(snap.products[0].on_hand, 5);
        assert!(!snap.products[0].build_active);
    }
}
