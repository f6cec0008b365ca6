#![deny(warnings)]

//! Economic helpers for Freight Tycoon.
//!
//! This module provides validated, closed-form arithmetic for:
//! - Shipping cost from distance, discounts, and penalties
//! - Idle catch-up cycle counts (production and ghost shipping)
//! - Order spawn counts against a queue cap
//! - The windowed reputation ratio
//! - Skill-point economics
//!
//! Everything here is pure; elapsed time comes in as a number, never a
//! clock read. Fractional money math uses `Decimal`; ledger money is an
//! `i64` obtained through [`money_round`].

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use sim_core::constants::{COST_PER_MILE_HUNDREDTHS, LOGISTICS_PENALTY_PERCENT};
use thiserror::Error;

/// Errors produced by economic helpers.
#[derive(Debug, Error, PartialEq)]
pub enum EconError {
    /// Durations and intervals must be strictly positive.
    #[error("invalid duration: {0} ms")]
    InvalidDuration(i64),
    /// Quantities must be strictly positive.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(i64),
    /// Fractions must lie in [0, 1) and be finite.
    #[error("invalid fraction: {0}")]
    InvalidFraction(f64),
    /// Distances must be non-negative.
    #[error("invalid distance: {0}")]
    InvalidDistance(i64),
    /// Numeric conversion to decimal failed.
    #[error("non-finite numeric conversion")]
    NonFinite,
}

/// The flat per-mile shipping rate (0.05).
pub fn cost_per_mile() -> Decimal {
    Decimal::new(COST_PER_MILE_HUNDREDTHS, 2)
}

/// Shipping cost for one order.
///
/// `distance x cost-per-mile x (1 - discount) x penalty + build_cost`,
/// where `penalty` is the exclusive-logistics factor when flagged.
///
/// Example:
/// shipping_cost(100, 0.0, false, 0) == 5;
/// shipping_cost(100, 0.5, false, 0) == 2.5.
pub fn shipping_cost(
    distance_miles: i64,
    discount_frac: f64,
    logistics_penalty: bool,
    build_cost: i64,
) -> Result<Decimal, EconError> {
    if distance_miles < 0 {
        return Err(EconError::InvalidDistance(distance_miles));
    }
    if !(0.0..1.0).contains(&discount_frac) || !discount_frac.is_finite() {
        return Err(EconError::InvalidFraction(discount_frac));
    }
    let keep = Decimal::from_f64(1.0 - discount_frac).ok_or(EconError::NonFinite)?;
    let mut cost = Decimal::from(distance_miles) * cost_per_mile() * keep;
    if logistics_penalty {
        cost *= Decimal::new(LOGISTICS_PENALTY_PERCENT, 2);
    }
    Ok(cost + Decimal::from(build_cost))
}

/// Round a decimal amount to whole ledger money, midpoints away from zero.
pub fn money_round(amount: Decimal) -> i64 {
    amount
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or(i64::MAX)
}

/// Whole cycles of a fixed duration that fit in an elapsed interval.
///
/// The closed form behind every idle catch-up path: never iterate ticks.
pub fn idle_cycles(elapsed_ms: i64, cycle_ms: i64) -> Result<i64, EconError> {
    if cycle_ms <= 0 {
        return Err(EconError::InvalidDuration(cycle_ms));
    }
    Ok((elapsed_ms.max(0)) / cycle_ms)
}

/// Clamp retroactive build cycles so money never sinks below the floor.
pub fn affordable_cycles(cycles: i64, money: i64, floor: i64, cost_per_cycle: i64) -> i64 {
    if cycles <= 0 || cost_per_cycle <= 0 {
        return cycles.max(0);
    }
    let headroom = money.saturating_sub(floor);
    if headroom <= 0 {
        return 0;
    }
    cycles.min(headroom / cost_per_cycle)
}

/// Orders to create this tick: spawn events that fit in the elapsed
/// interval, times the per-event count, capped by free queue slots.
pub fn spawnable_orders(
    elapsed_ms: i64,
    interval_ms: i64,
    spawn_count: i64,
    active_orders: usize,
    max_queue: usize,
) -> Result<i64, EconError> {
    if spawn_count <= 0 {
        return Err(EconError::InvalidQuantity(spawn_count));
    }
    let events = idle_cycles(elapsed_ms, interval_ms)?;
    let free = max_queue.saturating_sub(active_orders) as i64;
    Ok((events * spawn_count).min(free).max(0))
}

/// Ghost shipments an idle interval yields, stock-limited.
///
/// `floor(elapsed / duration) x orders_per_ship`, stopping the moment
/// stock cannot cover another `units_per_order` batch. Never ships more
/// than available inventory allows.
pub fn ghost_shipments(
    elapsed_ms: i64,
    ship_duration_ms: i64,
    orders_per_ship: i64,
    stock: i64,
    units_per_order: i64,
) -> Result<i64, EconError> {
    if orders_per_ship <= 0 {
        return Err(EconError::InvalidQuantity(orders_per_ship));
    }
    if units_per_order <= 0 {
        return Err(EconError::InvalidQuantity(units_per_order));
    }
    let by_time = idle_cycles(elapsed_ms, ship_duration_ms)?
        .saturating_mul(orders_per_ship);
    let by_stock = stock.max(0) / units_per_order;
    Ok(by_time.min(by_stock))
}

/// Reputation score over a window of terminal order outcomes.
///
/// `round(positive / (positive + negative) * 100)`; 100 when there are
/// no qualifying samples (no negative signal yet).
pub fn reputation_score(positive: u64, negative: u64) -> u8 {
    let total = positive + negative;
    if total == 0 {
        return 100;
    }
    let ratio = Decimal::from(positive) * Decimal::from(100u64) / Decimal::from(total);
    ratio
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u32()
        .unwrap_or(100)
        .min(100) as u8
}

/// Skill points newly earned by an XP award, given the per-point cost.
pub fn skill_points_earned(xp_before: i64, awarded: i64, per_point: i64) -> i64 {
    if per_point <= 0 || awarded <= 0 {
        return 0;
    }
    let before = xp_before.max(0);
    (before + awarded) / per_point - before / per_point
}

/// Apply one skill point to a rate: 10% faster, floored.
pub fn apply_skill_point(rate_ms: i64, floor_ms: i64) -> i64 {
    ((rate_ms * 9) / 10).max(floor_ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn shipping_cost_base_case() {
        let c = shipping_cost(100, 0.0, false, 0).unwrap();
        assert_eq!(c, Decimal::new(5, 0));
    }

    #[test]
    fn shipping_cost_with_discount() {
        let c = shipping_cost(100, 0.5, false, 0).unwrap();
        assert_eq!(c, Decimal::new(25, 1)); // 2.5
        assert_eq!(money_round(c), 3);
    }

    #[test]
    fn shipping_cost_with_penalty_and_build() {
        let c = shipping_cost(100, 0.0, true, 10).unwrap();
        assert_eq!(c, Decimal::new(1625, 2)); // 5 * 1.25 + 10
    }

    #[test]
    fn shipping_cost_rejects_bad_inputs() {
        assert!(shipping_cost(-1, 0.0, false, 0).is_err());
        assert!(shipping_cost(10, 1.0, false, 0).is_err());
        assert!(shipping_cost(10, f64::NAN, false, 0).is_err());
    }

    #[test]
    fn idle_cycles_floors() {
        assert_eq!(idle_cycles(14_999, 5000).unwrap(), 2);
        assert_eq!(idle_cycles(15_000, 5000).unwrap(), 3);
        assert_eq!(idle_cycles(-5, 5000).unwrap(), 0);
        assert!(idle_cycles(1000, 0).is_err());
    }

    #[test]
    fn affordable_cycles_respects_floor() {
        // 900 of headroom over the floor buys 18 cycles at 50 each.
        assert_eq!(affordable_cycles(100, 800, -100, 50), 18);
        assert_eq!(affordable_cycles(100, -100, -100, 50), 0);
        assert_eq!(affordable_cycles(3, 1_000_000, -100, 50), 3);
    }

    #[test]
    fn spawnable_orders_caps_at_queue() {
        assert_eq!(spawnable_orders(45_000, 15_000, 1, 0, 5).unwrap(), 3);
        assert_eq!(spawnable_orders(450_000, 15_000, 1, 0, 5).unwrap(), 5);
        assert_eq!(spawnable_orders(45_000, 15_000, 1, 5, 5).unwrap(), 0);
        assert_eq!(spawnable_orders(1000, 15_000, 1, 0, 5).unwrap(), 0);
    }

    #[test]
    fn ghost_shipments_stop_at_stock() {
        // Time allows 10 shipments, stock only 2 batches of 5.
        assert_eq!(ghost_shipments(30_000, 3000, 1, 10, 5).unwrap(), 2);
        // Stock allows plenty, time allows 3.
        assert_eq!(ghost_shipments(9000, 3000, 1, 1000, 5).unwrap(), 3);
        assert_eq!(ghost_shipments(9000, 3000, 1, 4, 5).unwrap(), 0);
    }

    #[test]
    fn reputation_score_edges() {
        assert_eq!(reputation_score(0, 0), 100);
        assert_eq!(reputation_score(10, 0), 100);
        assert_eq!(reputation_score(1, 1), 50);
        assert_eq!(reputation_score(0, 7), 0);
        assert_eq!(reputation_score(2, 1), 67);
    }

    #[test]
    fn skill_points_cross_thresholds() {
        assert_eq!(skill_points_earned(0, 100, 100), 1);
        assert_eq!(skill_points_earned(90, 25, 100), 1);
        assert_eq!(skill_points_earned(90, 5, 100), 0);
        assert_eq!(skill_points_earned(50, 250, 100), 3);
    }

    #[test]
    fn skill_point_floors_rate() {
        assert_eq!(apply_skill_point(5000, 500), 4500);
        assert_eq!(apply_skill_point(520, 500), 500);
    }

    proptest! {
        #[test]
        fn idle_catchup_equivalence(total in 0i64..1_000_000, cycle in 1i64..10_000, split in 0i64..1_000_000) {
            // One large interval never yields fewer cycles than any
            // two-way split of it, and at most one more.
            let split = split.min(total);
            let whole = idle_cycles(total, cycle).unwrap();
            let parts = idle_cycles(split, cycle).unwrap() + idle_cycles(total - split, cycle).unwrap();
            prop_assert!(parts <= whole);
            prop_assert!(whole - parts <= 1);
        }

        #[test]
        fn ghost_shipments_never_exceed_stock(elapsed in 0i64..10_000_000, dur in 1i64..100_000, stock in 0i64..10_000, per in 1i64..100) {
            let n = ghost_shipments(elapsed, dur, 1, stock, per).unwrap();
            prop_assert!(n * per <= stock);
        }

        #[test]
        fn reputation_bounded(p in 0u64..10_000, n in 0u64..10_000) {
            let s = reputation_score(p, n);
            prop_assert!(s <= 100);
            if n == 0 {
                prop_assert_eq!(s, 100);
            }
        }

        #[test]
        fn spawn_never_overfills_queue(elapsed in 0i64..10_000_000, interval in 1i64..100_000, active in 0usize..6) {
            let n = spawnable_orders(elapsed, interval, 1, active, 5).unwrap();
            prop_assert!(active as i64 + n <= 5);
        }
    }
}
