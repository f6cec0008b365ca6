//! Production engine: inventory built from elapsed time and build actions.

use chrono::{DateTime, Duration, Utc};
use sim_core::constants::MONEY_SAFETY_FLOOR;
use sim_core::{AutoBuild, Business, CompletedBuild, Product, ProductionDelta, StartedBuild};
use sim_econ::{affordable_cycles, idle_cycles};
use tracing::debug;

use crate::ledger::Modifiers;
use crate::steps::{build_duration_ms, build_steps, Step};
use crate::EngineError;

/// Result of a manual build start. A build that already ran its full
/// duration is completed in the same action before the new one starts.
#[derive(Clone, Debug)]
pub struct BuildPlan {
    pub completed: Option<CompletedBuild>,
    pub started: StartedBuild,
    pub steps: Vec<Step>,
    /// Warehouse challenge attaches unless smart inventory is owned.
    pub sets_build_challenge: bool,
}

/// Advance building from elapsed time.
///
/// Completes any build that ran its duration, then (with the automation
/// technology and the toggle on) synthesizes retroactive build cycles in
/// closed form and restarts the line. Cycles are anchored at the end of
/// the last completed build and the restart is backdated to keep the
/// cycle chain contiguous, so many small ticks and one large catch-up
/// tick yield the same aggregate output. Auto cycles may drive money
/// negative, clamped at the safety floor.
pub fn production_tick(
    business: &Business,
    products: &[Product],
    mods: &Modifiers,
    now: DateTime<Utc>,
) -> Result<ProductionDelta, EngineError> {
    let mut delta = ProductionDelta::default();

    for product in products {
        if product.build_finished_by(now) {
            delta.completed.push(CompletedBuild {
                product_id: product.id,
                quantity: product.quantity_per_build,
            });
        }
    }

    if !(mods.auto_build() && business.automation_enabled) {
        return Ok(delta);
    }
    let Some(target) = products.first() else {
        return Err(EngineError::MissingProduct);
    };

    // Anchor for idle time: the moment the line last went quiet.
    let anchor = match products.iter().find(|p| p.build_active) {
        Some(p) if p.build_finished_by(now) => {
            p.build_started_at.unwrap_or(business.last_game_update)
                + Duration::milliseconds(p.build_duration_ms)
        }
        // Line is busy through `now`; nothing retroactive to add.
        Some(_) => return Ok(delta),
        None => business.last_game_update,
    };

    let duration = build_duration_ms(business, mods);
    let cost_per_cycle = target.build_cost(business.products_per_build);
    let idle_ms = (now - anchor).num_milliseconds();
    let cycles = affordable_cycles(
        idle_cycles(idle_ms, duration)?,
        business.money,
        MONEY_SAFETY_FLOOR,
        cost_per_cycle,
    );
    if cycles > 0 {
        debug!(business = business.id, cycles, "retroactive build cycles");
        delta.auto = Some(AutoBuild {
            product_id: target.id,
            cycles,
            units: cycles * business.products_per_build,
            cost: cycles * cost_per_cycle,
        });
    }

    let spent = delta.auto.as_ref().map_or(0, |a| a.cost);
    if business.money - spent - cost_per_cycle >= MONEY_SAFETY_FLOOR {
        delta.started = Some(StartedBuild {
            product_id: target.id,
            // Backdated so the next completion lands on the cycle grid.
            started_at: anchor + Duration::milliseconds(cycles * duration),
            duration_ms: duration,
            quantity: business.products_per_build,
            cost: cost_per_cycle,
        });
    }

    Ok(delta)
}

/// Player-initiated build start.
///
/// Rejects while an active unfinished build exists; a finished one is
/// folded into the plan as a completion first.
pub fn start_build(
    business: &Business,
    products: &[Product],
    mods: &Modifiers,
    now: DateTime<Utc>,
) -> Result<BuildPlan, EngineError> {
    let Some(target) = products.first() else {
        return Err(EngineError::MissingProduct);
    };

    let mut completed = None;
    for product in products {
        if product.build_active {
            if product.build_finished_by(now) {
                completed = Some(CompletedBuild {
                    product_id: product.id,
                    quantity: product.quantity_per_build,
                });
            } else {
                return Err(EngineError::ProductAlreadyBuilding);
            }
        }
    }

    let cost = target.build_cost(business.products_per_build);
    if business.money - cost < MONEY_SAFETY_FLOOR {
        return Err(EngineError::NotEnoughMoney);
    }

    Ok(BuildPlan {
        completed,
        started: StartedBuild {
            product_id: target.id,
            started_at: now,
            duration_ms: build_duration_ms(business, mods),
            quantity: business.products_per_build,
            cost,
        },
        steps: build_steps(mods),
        sets_build_challenge: !mods.smart_inventory(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use sim_core::constants::*;
    use sim_core::{AcquiredTech, TechCode};

    fn t0() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    fn business() -> Business {
        Business::template(t0())
    }

    fn product() -> Product {
        Product {
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
        }
    }

    fn auto_mods() -> Modifiers {
        Modifiers::at(
            &[AcquiredTech { code: TechCode::AutoBuilder, modifier: 1.0, expires_at: None }],
            t0(),
        )
    }

    #[test]
    fn manual_build_deducts_cost_and_stamps_duration() {
        let b = business();
        let plan = start_build(&b, &[product()], &Modifiers::at(&[], t0()), t0()).unwrap();
        assert_eq!(plan.started.cost, 50);
        assert_eq!(plan.started.quantity, 5);
        assert_eq!(plan.started.duration_ms, 4 * DEFAULT_BUILDING_SPEED_MS);
        assert!(plan.sets_build_challenge);
        assert!(plan.completed.is_none());
    }

    #[test]
    fn manual_build_rejected_while_building() {
        let b = business();
        let mut p = product();
        p.build_active = true;
        p.build_started_at = Some(t0() - Duration::milliseconds(100));
        p.build_duration_ms = 20_000;
        let err = start_build(&b, &[p], &Modifiers::at(&[], t0()), t0()).unwrap_err();
        assert_eq!(err, EngineError::ProductAlreadyBuilding);
    }

    #[test]
    fn manual_build_completes_a_finished_build_first() {
        let b = business();
        let mut p = product();
        p.build_active = true;
        p.build_started_at = Some(t0() - Duration::milliseconds(30_000));
        p.build_duration_ms = 20_000;
        let plan = start_build(&b, &[p], &Modifiers::at(&[], t0()), t0()).unwrap();
        assert_eq!(plan.completed, Some(CompletedBuild { product_id: 10, quantity: 5 }));
    }

    #[test]
    fn tick_completes_due_builds() {
        let b = business();
        let mut p = product();
        p.build_active = true;
        p.build_started_at = Some(t0() - Duration::milliseconds(20_000));
        p.build_duration_ms = 20_000;
        let delta = production_tick(&b, &[p], &Modifiers::at(&[], t0()), t0()).unwrap();
        assert_eq!(delta.completed.len(), 1);
        assert!(delta.auto.is_none());
        assert!(delta.started.is_none());
    }

    #[test]
    fn automation_synthesizes_idle_cycles_and_restarts() {
        let mut b = business();
        b.automation_enabled = true;
        b.last_game_update = t0() - Duration::seconds(60);
        // 60s idle at 20s per cycle: 3 cycles, 15 units, 150 cost.
        let delta = production_tick(&b, &[product()], &auto_mods(), t0()).unwrap();
        let auto = delta.auto.unwrap();
        assert_eq!(auto.cycles, 3);
        assert_eq!(auto.units, 15);
        assert_eq!(auto.cost, 150);
        // The restart is backdated onto the cycle grid.
        let started = delta.started.unwrap();
        assert_eq!(started.started_at, t0());
        assert_eq!(started.cost, 50);
    }

    #[test]
    fn automation_continues_after_a_completed_build() {
        let mut b = business();
        b.automation_enabled = true;
        b.last_game_update = t0() - Duration::seconds(5);
        let mut p = product();
        p.build_active = true;
        // Finished 45s ago: two more full cycles fit since then.
        p.build_started_at = Some(t0() - Duration::seconds(65));
        p.build_duration_ms = 20_000;
        let delta = production_tick(&b, &[p], &auto_mods(), t0()).unwrap();
        assert_eq!(delta.completed.len(), 1);
        assert_eq!(delta.auto.unwrap().cycles, 2);
        let started = delta.started.unwrap();
        assert_eq!(started.started_at, t0() - Duration::seconds(5));
    }

    #[test]
    fn busy_line_gets_no_retroactive_cycles() {
        let mut b = business();
        b.automation_enabled = true;
        b.last_game_update = t0() - Duration::seconds(60);
        let mut p = product();
        p.build_active = true;
        p.build_started_at = Some(t0() - Duration::seconds(10));
        p.build_duration_ms = 20_000;
        let delta = production_tick(&b, &[p], &auto_mods(), t0()).unwrap();
        assert!(delta.completed.is_empty());
        assert!(delta.auto.is_none());
        assert!(delta.started.is_none());
    }

    #[test]
    fn automation_clamps_at_money_floor() {
        let mut b = business();
        b.automation_enabled = true;
        b.money = MONEY_SAFETY_FLOOR + 120;
        b.last_game_update = t0() - Duration::seconds(600);
        // Only 2 cycles of 50 fit above the floor.
        let delta = production_tick(&b, &[product()], &auto_mods(), t0()).unwrap();
        assert_eq!(delta.auto.unwrap().cycles, 2);
        // No restart either: another 50 would sink below the floor.
        assert!(delta.started.is_none());
    }

    #[test]
    fn automation_off_means_no_auto_cycles() {
        let mut b = business();
        b.last_game_update = t0() - Duration::seconds(60);
        let delta = production_tick(&b, &[product()], &auto_mods(), t0()).unwrap();
        assert!(delta.auto.is_none());
        assert!(delta.started.is_none());
    }
}
