//! Build and shipping step lists.
//!
//! The step list shown to the player is filtered by owned technologies,
//! and its length is load-bearing: total duration = steps x the
//! business's per-step rate, scaled by speed modifiers and an unresolved
//! challenge penalty.

use serde::Serialize;
use sim_core::constants::CHALLENGE_PENALTY_PERCENT;
use sim_core::{Business, TechCode};

use crate::ledger::Modifiers;

/// One presentational step of a build or shipment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Step {
    pub code: &'static str,
    pub label: &'static str,
}

const BUILD_STEPS: [Step; 4] = [
    Step { code: "gather_materials", label: "Gather materials" },
    Step { code: "input_weights", label: "Input product weights" },
    Step { code: "assemble", label: "Assemble products" },
    Step { code: "quality_check", label: "Quality check" },
];

const SHIP_STEPS: [Step; 5] = [
    Step { code: "pick_items", label: "Pick items from shelves" },
    Step { code: "pack_boxes", label: "Pack boxes" },
    Step { code: "plan_route", label: "Plan delivery route" },
    Step { code: "load_truck", label: "Load the truck" },
    Step { code: "deliver", label: "Deliver" },
];

/// Build steps for a business: smart inventory drops the weighing step.
pub fn build_steps(mods: &Modifiers) -> Vec<Step> {
    BUILD_STEPS
        .into_iter()
        .filter(|s| s.code != "input_weights" || !mods.owns(TechCode::SmartInventory))
        .collect()
}

/// Shipping steps: a route planner makes planning a non-step.
pub fn ship_steps(mods: &Modifiers) -> Vec<Step> {
    SHIP_STEPS
        .into_iter()
        .filter(|s| s.code != "plan_route" || !mods.owns(TechCode::RoutePlanner))
        .collect()
}

fn scaled(base_ms: i64, factor: f64, penalized: bool) -> i64 {
    let mut ms = (base_ms as f64 * factor).round() as i64;
    if penalized {
        ms = ms * CHALLENGE_PENALTY_PERCENT / 100;
    }
    ms.max(1)
}

/// Total build duration for one cycle.
pub fn build_duration_ms(business: &Business, mods: &Modifiers) -> i64 {
    let base = build_steps(mods).len() as i64 * business.building_speed_ms;
    scaled(base, mods.build_time_factor(), business.build_challenge_pending)
}

/// Total shipping duration for one order.
pub fn ship_duration_ms(business: &Business, mods: &Modifiers) -> i64 {
    let base = ship_steps(mods).len() as i64 * business.shipping_speed_ms;
    scaled(base, mods.ship_time_factor(), business.ship_challenge_pending)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use sim_core::AcquiredTech;

    fn business() -> Business {
        Business::template(Utc.timestamp_opt(1_700_000_000, 0).unwrap())
    }

    fn mods(acquired: &[(TechCode, f64)]) -> Modifiers {
        let list: Vec<AcquiredTech> = acquired
            .iter()
            .map(|&(code, modifier)| AcquiredTech { code, modifier, expires_at: None })
            .collect();
        Modifiers::at(&list, Utc.timestamp_opt(1_700_000_000, 0).unwrap())
    }

    #[test]
    fn base_durations_are_step_count_times_rate() {
        let b = business();
        let m = mods(&[]);
        assert_eq!(build_duration_ms(&b, &m), 4 * 5000);
        assert_eq!(ship_duration_ms(&b, &m), 5 * 3000);
    }

    #[test]
    fn smart_inventory_drops_a_build_step() {
        let b = business();
        let m = mods(&[(TechCode::SmartInventory, 1.0)]);
        assert_eq!(build_steps(&m).len(), 3);
        assert_eq!(build_duration_ms(&b, &m), 3 * 5000);
    }

    #[test]
    fn route_planner_drops_planning() {
        let b = business();
        let m = mods(&[(TechCode::RoutePlanner, 1.0)]);
        assert!(ship_steps(&m).iter().all(|s| s.code != "plan_route"));
        assert_eq!(ship_duration_ms(&b, &m), 4 * 3000);
    }

    #[test]
    fn speed_tech_and_penalty_scale_durations() {
        let mut b = business();
        let m = mods(&[(TechCode::ExpressLoading, 0.6)]);
        assert_eq!(ship_duration_ms(&b, &m), 9000);
        b.ship_challenge_pending = true;
        assert_eq!(ship_duration_ms(&b, &m), 13_500);
    }

    proptest::proptest! {
        #[test]
        fn build_duration_tracks_the_rate(rate in 1i64..100_000) {
            let mut b = business();
            b.building_speed_ms = rate;
            let m = mods(&[(TechCode::HighSpeedConveyors, 0.5)]);
            let d = build_duration_ms(&b, &m);
            proptest::prop_assert!(d >= 1);
            proptest::prop_assert_eq!(d, 2 * rate);
        }
    }
}
