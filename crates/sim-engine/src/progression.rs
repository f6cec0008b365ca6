//! Progression engine: experience, skill points, and rate upgrades.

use sim_core::constants::*;
use sim_core::{Business, SkillCode};
use sim_econ::{apply_skill_point, skill_points_earned};

use crate::EngineError;

/// XP award for one tick's completed work.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct XpAward {
    pub xp: i64,
    pub skill_points: i64,
}

/// XP earned by orders shipped and build cycles completed this tick.
pub fn award_for_tick(business: &Business, orders_shipped: i64, builds_completed: i64) -> XpAward {
    let xp = orders_shipped * XP_PER_SHIPPED_ORDER + builds_completed * XP_PER_BUILD;
    award(business, xp)
}

/// XP for one completed warehouse/truck challenge.
pub fn award_for_challenge(business: &Business) -> XpAward {
    award(business, XP_PER_CHALLENGE)
}

fn award(business: &Business, xp: i64) -> XpAward {
    XpAward {
        xp,
        skill_points: skill_points_earned(business.xp, xp, XP_PER_SKILL_POINT),
    }
}

/// The rate change produced by spending one skill point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SkillSpend {
    pub skill: SkillCode,
    /// New value for the rate column the skill targets.
    pub new_rate_ms: i64,
}

/// Spend one available skill point on a named skill.
pub fn spend_skill_point(business: &Business, code: &str) -> Result<SkillSpend, EngineError> {
    let skill = SkillCode::parse(code).ok_or(EngineError::UnknownSkill)?;
    if business.available_points <= 0 {
        return Err(EngineError::NoSkillPoints);
    }
    let new_rate_ms = match skill {
        SkillCode::Building => {
            apply_skill_point(business.building_speed_ms, MIN_BUILDING_SPEED_MS)
        }
        SkillCode::Shipping => {
            apply_skill_point(business.shipping_speed_ms, MIN_SHIPPING_SPEED_MS)
        }
        SkillCode::Logistics => apply_skill_point(business.order_spawn_ms, MIN_ORDER_SPAWN_MS),
    };
    Ok(SkillSpend { skill, new_rate_ms })
}

/// Which pending challenge a completion callback resolves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChallengeKind {
    /// Truck-to-warehouse, attached to shipments.
    Truck,
    /// Find-the-product haystack, attached to builds.
    Haystack,
}

/// Resolve a pending challenge; rejected when none is pending.
pub fn complete_challenge(
    business: &Business,
    kind: ChallengeKind,
) -> Result<XpAward, EngineError> {
    let pending = match kind {
        ChallengeKind::Truck => business.ship_challenge_pending,
        ChallengeKind::Haystack => business.build_challenge_pending,
    };
    if !pending {
        return Err(EngineError::NoChallengePending);
    }
    Ok(award_for_challenge(business))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn business() -> Business {
        Business::template(Utc.timestamp_opt(1_700_000_000, 0).unwrap())
    }

    #[test]
    fn tick_award_sums_work() {
        let a = award_for_tick(&business(), 2, 3);
        assert_eq!(a.xp, 2 * XP_PER_SHIPPED_ORDER + 3 * XP_PER_BUILD);
        assert_eq!(a.skill_points, 0);
    }

    #[test]
    fn crossing_the_threshold_earns_a_point() {
        let mut b = business();
        b.xp = 90;
        let a = award_for_tick(&b, 1, 0);
        assert_eq!(a.xp, 25);
        assert_eq!(a.skill_points, 1);
    }

    #[test]
    fn unknown_skill_is_rejected() {
        let mut b = business();
        b.available_points = 1;
        assert_eq!(spend_skill_point(&b, "piloting"), Err(EngineError::UnknownSkill));
    }

    #[test]
    fn spending_without_points_is_rejected() {
        assert_eq!(
            spend_skill_point(&business(), "building"),
            Err(EngineError::NoSkillPoints)
        );
    }

    #[test]
    fn spending_speeds_up_the_rate() {
        let mut b = business();
        b.available_points = 1;
        let spend = spend_skill_point(&b, "shipping").unwrap();
        assert_eq!(spend.skill, SkillCode::Shipping);
        assert_eq!(spend.new_rate_ms, 2700);
    }

    #[test]
    fn challenge_completion_requires_a_pending_flag() {
        let mut b = business();
        assert_eq!(
            complete_challenge(&b, ChallengeKind::Truck),
            Err(EngineError::NoChallengePending)
        );
        b.ship_challenge_pending = true;
        let a = complete_challenge(&b, ChallengeKind::Truck).unwrap();
        assert_eq!(a.xp, XP_PER_CHALLENGE);
    }
}
