//! Business (player) state and skill codes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::*;

/// One game account's persistent simulation state.
///
/// Rate attributes are durations in milliseconds where lower is faster.
/// `final_*` fields are null while `active` and are written exactly once,
/// atomically with `active` flipping to false.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Business {
    pub id: i64,
    pub name: String,
    pub business_name: String,
    pub money: i64,
    pub tech_level: i64,
    pub orders_shipped: i64,
    pub total_money_earned: i64,
    pub building_speed_ms: i64,
    pub shipping_speed_ms: i64,
    pub order_spawn_ms: i64,
    pub products_per_build: i64,
    pub products_per_order: i64,
    pub orders_per_ship: i64,
    pub order_spawn_count: i64,
    pub xp: i64,
    pub available_points: i64,
    pub points_spent: i64,
    pub automation_enabled: bool,
    pub logistics_penalty: bool,
    pub build_challenge_pending: bool,
    pub ship_challenge_pending: bool,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub last_game_update: DateTime<Utc>,
    pub last_order_spawned_at: DateTime<Utc>,
    pub final_money: Option<i64>,
    pub final_tech_level: Option<i64>,
    pub final_orders_shipped: Option<i64>,
    pub final_reputation: Option<i64>,
    pub expiration_reason: Option<String>,
    pub acquired_by: Option<String>,
}

impl Business {
    /// The template row (id 1) holding default starting values.
    pub fn template(now: DateTime<Utc>) -> Self {
        Self {
            id: 1,
            name: "Template".to_string(),
            business_name: "Template Freight Co".to_string(),
            money: DEFAULT_MONEY,
            tech_level: 0,
            orders_shipped: 0,
            total_money_earned: 0,
            building_speed_ms: DEFAULT_BUILDING_SPEED_MS,
            shipping_speed_ms: DEFAULT_SHIPPING_SPEED_MS,
            order_spawn_ms: DEFAULT_ORDER_SPAWN_MS,
            products_per_build: DEFAULT_PRODUCTS_PER_BUILD,
            products_per_order: DEFAULT_PRODUCTS_PER_ORDER,
            orders_per_ship: DEFAULT_ORDERS_PER_SHIP,
            order_spawn_count: DEFAULT_ORDER_SPAWN_COUNT,
            xp: 0,
            available_points: 0,
            points_spent: 0,
            automation_enabled: false,
            logistics_penalty: false,
            build_challenge_pending: false,
            ship_challenge_pending: false,
            active: true,
            created_at: now,
            last_game_update: now,
            last_order_spawned_at: now,
            final_money: None,
            final_tech_level: None,
            final_orders_shipped: None,
            final_reputation: None,
            expiration_reason: None,
            acquired_by: None,
        }
    }

    /// Seconds of game time left before this business expires.
    pub fn time_remaining_seconds(&self, now: DateTime<Utc>) -> i64 {
        GAME_DURATION_SECONDS - (now - self.created_at).num_seconds()
    }
}

/// A skill a player can spend an earned point on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillCode {
    /// Reduces `building_speed_ms`.
    Building,
    /// Reduces `shipping_speed_ms`.
    Shipping,
    /// Reduces `order_spawn_ms`.
    Logistics,
}

impl SkillCode {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "building" => Some(Self::Building),
            "shipping" => Some(Self::Shipping),
            "logistics" => Some(Self::Logistics),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Building => "building",
            Self::Shipping => "shipping",
            Self::Logistics => "logistics",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn template_seeds_defaults() {
        let b = Business::template(t0());
        assert_eq!(b.id, 1);
        assert_eq!(b.money, DEFAULT_MONEY);
        assert!(b.active);
        assert!(b.final_money.is_none());
    }

    #[test]
    fn time_remaining_counts_down_from_creation() {
        let b = Business::template(t0());
        assert_eq!(b.time_remaining_seconds(t0()), GAME_DURATION_SECONDS);
        let later = t0() + Duration::seconds(GAME_DURATION_SECONDS + 1);
        assert!(b.time_remaining_seconds(later) < 0);
    }

    #[test]
    fn skill_codes_roundtrip() {
        for code in [SkillCode::Building, SkillCode::Shipping, SkillCode::Logistics] {
            assert_eq!(SkillCode::parse(code.as_str()), Some(code));
        }
        assert_eq!(SkillCode::parse("piloting"), None);
    }
}
