//! Technology modifier lookups over a business's acquired set.
//!
//! The engines consult (never mutate) this view; acquisitions happen in
//! the purchase flow. Timed acquisitions past their expiry are treated
//! as absent here and revoked by the tick.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sim_core::{AcquiredTech, TechCode};

/// The modifier view of a business's acquired technologies at an instant.
#[derive(Clone, Debug)]
pub struct Modifiers {
    owned: HashMap<TechCode, f64>,
}

impl Modifiers {
    /// Build the view, dropping acquisitions already expired at `now`.
    pub fn at(acquired: &[AcquiredTech], now: DateTime<Utc>) -> Self {
        let owned = acquired
            .iter()
            .filter(|a| !a.expired(now))
            .map(|a| (a.code, a.modifier))
            .collect();
        Self { owned }
    }

    /// `hasTechnology`: the modifier value when owned, else None.
    pub fn modifier(&self, code: TechCode) -> Option<f64> {
        self.owned.get(&code).copied()
    }

    pub fn owns(&self, code: TechCode) -> bool {
        self.owned.contains_key(&code)
    }

    /// Combined build-duration multiplier from owned speed technologies.
    pub fn build_time_factor(&self) -> f64 {
        self.modifier(TechCode::AssemblyLine).unwrap_or(1.0)
            * self.modifier(TechCode::HighSpeedConveyors).unwrap_or(1.0)
    }

    /// Shipping-duration multiplier.
    pub fn ship_time_factor(&self) -> f64 {
        self.modifier(TechCode::ExpressLoading).unwrap_or(1.0)
    }

    /// Order-spawn interval multiplier (advertising while active).
    pub fn spawn_interval_factor(&self) -> f64 {
        self.modifier(TechCode::AdCampaign).unwrap_or(1.0)
    }

    /// Shipping cost discount fraction in [0, 1).
    pub fn shipping_discount(&self) -> f64 {
        self.modifier(TechCode::BulkShipping)
            .map_or(0.0, |m| 1.0 - m)
    }

    pub fn auto_build(&self) -> bool {
        self.owns(TechCode::AutoBuilder)
    }

    pub fn auto_ship(&self) -> bool {
        self.owns(TechCode::AutoShipper)
    }

    pub fn route_planner(&self) -> bool {
        self.owns(TechCode::RoutePlanner)
    }

    pub fn smart_inventory(&self) -> bool {
        self.owns(TechCode::SmartInventory)
    }

    pub fn just_in_time(&self) -> bool {
        self.owns(TechCode::JustInTime)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    fn owned(code: TechCode, modifier: f64) -> AcquiredTech {
        AcquiredTech { code, modifier, expires_at: None }
    }

    #[test]
    fn lookup_returns_modifier_or_none() {
        let mods = Modifiers::at(&[owned(TechCode::BulkShipping, 0.5)], t0());
        assert_eq!(mods.modifier(TechCode::BulkShipping), Some(0.5));
        assert_eq!(mods.modifier(TechCode::AutoBuilder), None);
        assert!((mods.shipping_discount() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn speed_factors_multiply() {
        let mods = Modifiers::at(
            &[
                owned(TechCode::AssemblyLine, 0.75),
                owned(TechCode::HighSpeedConveyors, 0.5),
            ],
            t0(),
        );
        assert!((mods.build_time_factor() - 0.375).abs() < 1e-9);
        assert!((mods.ship_time_factor() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn expired_advertising_is_absent() {
        let ad = AcquiredTech {
            code: TechCode::AdCampaign,
            modifier: 0.5,
            expires_at: Some(t0() + Duration::seconds(120)),
        };
        let active = Modifiers::at(std::slice::from_ref(&ad), t0());
        assert!((active.spawn_interval_factor() - 0.5).abs() < 1e-9);
        let lapsed = Modifiers::at(&[ad], t0() + Duration::seconds(121));
        assert!((lapsed.spawn_interval_factor() - 1.0).abs() < 1e-9);
    }
}
