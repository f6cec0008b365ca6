//! Technology catalog and per-business acquisition records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier for a purchasable technology.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TechCode {
    AssemblyLine,
    HighSpeedConveyors,
    AutoBuilder,
    AutoShipper,
    RoutePlanner,
    BulkShipping,
    ExpressLoading,
    SmartInventory,
    JustInTime,
    AdCampaign,
    ExclusiveLogistics,
    HostileTakeover,
}

impl TechCode {
    pub const ALL: [TechCode; 12] = [
        TechCode::AssemblyLine,
        TechCode::HighSpeedConveyors,
        TechCode::AutoBuilder,
        TechCode::AutoShipper,
        TechCode::RoutePlanner,
        TechCode::BulkShipping,
        TechCode::ExpressLoading,
        TechCode::SmartInventory,
        TechCode::JustInTime,
        TechCode::AdCampaign,
        TechCode::ExclusiveLogistics,
        TechCode::HostileTakeover,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AssemblyLine => "ASSEMBLY_LINE",
            Self::HighSpeedConveyors => "HIGH_SPEED_CONVEYORS",
            Self::AutoBuilder => "AUTO_BUILDER",
            Self::AutoShipper => "AUTO_SHIPPER",
            Self::RoutePlanner => "ROUTE_PLANNER",
            Self::BulkShipping => "BULK_SHIPPING",
            Self::ExpressLoading => "EXPRESS_LOADING",
            Self::SmartInventory => "SMART_INVENTORY",
            Self::JustInTime => "JUST_IN_TIME",
            Self::AdCampaign => "AD_CAMPAIGN",
            Self::ExclusiveLogistics => "EXCLUSIVE_LOGISTICS",
            Self::HostileTakeover => "HOSTILE_TAKEOVER",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.as_str() == s)
    }

    /// Whether acquisition triggers a one-time effect at purchase time.
    pub fn has_one_time_effect(&self) -> bool {
        matches!(
            self,
            Self::AdCampaign | Self::ExclusiveLogistics | Self::HostileTakeover
        )
    }
}

/// A catalog technology. `modifier` semantics are technology-specific:
/// a duration or cost multiplier, a discount fraction, or an unlock flag.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Technology {
    pub id: i64,
    pub code: TechCode,
    pub name: String,
    pub description: String,
    pub cost: i64,
    pub tech_level_required: i64,
    pub modifier: f64,
}

/// An acquired technology as the engines see it. `expires_at` is set only
/// for the advertising campaign, the one acquisition that self-revokes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AcquiredTech {
    pub code: TechCode,
    pub modifier: f64,
    pub expires_at: Option<DateTime<Utc>>,
}

impl AcquiredTech {
    pub fn expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// The static technology catalog seeded into the database.
pub fn technology_catalog() -> Vec<Technology> {
    fn tech(
        id: i64,
        code: TechCode,
        name: &str,
        description: &str,
        cost: i64,
        tech_level_required: i64,
        modifier: f64,
    ) -> Technology {
        Technology {
            id,
            code,
            name: name.to_string(),
            description: description.to_string(),
            cost,
            tech_level_required,
            modifier,
        }
    }

    vec![
        tech(
            1,
            TechCode::AssemblyLine,
            "Assembly Line",
            "Cuts build time by a quarter.",
            150,
            0,
            0.75,
        ),
        tech(
            2,
            TechCode::HighSpeedConveyors,
            "High-Speed Conveyors",
            "Halves build time.",
            400,
            2,
            0.5,
        ),
        tech(
            3,
            TechCode::AutoBuilder,
            "Auto-Builder",
            "Keeps the production line running while you are away.",
            300,
            1,
            1.0,
        ),
        tech(
            4,
            TechCode::AutoShipper,
            "Auto-Shipper",
            "Ships outstanding stock while you are away.",
            500,
            2,
            1.0,
        ),
        tech(
            5,
            TechCode::RoutePlanner,
            "Route Planner",
            "Ships the most urgent order first and skips route planning.",
            200,
            1,
            1.0,
        ),
        tech(
            6,
            TechCode::BulkShipping,
            "Bulk Shipping Contract",
            "Halves the per-mile shipping cost.",
            250,
            1,
            0.5,
        ),
        tech(
            7,
            TechCode::ExpressLoading,
            "Express Loading",
            "Speeds up every shipment.",
            350,
            2,
            0.6,
        ),
        tech(
            8,
            TechCode::SmartInventory,
            "Smart Inventory",
            "Automated weighing: one less build step, no warehouse hunts.",
            200,
            1,
            1.0,
        ),
        tech(
            9,
            TechCode::JustInTime,
            "Just-In-Time Fulfillment",
            "Ship orders before stock exists. Risky.",
            150,
            1,
            1.0,
        ),
        tech(
            10,
            TechCode::AdCampaign,
            "Advertising Campaign",
            "Orders arrive twice as fast for two minutes.",
            100,
            0,
            0.5,
        ),
        tech(
            11,
            TechCode::ExclusiveLogistics,
            "Exclusive Logistics Deal",
            "Every rival pays more to ship.",
            600,
            3,
            1.25,
        ),
        tech(
            12,
            TechCode::HostileTakeover,
            "Hostile Takeover",
            "Absorb a rival business outright.",
            1000,
            4,
            1.0,
        ),
    ]
}
