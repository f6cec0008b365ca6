//! Inputs and outputs of one game tick.
//!
//! Engines take an immutable [`GameSnapshot`] and produce a
//! [`TickOutcome`] of explicit deltas; the persistence layer applies each
//! delta as a single atomic storage operation. Engines never mutate
//! shared state in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AcquiredTech, Business, Order, OrderState, Product, TechCode};

/// Immutable per-business state read at the start of a tick.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub business: Business,
    pub products: Vec<Product>,
    /// Open (non-terminal) orders only.
    pub orders: Vec<Order>,
    pub acquired: Vec<AcquiredTech>,
}

/// Why a business reached end of game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpirationReason {
    TimeExpired,
    HostileTakeover,
}

impl ExpirationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TimeExpired => "time expired",
            Self::HostileTakeover => "hostile takeover",
        }
    }
}

/// An active build that ran its full duration this tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompletedBuild {
    pub product_id: i64,
    pub quantity: i64,
}

/// Retroactive automated build cycles covering idle time, in closed form.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AutoBuild {
    pub product_id: i64,
    pub cycles: i64,
    pub units: i64,
    pub cost: i64,
}

/// A build started this tick (manually or by automation).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StartedBuild {
    pub product_id: i64,
    pub started_at: DateTime<Utc>,
    pub duration_ms: i64,
    pub quantity: i64,
    pub cost: i64,
}

/// Everything the production engine did this tick.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductionDelta {
    pub completed: Vec<CompletedBuild>,
    pub auto: Option<AutoBuild>,
    pub started: Option<StartedBuild>,
}

impl ProductionDelta {
    pub fn is_empty(&self) -> bool {
        self.completed.is_empty() && self.auto.is_none() && self.started.is_none()
    }

    /// Units credited to inventory this tick.
    pub fn units_built(&self) -> i64 {
        let completed: i64 = self.completed.iter().map(|c| c.quantity).sum();
        completed + self.auto.as_ref().map_or(0, |a| a.units)
    }
}

/// A state-machine transition resolved this tick. `revenue` is credited
/// and `stock_delta` applied only when the guarded update lands.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderTransition {
    pub order_id: i64,
    pub from: OrderState,
    pub to: OrderState,
    pub product_id: Option<i64>,
    pub revenue: i64,
    pub stock_delta: i64,
}

/// An order to insert, produced by the spawn pass.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
    pub quantity: i64,
    pub distance_miles: i64,
    pub created_at: DateTime<Utc>,
    pub due_by: DateTime<Utc>,
}

/// Idle-catch-up shipments computed without persisting order rows.
/// Applied as one batched money/inventory/counter update.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GhostShipments {
    pub product_id: i64,
    pub shipments: i64,
    pub units: i64,
    pub revenue: i64,
    pub cost: i64,
}

/// The full result of advancing one business by one tick.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TickOutcome {
    /// Set when the game ended this tick; everything else is then empty.
    pub expired: Option<ExpirationReason>,
    /// Timed acquisitions (advertising) that lapsed this tick.
    pub revoked_technologies: Vec<TechCode>,
    pub transitions: Vec<OrderTransition>,
    pub spawned: Vec<NewOrder>,
    /// New `last_order_spawned_at` when the spawn clock moved.
    pub spawn_clock: Option<DateTime<Utc>>,
    pub production: ProductionDelta,
    pub ghost: Option<GhostShipments>,
    pub xp_awarded: i64,
    pub skill_points_earned: i64,
    pub seconds_until_next_order: i64,
    pub time_remaining_seconds: i64,
}

impl TickOutcome {
    /// An outcome that terminates the game and changes nothing else.
    pub fn expired(reason: ExpirationReason) -> Self {
        Self {
            expired: Some(reason),
            revoked_technologies: Vec::new(),
            transitions: Vec::new(),
            spawned: Vec::new(),
            spawn_clock: None,
            production: ProductionDelta::default(),
            ghost: None,
            xp_awarded: 0,
            skill_points_earned: 0,
            seconds_until_next_order: 0,
            time_remaining_seconds: 0,
        }
    }

    /// Whether this tick would change any persisted state.
    pub fn is_noop(&self) -> bool {
        self.expired.is_none()
            && self.revoked_technologies.is_empty()
            && self.transitions.is_empty()
            && self.spawned.is_empty()
            && self.spawn_clock.is_none()
            && self.production.is_empty()
            && self.ghost.is_none()
            && self.xp_awarded == 0
    }
}
