//! Tuning constants for the simulation.
//!
//! Durations are stored in milliseconds for rates and seconds for order
//! and game windows, matching the persisted column units.

/// Wall-clock length of one game, measured from business creation.
pub const GAME_DURATION_SECONDS: i64 = 3600;

/// Active orders (awaiting or in progress) a business can hold at once.
pub const MAXIMUM_ORDER_QUEUE_SIZE: usize = 5;

/// How long a spawned order waits before it is canceled unshipped.
pub const ORDER_DUE_SECONDS: i64 = 120;

/// Randomized order distance range, inclusive, in miles.
pub const MIN_ORDER_DISTANCE_MILES: i64 = 5;
pub const MAX_ORDER_DISTANCE_MILES: i64 = 500;

/// Shipping cost per mile, in hundredths of a currency unit (0.05).
pub const COST_PER_MILE_HUNDREDTHS: i64 = 5;

/// Shipping cost multiplier applied by a rival's exclusive logistics.
pub const LOGISTICS_PENALTY_PERCENT: i64 = 125;

/// Duration multiplier while a warehouse/truck challenge is unresolved.
pub const CHALLENGE_PENALTY_PERCENT: i64 = 150;

/// Auto-production may drive money negative, but never below this.
pub const MONEY_SAFETY_FLOOR: i64 = -100_000;

/// Lifetime of an advertising campaign after purchase.
pub const ADVERTISING_DURATION_SECONDS: i64 = 120;

/// Technologies offered for purchase at any time.
pub const AVAILABLE_TECH_POOL_SIZE: usize = 3;

/// Trailing window of order outcomes that feed the reputation score.
pub const REPUTATION_WINDOW_SECONDS: i64 = 300;

/// Reputation score cache TTL.
pub const REPUTATION_CACHE_SECONDS: u64 = 60;

/// Acquired-technology lookup cache TTL.
pub const TECH_CACHE_TTL_MS: u64 = 2000;

/// Network overview cache TTL.
pub const NETWORK_CACHE_SECONDS: u64 = 10;

/// Experience awards.
pub const XP_PER_SHIPPED_ORDER: i64 = 25;
pub const XP_PER_BUILD: i64 = 10;
pub const XP_PER_CHALLENGE: i64 = 15;

/// Cumulative XP required per skill point.
pub const XP_PER_SKILL_POINT: i64 = 100;

/// Shipments at or below this duration complete within the same call.
pub const SYNC_COMPLETE_THRESHOLD_MS: i64 = 1000;

/// Per-rate floors for skill-driven upgrades, in milliseconds.
pub const MIN_BUILDING_SPEED_MS: i64 = 500;
pub const MIN_SHIPPING_SPEED_MS: i64 = 300;
pub const MIN_ORDER_SPAWN_MS: i64 = 2000;

/// Template business defaults.
pub const DEFAULT_MONEY: i64 = 1000;
pub const DEFAULT_BUILDING_SPEED_MS: i64 = 5000;
pub const DEFAULT_SHIPPING_SPEED_MS: i64 = 3000;
pub const DEFAULT_ORDER_SPAWN_MS: i64 = 15_000;
pub const DEFAULT_PRODUCTS_PER_BUILD: i64 = 5;
pub const DEFAULT_PRODUCTS_PER_ORDER: i64 = 5;
pub const DEFAULT_ORDERS_PER_SHIP: i64 = 1;
pub const DEFAULT_ORDER_SPAWN_COUNT: i64 = 1;

/// Default product seeded with every new business.
pub const DEFAULT_COST_TO_BUILD: i64 = 10;
pub const DEFAULT_SALES_PRICE: i64 = 30;
pub const DEFAULT_PRODUCT_WEIGHT: i64 = 2;
