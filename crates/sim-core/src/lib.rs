#![deny(warnings)]

//! Core domain models and invariants for Freight Tycoon.
//!
//! This crate defines the serializable types shared by the simulation
//! engines and the persistence layer: businesses, products, orders and
//! their state machine, the technology catalog, tuning constants, and the
//! delta types a game tick produces. Validation helpers guarantee basic
//! invariants on seed and snapshot data.

pub mod business;
pub mod constants;
pub mod order;
pub mod product;
pub mod tech;
pub mod tick;

pub use business::{Business, SkillCode};
pub use order::{Order, OrderState};
pub use product::Product;
pub use tech::{technology_catalog, AcquiredTech, TechCode, Technology};
pub use tick::{
    AutoBuild, CompletedBuild, ExpirationReason, GameSnapshot, GhostShipments, NewOrder,
    OrderTransition, ProductionDelta, StartedBuild, TickOutcome,
};

use thiserror::Error;

/// Validation errors for domain invariants.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Rate durations must be strictly positive milliseconds.
    #[error("rate duration must be > 0 ms: {0}")]
    NonPositiveRate(&'static str),
    /// Batch quantities must be strictly positive.
    #[error("batch quantity must be > 0: {0}")]
    NonPositiveQuantity(&'static str),
    /// Prices and costs must be non-negative.
    #[error("negative monetary value is invalid: {0}")]
    NegativeMoney(&'static str),
    /// Inventory can never be negative.
    #[error("inventory on hand must be >= 0")]
    NegativeInventory,
    /// An order must be due after it was created.
    #[error("order due time must be after creation")]
    DueBeforeCreation,
    /// Names must be non-empty.
    #[error("name must not be empty")]
    EmptyName,
    /// Duplicate technology code in the catalog.
    #[error("duplicate technology code: {0}")]
    DuplicateTechCode(String),
}

/// Validate a business row's rate and batch attributes.
pub fn validate_business(b: &Business) -> Result<(), ValidationError> {
    if b.name.trim().is_empty() || b.business_name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if b.building_speed_ms <= 0 {
        return Err(ValidationError::NonPositiveRate("building_speed_ms"));
    }
    if b.shipping_speed_ms <= 0 {
        return Err(ValidationError::NonPositiveRate("shipping_speed_ms"));
    }
    if b.order_spawn_ms <= 0 {
        return Err(ValidationError::NonPositiveRate("order_spawn_ms"));
    }
    if b.products_per_build <= 0 {
        return Err(ValidationError::NonPositiveQuantity("products_per_build"));
    }
    if b.products_per_order <= 0 {
        return Err(ValidationError::NonPositiveQuantity("products_per_order"));
    }
    if b.orders_per_ship <= 0 {
        return Err(ValidationError::NonPositiveQuantity("orders_per_ship"));
    }
    if b.order_spawn_count <= 0 {
        return Err(ValidationError::NonPositiveQuantity("order_spawn_count"));
    }
    Ok(())
}

/// Validate a product row.
pub fn validate_product(p: &Product) -> Result<(), ValidationError> {
    if p.name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if p.cost_to_build < 0 || p.sales_price < 0 {
        return Err(ValidationError::NegativeMoney("product pricing"));
    }
    if p.on_hand < 0 {
        return Err(ValidationError::NegativeInventory);
    }
    if p.quantity_per_build <= 0 {
        return Err(ValidationError::NonPositiveQuantity("quantity_per_build"));
    }
    Ok(())
}

/// Validate an order row.
pub fn validate_order(o: &Order) -> Result<(), ValidationError> {
    if o.quantity <= 0 {
        return Err(ValidationError::NonPositiveQuantity("order quantity"));
    }
    if o.due_by <= o.created_at {
        return Err(ValidationError::DueBeforeCreation);
    }
    Ok(())
}

/// Validate the technology catalog: unique codes, non-negative costs.
pub fn validate_catalog(catalog: &[Technology]) -> Result<(), ValidationError> {
    let mut seen = std::collections::BTreeSet::new();
    for t in catalog {
        if t.cost < 0 {
            return Err(ValidationError::NegativeMoney("technology cost"));
        }
        if !seen.insert(t.code) {
            return Err(ValidationError::DuplicateTechCode(t.code.as_str().to_string()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn template_business_is_valid() {
        let b = Business::template(Utc.timestamp_opt(1_700_000_000, 0).unwrap());
        validate_business(&b).unwrap();
    }

    #[test]
    fn zero_rate_is_rejected() {
        let mut b = Business::template(Utc.timestamp_opt(1_700_000_000, 0).unwrap());
        b.building_speed_ms = 0;
        assert_eq!(
            validate_business(&b),
            Err(ValidationError::NonPositiveRate("building_speed_ms"))
        );
    }

    #[test]
    fn catalog_is_valid_and_codes_unique() {
        validate_catalog(&technology_catalog()).unwrap();
    }

    #[test]
    fn snapshot_roundtrip() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let snapshot = GameSnapshot {
            business: Business::template(now),
            products: vec![],
            orders: vec![],
            acquired: vec![AcquiredTech {
                code: TechCode::BulkShipping,
                modifier: 0.5,
                expires_at: None,
            }],
        };
        let s = serde_json::to_string(&snapshot).unwrap();
        let back: GameSnapshot = serde_json::from_str(&s).unwrap();
        assert_eq!(back.business.id, 1);
        assert_eq!(back.acquired[0].code, TechCode::BulkShipping);
    }
}
