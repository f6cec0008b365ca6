//! Products and their in-progress build record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A product a business manufactures and ships.
///
/// `on_hand` is adjusted only by build completion (+) and order
/// fulfillment (-); it is never driven negative. At most one product per
/// business has an active build under the base rules.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub business_id: i64,
    pub name: String,
    pub cost_to_build: i64,
    pub sales_price: i64,
    pub weight: i64,
    pub on_hand: i64,
    pub build_active: bool,
    pub build_started_at: Option<DateTime<Utc>>,
    pub build_duration_ms: i64,
    pub quantity_per_build: i64,
}

impl Product {
    /// Cost of one build cycle at the given batch size.
    pub fn build_cost(&self, quantity: i64) -> i64 {
        self.cost_to_build * quantity
    }

    /// Whether an active build has run its full duration by `now`.
    pub fn build_finished_by(&self, now: DateTime<Utc>) -> bool {
        match (self.build_active, self.build_started_at) {
            (true, Some(started)) => {
                (now - started).num_milliseconds() >= self.build_duration_ms
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn product(started_ms_ago: i64, duration_ms: i64) -> Product {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        Product {
            id: 1,
            business_id: 2,
            name: "Widget".to_string(),
            cost_to_build: 10,
            sales_price: 30,
            weight: 2,
            on_hand: 0,
            build_active: true,
            build_started_at: Some(now - Duration::milliseconds(started_ms_ago)),
            build_duration_ms: duration_ms,
            quantity_per_build: 5,
        }
    }

    #[test]
    fn build_completes_at_duration() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        assert!(product(5000, 5000).build_finished_by(now));
        assert!(!product(4999, 5000).build_finished_by(now));
    }

    #[test]
    fn inactive_build_never_finishes() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let mut p = product(10_000, 5000);
        p.build_active = false;
        assert!(!p.build_finished_by(now));
    }

    #[test]
    fn build_cost_scales_with_quantity() {
        let p = product(0, 5000);
        assert_eq!(p.build_cost(5), 50);
    }
}
