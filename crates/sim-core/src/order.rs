//! Orders and their lifecycle state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of an order.
///
/// `AwaitingShipment -> InProgress -> {Shipped | Returned | Lost}`;
/// `AwaitingShipment -> Canceled` when the due time passes unshipped.
/// Terminal states are immutable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderState {
    AwaitingShipment,
    InProgress,
    Shipped,
    Returned,
    Lost,
    Canceled,
}

impl OrderState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AwaitingShipment => "awaiting_shipment",
            Self::InProgress => "in_progress",
            Self::Shipped => "shipped",
            Self::Returned => "returned",
            Self::Lost => "lost",
            Self::Canceled => "canceled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "awaiting_shipment" => Some(Self::AwaitingShipment),
            "in_progress" => Some(Self::InProgress),
            "shipped" => Some(Self::Shipped),
            "returned" => Some(Self::Returned),
            "lost" => Some(Self::Lost),
            "canceled" => Some(Self::Canceled),
            _ => None,
        }
    }

    /// Whether the order still counts toward the active queue.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::AwaitingShipment | Self::InProgress)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }

    /// Terminal outcomes that count against reputation.
    pub fn is_negative_outcome(&self) -> bool {
        matches!(self, Self::Canceled | Self::Lost | Self::Returned)
    }

    /// Legal transitions of the state machine.
    pub fn can_transition_to(&self, next: OrderState) -> bool {
        match self {
            Self::AwaitingShipment => {
                matches!(next, Self::InProgress | Self::Canceled)
            }
            Self::InProgress => {
                matches!(next, Self::Shipped | Self::Returned | Self::Lost)
            }
            _ => false,
        }
    }
}

/// A customer order for a quantity of product over a shipping distance.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub business_id: i64,
    pub quantity: i64,
    pub distance_miles: i64,
    pub state: OrderState,
    pub created_at: DateTime<Utc>,
    pub due_by: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<i64>,
    pub shipping_cost: Option<i64>,
}

impl Order {
    /// Whether an awaiting order has blown past its due time.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.state == OrderState::AwaitingShipment && now > self.due_by
    }

    /// Whether an in-progress shipment has run its full duration by `now`.
    pub fn shipping_finished_by(&self, now: DateTime<Utc>) -> bool {
        match (self.state, self.started_at, self.duration_ms) {
            (OrderState::InProgress, Some(started), Some(duration)) => {
                (now - started).num_milliseconds() >= duration
            }
            _ => false,
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

    fn order(state: OrderState) -> Order {
        Order {
            id: 7,
            business_id: 2,
            quantity: 5,
            distance_miles: 100,
            state,
            created_at: t0(),
            due_by: t0() + Duration::seconds(120),
            started_at: None,
            duration_ms: None,
            shipping_cost: None,
        }
    }

    #[test]
    fn state_strings_roundtrip() {
        for s in [
            OrderState::AwaitingShipment,
            OrderState::InProgress,
            OrderState::Shipped,
            OrderState::Returned,
            OrderState::Lost,
            OrderState::Canceled,
        ] {
            assert_eq!(OrderState::parse(s.as_str()), Some(s));
        }
        assert_eq!(OrderState::parse("misplaced"), None);
    }

    #[test]
    fn terminal_states_have_no_transitions() {
        for s in [
            OrderState::Shipped,
            OrderState::Returned,
            OrderState::Lost,
            OrderState::Canceled,
        ] {
            assert!(s.is_terminal());
            assert!(!s.can_transition_to(OrderState::InProgress));
            assert!(!s.can_transition_to(OrderState::AwaitingShipment));
        }
    }

    #[test]
    fn awaiting_can_only_start_or_cancel() {
        let s = OrderState::AwaitingShipment;
        assert!(s.can_transition_to(OrderState::InProgress));
        assert!(s.can_transition_to(OrderState::Canceled));
        assert!(!s.can_transition_to(OrderState::Shipped));
    }

    #[test]
    fn overdue_only_while_awaiting() {
        let late = t0() + Duration::seconds(121);
        assert!(order(OrderState::AwaitingShipment).is_overdue(late));
        assert!(!order(OrderState::InProgress).is_overdue(late));
        assert!(!order(OrderState::AwaitingShipment).is_overdue(t0()));
    }

    #[test]
    fn shipping_finishes_after_duration() {
        let mut o = order(OrderState::InProgress);
        o.started_at = Some(t0());
        o.duration_ms = Some(3000);
        assert!(!o.shipping_finished_by(t0() + Duration::milliseconds(2999)));
        assert!(o.shipping_finished_by(t0() + Duration::milliseconds(3000)));
    }

    #[test]
    fn negative_outcomes_cover_canceled_lost_returned() {
        assert!(OrderState::Canceled.is_negative_outcome());
        assert!(OrderState::Lost.is_negative_outcome());
        assert!(OrderState::Returned.is_negative_outcome());
        assert!(!OrderState::Shipped.is_negative_outcome());
        assert!(!OrderState::InProgress.is_negative_outcome());
    }
}
