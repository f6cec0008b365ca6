//! Reputation engine: windowed success ratio over order outcomes.

use chrono::{DateTime, Duration, Utc};
use sim_core::constants::REPUTATION_WINDOW_SECONDS;
use sim_core::OrderState;
use sim_econ::reputation_score;

/// One order's contribution to the score: when it was created and where
/// it ended up.
#[derive(Clone, Copy, Debug)]
pub struct OutcomeSample {
    pub created_at: DateTime<Utc>,
    pub state: OrderState,
}

/// Score in 0..=100 from the trailing window of order outcomes.
///
/// Orders created inside the window that reached a terminal state
/// qualify; in-flight orders are excluded. With zero qualifying samples
/// the score is 100: no negative signal yet.
pub fn score(samples: &[OutcomeSample], now: DateTime<Utc>) -> u8 {
    let window_start = now - Duration::seconds(REPUTATION_WINDOW_SECONDS);
    let mut positive = 0u64;
    let mut negative = 0u64;
    for sample in samples {
        if sample.created_at < window_start || !sample.state.is_terminal() {
            continue;
        }
        if sample.state.is_negative_outcome() {
            negative += 1;
        } else {
            positive += 1;
        }
    }
    reputation_score(positive, negative)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    fn sample(age_s: i64, state: OrderState) -> OutcomeSample {
        OutcomeSample { created_at: t0() - Duration::seconds(age_s), state }
    }

    #[test]
    fn empty_window_scores_perfect() {
        assert_eq!(score(&[], t0()), 100);
    }

    #[test]
    fn all_shipped_scores_perfect() {
        let samples = vec![sample(10, OrderState::Shipped), sample(20, OrderState::Shipped)];
        assert_eq!(score(&samples, t0()), 100);
    }

    #[test]
    fn even_mix_scores_fifty() {
        let samples = vec![sample(10, OrderState::Shipped), sample(20, OrderState::Canceled)];
        assert_eq!(score(&samples, t0()), 50);
    }

    #[test]
    fn old_and_in_flight_samples_are_excluded() {
        let samples = vec![
            sample(REPUTATION_WINDOW_SECONDS + 1, OrderState::Canceled),
            sample(10, OrderState::InProgress),
            sample(10, OrderState::AwaitingShipment),
        ];
        assert_eq!(score(&samples, t0()), 100);
    }

    #[test]
    fn lost_and_returned_count_against() {
        let samples = vec![
            sample(10, OrderState::Shipped),
            sample(20, OrderState::Lost),
            sample(30, OrderState::Returned),
        ];
        assert_eq!(score(&samples, t0()), 33);
    }
}
