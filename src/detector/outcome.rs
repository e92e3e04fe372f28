//! Per-outcome rolling price state
//!
//! Each tracked outcome keeps a bounded history of observed best-ask prices
//! and derives its movement statistics (baseline delta, z-score) from it.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::VecDeque;

/// Maximum number of observations kept in the rolling history
pub const HISTORY_CAPACITY: usize = 60;

/// Minimum observations required before a z-score is statistically meaningful
pub const MIN_SAMPLES: usize = 5;

/// Sample standard deviation below this is treated as a flat history
const FLAT_STDDEV: f64 = 0.001;

/// On a flat history, a baseline move larger than this saturates the z-score
const FLAT_MOVE_THRESHOLD: Decimal = dec!(0.05);

/// Saturated z-score for a real move on a zero-variance history
const SATURATED_ZSCORE: f64 = 10.0;

/// Rolling price state for a single tradable outcome
#[derive(Debug, Clone)]
pub struct OutcomeState {
    /// Stable outcome label (bracket name)
    pub name: String,
    /// Tradable token for the Yes side
    pub token_id: String,
    /// Optional paired No token
    pub no_token_id: Option<String>,
    /// Bounded FIFO price history, oldest evicted first
    history: VecDeque<Decimal>,
    /// Price snapshot at window start, immutable until the next baseline
    pub baseline_price: Option<Decimal>,
    /// Most recent observed price
    pub current_price: Option<Decimal>,
    /// Timestamp of the most recent observation
    pub last_update: Option<DateTime<Utc>>,
    /// Number of signals this outcome has fired this session
    pub trigger_count: usize,
}

impl OutcomeState {
    /// Create an untracked state; call [`set_baseline`](Self::set_baseline) before feeding prices
    pub fn new(
        name: impl Into<String>,
        token_id: impl Into<String>,
        no_token_id: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            token_id: token_id.into(),
            no_token_id,
            history: VecDeque::with_capacity(HISTORY_CAPACITY),
            baseline_price: None,
            current_price: None,
            last_update: None,
            trigger_count: 0,
        }
    }

    /// Snapshot the baseline and re-seed the history with it
    ///
    /// Clears all per-session state; called exactly once per monitoring window.
    pub fn set_baseline(&mut self, price: Decimal) {
        self.history.clear();
        self.history.push_back(price);
        self.baseline_price = Some(price);
        self.current_price = Some(price);
        self.trigger_count = 0;
        tracing::info!(outcome = %self.name, baseline = %price, "Baseline set");
    }

    /// Append an observed price, evicting the oldest once capacity is reached
    pub fn update_price(&mut self, price: Decimal, timestamp: DateTime<Utc>) {
        if self.history.len() == HISTORY_CAPACITY {
            self.history.pop_front();
        }
        self.history.push_back(price);
        self.current_price = Some(price);
        self.last_update = Some(timestamp);
    }

    /// Z-score of the current price against the baseline
    ///
    /// Returns `None` with fewer than [`MIN_SAMPLES`] observations or before a
    /// baseline is set. A near-zero standard deviation would make the ratio
    /// explode on a stale book, so a flat history with a real move (>0.05)
    /// saturates to ±10.0 and anything smaller reads as 0.0.
    pub fn zscore(&self) -> Option<f64> {
        let baseline = self.baseline_price?;
        let current = self.current_price?;
        if self.history.len() < MIN_SAMPLES {
            return None;
        }

        let std_dev = self.sample_std_dev()?;
        if std_dev < FLAT_STDDEV {
            let change = current - baseline;
            if change.abs() > FLAT_MOVE_THRESHOLD {
                return Some(if change > Decimal::ZERO {
                    SATURATED_ZSCORE
                } else {
                    -SATURATED_ZSCORE
                });
            }
            return Some(0.0);
        }

        Some((current - baseline).to_f64()? / std_dev)
    }

    /// Absolute price change from the baseline
    pub fn price_change(&self) -> Option<Decimal> {
        Some(self.current_price? - self.baseline_price?)
    }

    /// Number of observations currently held
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Sample standard deviation over the full history window
    fn sample_std_dev(&self) -> Option<f64> {
        let n = self.history.len();
        if n < 2 {
            return None;
        }

        let values: Vec<f64> = self.history.iter().filter_map(|p| p.to_f64()).collect();
        if values.len() != n {
            return None;
        }

        let mean = values.iter().sum::<f64>() / n as f64;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        Some(variance.sqrt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn seeded(baseline: Decimal) -> OutcomeState {
        let mut state = OutcomeState::new("2.2M-2.4M", "token-yes", None);
        state.set_baseline(baseline);
        state
    }

    #[test]
    fn test_set_baseline_seeds_history() {
        let state = seeded(dec!(0.15));
        assert_eq!(state.baseline_price, Some(dec!(0.15)));
        assert_eq!(state.current_price, Some(dec!(0.15)));
        assert_eq!(state.history_len(), 1);
        assert_eq!(state.trigger_count, 0);
    }

    #[test]
    fn test_update_price_appends() {
        let mut state = seeded(dec!(0.10));
        state.update_price(dec!(0.12), Utc::now());
        assert_eq!(state.current_price, Some(dec!(0.12)));
        assert_eq!(state.history_len(), 2);
    }

    #[test]
    fn test_history_bounded_fifo() {
        let mut state = seeded(dec!(0.10));
        for i in 0..200 {
            state.update_price(dec!(0.10) + Decimal::new(i, 4), Utc::now());
        }
        assert_eq!(state.history_len(), HISTORY_CAPACITY);
        // Most recent observation is always the last appended price
        assert_eq!(state.current_price, Some(dec!(0.10) + Decimal::new(199, 4)));
    }

    #[test]
    fn test_zscore_requires_min_samples() {
        let mut state = seeded(dec!(0.10));
        assert!(state.zscore().is_none()); // only the baseline seed
        for _ in 0..3 {
            state.update_price(dec!(0.10), Utc::now());
        }
        assert!(state.zscore().is_none()); // 4 points
        state.update_price(dec!(0.10), Utc::now());
        assert!(state.zscore().is_some()); // 5 points
    }

    #[test]
    fn test_zscore_none_without_baseline() {
        let mut state = OutcomeState::new("Test", "token", None);
        for _ in 0..10 {
            state.update_price(dec!(0.20), Utc::now());
        }
        assert!(state.zscore().is_none());
    }

    #[test]
    fn test_zscore_flat_history_no_move() {
        let mut state = seeded(dec!(0.10));
        for _ in 0..10 {
            state.update_price(dec!(0.10), Utc::now());
        }
        assert_eq!(state.zscore(), Some(0.0));
    }

    #[test]
    fn test_zscore_saturates_up() {
        let mut state = seeded(dec!(0.10));
        // Fill the whole window at the elevated price so the baseline seed
        // rolls out and the history is truly flat.
        for _ in 0..HISTORY_CAPACITY {
            state.update_price(dec!(0.30), Utc::now());
        }
        assert_eq!(state.zscore(), Some(10.0));
    }

    #[test]
    fn test_zscore_saturates_down() {
        let mut state = seeded(dec!(0.30));
        for _ in 0..HISTORY_CAPACITY {
            state.update_price(dec!(0.10), Utc::now());
        }
        assert_eq!(state.zscore(), Some(-10.0));
    }

    #[test]
    fn test_zscore_flat_small_move_is_zero() {
        let mut state = seeded(dec!(0.10));
        for _ in 0..HISTORY_CAPACITY {
            state.update_price(dec!(0.13), Utc::now());
        }
        // |0.13 - 0.10| = 0.03 <= 0.05: flat history, negligible move
        assert_eq!(state.zscore(), Some(0.0));
    }

    #[test]
    fn test_zscore_normal_case() {
        let mut state = seeded(dec!(0.10));
        for price in [dec!(0.11), dec!(0.13), dec!(0.18), dec!(0.25), dec!(0.35)] {
            state.update_price(price, Utc::now());
        }
        let z = state.zscore().unwrap();
        // (0.35 - 0.10) / stdev([.10,.11,.13,.18,.25,.35]) ~= 2.57
        assert!(z > 2.5 && z < 2.7, "unexpected z-score {z}");
    }

    #[test]
    fn test_price_change() {
        let mut state = seeded(dec!(0.10));
        state.update_price(dec!(0.15), Utc::now());
        assert_eq!(state.price_change(), Some(dec!(0.05)));
    }

    #[test]
    fn test_price_change_none_without_baseline() {
        let state = OutcomeState::new("Test", "token", None);
        assert!(state.price_change().is_none());
    }

    #[test]
    fn test_rebaseline_clears_trigger_state() {
        let mut state = seeded(dec!(0.10));
        for _ in 0..10 {
            state.update_price(dec!(0.40), Utc::now());
        }
        state.trigger_count = 2;
        state.set_baseline(dec!(0.20));
        assert_eq!(state.trigger_count, 0);
        assert_eq!(state.history_len(), 1);
        assert_eq!(state.baseline_price, Some(dec!(0.20)));
    }
}
