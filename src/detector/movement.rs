//! Movement detector: trigger state machine and best-mover selection
//!
//! One detector instance per actively traded market. It owns the per-outcome
//! price states, arbitrates which outcome may fire, and enforces the
//! scale-in/lock policy across a monitoring session.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

use super::outcome::OutcomeState;
use super::schedule::default_schedule;
use super::types::{DetectorStatus, MovementSignal};
use crate::market::Outcome;
use crate::orderbook::Quote;

/// Session lifecycle of a detector
///
/// Illegal transitions (e.g. triggering before a baseline) are
/// unrepresentable: trigger checks only run from `Armed` or `Locked`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// No baseline has been snapshotted
    Uninitialized,
    /// Baseline set, any outcome may fire
    Armed,
    /// One outcome has fired; only it may fire again this session
    Locked {
        /// Name of the locked outcome
        outcome: String,
    },
}

/// Static detector thresholds
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Z-score a move must reach to trigger
    pub zscore_threshold: f64,
    /// Budget percentage per successive trigger on the locked outcome
    pub scale_in_pcts: Vec<Decimal>,
    /// Refuse to chase an outcome priced above this
    pub max_buy_price: Decimal,
    /// Minimum absolute move from baseline worth trading
    pub min_price_change: Decimal,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            zscore_threshold: 2.5,
            scale_in_pcts: default_schedule(),
            max_buy_price: dec!(0.95),
            min_price_change: dec!(0.05),
        }
    }
}

/// An outcome with the best-ask price observed at baseline time, if any
#[derive(Debug, Clone)]
pub struct BaselineQuote {
    /// Outcome identity from market discovery
    pub outcome: Outcome,
    /// Best ask at window start; `None` means no liquidity yet
    pub best_ask: Option<Decimal>,
}

/// Z-score movement detector for one market
#[derive(Debug)]
pub struct MovementDetector {
    config: DetectorConfig,
    /// Outcome name -> rolling state; BTreeMap keeps tie-breaking deterministic
    outcomes: BTreeMap<String, OutcomeState>,
    /// Token id -> outcome name, built at baseline time
    token_index: HashMap<String, String>,
    phase: Phase,
    window_start: Option<DateTime<Utc>>,
    total_signals: u64,
    budget_spent_pct: Decimal,
}

impl MovementDetector {
    /// Create a detector with the given thresholds
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            config,
            outcomes: BTreeMap::new(),
            token_index: HashMap::new(),
            phase: Phase::Uninitialized,
            window_start: None,
            total_signals: 0,
            budget_spent_pct: Decimal::ZERO,
        }
    }

    /// Create a detector with default thresholds
    pub fn with_defaults() -> Self {
        Self::new(DetectorConfig::default())
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Whether a baseline has been established this window
    pub fn baseline_set(&self) -> bool {
        !matches!(self.phase, Phase::Uninitialized)
    }

    /// Outcome the detector is locked to, if any
    pub fn locked_outcome(&self) -> Option<&str> {
        match &self.phase {
            Phase::Locked { outcome } => Some(outcome),
            _ => None,
        }
    }

    /// Clear all per-session state, keeping configuration
    pub fn reset(&mut self) {
        self.outcomes.clear();
        self.token_index.clear();
        self.phase = Phase::Uninitialized;
        self.window_start = None;
        self.total_signals = 0;
        self.budget_spent_pct = Decimal::ZERO;
        tracing::info!("MovementDetector reset");
    }

    /// Snapshot baseline prices and transition to `Armed`
    ///
    /// Outcomes with no resolvable price are skipped; a market can have
    /// partial liquidity at window start.
    pub fn set_baseline(&mut self, seeds: &[BaselineQuote]) {
        self.window_start = Some(Utc::now());
        self.phase = Phase::Armed;
        tracing::info!(outcomes = seeds.len(), "Setting baseline prices");

        for seed in seeds {
            let Some(best_ask) = seed.best_ask else {
                tracing::warn!(outcome = %seed.outcome.name, "No asks at baseline, skipping");
                continue;
            };
            let mut state = OutcomeState::new(
                seed.outcome.name.clone(),
                seed.outcome.token_id.clone(),
                seed.outcome.no_token_id.clone(),
            );
            state.set_baseline(best_ask);
            self.token_index
                .insert(seed.outcome.token_id.clone(), seed.outcome.name.clone());
            self.outcomes.insert(seed.outcome.name.clone(), state);
        }
    }

    /// Per-tick entry point: apply a batch of quotes, then evaluate the
    /// single best mover for a trigger
    ///
    /// Markets partition probability mass across mutually exclusive brackets;
    /// when one bracket surges the others fall, so evaluating every outcome
    /// independently would scatter buys across the losing side. At most one
    /// signal is emitted per tick.
    pub fn update_prices(&mut self, quotes: &[Quote]) -> Vec<MovementSignal> {
        if !self.baseline_set() {
            return Vec::new();
        }

        let now = Utc::now();
        for quote in quotes {
            let Some(name) = self.token_index.get(&quote.token_id) else {
                // New outcomes cannot appear mid-session
                continue;
            };
            if let Some(state) = self.outcomes.get_mut(name) {
                state.update_price(quote.price, now);
            }
        }

        self.evaluate_best_mover().into_iter().collect()
    }

    /// Push-feed entry point: apply a single quote and evaluate a trigger
    ///
    /// The best-mover rule applies here too: the pushed quote updates one
    /// outcome, but the trigger candidate is whichever tracked outcome now
    /// has the highest positive z-score.
    pub fn apply_quote(&mut self, quote: &Quote) -> Option<MovementSignal> {
        if !self.baseline_set() {
            return None;
        }
        let name = self.token_index.get(&quote.token_id)?.clone();
        let state = self.outcomes.get_mut(&name)?;
        state.update_price(quote.price, Utc::now());
        self.evaluate_best_mover()
    }

    /// Read-only session snapshot
    pub fn status(&self) -> DetectorStatus {
        DetectorStatus {
            baseline_set: self.baseline_set(),
            window_start: self.window_start,
            outcomes_tracked: self.outcomes.len(),
            total_signals: self.total_signals,
            budget_spent_pct: self.budget_spent_pct,
            locked_outcome: self.locked_outcome().map(str::to_owned),
        }
    }

    /// Select the outcome with the strictly highest positive z-score and run
    /// the trigger policy on it
    fn evaluate_best_mover(&mut self) -> Option<MovementSignal> {
        let mut best: Option<(String, f64)> = None;
        for (name, state) in &self.outcomes {
            let Some(z) = state.zscore() else { continue };
            if z > 0.0 && best.as_ref().map_or(true, |(_, bz)| z > *bz) {
                best = Some((name.clone(), z));
            }
        }
        let (name, _) = best?;
        self.check_trigger(&name)
    }

    /// Trigger policy, evaluated on the tick's chosen best mover
    ///
    /// Check order matters: price-quality gates run before the lock check so
    /// a locked-out candidate is never partially processed, and the scale-in
    /// index check runs last so a rejected candidate never consumes a slot.
    fn check_trigger(&mut self, name: &str) -> Option<MovementSignal> {
        let (zscore, price_change, current_price, baseline_price, last_update) = {
            let state = self.outcomes.get(name)?;
            let zscore = state.zscore()?;
            if zscore < self.config.zscore_threshold {
                return None;
            }
            let price_change = state.price_change()?;
            if price_change.abs() < self.config.min_price_change {
                return None;
            }
            let current_price = state.current_price?;
            if current_price > self.config.max_buy_price {
                tracing::info!(
                    outcome = %name,
                    zscore,
                    price = %current_price,
                    max = %self.config.max_buy_price,
                    "Significant move but price above ceiling"
                );
                return None;
            }
            (
                zscore,
                price_change,
                current_price,
                state.baseline_price?,
                state.last_update,
            )
        };

        if let Phase::Locked { outcome } = &self.phase {
            if outcome != name {
                return None;
            }
        }

        let state = self.outcomes.get_mut(name)?;
        let trigger_number = state.trigger_count + 1;
        if trigger_number > self.config.scale_in_pcts.len() {
            return None;
        }
        state.trigger_count = trigger_number;

        let budget_pct = self.config.scale_in_pcts[trigger_number - 1];
        self.budget_spent_pct += budget_pct;
        self.total_signals += 1;

        if self.phase == Phase::Armed {
            self.phase = Phase::Locked {
                outcome: name.to_string(),
            };
            tracing::info!(outcome = %name, "Locked to outcome");
        }

        let price_change_pct = if baseline_price > Decimal::ZERO {
            price_change / baseline_price * dec!(100)
        } else {
            Decimal::ZERO
        };

        tracing::info!(
            outcome = %name,
            zscore,
            baseline = %baseline_price,
            price = %current_price,
            change = %price_change,
            trigger = trigger_number,
            budget_pct = %budget_pct,
            "SIGNAL: BUY YES"
        );

        let (token_id, no_token_id) = {
            let state = self.outcomes.get(name)?;
            (state.token_id.clone(), state.no_token_id.clone())
        };

        Some(MovementSignal {
            id: Uuid::new_v4(),
            outcome_name: name.to_string(),
            token_id,
            no_token_id,
            current_price,
            baseline_price,
            zscore,
            price_change,
            price_change_pct,
            trigger_number,
            budget_pct,
            timestamp: last_update.unwrap_or_else(Utc::now),
        })
    }
}
