//! Movement detection module
//!
//! The core of the bot: per-outcome rolling price statistics, z-score
//! anomaly detection against a window-start baseline, and the
//! trigger/lock/scale-in state machine that arbitrates which outcome of a
//! market may be bought and how much of the budget each trigger commits.

mod movement;
mod outcome;
mod schedule;
mod types;

pub use movement::{BaselineQuote, DetectorConfig, MovementDetector, Phase};
pub use outcome::{OutcomeState, HISTORY_CAPACITY, MIN_SAMPLES};
pub use schedule::{default_schedule, parse_scale_in_pcts};
pub use types::{DetectorStatus, MovementSignal};
