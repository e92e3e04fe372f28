//! Detector signal and status types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A detected anomaly event, handed to the execution layer exactly once
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementSignal {
    /// Unique signal identifier
    pub id: Uuid,
    /// Outcome label that fired
    pub outcome_name: String,
    /// Tradable Yes token
    pub token_id: String,
    /// Optional paired No token
    pub no_token_id: Option<String>,
    /// Price at signal time
    pub current_price: Decimal,
    /// Window-start baseline price
    pub baseline_price: Decimal,
    /// Z-score that crossed the threshold
    pub zscore: f64,
    /// Absolute change from baseline
    pub price_change: Decimal,
    /// Percentage change from baseline
    pub price_change_pct: Decimal,
    /// Which scale-in trigger this is (1-based)
    pub trigger_number: usize,
    /// Budget percentage assigned to this trigger
    pub budget_pct: Decimal,
    /// Signal generation timestamp
    pub timestamp: DateTime<Utc>,
}

/// Read-only detector snapshot for operator visibility
#[derive(Debug, Clone, Serialize)]
pub struct DetectorStatus {
    /// Whether a baseline has been established this window
    pub baseline_set: bool,
    /// Window start time, if armed
    pub window_start: Option<DateTime<Utc>>,
    /// Number of outcomes currently tracked
    pub outcomes_tracked: usize,
    /// Cumulative signals emitted this session
    pub total_signals: u64,
    /// Cumulative budget percentage consumed by triggers
    pub budget_spent_pct: Decimal,
    /// Outcome the detector is locked to, if any
    pub locked_outcome: Option<String>,
}
