//! Shared session budget
//!
//! One budget covers every market monitored in a window. Allocations are
//! quoted against what remains right now, so a second market triggering
//! after the first has spent sees only the leftover. Funds leave the
//! budget on commit, after a buy actually fills.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Orders below this dollar amount are discarded instead of submitted
pub const MIN_ORDER_USD: Decimal = dec!(1);

/// Dollar budget shared across all detectors in a session
#[derive(Debug, Clone)]
pub struct SessionBudget {
    max: Decimal,
    remaining: Decimal,
}

impl SessionBudget {
    /// Create a budget with the given maximum
    pub fn new(max: Decimal) -> Self {
        Self {
            max,
            remaining: max,
        }
    }

    /// Configured maximum
    pub fn max(&self) -> Decimal {
        self.max
    }

    /// Uncommitted funds
    pub fn remaining(&self) -> Decimal {
        self.remaining
    }

    /// Dollars committed so far
    pub fn spent(&self) -> Decimal {
        self.max - self.remaining
    }

    /// Quote an order amount for a percentage of the remaining budget
    ///
    /// Returns `None` when the resulting amount is below [`MIN_ORDER_USD`].
    /// Quoting does not reserve funds; call [`commit`](Self::commit) once
    /// the order fills.
    pub fn allocate(&self, pct: Decimal) -> Option<Decimal> {
        let amount = (self.remaining * pct / dec!(100)).min(self.remaining);
        if amount < MIN_ORDER_USD {
            tracing::warn!(
                amount = %amount,
                remaining = %self.remaining,
                "Allocation below minimum order size, discarding"
            );
            return None;
        }
        Some(amount)
    }

    /// Deduct a filled amount from the remaining budget
    pub fn commit(&mut self, amount: Decimal) {
        self.remaining = (self.remaining - amount).max(Decimal::ZERO);
    }

    /// True once nothing spendable remains
    pub fn is_exhausted(&self) -> bool {
        self.remaining < MIN_ORDER_USD
    }

    /// Restore the full budget for a new session
    pub fn reset(&mut self) {
        self.remaining = self.max;
    }
}
