//! Execution types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A market buy request, priced from the current best ask
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuyOrder {
    /// Token identifier to buy
    pub token_id: String,
    /// Outcome label, for logging and fill records
    pub outcome_name: String,
    /// Expected fill price (current best ask)
    pub price: Decimal,
    /// Dollar amount to spend
    pub amount_usd: Decimal,
}

/// An executed buy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderFill {
    /// Exchange-assigned order identifier
    pub order_id: String,
    /// Token that was bought
    pub token_id: String,
    /// Outcome label
    pub outcome_name: String,
    /// Fill price
    pub price: Decimal,
    /// Shares received
    pub size: Decimal,
    /// Dollars spent
    pub amount_usd: Decimal,
    /// Fill timestamp
    pub timestamp: DateTime<Utc>,
}

/// Execution errors
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// Exchange rejected the order
    #[error("order rejected: {0}")]
    Rejected(String),
    /// Transport failure talking to the exchange
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    /// Response did not match the expected shape
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_buy_order_creation() {
        let order = BuyOrder {
            token_id: "yes-token".to_string(),
            outcome_name: "2.4M-2.6M".to_string(),
            price: dec!(0.30),
            amount_usd: dec!(50),
        };
        assert_eq!(order.token_id, "yes-token");
        assert_eq!(order.amount_usd, dec!(50));
    }

    #[test]
    fn test_fill_serde_round_trip() {
        let fill = OrderFill {
            order_id: "abc".to_string(),
            token_id: "yes-token".to_string(),
            outcome_name: "2.4M-2.6M".to_string(),
            price: dec!(0.30),
            size: dec!(166.66),
            amount_usd: dec!(50),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_string(&fill).unwrap();
        let back: OrderFill = serde_json::from_str(&json).unwrap();
        assert_eq!(back.order_id, fill.order_id);
        assert_eq!(back.price, fill.price);
    }

    #[test]
    fn test_error_display() {
        let err = ExecutionError::Rejected("insufficient balance".to_string());
        assert_eq!(err.to_string(), "order rejected: insufficient balance");
    }
}
