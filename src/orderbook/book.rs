//! Order book state management

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Single price level
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceLevel {
    /// Level price
    pub price: Decimal,
    /// Resting size at this price
    pub size: Decimal,
}

/// L2 aggregated order book for a token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderBook {
    /// Token identifier
    pub token_id: String,
    /// Bid levels, sorted best (highest) to worst
    pub bids: Vec<PriceLevel>,
    /// Ask levels, sorted best (lowest) to worst
    pub asks: Vec<PriceLevel>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl OrderBook {
    /// Create a new empty order book
    pub fn new(token_id: impl Into<String>) -> Self {
        Self {
            token_id: token_id.into(),
            bids: vec![],
            asks: vec![],
            updated_at: Utc::now(),
        }
    }

    /// Get best bid price
    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids.first().map(|l| l.price)
    }

    /// Get best ask price
    pub fn best_ask(&self) -> Option<Decimal> {
        self.asks.first().map(|l| l.price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_empty_book() {
        let book = OrderBook::new("test-token");
        assert_eq!(book.token_id, "test-token");
        assert!(book.best_bid().is_none());
        assert!(book.best_ask().is_none());
    }

    #[test]
    fn test_best_prices() {
        let mut book = OrderBook::new("test");
        book.bids = vec![
            PriceLevel {
                price: dec!(0.50),
                size: dec!(100),
            },
            PriceLevel {
                price: dec!(0.49),
                size: dec!(100),
            },
        ];
        book.asks = vec![
            PriceLevel {
                price: dec!(0.52),
                size: dec!(100),
            },
            PriceLevel {
                price: dec!(0.53),
                size: dec!(100),
            },
        ];

        assert_eq!(book.best_bid(), Some(dec!(0.50)));
        assert_eq!(book.best_ask(), Some(dec!(0.52)));
    }

    #[test]
    fn test_one_sided_book() {
        let mut book = OrderBook::new("test");
        book.asks = vec![PriceLevel {
            price: dec!(0.56),
            size: dec!(100),
        }];
        assert_eq!(book.best_ask(), Some(dec!(0.56)));
        assert!(book.best_bid().is_none());
    }
}
