//! Order book state and quote normalization
//!
//! Every external quote representation (REST book payloads, WebSocket
//! `book` snapshots, incremental `price_change` events) is converted into a
//! canonical [`Quote`] before it reaches the detector; the detector never
//! branches on payload shape.

mod book;
mod stream;

pub use book::{OrderBook, PriceLevel};
pub use stream::{BookStream, StreamConfig, POLYMARKET_WS_URL};

use rust_decimal::Decimal;

/// Canonical quote: the best ask observed for one token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    /// Outcome token the quote belongs to
    pub token_id: String,
    /// Best ask price
    pub price: Decimal,
}
