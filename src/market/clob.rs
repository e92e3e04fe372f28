//! CLOB REST client for order-book reads
//!
//! Used to snapshot baselines at window start and as the pull-based quote
//! source when the bot runs in polling mode.

use super::QuoteSource;
use crate::orderbook::{OrderBook, PriceLevel};
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;

/// Polymarket CLOB REST base URL
pub const CLOB_API_URL: &str = "https://clob.polymarket.com";

/// Configuration for the CLOB REST client
#[derive(Debug, Clone)]
pub struct ClobConfig {
    /// Base URL for the CLOB API
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for ClobConfig {
    fn default() -> Self {
        Self {
            base_url: CLOB_API_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// REST client for the Polymarket CLOB
pub struct ClobClient {
    config: ClobConfig,
    client: Client,
}

impl ClobClient {
    /// Create a client with default configuration
    pub fn new() -> anyhow::Result<Self> {
        Self::with_config(ClobConfig::default())
    }

    /// Create a client with custom configuration
    pub fn with_config(config: ClobConfig) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    /// Fetch the order book for a token
    ///
    /// `Ok(None)` on a 404: an unknown or expired token is unavailability,
    /// not a session-level failure.
    pub async fn get_book(&self, token_id: &str) -> anyhow::Result<Option<OrderBook>> {
        let url = format!("{}/book", self.config.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("token_id", token_id)])
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            anyhow::bail!("CLOB book request failed: {}", response.status());
        }

        let raw: RawBook = response.json().await?;
        Ok(Some(raw.into_order_book(token_id)))
    }
}

#[async_trait]
impl QuoteSource for ClobClient {
    async fn best_ask(&self, token_id: &str) -> anyhow::Result<Option<Decimal>> {
        Ok(self
            .get_book(token_id)
            .await?
            .and_then(|book| book.best_ask()))
    }
}

/// Book payload as returned by the CLOB REST API
#[derive(Debug, Deserialize)]
struct RawBook {
    #[serde(default)]
    bids: Vec<RawLevel>,
    #[serde(default)]
    asks: Vec<RawLevel>,
}

/// Price level with string-encoded decimals
#[derive(Debug, Deserialize)]
struct RawLevel {
    price: String,
    size: String,
}

impl RawBook {
    /// Convert into the canonical book, dropping unparseable levels and
    /// restoring best-first ordering
    fn into_order_book(self, token_id: &str) -> OrderBook {
        let mut book = OrderBook::new(token_id);
        book.bids = parse_levels(self.bids);
        book.asks = parse_levels(self.asks);
        book.bids.sort_by(|a, b| b.price.cmp(&a.price));
        book.asks.sort_by(|a, b| a.price.cmp(&b.price));
        book
    }
}

fn parse_levels(raw: Vec<RawLevel>) -> Vec<PriceLevel> {
    raw.into_iter()
        .filter_map(|level| {
            let price = Decimal::from_str(&level.price).ok()?;
            let size = Decimal::from_str(&level.size).ok()?;
            Some(PriceLevel { price, size })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_raw_book_conversion_sorts_levels() {
        let raw = RawBook {
            bids: vec![
                RawLevel {
                    price: "0.10".to_string(),
                    size: "50".to_string(),
                },
                RawLevel {
                    price: "0.12".to_string(),
                    size: "40".to_string(),
                },
            ],
            asks: vec![
                RawLevel {
                    price: "0.20".to_string(),
                    size: "30".to_string(),
                },
                RawLevel {
                    price: "0.15".to_string(),
                    size: "25".to_string(),
                },
            ],
        };

        let book = raw.into_order_book("tok");
        assert_eq!(book.best_bid(), Some(dec!(0.12)));
        assert_eq!(book.best_ask(), Some(dec!(0.15)));
    }

    #[test]
    fn test_unparseable_levels_dropped() {
        let raw = RawBook {
            bids: vec![RawLevel {
                price: "garbage".to_string(),
                size: "50".to_string(),
            }],
            asks: vec![],
        };
        let book = raw.into_order_book("tok");
        assert!(book.bids.is_empty());
        assert!(book.best_bid().is_none());
    }

    #[test]
    fn test_book_payload_deserialize() {
        let json = r#"{
            "market": "0xabc",
            "asset_id": "tok",
            "bids": [{"price": "0.10", "size": "100"}],
            "asks": [{"price": "0.15", "size": "80"}]
        }"#;
        let raw: RawBook = serde_json::from_str(json).unwrap();
        assert_eq!(raw.bids.len(), 1);
        assert_eq!(raw.asks.len(), 1);
    }
}
