//! Market discovery module
//!
//! Resolves which TSA passenger-count markets exist for a trading day and
//! maps outcome names to tradable token identifiers. A calendar rollover
//! day can yield more than one market needing simultaneous monitoring.

mod clob;
mod gamma;

pub use clob::{ClobClient, ClobConfig, CLOB_API_URL};
pub use gamma::{GammaClient, GammaConfig, GAMMA_API_URL};

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One mutually exclusive outcome (bracket) within a market
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outcome {
    /// Human-readable bracket label, stable within a session
    pub name: String,
    /// Tradable token for the Yes side
    pub token_id: String,
    /// Optional paired No token
    pub no_token_id: Option<String>,
}

/// A discovered market with its outcomes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Market {
    /// Unique condition identifier
    pub condition_id: String,
    /// Market question text
    pub question: String,
    /// Market slug
    pub slug: String,
    /// Outcomes to monitor
    pub outcomes: Vec<Outcome>,
}

/// Trait for market discovery implementations
#[async_trait]
pub trait MarketDiscovery: Send + Sync {
    /// Discover the markets to monitor for the given trading day
    async fn discover(&self, day: NaiveDate) -> anyhow::Result<Vec<Market>>;
}

/// Trait for pull-based quote sources
///
/// `Ok(None)` means no liquidity for that token right now; it is never an
/// error.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Best current ask price for an outcome token, if any
    async fn best_ask(&self, token_id: &str) -> anyhow::Result<Option<Decimal>>;
}
