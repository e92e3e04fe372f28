//! Gamma API client for market discovery
//!
//! Finds the daily TSA passenger-count event(s) on Polymarket's Gamma API
//! and flattens each event's bracket markets into one [`Market`] with an
//! outcome per bracket. Around a calendar rollover the previous, current and
//! next day can all have open events, so discovery probes all three.

use super::{Market, MarketDiscovery, Outcome};
use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Gamma API base URL
pub const GAMMA_API_URL: &str = "https://gamma-api.polymarket.com";

/// Configuration for the Gamma client
#[derive(Debug, Clone)]
pub struct GammaConfig {
    /// Base URL for the Gamma API
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Event slug prefix for the daily TSA markets
    pub slug_prefix: String,
    /// Explicit event slugs; when non-empty, discovery skips slug generation
    pub target_slugs: Vec<String>,
}

impl Default for GammaConfig {
    fn default() -> Self {
        Self {
            base_url: GAMMA_API_URL.to_string(),
            timeout: Duration::from_secs(10),
            slug_prefix: "tsa-passengers".to_string(),
            target_slugs: Vec::new(),
        }
    }
}

/// Client for Polymarket's Gamma API
pub struct GammaClient {
    config: GammaConfig,
    client: Client,
}

impl GammaClient {
    /// Create a new Gamma API client with default configuration
    pub fn new() -> anyhow::Result<Self> {
        Self::with_config(GammaConfig::default())
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: GammaConfig) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    /// Candidate event slugs for a trading day
    ///
    /// The upstream slug embeds the date the passenger data covers, which
    /// lags the trading day; probing the adjacent days covers the rollover.
    fn candidate_slugs(&self, day: NaiveDate) -> Vec<String> {
        if !self.config.target_slugs.is_empty() {
            return self.config.target_slugs.clone();
        }

        let mut days = vec![day];
        if let Some(prev) = day.checked_sub_days(Days::new(1)) {
            days.push(prev);
        }
        if let Some(next) = day.checked_add_days(Days::new(1)) {
            days.push(next);
        }

        days.into_iter()
            .map(|d| {
                format!(
                    "{}-{}",
                    self.config.slug_prefix,
                    d.format("%B-%-d").to_string().to_lowercase()
                )
            })
            .collect()
    }

    /// Fetch a single event by slug, flattened into a [`Market`]
    async fn fetch_event(&self, slug: &str) -> anyhow::Result<Option<Market>> {
        let url = format!("{}/events", self.config.base_url);
        tracing::debug!(url = %url, slug = %slug, "Fetching event from Gamma API");

        let response = self.client.get(&url).query(&[("slug", slug)]).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Gamma API error: {} - {}", status, body);
        }

        let events: Vec<GammaEvent> = response.json().await?;
        let Some(event) = events.into_iter().find(|e| e.active && !e.closed) else {
            return Ok(None);
        };

        let mut outcomes = Vec::new();
        for market in &event.markets {
            match market.yes_no_tokens() {
                Some((yes, no)) => outcomes.push(Outcome {
                    name: market.bracket_label(),
                    token_id: yes,
                    no_token_id: no,
                }),
                None => {
                    tracing::warn!(
                        market = %market.question,
                        "Bracket market without token ids, skipping"
                    );
                }
            }
        }

        if outcomes.is_empty() {
            return Ok(None);
        }

        Ok(Some(Market {
            condition_id: event.id,
            question: event.title,
            slug: event.slug,
            outcomes,
        }))
    }
}

#[async_trait]
impl MarketDiscovery for GammaClient {
    async fn discover(&self, day: NaiveDate) -> anyhow::Result<Vec<Market>> {
        let mut markets = Vec::new();
        for slug in self.candidate_slugs(day) {
            match self.fetch_event(&slug).await {
                Ok(Some(market)) => {
                    tracing::info!(slug = %slug, outcomes = market.outcomes.len(), "Discovered market");
                    markets.push(market);
                }
                Ok(None) => tracing::debug!(slug = %slug, "No active event for slug"),
                Err(e) => tracing::warn!(slug = %slug, error = %e, "Event lookup failed"),
            }
        }
        Ok(markets)
    }
}

/// Event from the Gamma API
#[derive(Debug, Deserialize)]
struct GammaEvent {
    id: String,
    title: String,
    slug: String,
    #[serde(default)]
    active: bool,
    #[serde(default)]
    closed: bool,
    #[serde(default)]
    markets: Vec<GammaMarket>,
}

/// Bracket market within an event
#[derive(Debug, Deserialize)]
struct GammaMarket {
    #[serde(default)]
    question: String,
    /// Short bracket label shown in grouped markets
    #[serde(rename = "groupItemTitle", default)]
    group_item_title: Option<String>,
    /// JSON-encoded array of CLOB token ids, Yes first
    #[serde(rename = "clobTokenIds", default)]
    clob_token_ids: Option<String>,
}

impl GammaMarket {
    /// Bracket label: the grouped title where present, else the question
    fn bracket_label(&self) -> String {
        self.group_item_title
            .clone()
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| self.question.clone())
    }

    /// Decode the Yes/No token pair from the JSON-encoded id list
    fn yes_no_tokens(&self) -> Option<(String, Option<String>)> {
        let raw = self.clob_token_ids.as_deref()?;
        let ids: Vec<String> = serde_json::from_str(raw).ok()?;
        let mut iter = ids.into_iter();
        let yes = iter.next()?;
        Some((yes, iter.next()))
    }
}
