//! Live best-ask stream over the Polymarket CLOB WebSocket
//!
//! Subscribes to the market channel for a set of tokens, maintains a light
//! ask ladder per token from `book` snapshots and incremental
//! `price_change` events, and emits a canonical [`Quote`] whenever a
//! token's best ask changes. Ladders are rebuilt from scratch after every
//! reconnect so no update is ever applied to stale state.

use super::Quote;
use crate::ws::{WsClient, WsConfig, WsEvent};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::str::FromStr;
use tokio::sync::mpsc;

/// Polymarket CLOB WebSocket URL for market data
pub const POLYMARKET_WS_URL: &str = "wss://ws-subscriptions-clob.polymarket.com/ws/market";

/// Configuration for the book stream
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// WebSocket URL
    pub ws_url: String,
    /// Channel buffer size for emitted quotes
    pub buffer_size: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            ws_url: POLYMARKET_WS_URL.to_string(),
            buffer_size: 256,
        }
    }
}

/// Push-based quote source for a fixed token set
pub struct BookStream;

impl BookStream {
    /// Subscribe to the given tokens and stream best-ask quotes
    ///
    /// The stream ends (receiver yields `None`) when the connection is
    /// closed for good. Dropping the receiver tears the connection down.
    pub fn subscribe(config: StreamConfig, token_ids: Vec<String>) -> mpsc::Receiver<Quote> {
        let (tx, rx) = mpsc::channel(config.buffer_size);

        if token_ids.is_empty() {
            tracing::warn!("No token IDs to subscribe, returning empty stream");
            return rx;
        }

        tokio::spawn(async move {
            run_stream(config, token_ids, tx).await;
        });

        rx
    }
}

async fn run_stream(config: StreamConfig, token_ids: Vec<String>, tx: mpsc::Sender<Quote>) {
    let ws_config = WsConfig::new(&config.ws_url);
    let client = WsClient::new(ws_config);
    let (mut events, sender) = client.connect();

    let subscribed: HashSet<String> = token_ids.iter().cloned().collect();
    let mut ladders = AskLadders::new(subscribed);

    while let Some(event) = events.recv().await {
        match event {
            WsEvent::Connected => {
                // Fresh session: anything learned before the reconnect is stale
                ladders.clear();

                let sub = SubscriptionMessage {
                    assets_ids: token_ids.clone(),
                    msg_type: "market".to_string(),
                };
                match serde_json::to_string(&sub) {
                    Ok(json) => {
                        if sender.send(json).await.is_err() {
                            tracing::error!("Failed to send subscription message");
                            break;
                        }
                        tracing::info!(tokens = token_ids.len(), "Subscribed to order books");
                    }
                    Err(e) => tracing::error!(error = %e, "Failed to encode subscription"),
                }
            }
            WsEvent::Text(text) => {
                for quote in ladders.apply_message(&text) {
                    metrics::counter!("polymovement_book_updates_total").increment(1);
                    if tx.send(quote).await.is_err() {
                        tracing::debug!("Quote receiver dropped, closing stream");
                        return;
                    }
                }
            }
            WsEvent::Reconnecting { attempt } => {
                tracing::info!(attempt, "Book stream reconnecting");
            }
            WsEvent::Disconnected => {
                tracing::info!("Book stream disconnected");
                break;
            }
        }
    }
}

/// Per-token ask ladders with change detection on the best ask
struct AskLadders {
    subscribed: HashSet<String>,
    asks: HashMap<String, BTreeMap<Decimal, Decimal>>,
    last_best: HashMap<String, Decimal>,
}

impl AskLadders {
    fn new(subscribed: HashSet<String>) -> Self {
        Self {
            subscribed,
            asks: HashMap::new(),
            last_best: HashMap::new(),
        }
    }

    fn clear(&mut self) {
        self.asks.clear();
        self.last_best.clear();
    }

    /// Apply one WebSocket message, returning quotes for tokens whose best
    /// ask changed
    fn apply_message(&mut self, text: &str) -> Vec<Quote> {
        let mut touched = Vec::new();

        // Messages arrive both as single events and as arrays of events
        if let Ok(events) = serde_json::from_str::<Vec<serde_json::Value>>(text) {
            for event in &events {
                self.apply_event(event, &mut touched);
            }
        } else if let Ok(event) = serde_json::from_str::<serde_json::Value>(text) {
            self.apply_event(&event, &mut touched);
        } else {
            tracing::warn!(preview = %text.chars().take(100).collect::<String>(), "Invalid JSON frame");
        }

        let mut quotes = Vec::new();
        for token_id in touched {
            let Some(best) = self.asks.get(&token_id).and_then(|l| l.keys().next().copied())
            else {
                continue;
            };
            if self.last_best.get(&token_id) != Some(&best) {
                self.last_best.insert(token_id.clone(), best);
                quotes.push(Quote {
                    token_id,
                    price: best,
                });
            }
        }
        quotes
    }

    fn apply_event(&mut self, event: &serde_json::Value, touched: &mut Vec<String>) {
        let event_type = event
            .get("event_type")
            .and_then(|v| v.as_str())
            .unwrap_or("");

        match event_type {
            "book" => {
                if let Ok(book) = serde_json::from_value::<BookEvent>(event.clone()) {
                    self.apply_book(book, touched);
                }
            }
            "price_change" => {
                if let Ok(msg) = serde_json::from_value::<PriceChangeEvent>(event.clone()) {
                    self.apply_price_changes(msg, touched);
                }
            }
            // last_trade_price, tick_size_change etc. carry no book state
            _ => {}
        }
    }

    fn apply_book(&mut self, book: BookEvent, touched: &mut Vec<String>) {
        if !self.subscribed.contains(&book.asset_id) {
            return;
        }
        let ladder = self.asks.entry(book.asset_id.clone()).or_default();
        ladder.clear();
        for level in book.asks {
            let (Ok(price), Ok(size)) = (
                Decimal::from_str(&level.price),
                Decimal::from_str(&level.size),
            ) else {
                continue;
            };
            if !size.is_zero() {
                ladder.insert(price, size);
            }
        }
        touched.push(book.asset_id);
    }

    fn apply_price_changes(&mut self, msg: PriceChangeEvent, touched: &mut Vec<String>) {
        // Two wire shapes: a flat price_changes list with per-change asset
        // ids, or a per-asset event with a changes list.
        let changes: Vec<(String, LevelChange)> = if !msg.price_changes.is_empty() {
            msg.price_changes
                .into_iter()
                .map(|c| {
                    (
                        c.asset_id,
                        LevelChange {
                            price: c.price,
                            size: c.size,
                            side: c.side,
                        },
                    )
                })
                .collect()
        } else if let Some(asset_id) = msg.asset_id {
            msg.changes
                .into_iter()
                .map(|c| (asset_id.clone(), c))
                .collect()
        } else {
            Vec::new()
        };

        for (asset_id, change) in changes {
            if !self.subscribed.contains(&asset_id) || change.side != "SELL" {
                continue;
            }
            let (Ok(price), Ok(size)) = (
                Decimal::from_str(&change.price),
                Decimal::from_str(&change.size),
            ) else {
                continue;
            };

            let ladder = self.asks.entry(asset_id.clone()).or_default();
            if size.is_zero() {
                ladder.remove(&price);
            } else {
                ladder.insert(price, size);
            }
            touched.push(asset_id);
        }
    }
}

/// Subscription message for the market channel
#[derive(Debug, Serialize)]
struct SubscriptionMessage {
    assets_ids: Vec<String>,
    #[serde(rename = "type")]
    msg_type: String,
}

/// Full book snapshot event
#[derive(Debug, Deserialize)]
struct BookEvent {
    asset_id: String,
    #[serde(default)]
    asks: Vec<RawLevel>,
}

/// String-encoded price level
#[derive(Debug, Deserialize)]
struct RawLevel {
    price: String,
    size: String,
}

/// Incremental price change event, in either wire shape
#[derive(Debug, Deserialize)]
struct PriceChangeEvent {
    #[serde(default)]
    asset_id: Option<String>,
    #[serde(default)]
    changes: Vec<LevelChange>,
    #[serde(default)]
    price_changes: Vec<FlatChange>,
}

/// Change entry carrying its own asset id
#[derive(Debug, Deserialize)]
struct FlatChange {
    asset_id: String,
    price: String,
    size: String,
    side: String,
}

/// Change entry scoped to the event's asset id
#[derive(Debug, Deserialize)]
struct LevelChange {
    price: String,
    size: String,
    side: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn ladders_for(tokens: &[&str]) -> AskLadders {
        AskLadders::new(tokens.iter().map(|t| t.to_string()).collect())
    }

    #[test]
    fn test_book_snapshot_emits_best_ask() {
        let mut ladders = ladders_for(&["tok-a"]);
        let msg = r#"{
            "event_type": "book",
            "asset_id": "tok-a",
            "asks": [
                {"price": "0.20", "size": "50"},
                {"price": "0.15", "size": "30"}
            ]
        }"#;
        let quotes = ladders.apply_message(msg);
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].token_id, "tok-a");
        assert_eq!(quotes[0].price, dec!(0.15));
    }

    #[test]
    fn test_unchanged_best_not_reemitted() {
        let mut ladders = ladders_for(&["tok-a"]);
        let msg = r#"{"event_type":"book","asset_id":"tok-a","asks":[{"price":"0.15","size":"30"}]}"#;
        assert_eq!(ladders.apply_message(msg).len(), 1);
        assert_eq!(ladders.apply_message(msg).len(), 0);
    }

    #[test]
    fn test_unsubscribed_token_ignored() {
        let mut ladders = ladders_for(&["tok-a"]);
        let msg = r#"{"event_type":"book","asset_id":"tok-b","asks":[{"price":"0.15","size":"30"}]}"#;
        assert!(ladders.apply_message(msg).is_empty());
    }

    #[test]
    fn test_price_change_moves_best() {
        let mut ladders = ladders_for(&["tok-a"]);
        let snapshot = r#"{"event_type":"book","asset_id":"tok-a","asks":[{"price":"0.20","size":"50"}]}"#;
        ladders.apply_message(snapshot);

        // A new SELL level inside the spread becomes the best ask
        let change = r#"{
            "event_type": "price_change",
            "asset_id": "tok-a",
            "changes": [{"price": "0.18", "size": "10", "side": "SELL"}]
        }"#;
        let quotes = ladders.apply_message(change);
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].price, dec!(0.18));
    }

    #[test]
    fn test_price_change_removal_restores_next_level() {
        let mut ladders = ladders_for(&["tok-a"]);
        let snapshot = r#"{"event_type":"book","asset_id":"tok-a","asks":[
            {"price": "0.18", "size": "10"},
            {"price": "0.20", "size": "50"}
        ]}"#;
        ladders.apply_message(snapshot);

        let removal = r#"{
            "event_type": "price_change",
            "asset_id": "tok-a",
            "changes": [{"price": "0.18", "size": "0", "side": "SELL"}]
        }"#;
        let quotes = ladders.apply_message(removal);
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].price, dec!(0.20));
    }

    #[test]
    fn test_buy_side_changes_ignored() {
        let mut ladders = ladders_for(&["tok-a"]);
        let snapshot = r#"{"event_type":"book","asset_id":"tok-a","asks":[{"price":"0.20","size":"50"}]}"#;
        ladders.apply_message(snapshot);

        let change = r#"{
            "event_type": "price_change",
            "asset_id": "tok-a",
            "changes": [{"price": "0.10", "size": "10", "side": "BUY"}]
        }"#;
        assert!(ladders.apply_message(change).is_empty());
    }

    #[test]
    fn test_flat_price_changes_shape() {
        let mut ladders = ladders_for(&["tok-a", "tok-b"]);
        let msg = r#"{
            "event_type": "price_change",
            "price_changes": [
                {"asset_id": "tok-a", "price": "0.15", "size": "5", "side": "SELL"},
                {"asset_id": "tok-b", "price": "0.40", "size": "8", "side": "SELL"}
            ]
        }"#;
        let quotes = ladders.apply_message(msg);
        assert_eq!(quotes.len(), 2);
    }

    #[test]
    fn test_array_of_events() {
        let mut ladders = ladders_for(&["tok-a", "tok-b"]);
        let msg = r#"[
            {"event_type":"book","asset_id":"tok-a","asks":[{"price":"0.15","size":"30"}]},
            {"event_type":"book","asset_id":"tok-b","asks":[{"price":"0.25","size":"30"}]}
        ]"#;
        let quotes = ladders.apply_message(msg);
        assert_eq!(quotes.len(), 2);
    }

    #[test]
    fn test_malformed_frame_skipped() {
        let mut ladders = ladders_for(&["tok-a"]);
        assert!(ladders.apply_message("not json").is_empty());
        assert!(ladders
            .apply_message(r#"{"event_type":"last_trade_price"}"#)
            .is_empty());
    }

    #[test]
    fn test_clear_forgets_state() {
        let mut ladders = ladders_for(&["tok-a"]);
        let msg = r#"{"event_type":"book","asset_id":"tok-a","asks":[{"price":"0.15","size":"30"}]}"#;
        ladders.apply_message(msg);
        ladders.clear();
        // Same snapshot emits again after a reconnect-style clear
        assert_eq!(ladders.apply_message(msg).len(), 1);
    }
}
