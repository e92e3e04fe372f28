//! End-to-end movement detection and budget scenarios

use async_trait::async_trait;
use chrono::NaiveTime;
use poly_movement::detector::{BaselineQuote, MovementDetector, MovementSignal};
use poly_movement::execution::{BuyOrder, ExecutionError, OrderExecutor, OrderFill};
use poly_movement::market::{Market, MarketDiscovery, Outcome, QuoteSource};
use poly_movement::orderbook::Quote;
use poly_movement::session::{MonitorWindow, MovementBot};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn outcome(name: &str, token: &str) -> Outcome {
    Outcome {
        name: name.to_string(),
        token_id: token.to_string(),
        no_token_id: None,
    }
}

fn armed_detector(outcomes: &[(&str, &str)], baseline: Decimal) -> MovementDetector {
    let seeds: Vec<BaselineQuote> = outcomes
        .iter()
        .map(|(name, token)| BaselineQuote {
            outcome: outcome(name, token),
            best_ask: Some(baseline),
        })
        .collect();
    let mut detector = MovementDetector::with_defaults();
    detector.set_baseline(&seeds);
    detector
}

fn tick(detector: &mut MovementDetector, prices: &[(&str, Decimal)]) -> Vec<MovementSignal> {
    let quotes: Vec<Quote> = prices
        .iter()
        .map(|(token, price)| Quote {
            token_id: token.to_string(),
            price: *price,
        })
        .collect();
    detector.update_prices(&quotes)
}

#[test]
fn gradual_climb_triggers_once_then_scales_in() {
    let mut detector = armed_detector(&[("2.4M-2.6M", "tok-a")], dec!(0.10));

    // Quiet open: no movement, no signals
    for _ in 0..5 {
        assert!(tick(&mut detector, &[("tok-a", dec!(0.10))]).is_empty());
    }

    // First significant move takes 50% of the budget
    let signals = tick(&mut detector, &[("tok-a", dec!(0.16))]);
    assert_eq!(signals.len(), 1);
    assert_eq!(signals[0].trigger_number, 1);
    assert_eq!(signals[0].budget_pct, dec!(50));
    assert_eq!(detector.locked_outcome(), Some("2.4M-2.6M"));

    // Continued move scales in at 30% then 20%
    let signals = tick(&mut detector, &[("tok-a", dec!(0.22))]);
    assert_eq!(signals.len(), 1);
    assert_eq!(signals[0].trigger_number, 2);
    assert_eq!(signals[0].budget_pct, dec!(30));

    let signals = tick(&mut detector, &[("tok-a", dec!(0.30))]);
    assert_eq!(signals.len(), 1);
    assert_eq!(signals[0].trigger_number, 3);
    assert_eq!(signals[0].budget_pct, dec!(20));

    // Schedule exhausted: further moves stay silent
    let signals = tick(&mut detector, &[("tok-a", dec!(0.40))]);
    assert!(signals.is_empty());

    let status = detector.status();
    assert_eq!(status.total_signals, 3);
    assert_eq!(status.budget_spent_pct, dec!(100));
}

#[test]
fn oscillation_never_triggers() {
    let mut detector = armed_detector(&[("2.4M-2.6M", "tok-a")], dec!(0.50));

    for i in 0..30 {
        let price = if i % 2 == 0 { dec!(0.48) } else { dec!(0.52) };
        let signals = tick(&mut detector, &[("tok-a", price)]);
        assert!(signals.is_empty(), "oscillation tick {i} signalled");
    }
    assert_eq!(detector.status().total_signals, 0);
}

#[test]
fn lock_excludes_other_outcomes() {
    let mut detector =
        armed_detector(&[("2.4M-2.6M", "tok-a"), ("2.6M-2.8M", "tok-b")], dec!(0.10));

    for _ in 0..5 {
        tick(
            &mut detector,
            &[("tok-a", dec!(0.10)), ("tok-b", dec!(0.10))],
        );
    }

    // First mover wins the lock
    let signals = tick(
        &mut detector,
        &[("tok-a", dec!(0.16)), ("tok-b", dec!(0.10))],
    );
    assert_eq!(signals.len(), 1);
    assert_eq!(signals[0].outcome_name, "2.4M-2.6M");

    // A bigger move on the other outcome is ignored once locked
    let signals = tick(
        &mut detector,
        &[("tok-a", dec!(0.16)), ("tok-b", dec!(0.30))],
    );
    assert!(signals.is_empty());
    assert_eq!(detector.locked_outcome(), Some("2.4M-2.6M"));
}

#[test]
fn price_above_cap_never_bought() {
    let mut detector = armed_detector(&[("2.4M-2.6M", "tok-a")], dec!(0.90));

    for _ in 0..5 {
        tick(&mut detector, &[("tok-a", dec!(0.90))]);
    }
    // Large move, but the price is beyond the buy cap
    let signals = tick(&mut detector, &[("tok-a", dec!(0.98))]);
    assert!(signals.is_empty());
}

// Session-level fixtures

struct FixedDiscovery {
    markets: Vec<Market>,
}

#[async_trait]
impl MarketDiscovery for FixedDiscovery {
    async fn discover(&self, _day: chrono::NaiveDate) -> anyhow::Result<Vec<Market>> {
        Ok(self.markets.clone())
    }
}

struct ScriptedQuotes {
    asks: Mutex<HashMap<String, Decimal>>,
}

impl ScriptedQuotes {
    fn new(asks: &[(&str, Decimal)]) -> Self {
        Self {
            asks: Mutex::new(asks.iter().map(|(k, v)| (k.to_string(), *v)).collect()),
        }
    }

    fn set(&self, token: &str, price: Decimal) {
        self.asks.lock().unwrap().insert(token.to_string(), price);
    }
}

#[async_trait]
impl QuoteSource for ScriptedQuotes {
    async fn best_ask(&self, token_id: &str) -> anyhow::Result<Option<Decimal>> {
        Ok(self.asks.lock().unwrap().get(token_id).copied())
    }
}

struct RecordingExecutor {
    fills: Mutex<Vec<OrderFill>>,
}

impl RecordingExecutor {
    fn new() -> Self {
        Self {
            fills: Mutex::new(vec![]),
        }
    }
}

#[async_trait]
impl OrderExecutor for RecordingExecutor {
    async fn buy_market(&self, order: BuyOrder) -> Result<OrderFill, ExecutionError> {
        let fill = OrderFill {
            order_id: format!("fill-{}", self.fills.lock().unwrap().len()),
            token_id: order.token_id,
            outcome_name: order.outcome_name,
            price: order.price,
            size: order.amount_usd / order.price,
            amount_usd: order.amount_usd,
            timestamp: chrono::Utc::now(),
        };
        self.fills.lock().unwrap().push(fill.clone());
        Ok(fill)
    }

    async fn fills(&self) -> Vec<OrderFill> {
        self.fills.lock().unwrap().clone()
    }
}

fn always_open_window() -> MonitorWindow {
    MonitorWindow::new(
        NaiveTime::from_hms_opt(0, 0, 0).unwrap(),
        NaiveTime::from_hms_opt(23, 59, 59).unwrap(),
        0,
        false,
        Duration::from_secs(30),
    )
    .unwrap()
}

fn single_outcome_market(condition_id: &str, name: &str, token: &str) -> Market {
    Market {
        condition_id: condition_id.to_string(),
        question: format!("TSA {name}?"),
        slug: format!("tsa-{condition_id}"),
        outcomes: vec![outcome(name, token)],
    }
}

#[tokio::test]
async fn budget_is_shared_across_markets() {
    let discovery = Arc::new(FixedDiscovery {
        markets: vec![
            single_outcome_market("m1", "2.4M-2.6M", "tok-a"),
            single_outcome_market("m2", "2.6M-2.8M", "tok-b"),
        ],
    });
    let quotes = Arc::new(ScriptedQuotes::new(&[
        ("tok-a", dec!(0.10)),
        ("tok-b", dec!(0.10)),
    ]));
    let executor = Arc::new(RecordingExecutor::new());

    let mut bot = MovementBot::new(
        always_open_window(),
        poly_movement::detector::DetectorConfig::default(),
        dec!(100),
        discovery,
        quotes.clone(),
        executor.clone(),
    );
    bot.open_session().await.unwrap();

    // Quiet ticks to build history
    for _ in 0..5 {
        assert!(bot.poll_tick().await);
    }

    // First market triggers: 50% of $100
    quotes.set("tok-a", dec!(0.16));
    assert!(bot.poll_tick().await);

    // Second market triggers on a later tick: 50% of the remaining $50
    quotes.set("tok-b", dec!(0.16));
    assert!(bot.poll_tick().await);

    let fills = executor.fills().await;
    let amounts: Vec<Decimal> = fills.iter().map(|f| f.amount_usd).collect();
    assert!(amounts.contains(&dec!(50)));
    assert!(amounts.contains(&dec!(25)));
    assert_eq!(bot.budget_remaining(), dec!(25));
}

#[tokio::test]
async fn sub_dollar_budget_places_nothing() {
    let discovery = Arc::new(FixedDiscovery {
        markets: vec![single_outcome_market("m1", "2.4M-2.6M", "tok-a")],
    });
    let quotes = Arc::new(ScriptedQuotes::new(&[("tok-a", dec!(0.10))]));
    let executor = Arc::new(RecordingExecutor::new());

    let mut bot = MovementBot::new(
        always_open_window(),
        poly_movement::detector::DetectorConfig::default(),
        dec!(0.50),
        discovery,
        quotes.clone(),
        executor.clone(),
    );
    bot.open_session().await.unwrap();

    for _ in 0..5 {
        bot.poll_tick().await;
    }
    quotes.set("tok-a", dec!(0.16));
    // The signal fires but the allocation is below the $1 floor
    let alive = bot.poll_tick().await;

    assert!(executor.fills().await.is_empty());
    assert_eq!(bot.budget_remaining(), dec!(0.50));
    assert!(!alive);
}
