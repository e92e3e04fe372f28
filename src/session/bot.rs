//! Session controller
//!
//! Owns one detector per discovered market and a budget shared across all
//! of them. At window open it discovers the day's markets, snapshots
//! baselines, and starts processing quotes; at window close (or budget
//! exhaustion) it logs a summary and resets for the next day.
//!
//! Two drive modes share the same signal path: `run_polling` pulls best
//! asks over REST on a cadence that tightens inside the window, and
//! `run_streaming` pushes WebSocket quotes straight into the detectors.

use crate::detector::{BaselineQuote, DetectorConfig, MovementDetector, MovementSignal};
use crate::execution::{BuyOrder, OrderExecutor};
use crate::market::{Market, MarketDiscovery, QuoteSource};
use crate::orderbook::{BookStream, Quote, StreamConfig};
use crate::session::budget::SessionBudget;
use crate::session::window::MonitorWindow;
use chrono::{NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::time::sleep;

/// Market monitoring bot driving detectors against a shared budget
pub struct MovementBot {
    window: MonitorWindow,
    detector_config: DetectorConfig,
    budget: SessionBudget,
    discovery: Arc<dyn MarketDiscovery>,
    quotes: Arc<dyn QuoteSource>,
    executor: Arc<dyn OrderExecutor>,
    /// Detector per market, keyed by condition id
    detectors: HashMap<String, MovementDetector>,
    /// Yes-token id to owning condition id
    token_index: HashMap<String, String>,
    markets: Vec<Market>,
    session_open: bool,
    /// Local date of the window the budget was last reset for
    session_date: Option<NaiveDate>,
    /// Set when the budget ran out before the window closed
    done_for_today: bool,
}

impl MovementBot {
    pub fn new(
        window: MonitorWindow,
        detector_config: DetectorConfig,
        max_budget: Decimal,
        discovery: Arc<dyn MarketDiscovery>,
        quotes: Arc<dyn QuoteSource>,
        executor: Arc<dyn OrderExecutor>,
    ) -> Self {
        Self {
            window,
            detector_config,
            budget: SessionBudget::new(max_budget),
            discovery,
            quotes,
            executor,
            detectors: HashMap::new(),
            token_index: HashMap::new(),
            markets: Vec::new(),
            session_open: false,
            session_date: None,
            done_for_today: false,
        }
    }

    /// Remaining session budget
    pub fn budget_remaining(&self) -> Decimal {
        self.budget.remaining()
    }

    /// Markets currently under watch
    pub fn markets(&self) -> &[Market] {
        &self.markets
    }

    /// Discover markets, snapshot baselines, and arm the detectors
    pub async fn open_session(&mut self) -> anyhow::Result<()> {
        let now = Utc::now();
        let day = self.window.local_date(now);
        let markets = self.discovery.discover(day).await?;
        if markets.is_empty() {
            anyhow::bail!("no markets found for {day}");
        }

        // The budget covers one monitoring window: a reopen within the same
        // window (dropped stream, transient discovery failure) keeps what
        // was already committed.
        if self.session_date != Some(day) {
            self.budget.reset();
            self.session_date = Some(day);
        }
        self.detectors.clear();
        self.token_index.clear();

        for market in &markets {
            let mut detector = MovementDetector::new(self.detector_config.clone());
            let mut baselines = Vec::with_capacity(market.outcomes.len());
            for outcome in &market.outcomes {
                let best_ask = match self.quotes.best_ask(&outcome.token_id).await {
                    Ok(ask) => ask,
                    Err(e) => {
                        tracing::warn!(
                            outcome = %outcome.name,
                            error = %e,
                            "Failed to fetch baseline ask"
                        );
                        None
                    }
                };
                baselines.push(BaselineQuote {
                    outcome: outcome.clone(),
                    best_ask,
                });
                self.token_index
                    .insert(outcome.token_id.clone(), market.condition_id.clone());
            }
            detector.set_baseline(&baselines);
            self.detectors.insert(market.condition_id.clone(), detector);
        }

        tracing::info!(
            markets = markets.len(),
            budget_remaining = %self.budget.remaining(),
            window_secs_left = self.window.seconds_remaining(now),
            "Session open"
        );
        metrics::gauge!("polymovement_active_markets").set(markets.len() as f64);
        self.markets = markets;
        self.session_open = true;
        Ok(())
    }

    /// Log the session summary and reset all per-session state
    pub async fn close_session(&mut self) {
        if !self.session_open {
            return;
        }

        for market in &self.markets {
            if let Some(detector) = self.detectors.get(&market.condition_id) {
                let status = detector.status();
                tracing::info!(
                    market = %market.question,
                    signals = status.total_signals,
                    budget_spent_pct = %status.budget_spent_pct,
                    locked = status.locked_outcome.as_deref().unwrap_or("-"),
                    "Session summary"
                );
            }
        }
        let fills = self.executor.fills().await;
        tracing::info!(
            fills = fills.len(),
            spent = %self.budget.spent(),
            remaining = %self.budget.remaining(),
            "Session closed"
        );

        for detector in self.detectors.values_mut() {
            detector.reset();
        }
        self.detectors.clear();
        self.token_index.clear();
        self.markets.clear();
        self.session_open = false;
        metrics::gauge!("polymovement_active_markets").set(0.0);
    }

    /// Pull one round of best asks and feed every detector
    ///
    /// Returns false once the budget is exhausted.
    pub async fn poll_tick(&mut self) -> bool {
        // Gather quotes grouped by owning market
        let mut per_market: HashMap<String, Vec<Quote>> = HashMap::new();
        for (token_id, condition_id) in &self.token_index {
            match self.quotes.best_ask(token_id).await {
                Ok(Some(price)) => {
                    per_market.entry(condition_id.clone()).or_default().push(Quote {
                        token_id: token_id.clone(),
                        price,
                    });
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::debug!(token_id = %token_id, error = %e, "Quote fetch failed");
                }
            }
        }

        let mut signals = Vec::new();
        for (condition_id, quotes) in per_market {
            if let Some(detector) = self.detectors.get_mut(&condition_id) {
                signals.extend(detector.update_prices(&quotes));
            }
        }

        for signal in signals {
            if !self.handle_signal(signal).await {
                return false;
            }
        }
        !self.budget.is_exhausted()
    }

    /// Route one pushed quote to its detector
    ///
    /// Returns false once the budget is exhausted.
    pub async fn apply_quote(&mut self, quote: Quote) -> bool {
        let Some(condition_id) = self.token_index.get(&quote.token_id).cloned() else {
            return true;
        };
        let signal = self
            .detectors
            .get_mut(&condition_id)
            .and_then(|d| d.apply_quote(&quote));

        if let Some(signal) = signal {
            if !self.handle_signal(signal).await {
                return false;
            }
        }
        !self.budget.is_exhausted()
    }

    /// Size and execute one signal against the shared budget
    ///
    /// The budget is only charged after the buy fills; a failed buy leaves
    /// it untouched. Returns false once the budget is exhausted.
    pub async fn handle_signal(&mut self, signal: MovementSignal) -> bool {
        metrics::counter!("polymovement_signals_total").increment(1);

        let Some(amount) = self.budget.allocate(signal.budget_pct) else {
            tracing::info!(
                outcome = %signal.outcome_name,
                budget_pct = %signal.budget_pct,
                remaining = %self.budget.remaining(),
                "Signal skipped, allocation below minimum"
            );
            return !self.budget.is_exhausted();
        };

        let order = BuyOrder {
            token_id: signal.token_id.clone(),
            outcome_name: signal.outcome_name.clone(),
            price: signal.current_price,
            amount_usd: amount,
        };

        match self.executor.buy_market(order).await {
            Ok(fill) => {
                self.budget.commit(fill.amount_usd);
                metrics::gauge!("polymovement_budget_remaining_usd")
                    .set(self.budget.remaining().to_f64().unwrap_or(0.0));
                tracing::info!(
                    outcome = %signal.outcome_name,
                    trigger = signal.trigger_number,
                    zscore = signal.zscore,
                    amount_usd = %fill.amount_usd,
                    remaining = %self.budget.remaining(),
                    "Buy committed"
                );
            }
            Err(e) => {
                tracing::error!(
                    outcome = %signal.outcome_name,
                    error = %e,
                    "Buy failed, budget unchanged"
                );
            }
        }
        !self.budget.is_exhausted()
    }

    /// REST polling loop, running until interrupted
    pub async fn run_polling(&mut self) -> anyhow::Result<()> {
        tracing::info!("Starting polling loop");
        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Interrupted, shutting down");
                    self.close_session().await;
                    return Ok(());
                }
                _ = sleep(self.window.poll_interval(Utc::now())) => {
                    self.polling_step().await;
                }
            }
        }
    }

    async fn polling_step(&mut self) {
        let now = Utc::now();
        if !self.window.contains(now) {
            if self.session_open {
                self.close_session().await;
            }
            self.done_for_today = false;
            return;
        }
        if self.done_for_today {
            return;
        }
        if !self.session_open {
            if let Err(e) = self.open_session().await {
                tracing::warn!(error = %e, "Session open failed, will retry");
                return;
            }
        }
        if !self.poll_tick().await {
            tracing::info!("Budget exhausted, ending session early");
            self.close_session().await;
            self.done_for_today = true;
        }
    }

    /// WebSocket streaming loop, running until interrupted
    ///
    /// Sessions still open and close on the monitoring window. A stream
    /// that drops mid-window is resubscribed against the open session:
    /// baselines and the committed budget survive, only the subscription
    /// restarts.
    pub async fn run_streaming(&mut self, stream_config: StreamConfig) -> anyhow::Result<()> {
        tracing::info!("Starting streaming loop");
        loop {
            // Wait for the window to open
            while !self.window.contains(Utc::now()) {
                if self.session_open {
                    self.close_session().await;
                }
                self.done_for_today = false;
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => return Ok(()),
                    _ = sleep(self.window.idle_poll_interval) => {}
                }
            }
            if self.done_for_today {
                sleep(self.window.idle_poll_interval).await;
                continue;
            }

            if !self.session_open {
                if let Err(e) = self.open_session().await {
                    tracing::warn!(error = %e, "Session open failed, will retry");
                    sleep(self.window.idle_poll_interval).await;
                    continue;
                }
            }

            let token_ids: Vec<String> = self.token_index.keys().cloned().collect();
            let mut rx = BookStream::subscribe(stream_config.clone(), token_ids);
            let mut clock = tokio::time::interval(std::time::Duration::from_secs(1));

            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        self.close_session().await;
                        return Ok(());
                    }
                    quote = rx.recv() => {
                        match quote {
                            Some(quote) => {
                                if !self.apply_quote(quote).await {
                                    tracing::info!("Budget exhausted, ending session early");
                                    self.done_for_today = true;
                                    break;
                                }
                            }
                            None => {
                                tracing::warn!("Quote stream ended, resubscribing");
                                break;
                            }
                        }
                    }
                    _ = clock.tick() => {
                        if !self.window.contains(Utc::now()) {
                            break;
                        }
                    }
                }
            }

            // Dropping the receiver tears the stream down
            drop(rx);
            if self.done_for_today || !self.window.contains(Utc::now()) {
                self.close_session().await;
            }
        }
    }
}
