//! Configuration types for poly-movement

use crate::detector::{parse_scale_in_pcts, DetectorConfig};
use crate::execution::ExecutorConfig;
use crate::market::{ClobConfig, GammaConfig, CLOB_API_URL, GAMMA_API_URL};
use crate::orderbook::{StreamConfig, POLYMARKET_WS_URL};
use crate::session::MonitorWindow;
use chrono::NaiveTime;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub detector: DetectorSettings,
    #[serde(default)]
    pub budget: BudgetConfig,
    #[serde(default)]
    pub market: MarketConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config from {}: {}", path, e))?;
        let config: Config = toml::from_str(&contents)
            .map_err(|e| anyhow::anyhow!("Failed to parse config: {}", e))?;
        Ok(config)
    }
}

/// Monitoring window configuration
#[derive(Debug, Clone, Deserialize)]
pub struct WindowConfig {
    /// Local start time, HH:MM
    #[serde(default = "default_window_start")]
    pub start: String,
    /// Local end time, HH:MM
    #[serde(default = "default_window_end")]
    pub end: String,
    /// UTC offset of the window's local times, in hours
    #[serde(default = "default_utc_offset")]
    pub utc_offset_hours: i32,
    /// Skip weekends
    #[serde(default = "default_true")]
    pub weekdays_only: bool,
    /// Poll cadence outside the window, in seconds
    #[serde(default = "default_idle_poll_secs")]
    pub idle_poll_secs: u64,
}

fn default_window_start() -> String {
    "07:00".to_string()
}
fn default_window_end() -> String {
    "10:00".to_string()
}
fn default_utc_offset() -> i32 {
    -4 // US Eastern daylight time
}
fn default_true() -> bool {
    true
}
fn default_idle_poll_secs() -> u64 {
    30
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            start: default_window_start(),
            end: default_window_end(),
            utc_offset_hours: default_utc_offset(),
            weekdays_only: true,
            idle_poll_secs: default_idle_poll_secs(),
        }
    }
}

impl WindowConfig {
    /// Build the monitoring window
    pub fn monitor_window(&self) -> anyhow::Result<MonitorWindow> {
        let start = NaiveTime::parse_from_str(&self.start, "%H:%M")
            .map_err(|e| anyhow::anyhow!("Invalid window start {:?}: {}", self.start, e))?;
        let end = NaiveTime::parse_from_str(&self.end, "%H:%M")
            .map_err(|e| anyhow::anyhow!("Invalid window end {:?}: {}", self.end, e))?;
        MonitorWindow::new(
            start,
            end,
            self.utc_offset_hours,
            self.weekdays_only,
            Duration::from_secs(self.idle_poll_secs),
        )
        .ok_or_else(|| anyhow::anyhow!("Invalid window: {} .. {}", self.start, self.end))
    }
}

/// Movement detector configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DetectorSettings {
    /// Z-score a move must reach to trigger
    #[serde(default = "default_zscore_threshold")]
    pub zscore_threshold: f64,
    /// Comma-separated scale-in percentages
    #[serde(default = "default_scale_in_pcts")]
    pub scale_in_pcts: String,
    /// Never buy above this price
    #[serde(default = "default_max_buy_price")]
    pub max_buy_price: Decimal,
    /// Minimum absolute price change to trigger
    #[serde(default = "default_min_price_change")]
    pub min_price_change: Decimal,
}

fn default_zscore_threshold() -> f64 {
    2.5
}
fn default_scale_in_pcts() -> String {
    "50,30,20".to_string()
}
fn default_max_buy_price() -> Decimal {
    Decimal::new(95, 2) // 0.95
}
fn default_min_price_change() -> Decimal {
    Decimal::new(5, 2) // 0.05
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            zscore_threshold: default_zscore_threshold(),
            scale_in_pcts: default_scale_in_pcts(),
            max_buy_price: default_max_buy_price(),
            min_price_change: default_min_price_change(),
        }
    }
}

impl DetectorSettings {
    /// Build the detector configuration
    pub fn detector_config(&self) -> DetectorConfig {
        DetectorConfig {
            zscore_threshold: self.zscore_threshold,
            scale_in_pcts: parse_scale_in_pcts(&self.scale_in_pcts),
            max_buy_price: self.max_buy_price,
            min_price_change: self.min_price_change,
        }
    }
}

/// Session budget configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BudgetConfig {
    /// Dollars available per session, shared across all markets
    #[serde(default = "default_max_usd")]
    pub max_usd: Decimal,
}

fn default_max_usd() -> Decimal {
    Decimal::new(100, 0)
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            max_usd: default_max_usd(),
        }
    }
}

/// Market discovery and REST endpoint configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MarketConfig {
    /// Gamma API base URL
    #[serde(default = "default_gamma_url")]
    pub gamma_url: String,
    /// CLOB REST base URL
    #[serde(default = "default_clob_url")]
    pub clob_url: String,
    /// Event slug prefix for auto-discovery
    #[serde(default = "default_slug_prefix")]
    pub slug_prefix: String,
    /// Explicit event slugs, bypassing auto-discovery when non-empty
    #[serde(default)]
    pub target_slugs: Vec<String>,
    /// HTTP request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_gamma_url() -> String {
    GAMMA_API_URL.to_string()
}
fn default_clob_url() -> String {
    CLOB_API_URL.to_string()
}
fn default_slug_prefix() -> String {
    "tsa-passengers".to_string()
}
fn default_request_timeout_secs() -> u64 {
    10
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            gamma_url: default_gamma_url(),
            clob_url: default_clob_url(),
            slug_prefix: default_slug_prefix(),
            target_slugs: vec![],
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl MarketConfig {
    fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Build the Gamma client configuration
    pub fn gamma_config(&self) -> GammaConfig {
        GammaConfig {
            base_url: self.gamma_url.clone(),
            timeout: self.timeout(),
            slug_prefix: self.slug_prefix.clone(),
            target_slugs: self.target_slugs.clone(),
        }
    }

    /// Build the CLOB client configuration
    pub fn clob_config(&self) -> ClobConfig {
        ClobConfig {
            base_url: self.clob_url.clone(),
            timeout: self.timeout(),
        }
    }
}

/// Quote feed configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// CLOB market-channel WebSocket URL
    #[serde(default = "default_ws_url")]
    pub ws_url: String,
    /// Quote channel buffer size
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
}

fn default_ws_url() -> String {
    POLYMARKET_WS_URL.to_string()
}
fn default_buffer_size() -> usize {
    256
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            ws_url: default_ws_url(),
            buffer_size: default_buffer_size(),
        }
    }
}

impl FeedConfig {
    /// Build the stream configuration
    pub fn stream_config(&self) -> StreamConfig {
        StreamConfig {
            ws_url: self.ws_url.clone(),
            buffer_size: self.buffer_size,
        }
    }
}

/// Execution configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExecutionConfig {
    #[serde(default)]
    pub mode: ExecutionMode,
}

/// Execution mode: dry-run or live
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    #[default]
    Dryrun,
    Live,
}

impl ExecutionConfig {
    /// Build the executor configuration
    pub fn executor_config(&self, market: &MarketConfig) -> ExecutorConfig {
        ExecutorConfig {
            base_url: market.clob_url.clone(),
            timeout: market.timeout(),
            dry_run: self.mode == ExecutionMode::Dryrun,
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    /// Prometheus exporter port, disabled when absent
    #[serde(default)]
    pub metrics_port: Option<u16>,
    /// Log level when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Log format: pretty or json
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            metrics_port: None,
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}
