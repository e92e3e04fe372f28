//! poly-movement: movement-detection trading bot for Polymarket
//!
//! Monitors TSA passenger-count markets during a daily window, detects
//! statistically significant price moves against a window-start baseline,
//! and scales into the single best-moving outcome under a budget shared
//! across all markets in the session.

pub mod cli;
pub mod config;
pub mod detector;
pub mod execution;
pub mod market;
pub mod orderbook;
pub mod session;
pub mod telemetry;
pub mod ws;
