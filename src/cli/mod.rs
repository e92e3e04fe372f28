//! CLI interface for poly-movement
//!
//! Provides subcommands for:
//! - `run`: Monitor via REST polling and trade on movement signals
//! - `watch`: Monitor via WebSocket streaming and trade on movement signals
//! - `status`: Show current state
//! - `config`: Show effective configuration

mod run;
mod watch;

pub use run::RunArgs;
pub use watch::WatchArgs;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "poly-movement")]
#[command(about = "Movement-detection trading bot for Polymarket TSA passenger-count markets")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Monitor markets via REST polling
    Run(RunArgs),
    /// Monitor markets via WebSocket streaming
    Watch(WatchArgs),
    /// Show current state
    Status,
    /// Show effective configuration
    Config,
}
