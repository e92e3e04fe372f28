//! Run command implementation

use crate::config::Config;
use crate::execution::ClobExecutor;
use crate::market::{ClobClient, GammaClient};
use crate::session::MovementBot;
use clap::Args;
use rust_decimal::Decimal;
use std::sync::Arc;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Override the session budget in dollars
    #[arg(long)]
    pub budget: Option<Decimal>,
}

impl RunArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let budget = self.budget.unwrap_or(config.budget.max_usd);
        let mut bot = build_bot(config, budget)?;
        bot.run_polling().await
    }
}

/// Wire a bot from configuration, shared by `run` and `watch`
pub(crate) fn build_bot(config: &Config, budget: Decimal) -> anyhow::Result<MovementBot> {
    let window = config.window.monitor_window()?;
    let discovery = Arc::new(GammaClient::with_config(config.market.gamma_config())?);
    let quotes = Arc::new(ClobClient::with_config(config.market.clob_config())?);
    let executor = Arc::new(ClobExecutor::new(
        config.execution.executor_config(&config.market),
    )?);

    Ok(MovementBot::new(
        window,
        config.detector.detector_config(),
        budget,
        discovery,
        quotes,
        executor,
    ))
}
