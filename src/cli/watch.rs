//! Watch command implementation

use crate::config::Config;
use clap::Args;
use rust_decimal::Decimal;

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Override the session budget in dollars
    #[arg(long)]
    pub budget: Option<Decimal>,
}

impl WatchArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let budget = self.budget.unwrap_or(config.budget.max_usd);
        let mut bot = super::run::build_bot(config, budget)?;
        bot.run_streaming(config.feed.stream_config()).await
    }
}
