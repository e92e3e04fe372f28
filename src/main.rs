use clap::Parser;
use poly_movement::cli::{Cli, Commands};
use poly_movement::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config).unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
        eprintln!("Using default configuration");
        Config::default()
    });

    // Initialize telemetry
    let _guard = poly_movement::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Run(args) => {
            tracing::info!("Starting polling mode");
            args.execute(&config).await?;
        }
        Commands::Watch(args) => {
            tracing::info!("Starting streaming mode");
            args.execute(&config).await?;
        }
        Commands::Status => {
            println!("poly-movement status");
            println!("  Mode: {:?}", config.execution.mode);
            println!("  Status: Not running");
        }
        Commands::Config => {
            println!("Current configuration:");
            println!(
                "  Window: {}-{} (UTC{:+}), weekdays_only={}",
                config.window.start,
                config.window.end,
                config.window.utc_offset_hours,
                config.window.weekdays_only
            );
            println!(
                "  Detector: z>{}, scale-in {}, max_buy {}",
                config.detector.zscore_threshold,
                config.detector.scale_in_pcts,
                config.detector.max_buy_price
            );
            println!("  Budget: ${} per session", config.budget.max_usd);
            println!(
                "  Market: prefix {:?}, slugs {:?}",
                config.market.slug_prefix, config.market.target_slugs
            );
            println!("  Execution: {:?}", config.execution.mode);
        }
    }

    Ok(())
}
