use clap::Parser;

use btc_backtest::cli::{Cli, Commands};
use btc_backtest::config::Config;
use btc_backtest::strategy::StrategyRegistry;

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
    btc_backtest::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Backtest(args) => {
            tracing::info!("Starting backtest");
            args.execute(&config).await?;
        }
        Commands::Compare(args) => {
            tracing::info!("Starting strategy comparison");
            args.execute(&config).await?;
        }
        Commands::Optimize(args) => {
            tracing::info!("Starting parameter optimization");
            args.execute(&config).await?;
        }
        Commands::Results(args) => {
            args.execute(&config).await?;
        }
        Commands::Strategies => {
            let registry = StrategyRegistry::with_builtins();
            println!("Registered strategies:");
            for id in registry.ids() {
                let strategy = registry.get(id)?;
                println!("  {} ({})", strategy.id(), strategy.name());
                for spec in strategy.param_schema() {
                    println!(
                        "      {} (default {}, range {}..{})",
                        spec.name, spec.default, spec.min, spec.max
                    );
                }
            }
        }
        Commands::Config => {
            println!("Current configuration:");
            println!("  Bars dir: {}", config.data.bars_dir.display());
            println!("  Synthetic seed: {:?}", config.data.synthetic_seed);
            println!(
                "  Simulation: allocation={}, commission={}, slippage={}",
                config.simulation.allocation_fraction,
                config.simulation.commission_rate,
                config.simulation.slippage_rate
            );
            println!(
                "  Optimizer: workers={}, objective={}",
                config.optimizer.workers,
                config.optimizer.objective.as_str()
            );
        }
    }

    Ok(())
}
