//! Backtest command implementation

use chrono::{Duration, Utc};
use clap::Args;
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::sync::Arc;

use super::{build_provider, parse_param, parse_utc};
use crate::config::Config;
use crate::data::Timeframe;
use crate::engine::{BacktestConfig, BacktestEngine};
use crate::store::JsonFileStore;
use crate::strategy::{Params, StrategyRegistry};

#[derive(Args, Debug)]
pub struct BacktestArgs {
    /// Strategy id to run
    #[arg(long, default_value = "sma-crossover")]
    pub strategy: String,

    /// Market symbol
    #[arg(long, default_value = "BTC/USD")]
    pub market: String,

    /// Candle interval
    #[arg(long, default_value = "1h")]
    pub timeframe: Timeframe,

    /// Start time (RFC 3339 or YYYY-MM-DD); defaults to 30 days ago
    #[arg(long)]
    pub start: Option<String>,

    /// End time (RFC 3339 or YYYY-MM-DD); defaults to now
    #[arg(long)]
    pub end: Option<String>,

    /// Initial balance
    #[arg(long, default_value = "10000")]
    pub capital: Decimal,

    /// Strategy parameter override, repeatable (name=value)
    #[arg(long = "param", value_parser = parse_param)]
    pub params: Vec<(String, f64)>,

    /// Generate bars from a seeded random walk instead of files
    #[arg(long)]
    pub synthetic_seed: Option<u64>,

    /// Directory to persist the result into
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Output format: table or json
    #[arg(long, default_value = "table")]
    pub format: String,
}

impl BacktestArgs {
    /// Assemble the run configuration from arguments
    pub fn run_config(&self) -> anyhow::Result<BacktestConfig> {
        let end_time = match &self.end {
            Some(s) => parse_utc(s)?,
            None => Utc::now(),
        };
        let start_time = match &self.start {
            Some(s) => parse_utc(s)?,
            None => end_time - Duration::days(30),
        };
        Ok(BacktestConfig {
            strategy_id: self.strategy.clone(),
            markets: vec![self.market.clone()],
            timeframe: self.timeframe,
            start_time,
            end_time,
            initial_balance: self.capital,
            parameters: self.params.iter().cloned().collect::<Params>(),
        })
    }

    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let provider = build_provider(&config.data, self.synthetic_seed);
        let registry = Arc::new(StrategyRegistry::with_builtins());
        let mut engine = BacktestEngine::new(provider, registry)
            .with_simulation(config.simulation.clone());
        if let Some(dir) = &self.output {
            engine = engine.with_store(Arc::new(JsonFileStore::new(dir.clone())));
        }

        let run = self.run_config()?;
        let result = engine.run_backtest(&run).await?;

        match self.format.as_str() {
            "json" => println!("{}", serde_json::to_string_pretty(&result.metrics)?),
            _ => {
                println!("{}", result.summary.format_table());
                tracing::info!(
                    trades = result.trades.len(),
                    final_balance = %result.final_balance,
                    "backtest complete"
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn args() -> BacktestArgs {
        BacktestArgs {
            strategy: "momentum".to_string(),
            market: "BTC/USD".to_string(),
            timeframe: Timeframe::H1,
            start: Some("2025-01-01".to_string()),
            end: Some("2025-02-01".to_string()),
            capital: dec!(5000),
            params: vec![("lookback".to_string(), 10.0)],
            synthetic_seed: Some(42),
            output: None,
            format: "table".to_string(),
        }
    }

    #[test]
    fn test_run_config_assembly() {
        let run = args().run_config().unwrap();
        assert_eq!(run.strategy_id, "momentum");
        assert_eq!(run.markets, vec!["BTC/USD".to_string()]);
        assert_eq!(run.initial_balance, dec!(5000));
        assert_eq!(run.parameters["lookback"], 10.0);
        assert!(run.start_time < run.end_time);
    }

    #[tokio::test]
    async fn test_execute_on_synthetic_data() {
        let config = Config::default();
        assert!(args().execute(&config).await.is_ok());
    }
}
