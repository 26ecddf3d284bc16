//! Compare command implementation

use chrono::{Duration, Utc};
use clap::Args;
use rust_decimal::Decimal;
use std::sync::Arc;

use super::{build_provider, parse_utc};
use crate::config::Config;
use crate::data::Timeframe;
use crate::engine::{BacktestConfig, BacktestEngine};
use crate::strategy::{Params, StrategyRegistry};

#[derive(Args, Debug)]
pub struct CompareArgs {
    /// Strategy ids to compare
    #[arg(long, value_delimiter = ',', default_value = "sma-crossover,momentum")]
    pub strategies: Vec<String>,

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

    /// Generate bars from a seeded random walk instead of files
    #[arg(long)]
    pub synthetic_seed: Option<u64>,
}

impl CompareArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let provider = build_provider(&config.data, self.synthetic_seed);
        let registry = Arc::new(StrategyRegistry::with_builtins());
        let engine = BacktestEngine::new(provider, registry)
            .with_simulation(config.simulation.clone())
            .with_workers(config.optimizer.workers);

        let end_time = match &self.end {
            Some(s) => parse_utc(s)?,
            None => Utc::now(),
        };
        let start_time = match &self.start {
            Some(s) => parse_utc(s)?,
            None => end_time - Duration::days(30),
        };
        let run = BacktestConfig {
            strategy_id: self
                .strategies
                .first()
                .cloned()
                .unwrap_or_else(|| "sma-crossover".to_string()),
            markets: vec![self.market.clone()],
            timeframe: self.timeframe,
            start_time,
            end_time,
            initial_balance: self.capital,
            parameters: Params::new(),
        };

        let results = engine.compare_strategies(&self.strategies, &run).await?;

        println!(
            "{:<16} {:>10} {:>8} {:>8} {:>9} {:>7}",
            "STRATEGY", "PNL", "SHARPE", "MAX DD%", "WIN RATE", "TRADES"
        );
        for result in &results {
            println!(
                "{:<16} {:>10.2} {:>8.2} {:>8.2} {:>8.1}% {:>7}",
                result.strategy_id,
                result.summary.total_pnl,
                result.summary.sharpe_ratio,
                result.summary.max_drawdown_pct,
                result.summary.win_rate * 100.0,
                result.summary.total_trades,
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_execute_on_synthetic_data() {
        let args = CompareArgs {
            strategies: vec!["sma-crossover".to_string(), "momentum".to_string()],
            market: "BTC/USD".to_string(),
            timeframe: Timeframe::H1,
            start: Some("2025-01-01".to_string()),
            end: Some("2025-01-20".to_string()),
            capital: dec!(10000),
            synthetic_seed: Some(42),
        };
        assert!(args.execute(&Config::default()).await.is_ok());
    }
}
