//! Optimize command implementation

use chrono::{Duration, Utc};
use clap::Args;
use rust_decimal::Decimal;
use std::sync::Arc;

use super::{build_provider, parse_range, parse_utc};
use crate::config::Config;
use crate::data::Timeframe;
use crate::engine::{BacktestConfig, BacktestEngine};
use crate::optimizer::{
    Objective, OptimizerConfig, ParameterOptimizer, ParameterRange, ParameterRanges,
};
use crate::strategy::{Params, StrategyRegistry};

#[derive(Args, Debug)]
pub struct OptimizeArgs {
    /// Strategy id to optimize
    #[arg(long, default_value = "sma-crossover")]
    pub strategy: String,

    /// Parameter range, repeatable (name=min:max:step)
    #[arg(long = "range", value_parser = parse_range, required = true)]
    pub ranges: Vec<(String, ParameterRange)>,

    /// Objective to maximize (defaults to the configured one)
    #[arg(long)]
    pub objective: Option<Objective>,

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

    /// How many ranked results to print
    #[arg(long, default_value = "5")]
    pub top: usize,
}

impl OptimizeArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let provider = build_provider(&config.data, self.synthetic_seed);
        let registry = Arc::new(StrategyRegistry::with_builtins());
        let engine = Arc::new(
            BacktestEngine::new(provider, registry).with_simulation(config.simulation.clone()),
        );

        let optimizer_config = OptimizerConfig {
            objective: self.objective.unwrap_or(config.optimizer.objective),
            ..config.optimizer.clone()
        };
        let objective = optimizer_config.objective;
        let optimizer = ParameterOptimizer::new(engine, optimizer_config);

        let end_time = match &self.end {
            Some(s) => parse_utc(s)?,
            None => Utc::now(),
        };
        let start_time = match &self.start {
            Some(s) => parse_utc(s)?,
            None => end_time - Duration::days(30),
        };
        let base = BacktestConfig {
            strategy_id: self.strategy.clone(),
            markets: vec![self.market.clone()],
            timeframe: self.timeframe,
            start_time,
            end_time,
            initial_balance: self.capital,
            parameters: Params::new(),
        };
        let ranges: ParameterRanges = self.ranges.iter().cloned().collect();

        let outcome = optimizer.optimize(&self.strategy, &base, &ranges).await?;

        println!(
            "Best parameters ({} = {:.4}):",
            objective.as_str(),
            outcome.best_score(objective)
        );
        for (name, value) in &outcome.best().parameters {
            println!("  {name} = {value}");
        }
        println!("{}", outcome.best().summary.format_table());

        let mut ranked: Vec<_> = outcome.results.iter().collect();
        ranked.sort_by(|a, b| {
            objective
                .value(&b.metrics)
                .partial_cmp(&objective.value(&a.metrics))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        println!("Top {} of {} combinations:", self.top.min(ranked.len()), ranked.len());
        for result in ranked.iter().take(self.top) {
            let params: Vec<String> = result
                .parameters
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect();
            println!(
                "  {:.4}  {}",
                objective.value(&result.metrics),
                params.join(", ")
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
        let args = OptimizeArgs {
            strategy: "momentum".to_string(),
            ranges: vec![
                ("lookback".to_string(), ParameterRange::new(5.0, 15.0, 5.0)),
                (
                    "threshold".to_string(),
                    ParameterRange::new(0.01, 0.03, 0.01),
                ),
            ],
            objective: Some(Objective::SharpeRatio),
            market: "BTC/USD".to_string(),
            timeframe: Timeframe::H1,
            start: Some("2025-01-01".to_string()),
            end: Some("2025-01-20".to_string()),
            capital: dec!(10000),
            synthetic_seed: Some(42),
            top: 3,
        };
        assert!(args.execute(&Config::default()).await.is_ok());
    }
}
