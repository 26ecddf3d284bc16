//! CLI interface for btc-backtest
//!
//! Provides subcommands for:
//! - `backtest`: Run a single strategy backtest
//! - `compare`: Run several strategies over the same bars
//! - `optimize`: Grid-search strategy parameters
//! - `results`: List persisted results
//! - `strategies`: List registered strategies
//! - `config`: Show effective configuration

mod backtest;
mod compare;
mod optimize;
mod results;

pub use backtest::BacktestArgs;
pub use compare::CompareArgs;
pub use optimize::OptimizeArgs;
pub use results::ResultsArgs;

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::sync::Arc;

use crate::config::DataConfig;
use crate::data::{HistoricalDataProvider, JsonBarProvider, SyntheticProvider};
use crate::optimizer::ParameterRange;

#[derive(Parser, Debug)]
#[command(name = "btc-backtest")]
#[command(about = "Strategy backtesting and risk-metrics engine")]
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
    /// Run a single strategy backtest
    Backtest(BacktestArgs),
    /// Run several strategies over the same bars
    Compare(CompareArgs),
    /// Grid-search strategy parameters
    Optimize(OptimizeArgs),
    /// List persisted results
    Results(ResultsArgs),
    /// List registered strategies
    Strategies,
    /// Show effective configuration
    Config,
}

/// Pick the bar source: an explicit seed wins, then the configured one,
/// then the JSON file directory
pub(crate) fn build_provider(
    data: &DataConfig,
    seed_override: Option<u64>,
) -> Arc<dyn HistoricalDataProvider> {
    match seed_override.or(data.synthetic_seed) {
        Some(seed) => Arc::new(SyntheticProvider::new(seed)),
        None => Arc::new(JsonBarProvider::new(data.bars_dir.clone())),
    }
}

/// Parse an RFC 3339 timestamp or a plain `YYYY-MM-DD` date
pub(crate) fn parse_utc(s: &str) -> anyhow::Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| anyhow::anyhow!("invalid time '{s}': {e}"))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| anyhow::anyhow!("invalid time '{s}'"))?;
    Ok(DateTime::from_naive_utc_and_offset(midnight, Utc))
}

/// Parse a `name=value` strategy parameter
pub(crate) fn parse_param(s: &str) -> Result<(String, f64), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{s}'"))?;
    let value: f64 = value
        .parse()
        .map_err(|e| format!("invalid value in '{s}': {e}"))?;
    Ok((name.to_string(), value))
}

/// Parse a `name=min:max:step` optimization range
pub(crate) fn parse_range(s: &str) -> Result<(String, ParameterRange), String> {
    let (name, spec) = s
        .split_once('=')
        .ok_or_else(|| format!("expected name=min:max:step, got '{s}'"))?;
    let parts: Vec<&str> = spec.split(':').collect();
    if parts.len() != 3 {
        return Err(format!("expected name=min:max:step, got '{s}'"));
    }
    let parse = |v: &str| -> Result<f64, String> {
        v.parse().map_err(|e| format!("invalid number in '{s}': {e}"))
    };
    Ok((
        name.to_string(),
        ParameterRange::new(parse(parts[0])?, parse(parts[1])?, parse(parts[2])?),
    ))
}
