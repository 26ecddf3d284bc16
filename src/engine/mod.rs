//! Backtesting engine
//!
//! Deterministic bar-by-bar simulation plus the pure metrics reduction.
//! Data flows one way: bars → simulator → (trades, equity curve) →
//! metrics. The orchestrator wires collaborators together; the inner
//! loops never touch I/O.

mod metrics;
mod runner;
mod simulator;
mod types;

pub use metrics::{BacktestMetrics, MetricsCalculator};
pub use runner::BacktestEngine;
pub(crate) use runner::build_result;
pub use simulator::{
    SimulationConfig, SimulationOutput, Simulator, PARAM_STOP_LOSS, PARAM_TAKE_PROFIT,
};
pub use types::{BacktestResult, BacktestSummary, CloseReason, EquityPoint, Position, Side, Trade};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::data::Timeframe;
use crate::error::EngineError;
use crate::strategy::Params;

/// Configuration of a single backtest run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestConfig {
    /// Registered strategy id
    pub strategy_id: String,
    /// Markets to simulate; the engine's single-instrument model runs
    /// the first entry
    pub markets: Vec<String>,
    /// Candle interval
    pub timeframe: Timeframe,
    /// Start of the simulated range (inclusive)
    pub start_time: DateTime<Utc>,
    /// End of the simulated range (exclusive)
    pub end_time: DateTime<Utc>,
    /// Starting cash balance, must be positive
    pub initial_balance: Decimal,
    /// Strategy parameters overriding the schema defaults
    pub parameters: Params,
}

impl BacktestConfig {
    /// Market the run simulates
    pub fn market(&self) -> &str {
        self.markets.first().map(String::as_str).unwrap_or("")
    }

    /// Structural validation; range degeneracy is left to the data
    /// provider, which reports it as missing data
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.markets.is_empty() {
            return Err(EngineError::Config("market list is empty".to_string()));
        }
        if self.initial_balance <= Decimal::ZERO {
            return Err(EngineError::Config(format!(
                "initial balance must be positive, got {}",
                self.initial_balance
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn config() -> BacktestConfig {
        BacktestConfig {
            strategy_id: "sma-crossover".to_string(),
            markets: vec!["BTC/USD".to_string()],
            timeframe: Timeframe::H1,
            start_time: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            end_time: Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap(),
            initial_balance: dec!(10000),
            parameters: Params::new(),
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(config().validate().is_ok());
        assert_eq!(config().market(), "BTC/USD");
    }

    #[test]
    fn test_empty_markets_rejected() {
        let mut cfg = config();
        cfg.markets.clear();
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn test_non_positive_balance_rejected() {
        let mut cfg = config();
        cfg.initial_balance = Decimal::ZERO;
        assert!(cfg.validate().is_err());
    }
}
