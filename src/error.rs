//! Engine error taxonomy

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors surfaced by the backtesting engine and optimizer
#[derive(Debug, Error)]
pub enum EngineError {
    /// Invalid run configuration (empty market list, non-positive balance)
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The data provider returned no bars for the requested range
    #[error("No historical data available for {market} {timeframe} between {start} and {end}")]
    DataUnavailable {
        market: String,
        timeframe: String,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// The requested strategy id is not registered
    #[error("Strategy '{0}' not found")]
    StrategyNotFound(String),

    /// The parameter grid expanded to zero combinations, or no grid point completed
    #[error("Optimization produced no results: empty parameter grid")]
    NoOptimizationResults,
}
