//! Parameter-grid optimization
//!
//! Enumerates the Cartesian product of stepped parameter ranges, runs
//! the full simulate→metrics pipeline once per combination on a bounded
//! worker pool, and selects the combination maximizing the configured
//! objective with a stable first-wins tie-break.

mod grid;
mod search;

pub use grid::{expand_grid, ParameterRange, ParameterRanges};
pub use search::{OptimizerConfig, ParameterOptimizer};

use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::engine::{BacktestMetrics, BacktestResult};

/// Metric a grid search maximizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Objective {
    #[default]
    SharpeRatio,
    SortinoRatio,
    CalmarRatio,
    ProfitFactor,
    TotalReturn,
}

impl Objective {
    /// Extract the objective value from a metric battery
    pub fn value(&self, metrics: &BacktestMetrics) -> f64 {
        match self {
            Objective::SharpeRatio => metrics.sharpe_ratio,
            Objective::SortinoRatio => metrics.sortino_ratio,
            Objective::CalmarRatio => metrics.calmar_ratio,
            Objective::ProfitFactor => metrics.profit_factor,
            Objective::TotalReturn => metrics.total_return.to_f64().unwrap_or(0.0),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Objective::SharpeRatio => "sharpe-ratio",
            Objective::SortinoRatio => "sortino-ratio",
            Objective::CalmarRatio => "calmar-ratio",
            Objective::ProfitFactor => "profit-factor",
            Objective::TotalReturn => "total-return",
        }
    }
}

impl FromStr for Objective {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sharpe-ratio" | "sharpe" => Ok(Objective::SharpeRatio),
            "sortino-ratio" | "sortino" => Ok(Objective::SortinoRatio),
            "calmar-ratio" | "calmar" => Ok(Objective::CalmarRatio),
            "profit-factor" => Ok(Objective::ProfitFactor),
            "total-return" => Ok(Objective::TotalReturn),
            other => Err(format!("unknown objective '{other}'")),
        }
    }
}

/// All grid-point results plus the index of the winning one
#[derive(Debug, Clone, Serialize)]
pub struct OptimizationOutcome {
    /// One result per evaluated grid point, in enumeration order
    pub results: Vec<BacktestResult>,
    /// Index of the best result within `results`
    pub best_index: usize,
}

impl OptimizationOutcome {
    /// The winning result, by reference into `results`
    pub fn best(&self) -> &BacktestResult {
        &self.results[self.best_index]
    }

    /// Objective value of the winning result
    pub fn best_score(&self, objective: Objective) -> f64 {
        objective.value(&self.best().metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_objective_parse() {
        assert_eq!("sharpe".parse::<Objective>().unwrap(), Objective::SharpeRatio);
        assert_eq!(
            "profit-factor".parse::<Objective>().unwrap(),
            Objective::ProfitFactor
        );
        assert!("alpha".parse::<Objective>().is_err());
    }

    #[test]
    fn test_objective_roundtrip() {
        for objective in [
            Objective::SharpeRatio,
            Objective::SortinoRatio,
            Objective::CalmarRatio,
            Objective::ProfitFactor,
            Objective::TotalReturn,
        ] {
            assert_eq!(objective.as_str().parse::<Objective>().unwrap(), objective);
        }
    }

    #[test]
    fn test_objective_reads_metrics() {
        let metrics = BacktestMetrics {
            sharpe_ratio: 1.5,
            sortino_ratio: 2.0,
            ..BacktestMetrics::default()
        };
        assert_eq!(Objective::SharpeRatio.value(&metrics), 1.5);
        assert_eq!(Objective::SortinoRatio.value(&metrics), 2.0);
        assert_eq!(Objective::TotalReturn.value(&metrics), 0.0);
    }
}
