//! Grid-search parameter optimizer

use futures_util::stream::{self, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use super::grid::{expand_grid, ParameterRanges};
use super::{Objective, OptimizationOutcome};
use crate::engine::{BacktestConfig, BacktestEngine, BacktestResult, Simulator};
use crate::error::EngineError;
use crate::strategy::Params;

/// Optimizer tuning knobs
#[derive(Debug, Clone, Deserialize)]
pub struct OptimizerConfig {
    /// Parallel grid-point evaluations
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Per-grid-point deadline in seconds; a slower point is dropped
    #[serde(default = "default_run_timeout_secs")]
    pub run_timeout_secs: u64,

    /// Overall search budget in seconds; on expiry, remaining points
    /// are abandoned and partial results returned
    #[serde(default = "default_budget_secs")]
    pub budget_secs: u64,

    /// Metric the search maximizes
    #[serde(default)]
    pub objective: Objective,
}

fn default_workers() -> usize {
    4
}
fn default_run_timeout_secs() -> u64 {
    30
}
fn default_budget_secs() -> u64 {
    300
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            run_timeout_secs: default_run_timeout_secs(),
            budget_secs: default_budget_secs(),
            objective: Objective::default(),
        }
    }
}

/// Brute-force Cartesian grid search over the backtest pipeline
pub struct ParameterOptimizer {
    engine: Arc<BacktestEngine>,
    config: OptimizerConfig,
}

impl ParameterOptimizer {
    pub fn new(engine: Arc<BacktestEngine>, config: OptimizerConfig) -> Self {
        Self {
            engine,
            config: OptimizerConfig {
                workers: config.workers.max(1),
                ..config
            },
        }
    }

    /// Evaluate every combination of `ranges` for `strategy_id` over
    /// `base` and pick the stable argmax of the configured objective.
    ///
    /// Bars are fetched once; each grid point then runs the pure
    /// simulate→metrics pipeline on the shared series. Ties keep the
    /// first combination in enumeration order.
    pub async fn optimize(
        &self,
        strategy_id: &str,
        base: &BacktestConfig,
        ranges: &ParameterRanges,
    ) -> Result<OptimizationOutcome, EngineError> {
        let combos = expand_grid(ranges);
        if combos.is_empty() {
            return Err(EngineError::NoOptimizationResults);
        }

        let mut config = base.clone();
        config.strategy_id = strategy_id.to_string();
        config.validate()?;

        let strategy = self.engine.resolve_strategy(strategy_id)?;
        let bars = Arc::new(self.engine.fetch_bars(&config).await?);

        tracing::info!(
            strategy = %strategy_id,
            combinations = combos.len(),
            workers = self.config.workers,
            bars = bars.len(),
            "starting grid search"
        );

        let run_timeout = Duration::from_secs(self.config.run_timeout_secs);
        let deadline =
            tokio::time::Instant::now() + Duration::from_secs(self.config.budget_secs);
        let total = combos.len();

        let mut evaluations = stream::iter(combos.into_iter().enumerate())
            .map(|(index, combo)| {
                let bars = Arc::clone(&bars);
                let strategy = Arc::clone(&strategy);
                let simulation = self.engine.simulation_config().clone();
                let config = config.clone();
                async move {
                    let handle = tokio::task::spawn_blocking(move || {
                        let mut params: Params = config.parameters.clone();
                        params.extend(combo);

                        if bars.len() <= strategy.warmup(&params) {
                            return None;
                        }
                        let output = Simulator::new(simulation).run(
                            &bars,
                            strategy.as_ref(),
                            &params,
                            config.initial_balance,
                            config.market(),
                        );
                        Some(crate::engine::build_result(&config, &params, output))
                    });
                    match tokio::time::timeout(run_timeout, handle).await {
                        Ok(Ok(result)) => (index, result),
                        Ok(Err(e)) => {
                            tracing::warn!(index, error = %e, "grid point task failed");
                            (index, None)
                        }
                        Err(_) => {
                            tracing::warn!(index, "grid point exceeded run timeout, dropping");
                            (index, None)
                        }
                    }
                }
            })
            .buffer_unordered(self.config.workers);

        let mut completed: Vec<(usize, BacktestResult)> = Vec::new();
        loop {
            match tokio::time::timeout_at(deadline, evaluations.next()).await {
                Ok(Some((index, Some(result)))) => completed.push((index, result)),
                Ok(Some((_, None))) => {}
                Ok(None) => break,
                Err(_) => {
                    tracing::warn!(
                        completed = completed.len(),
                        total,
                        "optimization budget exhausted, returning partial results"
                    );
                    break;
                }
            }
        }
        drop(evaluations);

        completed.sort_by_key(|(index, _)| *index);
        let results: Vec<BacktestResult> =
            completed.into_iter().map(|(_, result)| result).collect();
        if results.is_empty() {
            return Err(EngineError::NoOptimizationResults);
        }

        let best_index = stable_argmax(&results, self.config.objective);
        let outcome = OptimizationOutcome {
            results,
            best_index,
        };

        tracing::info!(
            best = ?outcome.best().parameters,
            score = outcome.best_score(self.config.objective),
            "grid search finished"
        );
        self.engine.persist(outcome.best()).await;
        Ok(outcome)
    }
}

/// First index attaining the maximum objective value; non-finite
/// values rank lowest
fn stable_argmax(results: &[BacktestResult], objective: Objective) -> usize {
    let mut best_index = 0;
    let mut best_value = f64::NEG_INFINITY;
    for (index, result) in results.iter().enumerate() {
        let mut value = objective.value(&result.metrics);
        if !value.is_finite() {
            value = f64::NEG_INFINITY;
        }
        if value > best_value {
            best_value = value;
            best_index = index;
        }
    }
    best_index
}
