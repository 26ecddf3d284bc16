//! End-to-end optimizer tests

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use rust_decimal_macros::dec;

use btc_backtest::data::{SyntheticProvider, Timeframe};
use btc_backtest::engine::{BacktestConfig, BacktestEngine};
use btc_backtest::error::EngineError;
use btc_backtest::optimizer::{
    Objective, OptimizerConfig, ParameterOptimizer, ParameterRange, ParameterRanges,
};
use btc_backtest::strategy::{Params, StrategyRegistry};

fn optimizer(seed: u64) -> ParameterOptimizer {
    let engine = Arc::new(BacktestEngine::new(
        Arc::new(SyntheticProvider::new(seed)),
        Arc::new(StrategyRegistry::with_builtins()),
    ));
    ParameterOptimizer::new(engine, OptimizerConfig::default())
}

fn base() -> BacktestConfig {
    BacktestConfig {
        strategy_id: "sma-crossover".to_string(),
        markets: vec!["BTC/USD".to_string()],
        timeframe: Timeframe::H1,
        start_time: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        end_time: Utc.with_ymd_and_hms(2025, 1, 21, 0, 0, 0).unwrap(),
        initial_balance: dec!(100000),
        parameters: Params::new(),
    }
}

#[tokio::test]
async fn three_by_three_grid_evaluates_nine_points() {
    let mut ranges = ParameterRanges::new();
    ranges.insert(
        "fast_period".to_string(),
        ParameterRange::new(10.0, 30.0, 10.0),
    );
    ranges.insert(
        "stop_loss".to_string(),
        ParameterRange::new(0.01, 0.03, 0.01),
    );

    let outcome = optimizer(42)
        .optimize("sma-crossover", &base(), &ranges)
        .await
        .unwrap();

    assert_eq!(outcome.results.len(), 9);

    // The winner carries the maximum Sharpe of the whole grid
    let max_sharpe = outcome
        .results
        .iter()
        .map(|r| r.metrics.sharpe_ratio)
        .fold(f64::NEG_INFINITY, f64::max);
    assert_eq!(outcome.best().metrics.sharpe_ratio, max_sharpe);

    // Every grid point recorded the parameters it ran with
    for result in &outcome.results {
        assert!(result.parameters.contains_key("fast_period"));
        assert!(result.parameters.contains_key("stop_loss"));
    }
}

#[tokio::test]
async fn tie_break_keeps_first_enumerated_combination() {
    // Thresholds no random walk will ever reach: all grid points tie at
    // zero trades and zero Sharpe
    let mut ranges = ParameterRanges::new();
    ranges.insert("threshold".to_string(), ParameterRange::new(5.0, 9.0, 2.0));

    let outcome = optimizer(42)
        .optimize("momentum", &base(), &ranges)
        .await
        .unwrap();

    assert_eq!(outcome.results.len(), 3);
    for result in &outcome.results {
        assert_eq!(result.metrics.total_trades, 0);
        assert_eq!(result.metrics.sharpe_ratio, 0.0);
    }
    assert_eq!(outcome.best_index, 0);
    assert_eq!(outcome.best().parameters["threshold"], 5.0);
}

#[tokio::test]
async fn empty_grid_is_no_results_error() {
    let err = optimizer(42)
        .optimize("sma-crossover", &base(), &ParameterRanges::new())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NoOptimizationResults));
}

#[tokio::test]
async fn best_reference_points_into_results() {
    let mut ranges = ParameterRanges::new();
    ranges.insert(
        "lookback".to_string(),
        ParameterRange::new(5.0, 20.0, 5.0),
    );

    let outcome = optimizer(42)
        .optimize("momentum", &base(), &ranges)
        .await
        .unwrap();

    assert!(outcome.best_index < outcome.results.len());
    let by_index = &outcome.results[outcome.best_index];
    assert_eq!(
        serde_json::to_string(by_index).unwrap(),
        serde_json::to_string(outcome.best()).unwrap()
    );
}

#[tokio::test]
async fn objective_switch_changes_ranking_input() {
    let mut ranges = ParameterRanges::new();
    ranges.insert(
        "lookback".to_string(),
        ParameterRange::new(5.0, 20.0, 5.0),
    );

    let engine = Arc::new(BacktestEngine::new(
        Arc::new(SyntheticProvider::new(42)),
        Arc::new(StrategyRegistry::with_builtins()),
    ));
    let optimizer = ParameterOptimizer::new(
        engine,
        OptimizerConfig {
            objective: Objective::TotalReturn,
            ..OptimizerConfig::default()
        },
    );
    let outcome = optimizer.optimize("momentum", &base(), &ranges).await.unwrap();

    let max_return = outcome
        .results
        .iter()
        .map(|r| Objective::TotalReturn.value(&r.metrics))
        .fold(f64::NEG_INFINITY, f64::max);
    assert_eq!(outcome.best_score(Objective::TotalReturn), max_return);
}

#[tokio::test]
async fn optimization_is_deterministic() {
    let mut ranges = ParameterRanges::new();
    ranges.insert(
        "fast_period".to_string(),
        ParameterRange::new(5.0, 15.0, 5.0),
    );
    ranges.insert(
        "slow_period".to_string(),
        ParameterRange::new(20.0, 40.0, 10.0),
    );

    let a = optimizer(11).optimize("sma-crossover", &base(), &ranges).await.unwrap();
    let b = optimizer(11).optimize("sma-crossover", &base(), &ranges).await.unwrap();

    assert_eq!(a.best_index, b.best_index);
    assert_eq!(
        serde_json::to_string(&a.results).unwrap(),
        serde_json::to_string(&b.results).unwrap()
    );
}
