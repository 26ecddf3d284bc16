//! Backtest orchestration
//!
//! Wires the data provider, strategy registry, and result store around
//! the pure simulation core. Collaborators are injected and owned by the
//! caller; the engine holds no process-wide state.

use futures_util::stream::{self, StreamExt};
use std::sync::Arc;

use super::metrics::MetricsCalculator;
use super::simulator::{SimulationConfig, SimulationOutput, Simulator};
use super::types::{BacktestResult, BacktestSummary};
use super::BacktestConfig;
use crate::data::{Bar, HistoricalDataProvider, Timeframe};
use crate::error::EngineError;
use crate::store::ResultStore;
use crate::strategy::{Params, Strategy, StrategyRegistry};

const DEFAULT_WORKERS: usize = 4;

/// Runs backtests against injected collaborators
pub struct BacktestEngine {
    provider: Arc<dyn HistoricalDataProvider>,
    registry: Arc<StrategyRegistry>,
    store: Option<Arc<dyn ResultStore>>,
    simulation: SimulationConfig,
    workers: usize,
}

impl BacktestEngine {
    /// Create an engine over a data provider and strategy registry
    pub fn new(provider: Arc<dyn HistoricalDataProvider>, registry: Arc<StrategyRegistry>) -> Self {
        Self {
            provider,
            registry,
            store: None,
            simulation: SimulationConfig::default(),
            workers: DEFAULT_WORKERS,
        }
    }

    /// Attach a result store; saving is best effort and never fails a run
    pub fn with_store(mut self, store: Arc<dyn ResultStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Override the execution model
    pub fn with_simulation(mut self, simulation: SimulationConfig) -> Self {
        self.simulation = simulation;
        self
    }

    /// Bound the worker pool used by comparisons and optimizations
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Run a single backtest
    pub async fn run_backtest(
        &self,
        config: &BacktestConfig,
    ) -> Result<BacktestResult, EngineError> {
        config.validate()?;
        let strategy = self.registry.get(&config.strategy_id)?;
        let bars = self.fetch_bars(config).await?;
        self.ensure_enough_bars(&bars, strategy.as_ref(), config)?;

        tracing::info!(
            strategy = %config.strategy_id,
            market = %config.market(),
            bars = bars.len(),
            "running backtest"
        );

        let output = Simulator::new(self.simulation.clone()).run(
            &bars,
            strategy.as_ref(),
            &config.parameters,
            config.initial_balance,
            config.market(),
        );
        let result = build_result(config, &config.parameters, output);
        self.persist(&result).await;
        Ok(result)
    }

    /// Run the same configuration across several strategies on a shared
    /// bar series, in parallel, preserving input order
    pub async fn compare_strategies(
        &self,
        ids: &[String],
        config: &BacktestConfig,
    ) -> Result<Vec<BacktestResult>, EngineError> {
        config.validate()?;

        // Resolve everything up front so an unknown id fails before any
        // work is spawned
        let strategies: Vec<Arc<dyn Strategy>> = ids
            .iter()
            .map(|id| self.registry.get(id))
            .collect::<Result<_, _>>()?;

        if strategies.is_empty() {
            return Ok(Vec::new());
        }

        let bars = Arc::new(self.fetch_bars(config).await?);
        for strategy in &strategies {
            self.ensure_enough_bars(&bars, strategy.as_ref(), config)?;
        }

        let mut completed: Vec<(usize, BacktestResult)> =
            stream::iter(strategies.into_iter().enumerate())
                .map(|(i, strategy)| {
                    let bars = Arc::clone(&bars);
                    let simulation = self.simulation.clone();
                    let params = config.parameters.clone();
                    let initial = config.initial_balance;
                    let market = config.market().to_string();
                    let timeframe = config.timeframe;
                    async move {
                        let handle = tokio::task::spawn_blocking(move || {
                            let output = Simulator::new(simulation).run(
                                &bars,
                                strategy.as_ref(),
                                &params,
                                initial,
                                &market,
                            );
                            assemble(
                                strategy.id().to_string(),
                                market,
                                timeframe,
                                params,
                                initial,
                                output,
                            )
                        });
                        (i, handle.await)
                    }
                })
                .buffer_unordered(self.workers)
                .map(|(i, joined)| {
                    joined
                        .map(|result| (i, result))
                        .map_err(|e| EngineError::Config(format!("simulation task failed: {e}")))
                })
                .collect::<Vec<_>>()
                .await
                .into_iter()
                .collect::<Result<Vec<_>, _>>()?;

        completed.sort_by_key(|(i, _)| *i);
        let results: Vec<BacktestResult> = completed.into_iter().map(|(_, r)| r).collect();
        for result in &results {
            self.persist(result).await;
        }
        Ok(results)
    }

    /// Fetch the bar series for a run
    pub(crate) async fn fetch_bars(
        &self,
        config: &BacktestConfig,
    ) -> Result<Vec<Bar>, EngineError> {
        self.provider
            .get_bars(
                config.market(),
                config.timeframe,
                config.start_time,
                config.end_time,
            )
            .await
    }

    /// Resolve a strategy id from the attached registry
    pub(crate) fn resolve_strategy(&self, id: &str) -> Result<Arc<dyn Strategy>, EngineError> {
        self.registry.get(id)
    }

    pub(crate) fn simulation_config(&self) -> &SimulationConfig {
        &self.simulation
    }

    /// The series must cover the warmup window plus at least one
    /// tradable bar
    pub(crate) fn ensure_enough_bars(
        &self,
        bars: &[Bar],
        strategy: &dyn Strategy,
        config: &BacktestConfig,
    ) -> Result<(), EngineError> {
        let warmup = strategy.warmup(&config.parameters);
        if bars.len() <= warmup {
            return Err(EngineError::DataUnavailable {
                market: config.market().to_string(),
                timeframe: config.timeframe.to_string(),
                start: config.start_time,
                end: config.end_time,
            });
        }
        Ok(())
    }

    /// Best-effort save: failures are logged and swallowed so
    /// persistence can never invalidate a successful run
    pub(crate) async fn persist(&self, result: &BacktestResult) {
        if let Some(store) = &self.store {
            if let Err(e) = store.save(result).await {
                tracing::warn!(
                    strategy = %result.strategy_id,
                    error = %e,
                    "failed to persist backtest result"
                );
            }
        }
    }
}

/// Reduce a simulation output into a full result for a run config
pub(crate) fn build_result(
    config: &BacktestConfig,
    params: &Params,
    output: SimulationOutput,
) -> BacktestResult {
    assemble(
        config.strategy_id.clone(),
        config.market().to_string(),
        config.timeframe,
        params.clone(),
        config.initial_balance,
        output,
    )
}

fn assemble(
    strategy_id: String,
    market: String,
    timeframe: Timeframe,
    parameters: Params,
    initial_balance: rust_decimal::Decimal,
    output: SimulationOutput,
) -> BacktestResult {
    let metrics =
        MetricsCalculator::compute(&output.trades, &output.equity_curve, initial_balance);
    let summary = BacktestSummary::from_metrics(&metrics);
    BacktestResult {
        strategy_id,
        market,
        timeframe,
        parameters,
        initial_balance,
        final_balance: output.final_balance,
        trades: output.trades,
        equity_curve: output.equity_curve,
        metrics,
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SyntheticProvider;
    use crate::store::MemoryResultStore;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn engine_over(seed: u64) -> BacktestEngine {
        BacktestEngine::new(
            Arc::new(SyntheticProvider::new(seed)),
            Arc::new(StrategyRegistry::with_builtins()),
        )
    }

    fn config() -> BacktestConfig {
        BacktestConfig {
            strategy_id: "sma-crossover".to_string(),
            markets: vec!["BTC/USD".to_string()],
            timeframe: Timeframe::H1,
            start_time: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            end_time: Utc.with_ymd_and_hms(2025, 1, 11, 0, 0, 0).unwrap(),
            initial_balance: dec!(100000),
            parameters: Params::new(),
        }
    }

    #[tokio::test]
    async fn test_run_backtest_curve_length() {
        let result = engine_over(42).run_backtest(&config()).await.unwrap();
        // 10 days of hourly bars minus the default warmup of 31
        assert_eq!(result.equity_curve.len(), 240 - 31);
        assert_eq!(result.strategy_id, "sma-crossover");
        assert_eq!(result.initial_balance, dec!(100000));
    }

    #[tokio::test]
    async fn test_pnl_reconciles_with_metrics() {
        let result = engine_over(42).run_backtest(&config()).await.unwrap();
        let ledger: Decimal = result.trades.iter().map(|t| t.pnl).sum();
        assert_eq!(result.metrics.total_return, ledger);
        assert_eq!(result.final_balance, result.initial_balance + ledger);
        assert!(result.metrics.win_rate >= 0.0 && result.metrics.win_rate <= 1.0);
        assert!(result.metrics.max_drawdown_percentage >= Decimal::ZERO);
        assert!(result.metrics.max_drawdown_percentage <= dec!(100));
    }

    #[tokio::test]
    async fn test_determinism_byte_identical() {
        let engine = engine_over(7);
        let a = engine.run_backtest(&config()).await.unwrap();
        let b = engine.run_backtest(&config()).await.unwrap();
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[tokio::test]
    async fn test_degenerate_range_is_data_unavailable() {
        let mut cfg = config();
        cfg.end_time = cfg.start_time;
        let err = engine_over(42).run_backtest(&cfg).await.unwrap_err();
        assert!(matches!(err, EngineError::DataUnavailable { .. }));
        assert!(err.to_string().contains("No historical data"));
    }

    #[tokio::test]
    async fn test_unknown_strategy() {
        let mut cfg = config();
        cfg.strategy_id = "unknown".to_string();
        let err = engine_over(42).run_backtest(&cfg).await.unwrap_err();
        assert!(matches!(err, EngineError::StrategyNotFound(_)));
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn test_empty_market_list_is_config_error() {
        let mut cfg = config();
        cfg.markets.clear();
        let err = engine_over(42).run_backtest(&cfg).await.unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[tokio::test]
    async fn test_too_few_bars_is_data_unavailable() {
        let mut cfg = config();
        // Five hourly bars cannot cover the default 31-bar warmup
        cfg.end_time = cfg.start_time + chrono::Duration::hours(5);
        let err = engine_over(42).run_backtest(&cfg).await.unwrap_err();
        assert!(err.to_string().contains("No historical data"));
    }

    #[tokio::test]
    async fn test_compare_preserves_input_order() {
        let ids = vec!["momentum".to_string(), "sma-crossover".to_string()];
        let results = engine_over(42)
            .compare_strategies(&ids, &config())
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].strategy_id, "momentum");
        assert_eq!(results[1].strategy_id, "sma-crossover");
    }

    #[tokio::test]
    async fn test_compare_unknown_id_fails_fast() {
        let ids = vec!["momentum".to_string(), "nope".to_string()];
        let err = engine_over(42)
            .compare_strategies(&ids, &config())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::StrategyNotFound(_)));
    }

    #[tokio::test]
    async fn test_results_are_saved() {
        let store = Arc::new(MemoryResultStore::new());
        let engine = engine_over(42).with_store(store.clone());
        engine.run_backtest(&config()).await.unwrap();
        let listed = store.list("sma-crossover", 10).await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    struct FailingStore;

    #[async_trait]
    impl ResultStore for FailingStore {
        async fn save(&self, _result: &BacktestResult) -> anyhow::Result<()> {
            anyhow::bail!("disk on fire")
        }
        async fn list(
            &self,
            _strategy_id: &str,
            _limit: usize,
        ) -> anyhow::Result<Vec<BacktestResult>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_save_failure_is_swallowed() {
        let engine = engine_over(42).with_store(Arc::new(FailingStore));
        // The run must still succeed
        assert!(engine.run_backtest(&config()).await.is_ok());
    }
}
