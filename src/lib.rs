//! btc-backtest: strategy backtesting engine for a Bitcoin margin-trading platform
//!
//! This library provides the core components for:
//! - Historical bar access behind a provider trait (JSON files, seeded synthetic walks)
//! - Statically registered, pure trading strategies
//! - Deterministic bar-by-bar trade simulation with a single-position model
//! - Performance and risk metrics (Sharpe/Sortino/Calmar, VaR, expected shortfall, drawdowns)
//! - Brute-force parameter-grid optimization over a bounded worker pool
//! - Best-effort result persistence
//! - Structured logging

pub mod cli;
pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod optimizer;
pub mod store;
pub mod strategy;
pub mod telemetry;
