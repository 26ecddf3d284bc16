//! Performance and risk metrics
//!
//! Pure reduction from a trade ledger and equity curve to the metric
//! battery. Money aggregates stay in `Decimal`; the statistical ratios
//! cross into `f64` for square roots and quantiles. Every formula
//! resolves degenerate input (no trades, flat curve, zero variance) to
//! zero instead of NaN or infinity, so a zero-trade run reduces cleanly.
//!
//! All ratios are per-period: nothing here multiplies by an annualization
//! factor. Callers wanting annualized figures scale by
//! `sqrt(periods_per_year)` themselves.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::types::{EquityPoint, Trade};

/// The full metric battery for one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BacktestMetrics {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    /// Fraction of trades with positive P&L, in [0, 1]
    pub win_rate: f64,
    /// Gross profit over gross loss (0 when there are no losers)
    pub profit_factor: f64,

    /// Sum of trade P&L (reconciles exactly with the ledger)
    pub total_return: Decimal,
    /// Total return as a percentage of initial equity
    pub total_return_pct: Decimal,
    pub gross_profit: Decimal,
    pub gross_loss: Decimal,

    /// Population standard deviation of period returns
    pub volatility: f64,
    pub sharpe_ratio: f64,
    pub downside_deviation: f64,
    pub sortino_ratio: f64,
    pub calmar_ratio: f64,

    pub max_drawdown: Decimal,
    /// In [0, 100]
    pub max_drawdown_percentage: Decimal,

    /// Historical 95% value-at-risk on period returns (absolute value)
    pub value_at_risk_95: f64,
    /// Historical 99% value-at-risk on period returns (absolute value)
    pub value_at_risk_99: f64,
    /// Mean of the returns at or below the 5% quantile (absolute value)
    pub expected_shortfall: f64,

    pub average_holding_secs: i64,
    pub min_holding_secs: i64,
    pub max_holding_secs: i64,

    /// Sum of entry notionals across trades
    pub total_volume: Decimal,
    pub average_volume: Decimal,
}

/// Stateless reducer from (trades, equity curve) to [`BacktestMetrics`]
pub struct MetricsCalculator;

impl MetricsCalculator {
    /// Compute the metric battery. Pure and idempotent: recomputing on
    /// the same inputs yields an identical result.
    pub fn compute(
        trades: &[Trade],
        equity_curve: &[EquityPoint],
        initial_equity: Decimal,
    ) -> BacktestMetrics {
        let mut metrics = BacktestMetrics {
            total_trades: trades.len(),
            ..BacktestMetrics::default()
        };

        Self::reduce_trades(&mut metrics, trades, initial_equity);
        Self::reduce_curve(&mut metrics, equity_curve);
        Self::reduce_ratios(&mut metrics, equity_curve, initial_equity);
        metrics
    }

    fn reduce_trades(metrics: &mut BacktestMetrics, trades: &[Trade], initial_equity: Decimal) {
        for trade in trades {
            if trade.pnl > Decimal::ZERO {
                metrics.winning_trades += 1;
                metrics.gross_profit += trade.pnl;
            } else if trade.pnl < Decimal::ZERO {
                metrics.losing_trades += 1;
                metrics.gross_loss += trade.pnl.abs();
            }
            metrics.total_return += trade.pnl;
            metrics.total_volume += trade.volume();
        }

        if !trades.is_empty() {
            metrics.win_rate = metrics.winning_trades as f64 / trades.len() as f64;
            metrics.average_volume = metrics.total_volume / Decimal::from(trades.len());

            let holdings: Vec<i64> = trades.iter().map(Trade::holding_secs).collect();
            metrics.average_holding_secs =
                holdings.iter().sum::<i64>() / holdings.len() as i64;
            metrics.min_holding_secs = holdings.iter().copied().min().unwrap_or(0);
            metrics.max_holding_secs = holdings.iter().copied().max().unwrap_or(0);
        }

        if metrics.gross_loss > Decimal::ZERO {
            metrics.profit_factor = (metrics.gross_profit / metrics.gross_loss)
                .to_f64()
                .unwrap_or(0.0);
        }

        if initial_equity > Decimal::ZERO {
            metrics.total_return_pct = metrics.total_return / initial_equity * dec!(100);
        }
    }

    fn reduce_curve(metrics: &mut BacktestMetrics, curve: &[EquityPoint]) {
        for point in curve {
            if point.drawdown > metrics.max_drawdown {
                metrics.max_drawdown = point.drawdown;
            }
            if point.drawdown_percentage > metrics.max_drawdown_percentage {
                metrics.max_drawdown_percentage = point.drawdown_percentage;
            }
        }
    }

    fn reduce_ratios(
        metrics: &mut BacktestMetrics,
        curve: &[EquityPoint],
        initial_equity: Decimal,
    ) {
        let returns = period_returns(curve);

        let mean = mean(&returns);
        metrics.volatility = std_dev(&returns);
        if metrics.volatility > 0.0 {
            metrics.sharpe_ratio = mean / metrics.volatility;
        }

        metrics.downside_deviation = downside_deviation(&returns);
        if metrics.downside_deviation > 0.0 {
            metrics.sortino_ratio = mean / metrics.downside_deviation;
        }

        metrics.value_at_risk_95 = historical_var(&returns, 0.95);
        metrics.value_at_risk_99 = historical_var(&returns, 0.99);
        metrics.expected_shortfall = expected_shortfall(&returns, 0.95);

        if metrics.max_drawdown_percentage > Decimal::ZERO && initial_equity > Decimal::ZERO {
            let period_return = (metrics.total_return / initial_equity)
                .to_f64()
                .unwrap_or(0.0);
            let dd = (metrics.max_drawdown_percentage / dec!(100))
                .to_f64()
                .unwrap_or(0.0);
            if dd > 0.0 {
                metrics.calmar_ratio = period_return / dd;
            }
        }
    }
}

/// Simple period-over-period returns from the equity curve
fn period_returns(curve: &[EquityPoint]) -> Vec<f64> {
    if curve.len() < 2 {
        return Vec::new();
    }
    curve
        .windows(2)
        .filter_map(|pair| {
            let prev = pair[0].equity.to_f64()?;
            let curr = pair[1].equity.to_f64()?;
            if prev == 0.0 {
                Some(0.0)
            } else {
                Some((curr - prev) / prev)
            }
        })
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (0 below two samples)
fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Root mean square of the negative returns only
fn downside_deviation(returns: &[f64]) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let sum_sq = returns
        .iter()
        .map(|r| r.min(0.0).powi(2))
        .sum::<f64>();
    (sum_sq / returns.len() as f64).sqrt()
}

/// Historical VaR: the return at the (1 - confidence) quantile, reported
/// as a positive magnitude
fn historical_var(returns: &[f64], confidence: f64) -> f64 {
    quantile_return(returns, confidence)
        .map(f64::abs)
        .unwrap_or(0.0)
}

/// Mean of the tail at or below the quantile return, as a magnitude
fn expected_shortfall(returns: &[f64], confidence: f64) -> f64 {
    let Some(cutoff) = quantile_return(returns, confidence) else {
        return 0.0;
    };
    let tail: Vec<f64> = returns.iter().copied().filter(|r| *r <= cutoff).collect();
    if tail.is_empty() {
        return 0.0;
    }
    mean(&tail).abs()
}

/// The raw (signed) return sitting at the (1 - confidence) quantile
fn quantile_return(returns: &[f64], confidence: f64) -> Option<f64> {
    if returns.is_empty() {
        return None;
    }
    let mut sorted = returns.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let idx = ((1.0 - confidence) * sorted.len() as f64).floor() as usize;
    sorted.get(idx.min(sorted.len() - 1)).copied()
}
