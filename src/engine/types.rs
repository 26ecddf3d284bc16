//! Simulation output types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::metrics::BacktestMetrics;
use crate::data::Timeframe;
use crate::strategy::Params;

/// Position direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Long,
    Short,
}

impl Side {
    /// +1 for long, -1 for short
    pub fn sign(&self) -> Decimal {
        match self {
            Side::Long => Decimal::ONE,
            Side::Short => -Decimal::ONE,
        }
    }
}

/// Why a position was closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    /// The strategy signalled the opposite direction
    SignalReversal,
    /// Price breached the stop-loss distance
    StopLoss,
    /// Price reached the take-profit distance
    TakeProfit,
    /// Forced close on the final bar
    EndOfData,
}

/// An open position. Exists only inside the simulator's call stack;
/// at most one is open at any bar.
#[derive(Debug, Clone)]
pub struct Position {
    pub side: Side,
    pub quantity: Decimal,
    pub entry_price: Decimal,
    pub entry_time: DateTime<Utc>,
}

impl Position {
    /// Mark-to-market P&L at the given price
    pub fn unrealized_pnl(&self, price: Decimal) -> Decimal {
        self.side.sign() * (price - self.entry_price) * self.quantity
    }
}

/// A completed round trip, appended to the ledger at close
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// Sequential id within the run (deterministic across reruns)
    pub id: u64,
    pub market: String,
    pub side: Side,
    pub entry_price: Decimal,
    pub exit_price: Decimal,
    pub quantity: Decimal,
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    /// Realized P&L net of commission and slippage
    pub pnl: Decimal,
    /// P&L as a percentage of the entry notional
    pub pnl_percentage: Decimal,
    pub commission: Decimal,
    pub slippage: Decimal,
    pub reason: CloseReason,
}

impl Trade {
    /// Entry notional value
    pub fn volume(&self) -> Decimal {
        self.entry_price * self.quantity
    }

    /// Time the position was held
    pub fn holding_secs(&self) -> i64 {
        (self.exit_time - self.entry_time).num_seconds()
    }
}

/// One point of the simulated equity curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    /// Cash balance plus unrealized position value
    pub equity: Decimal,
    /// Distance below the running peak, never negative
    pub drawdown: Decimal,
    /// Drawdown as a percentage of the peak, in [0, 100]
    pub drawdown_percentage: Decimal,
}

/// Complete result of a single backtest run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    pub strategy_id: String,
    pub market: String,
    pub timeframe: Timeframe,
    pub parameters: Params,
    pub initial_balance: Decimal,
    pub final_balance: Decimal,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
    pub metrics: BacktestMetrics,
    pub summary: BacktestSummary,
}

/// Headline statistics for CLI output and result listings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BacktestSummary {
    pub total_pnl: Decimal,
    pub total_return_pct: Decimal,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub max_drawdown: Decimal,
    pub max_drawdown_pct: Decimal,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub total_trades: usize,
    pub avg_holding_secs: i64,
}

impl BacktestSummary {
    /// Condense full metrics into the headline set
    pub fn from_metrics(metrics: &BacktestMetrics) -> Self {
        Self {
            total_pnl: metrics.total_return,
            total_return_pct: metrics.total_return_pct,
            sharpe_ratio: metrics.sharpe_ratio,
            sortino_ratio: metrics.sortino_ratio,
            max_drawdown: metrics.max_drawdown,
            max_drawdown_pct: metrics.max_drawdown_percentage,
            win_rate: metrics.win_rate,
            profit_factor: metrics.profit_factor,
            total_trades: metrics.total_trades,
            avg_holding_secs: metrics.average_holding_secs,
        }
    }

    /// Format as table for CLI output
    pub fn format_table(&self) -> String {
        format!(
            r#"
══════════════════════════════════════════════════════
               BACKTEST RESULTS
══════════════════════════════════════════════════════

PERFORMANCE
───────────────────────────────────────────────────────
Net P&L:          {:+.2} ({:+.2}%)
Sharpe Ratio:     {:.2}
Sortino Ratio:    {:.2}
Max Drawdown:     {:.2} ({:.2}%)
Win Rate:         {:.1}%
Profit Factor:    {:.2}

ACTIVITY
───────────────────────────────────────────────────────
Total Trades:     {}
Avg Duration:     {}s
══════════════════════════════════════════════════════
"#,
            self.total_pnl,
            self.total_return_pct,
            self.sharpe_ratio,
            self.sortino_ratio,
            self.max_drawdown,
            self.max_drawdown_pct,
            self.win_rate * 100.0,
            self.profit_factor,
            self.total_trades,
            self.avg_holding_secs,
        )
    }
}
