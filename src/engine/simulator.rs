//! Bar-by-bar trade simulator
//!
//! Walks an ordered bar sequence once, holding at most one open position.
//! The strategy only ever sees the bars strictly before the execution bar
//! and all fills happen at bar close, so a run is a pure function of its
//! inputs: identical bars, strategy, and parameters reproduce the ledger
//! and equity curve byte for byte.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

use super::types::{CloseReason, EquityPoint, Position, Side, Trade};
use crate::data::Bar;
use crate::strategy::{Params, Signal, Strategy};

/// Reserved parameter enabling a protective stop (fraction of entry price)
pub const PARAM_STOP_LOSS: &str = "stop_loss";
/// Reserved parameter enabling a profit target (fraction of entry price)
pub const PARAM_TAKE_PROFIT: &str = "take_profit";

/// Execution model knobs, shared by every run of an engine
#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    /// Fraction of the balance allocated to each new position
    #[serde(default = "default_allocation_fraction")]
    pub allocation_fraction: Decimal,

    /// Commission charged on the exit notional
    #[serde(default = "default_commission_rate")]
    pub commission_rate: Decimal,

    /// Slippage charged on the exit notional
    #[serde(default = "default_slippage_rate")]
    pub slippage_rate: Decimal,

    /// Force-close any open position on the final bar
    #[serde(default)]
    pub close_at_end: bool,
}

fn default_allocation_fraction() -> Decimal {
    dec!(0.95)
}
fn default_commission_rate() -> Decimal {
    dec!(0.001)
}
fn default_slippage_rate() -> Decimal {
    Decimal::ZERO
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            allocation_fraction: default_allocation_fraction(),
            commission_rate: default_commission_rate(),
            slippage_rate: default_slippage_rate(),
            close_at_end: false,
        }
    }
}

/// Everything a single simulation produces
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationOutput {
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
    pub final_balance: Decimal,
}

/// Runs the simulation loop
pub struct Simulator {
    config: SimulationConfig,
}

impl Simulator {
    /// Create a simulator with the given execution model
    pub fn new(config: SimulationConfig) -> Self {
        Self { config }
    }

    /// Simulate a strategy over `bars`, starting from `initial_balance`.
    ///
    /// The caller guarantees `bars.len() > strategy.warmup(params)`; a
    /// shorter series yields an empty output rather than a panic.
    pub fn run(
        &self,
        bars: &[Bar],
        strategy: &dyn Strategy,
        params: &Params,
        initial_balance: Decimal,
        market: &str,
    ) -> SimulationOutput {
        let warmup = strategy.warmup(params);
        if bars.len() <= warmup {
            return SimulationOutput {
                trades: Vec::new(),
                equity_curve: Vec::new(),
                final_balance: initial_balance,
            };
        }

        let stop_loss = fraction_param(params, PARAM_STOP_LOSS);
        let take_profit = fraction_param(params, PARAM_TAKE_PROFIT);

        let mut balance = initial_balance;
        let mut position: Option<Position> = None;
        let mut trades: Vec<Trade> = Vec::new();
        let mut curve: Vec<EquityPoint> = Vec::with_capacity(bars.len() - warmup);

        for i in warmup..bars.len() {
            let bar = &bars[i];
            let price = bar.close;

            // Protective exits take precedence over the signal on the
            // same bar; exits fill at bar close (intrabar touches are
            // not modeled)
            let exit_reason = position
                .as_ref()
                .and_then(|pos| protective_exit(pos, price, stop_loss, take_profit));
            let mut exited = false;
            if let Some(reason) = exit_reason {
                if let Some(pos) = position.take() {
                    balance += self.close(&mut trades, pos, price, bar, market, reason);
                    exited = true;
                }
            }

            if !exited {
                let signal = strategy.evaluate(&bars[..i], params);
                match (position.as_ref().map(|p| p.side), signal) {
                    (None, Signal::Buy) => {
                        position = self.open(Side::Long, balance, price, bar);
                    }
                    (None, Signal::Sell) => {
                        position = self.open(Side::Short, balance, price, bar);
                    }
                    (Some(Side::Long), Signal::Sell) | (Some(Side::Short), Signal::Buy) => {
                        if let Some(pos) = position.take() {
                            balance += self.close(
                                &mut trades,
                                pos,
                                price,
                                bar,
                                market,
                                CloseReason::SignalReversal,
                            );
                        }
                    }
                    _ => {}
                }
            }

            let unrealized = position
                .as_ref()
                .map(|p| p.unrealized_pnl(price))
                .unwrap_or(Decimal::ZERO);
            curve.push(EquityPoint {
                timestamp: bar.timestamp,
                equity: balance + unrealized,
                drawdown: Decimal::ZERO,
                drawdown_percentage: Decimal::ZERO,
            });
        }

        if self.config.close_at_end {
            if let (Some(pos), Some(last)) = (position.take(), bars.last()) {
                balance +=
                    self.close(&mut trades, pos, last.close, last, market, CloseReason::EndOfData);
                if let Some(point) = curve.last_mut() {
                    point.equity = balance;
                }
            }
        }

        apply_drawdowns(&mut curve);

        SimulationOutput {
            trades,
            equity_curve: curve,
            final_balance: balance,
        }
    }

    /// Open a position sized from the current balance. Returns `None`
    /// when the balance buys less than one unit (skipped silently).
    fn open(&self, side: Side, balance: Decimal, price: Decimal, bar: &Bar) -> Option<Position> {
        if price <= Decimal::ZERO {
            return None;
        }
        let quantity = (balance * self.config.allocation_fraction / price).floor();
        if quantity <= Decimal::ZERO {
            return None;
        }
        Some(Position {
            side,
            quantity,
            entry_price: price,
            entry_time: bar.timestamp,
        })
    }

    /// Close a position, append the trade, and return the realized P&L
    fn close(
        &self,
        trades: &mut Vec<Trade>,
        position: Position,
        exit_price: Decimal,
        bar: &Bar,
        market: &str,
        reason: CloseReason,
    ) -> Decimal {
        let exit_notional = exit_price * position.quantity;
        let commission = exit_notional * self.config.commission_rate;
        let slippage = exit_notional * self.config.slippage_rate;
        let pnl = position.side.sign() * (exit_price - position.entry_price) * position.quantity
            - commission
            - slippage;

        let entry_notional = position.entry_price * position.quantity;
        let pnl_percentage = if entry_notional > Decimal::ZERO {
            pnl / entry_notional * dec!(100)
        } else {
            Decimal::ZERO
        };

        trades.push(Trade {
            id: trades.len() as u64 + 1,
            market: market.to_string(),
            side: position.side,
            entry_price: position.entry_price,
            exit_price,
            quantity: position.quantity,
            entry_time: position.entry_time,
            exit_time: bar.timestamp,
            pnl,
            pnl_percentage,
            commission,
            slippage,
            reason,
        });
        pnl
    }
}

/// Read an optional positive fraction parameter
fn fraction_param(params: &Params, name: &str) -> Option<Decimal> {
    params
        .get(name)
        .copied()
        .filter(|v| *v > 0.0)
        .and_then(Decimal::from_f64_retain)
}

/// Check stop-loss / take-profit distances against the mark price
fn protective_exit(
    position: &Position,
    price: Decimal,
    stop_loss: Option<Decimal>,
    take_profit: Option<Decimal>,
) -> Option<CloseReason> {
    if position.entry_price.is_zero() {
        return None;
    }
    // Favorable move is positive for both sides
    let move_pct = position.side.sign() * (price - position.entry_price) / position.entry_price;

    if let Some(stop) = stop_loss {
        if move_pct <= -stop {
            return Some(CloseReason::StopLoss);
        }
    }
    if let Some(target) = take_profit {
        if move_pct >= target {
            return Some(CloseReason::TakeProfit);
        }
    }
    None
}

/// Second pass: running-peak drawdown over the finished curve
fn apply_drawdowns(curve: &mut [EquityPoint]) {
    let mut peak = Decimal::MIN;
    for point in curve.iter_mut() {
        if point.equity > peak {
            peak = point.equity;
        }
        point.drawdown = peak - point.equity;
        point.drawdown_percentage = if peak > Decimal::ZERO {
            point.drawdown / peak * dec!(100)
        } else {
            Decimal::ZERO
        };
    }
}
