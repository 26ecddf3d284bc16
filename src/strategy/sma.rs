//! Simple moving average crossover strategy

use rust_decimal::Decimal;

use super::{period_param, ParamSpec, Params, Signal, Strategy};
use crate::data::Bar;

const FAST_PERIOD: ParamSpec = ParamSpec {
    name: "fast_period",
    default: 10.0,
    min: 2.0,
    max: 100.0,
};

const SLOW_PERIOD: ParamSpec = ParamSpec {
    name: "slow_period",
    default: 30.0,
    min: 5.0,
    max: 400.0,
};

const SCHEMA: [ParamSpec; 2] = [FAST_PERIOD, SLOW_PERIOD];

/// Classic fast/slow SMA crossover
///
/// Buys when the fast average crosses above the slow one, sells when it
/// crosses below. A cross is detected by comparing the averages on the
/// current window against the window shifted back by one bar.
#[derive(Debug, Clone, Copy, Default)]
pub struct SmaCrossover;

impl SmaCrossover {
    fn periods(params: &Params) -> (usize, usize) {
        let fast = period_param(params, &FAST_PERIOD);
        let slow = period_param(params, &SLOW_PERIOD);
        // Degenerate fast >= slow collapses to no crossings rather than
        // an inverted pair
        (fast.min(slow), slow.max(fast))
    }
}

impl Strategy for SmaCrossover {
    fn id(&self) -> &'static str {
        "sma-crossover"
    }

    fn name(&self) -> &'static str {
        "SMA crossover"
    }

    fn param_schema(&self) -> &'static [ParamSpec] {
        &SCHEMA
    }

    fn warmup(&self, params: &Params) -> usize {
        let (_, slow) = Self::periods(params);
        // One extra bar so the shifted averages exist at the first
        // evaluated window
        slow + 1
    }

    fn evaluate(&self, window: &[Bar], params: &Params) -> Signal {
        let (fast, slow) = Self::periods(params);
        if fast == slow || window.len() < slow + 1 {
            return Signal::Hold;
        }

        let closes: Vec<Decimal> = window.iter().map(|b| b.close).collect();
        let n = closes.len();

        let curr_fast = mean(&closes[n - fast..]);
        let curr_slow = mean(&closes[n - slow..]);
        let prev_fast = mean(&closes[n - 1 - fast..n - 1]);
        let prev_slow = mean(&closes[n - 1 - slow..n - 1]);

        if prev_fast <= prev_slow && curr_fast > curr_slow {
            Signal::Buy
        } else if prev_fast >= prev_slow && curr_fast < curr_slow {
            Signal::Sell
        } else {
            Signal::Hold
        }
    }
}

fn mean(values: &[Decimal]) -> Decimal {
    if values.is_empty() {
        return Decimal::ZERO;
    }
    values.iter().copied().sum::<Decimal>() / Decimal::from(values.len())
}
