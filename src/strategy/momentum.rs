//! Momentum breakout strategy

use rust_decimal::Decimal;

use super::{param, period_param, ParamSpec, Params, Signal, Strategy};
use crate::data::Bar;

const LOOKBACK: ParamSpec = ParamSpec {
    name: "lookback",
    default: 14.0,
    min: 2.0,
    max: 200.0,
};

const THRESHOLD: ParamSpec = ParamSpec {
    name: "threshold",
    default: 0.02,
    min: 0.001,
    max: 0.5,
};

const SCHEMA: [ParamSpec; 2] = [LOOKBACK, THRESHOLD];

/// Breakout on trailing return
///
/// Signals long when the return over the lookback window exceeds the
/// threshold, short when it falls below the negative threshold.
#[derive(Debug, Clone, Copy, Default)]
pub struct Momentum;

impl Strategy for Momentum {
    fn id(&self) -> &'static str {
        "momentum"
    }

    fn name(&self) -> &'static str {
        "Momentum breakout"
    }

    fn param_schema(&self) -> &'static [ParamSpec] {
        &SCHEMA
    }

    fn warmup(&self, params: &Params) -> usize {
        period_param(params, &LOOKBACK) + 1
    }

    fn evaluate(&self, window: &[Bar], params: &Params) -> Signal {
        let lookback = period_param(params, &LOOKBACK);
        if window.len() < lookback + 1 {
            return Signal::Hold;
        }

        let reference = window[window.len() - 1 - lookback].close;
        let latest = window[window.len() - 1].close;
        if reference.is_zero() {
            return Signal::Hold;
        }

        let ret = (latest - reference) / reference;
        let threshold =
            Decimal::from_f64_retain(param(params, &THRESHOLD)).unwrap_or_default();

        if ret > threshold {
            Signal::Buy
        } else if ret < -threshold {
            Signal::Sell
        } else {
            Signal::Hold
        }
    }
}
