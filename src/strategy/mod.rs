//! Trading strategies
//!
//! Strategies are statically registered, pure functions: the same window
//! and parameters always produce the same signal. There is no dynamic
//! strategy loading and no script evaluation of any kind; every strategy
//! is a typed implementation of [`Strategy`] registered in the
//! [`StrategyRegistry`].

mod momentum;
mod registry;
mod sma;
mod types;

pub use momentum::Momentum;
pub use registry::StrategyRegistry;
pub use sma::SmaCrossover;
pub use types::{param, period_param, ParamSpec, Params, Signal};

use crate::data::Bar;

/// A registered trading strategy
///
/// `evaluate` sees the window of bars strictly before the execution bar,
/// so a decision can never look at the price it fills on. Implementations
/// must be pure: no interior state, no I/O, no randomness.
pub trait Strategy: Send + Sync + std::fmt::Debug {
    /// Stable identifier used in configs and the registry
    fn id(&self) -> &'static str;

    /// Human-readable name
    fn name(&self) -> &'static str;

    /// Declared parameters with defaults and bounds
    fn param_schema(&self) -> &'static [ParamSpec];

    /// Number of bars the strategy needs before it can emit a
    /// non-trivial signal for the given parameters
    fn warmup(&self, params: &Params) -> usize;

    /// Evaluate the lookback window and emit a signal
    fn evaluate(&self, window: &[Bar], params: &Params) -> Signal;
}
