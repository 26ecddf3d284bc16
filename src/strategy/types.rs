//! Strategy types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Trading signal emitted per bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    /// Enter or stay long
    Buy,
    /// Enter or stay short
    Sell,
    /// Do nothing
    Hold,
}

/// Strategy parameter set. A `BTreeMap` keeps iteration order stable so
/// grid enumeration and serialized output are deterministic.
pub type Params = BTreeMap<String, f64>;

/// Declared parameter of a strategy
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ParamSpec {
    /// Parameter name as used in [`Params`]
    pub name: &'static str,
    /// Value used when the parameter is absent
    pub default: f64,
    /// Smallest sensible value
    pub min: f64,
    /// Largest sensible value
    pub max: f64,
}

/// Read a parameter, falling back to its schema default
pub fn param(params: &Params, spec: &ParamSpec) -> f64 {
    params.get(spec.name).copied().unwrap_or(spec.default)
}

/// Read a parameter as a positive period length
pub fn period_param(params: &Params, spec: &ParamSpec) -> usize {
    (param(params, spec).round() as i64).max(1) as usize
}
