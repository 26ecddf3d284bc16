//! Parameter grid expansion

use std::collections::BTreeMap;

use crate::strategy::Params;

/// Inclusive stepped range for one parameter
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ParameterRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

/// Named ranges; `BTreeMap` fixes the enumeration order
pub type ParameterRanges = BTreeMap<String, ParameterRange>;

impl ParameterRange {
    pub fn new(min: f64, max: f64, step: f64) -> Self {
        Self { min, max, step }
    }

    /// Values `[min, min + step, ...]`, including `max` only when the
    /// stepping lands on it within floating-point epsilon. A
    /// non-positive step or inverted range yields no values.
    pub fn values(&self) -> Vec<f64> {
        if self.step <= 0.0 {
            return Vec::new();
        }
        let eps = self.step.abs() * 1e-9;
        let mut out = Vec::new();
        let mut k = 0u32;
        loop {
            // Multiply instead of accumulating so error never compounds
            let v = self.min + f64::from(k) * self.step;
            if v > self.max + eps {
                break;
            }
            out.push(v);
            k += 1;
        }
        out
    }
}

/// Cartesian product of all ranges, in deterministic order: the first
/// parameter name varies slowest. An empty map, or any range with no
/// values, expands to zero combinations.
pub fn expand_grid(ranges: &ParameterRanges) -> Vec<Params> {
    if ranges.is_empty() {
        return Vec::new();
    }

    let mut combos: Vec<Params> = vec![Params::new()];
    for (name, range) in ranges {
        let values = range.values();
        if values.is_empty() {
            return Vec::new();
        }
        let mut next = Vec::with_capacity(combos.len() * values.len());
        for combo in &combos {
            for value in &values {
                let mut expanded = combo.clone();
                expanded.insert(name.clone(), *value);
                next.push(expanded);
            }
        }
        combos = next;
    }
    combos
}
