//! Strategy registry

use std::collections::HashMap;
use std::sync::Arc;

use super::{Momentum, SmaCrossover, Strategy};
use crate::error::EngineError;

/// Owns the set of registered strategies and resolves ids for runs
pub struct StrategyRegistry {
    strategies: HashMap<&'static str, Arc<dyn Strategy>>,
}

impl StrategyRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            strategies: HashMap::new(),
        }
    }

    /// Registry pre-loaded with the built-in strategies
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(SmaCrossover));
        registry.register(Arc::new(Momentum));
        registry
    }

    /// Register a strategy under its own id. Re-registering an id
    /// replaces the previous entry.
    pub fn register(&mut self, strategy: Arc<dyn Strategy>) {
        self.strategies.insert(strategy.id(), strategy);
    }

    /// Resolve a strategy id
    pub fn get(&self, id: &str) -> Result<Arc<dyn Strategy>, EngineError> {
        self.strategies
            .get(id)
            .cloned()
            .ok_or_else(|| EngineError::StrategyNotFound(id.to_string()))
    }

    /// Registered ids, sorted for stable listings
    pub fn ids(&self) -> Vec<&'static str> {
        let mut ids: Vec<&'static str> = self.strategies.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_registered() {
        let registry = StrategyRegistry::with_builtins();
        assert!(registry.get("sma-crossover").is_ok());
        assert!(registry.get("momentum").is_ok());
        assert_eq!(registry.ids(), vec!["momentum", "sma-crossover"]);
    }

    #[test]
    fn test_unknown_id_not_found() {
        let registry = StrategyRegistry::with_builtins();
        let err = registry.get("unknown").unwrap_err();
        assert!(matches!(err, EngineError::StrategyNotFound(_)));
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = StrategyRegistry::new();
        registry.register(Arc::new(SmaCrossover));
        registry.register(Arc::new(SmaCrossover));
        assert_eq!(registry.ids().len(), 1);
    }
}
