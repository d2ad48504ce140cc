// ragwatch-core/src/application/registry.rs

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::error::DomainError;
use crate::ports::source::SourceStrategy;

/// Source strategies keyed by name, looked up case-insensitively.
#[derive(Default, Clone)]
pub struct StrategyRegistry {
    strategies: HashMap<String, Arc<dyn SourceStrategy>>,
    names: Vec<String>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from a fixed set of strategies.
    pub fn from_strategies(
        strategies: impl IntoIterator<Item = Arc<dyn SourceStrategy>>,
    ) -> Result<Self, DomainError> {
        let mut registry = Self::new();
        for strategy in strategies {
            registry.register(strategy)?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, strategy: Arc<dyn SourceStrategy>) -> Result<(), DomainError> {
        let name = strategy.name().to_string();
        let key = name.to_lowercase();
        if self.strategies.contains_key(&key) {
            return Err(DomainError::Configuration(format!(
                "Source strategy '{}' is registered twice",
                name
            )));
        }
        self.strategies.insert(key, strategy);
        self.names.push(name);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn SourceStrategy>, DomainError> {
        self.strategies
            .get(&name.to_lowercase())
            .cloned()
            .ok_or_else(|| DomainError::StrategyNotFound(name.to_string()))
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl std::fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyRegistry")
            .field("names", &self.names)
            .finish()
    }
}
