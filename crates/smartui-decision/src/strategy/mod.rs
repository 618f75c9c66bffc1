//! Strategy engines
//!
//! Each engine maps a decision context and input to a [`CandidateDecision`].
//! Engines are pure given their configuration; the fusion engine owns
//! timeouts and failure handling.

mod heuristic;
mod ml;
mod rule_based;

pub use heuristic::HeuristicEngine;
pub use ml::{MlFeatures, MlPlaceholderEngine};
pub use rule_based::{RuleBasedEngine, RuleTable};

use async_trait::async_trait;
use smartui_common::{CandidateDecision, DecisionContext, DecisionInput, EngineError, StrategyKind};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A decision strategy
#[async_trait]
pub trait StrategyEngine: Send + Sync {
    fn kind(&self) -> StrategyKind;

    async fn decide(
        &self,
        context: &DecisionContext,
        input: &DecisionInput,
    ) -> Result<CandidateDecision, EngineError>;
}

/// Engines keyed by strategy kind
#[derive(Clone, Default)]
pub struct StrategyRegistry {
    engines: BTreeMap<StrategyKind, Arc<dyn StrategyEngine>>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in engine for each listed kind
    pub fn from_kinds(kinds: &[StrategyKind]) -> Self {
        let mut registry = Self::new();
        for kind in kinds {
            let engine: Arc<dyn StrategyEngine> = match kind {
                StrategyKind::RuleBased => Arc::new(RuleBasedEngine::default()),
                StrategyKind::MlPlaceholder => Arc::new(MlPlaceholderEngine),
                StrategyKind::Heuristic => Arc::new(HeuristicEngine),
            };
            registry.engines.insert(*kind, engine);
        }
        registry
    }

    /// All three built-in engines
    pub fn with_defaults() -> Self {
        Self::from_kinds(&StrategyKind::ALL)
    }

    /// Add an engine, replacing any engine of the same kind
    pub fn register(mut self, engine: Arc<dyn StrategyEngine>) -> Self {
        self.engines.insert(engine.kind(), engine);
        self
    }

    /// Engines in priority order
    pub fn engines(&self) -> Vec<Arc<dyn StrategyEngine>> {
        self.engines.values().cloned().collect()
    }

    pub fn kinds(&self) -> Vec<StrategyKind> {
        self.engines.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }
}

impl std::fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyRegistry")
            .field("engines", &self.kinds())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_orders_by_priority() {
        let registry = StrategyRegistry::from_kinds(&[
            StrategyKind::Heuristic,
            StrategyKind::RuleBased,
        ]);
        assert_eq!(
            registry.kinds(),
            vec![StrategyKind::RuleBased, StrategyKind::Heuristic]
        );
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_register_replaces_same_kind() {
        let registry = StrategyRegistry::with_defaults()
            .register(Arc::new(RuleBasedEngine::new(RuleTable::default())));
        assert_eq!(registry.len(), 3);
    }
}
