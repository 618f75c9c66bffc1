//! # SmartUI Decision
//!
//! Strategy engines and the decision fusion engine.
//!
//! ## Flow
//!
//! 1. Every registered [`StrategyEngine`] is invoked concurrently with a timeout
//! 2. [`FusionMerger`] picks the primary candidate and merges actions and reasoning
//! 3. Shared [`CategoryWeights`] adapt to the fused confidence
//! 4. The result is appended to the bounded [`DecisionHistory`]

pub mod fusion;
pub mod strategy;
pub mod telemetry;

pub use fusion::{
    CategoryWeights, DecisionFusionEngine, DecisionHistory, FusionMerger, FusionState,
    PerformanceMetrics, SharedWeights,
};
pub use strategy::{
    HeuristicEngine, MlPlaceholderEngine, RuleBasedEngine, RuleTable, StrategyEngine,
    StrategyRegistry,
};
pub use telemetry::DecisionTelemetry;

use serde::{Deserialize, Serialize};
use smartui_common::{
    Category, SmartUiError, StrategyKind, DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_HISTORY_CAPACITY,
    DEFAULT_HISTORY_RETAIN,
};
use std::collections::BTreeMap;
use std::time::Duration;

/// Decision fusion configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionConfig {
    /// Engines to register, by kind
    pub strategies: Vec<StrategyKind>,
    /// Per-engine timeout in milliseconds
    pub engine_timeout_ms: u64,
    /// Fused confidence below this needs clarification
    pub confidence_threshold: f64,
    /// Fused confidence at or above this boosts the primary category
    pub boost_threshold: f64,
    /// Fused confidence below this decays the primary category
    pub decay_threshold: f64,
    pub boost_factor: f64,
    pub decay_factor: f64,
    /// Initial category weights; normalized on load
    pub initial_weights: BTreeMap<Category, f64>,
    pub history_capacity: usize,
    /// History size kept after trimming
    pub history_retain: usize,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            strategies: StrategyKind::ALL.to_vec(),
            engine_timeout_ms: 2000,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            boost_threshold: 0.8,
            decay_threshold: 0.5,
            boost_factor: 1.05,
            decay_factor: 0.95,
            initial_weights: Category::ALL.iter().map(|c| (*c, 0.25)).collect(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            history_retain: DEFAULT_HISTORY_RETAIN,
        }
    }
}

impl DecisionConfig {
    pub fn engine_timeout(&self) -> Duration {
        Duration::from_millis(self.engine_timeout_ms)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), SmartUiError> {
        if self.strategies.is_empty() {
            return Err(SmartUiError::Config(
                "decision.strategies must name at least one engine".into(),
            ));
        }
        if self.engine_timeout_ms == 0 {
            return Err(SmartUiError::Config("decision.engine_timeout_ms must be > 0".into()));
        }
        for (name, value) in [
            ("confidence_threshold", self.confidence_threshold),
            ("boost_threshold", self.boost_threshold),
            ("decay_threshold", self.decay_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(SmartUiError::Config(format!(
                    "decision.{} must be within [0, 1]",
                    name
                )));
            }
        }
        if self.boost_factor <= 0.0 || self.decay_factor <= 0.0 {
            return Err(SmartUiError::Config(
                "decision adaptation factors must be > 0".into(),
            ));
        }
        if self.initial_weights.values().any(|w| !w.is_finite() || *w <= 0.0) {
            return Err(SmartUiError::Config(
                "decision.initial_weights must be positive".into(),
            ));
        }
        if self.history_retain == 0 || self.history_retain > self.history_capacity {
            return Err(SmartUiError::Config(
                "decision.history_retain must be within 1..=history_capacity".into(),
            ));
        }
        Ok(())
    }
}
