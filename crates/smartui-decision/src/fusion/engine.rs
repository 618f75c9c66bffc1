//! Decision Fusion Engine

use futures::future::join_all;
use futures::FutureExt;
use smartui_common::{
    CandidateDecision, DecisionContext, DecisionInput, DecisionResult, EngineError, SmartUiError,
    StrategyKind,
};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::history::{DecisionHistory, PerformanceMetrics};
use super::merge::FusionMerger;
use super::weights::{AdaptationPolicy, CategoryWeights, SharedWeights};
use crate::strategy::{StrategyEngine, StrategyRegistry};
use crate::telemetry::DecisionTelemetry;
use crate::DecisionConfig;

/// Mutable state shared across decision cycles
#[derive(Clone)]
pub struct FusionState {
    pub weights: SharedWeights,
    pub history: Arc<DecisionHistory>,
}

impl FusionState {
    pub fn new(weights: CategoryWeights, history: DecisionHistory) -> Self {
        Self {
            weights: weights.shared(),
            history: Arc::new(history),
        }
    }

    pub fn from_config(config: &DecisionConfig) -> Self {
        Self::new(
            CategoryWeights::from_map(&config.initial_weights),
            DecisionHistory::new(config.history_capacity, config.history_retain),
        )
    }

    /// Copy of the current weights
    pub fn weights_snapshot(&self) -> CategoryWeights {
        self.weights.lock().clone()
    }
}

/// Fans a decision request out to every strategy engine and fuses the results
pub struct DecisionFusionEngine {
    registry: StrategyRegistry,
    merger: FusionMerger,
    policy: AdaptationPolicy,
    engine_timeout: Duration,
    state: FusionState,
    telemetry: Option<Arc<DecisionTelemetry>>,
}

impl DecisionFusionEngine {
    /// Engine with the built-in strategies named in the config
    pub fn new(config: DecisionConfig) -> Result<Self, SmartUiError> {
        let registry = StrategyRegistry::from_kinds(&config.strategies);
        let state = FusionState::from_config(&config);
        Self::with_registry(config, registry, state)
    }

    /// Engine over an explicit registry and injected state
    pub fn with_registry(
        config: DecisionConfig,
        registry: StrategyRegistry,
        state: FusionState,
    ) -> Result<Self, SmartUiError> {
        config.validate()?;
        if registry.is_empty() {
            return Err(SmartUiError::Config(
                "no strategy engines registered".into(),
            ));
        }
        info!(engines = ?registry.kinds(), "Decision fusion engine ready");
        Ok(Self {
            merger: FusionMerger::new(config.confidence_threshold),
            policy: AdaptationPolicy::from(&config),
            engine_timeout: config.engine_timeout(),
            registry,
            state,
            telemetry: None,
        })
    }

    pub fn with_telemetry(mut self, telemetry: Arc<DecisionTelemetry>) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    pub fn state(&self) -> &FusionState {
        &self.state
    }

    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    /// Run one decision cycle. Engine errors and timeouts become
    /// zero-confidence candidates, so this always produces a result.
    #[instrument(skip_all, fields(user = %context.user_id, source = ?input.source()))]
    pub async fn decide(&self, context: &DecisionContext, input: &DecisionInput) -> DecisionResult {
        let started = Instant::now();

        let invocations = self
            .registry
            .engines()
            .into_iter()
            .map(|engine| self.invoke(engine, context, input));
        let outcomes = join_all(invocations).await;

        let failed: Vec<StrategyKind> = outcomes
            .iter()
            .filter(|(_, failed)| *failed)
            .map(|(c, _)| c.strategy)
            .collect();
        let candidates: Vec<CandidateDecision> = outcomes.into_iter().map(|(c, _)| c).collect();

        let weights = self.state.weights_snapshot();
        let merged = self.merger.merge(candidates, &weights);

        let weights_after = {
            let mut shared = self.state.weights.lock();
            shared.adapt(merged.category, merged.confidence, &self.policy);
            shared.clone()
        };

        let result = DecisionResult {
            id: Uuid::now_v7(),
            strategy: merged.strategy,
            category: merged.category,
            confidence: merged.confidence,
            status: merged.status,
            actions: merged.actions,
            reasoning: merged.reasoning,
            metadata: merged.metadata,
            response_time_ms: started.elapsed().as_secs_f64() * 1000.0,
            timestamp: chrono::Utc::now(),
        };

        self.state
            .history
            .record(Arc::new(result.clone()), failed.len() as u64);
        if let Some(telemetry) = &self.telemetry {
            telemetry.observe(&result, &failed, &weights_after);
        }

        info!(
            strategy = %result.strategy,
            category = %result.category,
            confidence = result.confidence,
            status = ?result.status,
            actions = result.actions.len(),
            "Decision fused"
        );
        result
    }

    /// Run one engine under the timeout; the flag is set when it failed
    async fn invoke(
        &self,
        engine: Arc<dyn StrategyEngine>,
        context: &DecisionContext,
        input: &DecisionInput,
    ) -> (CandidateDecision, bool) {
        let kind = engine.kind();
        let started = Instant::now();

        // A panicking engine is confined to its own branch
        let guarded = AssertUnwindSafe(engine.decide(context, input)).catch_unwind();

        let error = match tokio::time::timeout(self.engine_timeout, guarded).await {
            Ok(Ok(Ok(mut candidate))) => {
                candidate.strategy = kind;
                debug!(strategy = %kind, confidence = candidate.confidence, "Engine finished");
                return (candidate, false);
            }
            Ok(Ok(Err(e))) => e,
            Ok(Err(_)) => EngineError::Panicked {
                strategy: kind.to_string(),
            },
            Err(_) => EngineError::Timeout {
                strategy: kind.to_string(),
                elapsed_ms: started.elapsed().as_millis() as u64,
            },
        };

        warn!(strategy = %kind, error = %error, "Strategy engine failed");
        (CandidateDecision::failed(kind, error.to_string()), true)
    }

    pub fn performance_metrics(&self) -> PerformanceMetrics {
        let weights = self.state.weights_snapshot();
        self.state.history.metrics(&weights)
    }
}
