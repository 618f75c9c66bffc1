//! SmartUI service facade
//!
//! Wires the interaction store, behavior analyzer and decision fusion engine
//! together. A decision request goes through five steps: record the command,
//! build the context from the providers and the analyzer, fuse, deliver to
//! the sinks, return the result.

use chrono::Utc;
use prometheus::{Encoder, Registry, TextEncoder};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use smartui_analyzer::{AnalyzerStats, UserBehaviorAnalyzer, UserInsights};
use smartui_common::{
    DecisionContext, DecisionInput, DecisionResult, Interaction, JsonMap, RawInteraction,
    SmartUiError, ValidationError,
};
use smartui_decision::{
    DecisionFusionEngine, DecisionTelemetry, FusionState, PerformanceMetrics, StrategyRegistry,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::config::{ServiceConfig, ServiceSettings};
use crate::providers::{DecisionSink, EnvironmentProvider, StaticProviders, UiStateProvider};

/// One decision request from the transport boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRequest {
    pub user_id: String,
    pub session_id: String,
    #[serde(default)]
    pub device_info: JsonMap,
    pub input: DecisionInput,
}

impl DecisionRequest {
    pub fn new(user_id: impl Into<String>, session_id: impl Into<String>, input: DecisionInput) -> Self {
        Self {
            user_id: user_id.into(),
            session_id: session_id.into(),
            device_info: JsonMap::new(),
            input,
        }
    }

    pub fn with_device_info(mut self, device_info: JsonMap) -> Self {
        self.device_info = device_info;
        self
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.user_id.trim().is_empty() {
            return Err(ValidationError::MissingField("user_id"));
        }
        if self.session_id.trim().is_empty() {
            return Err(ValidationError::MissingField("session_id"));
        }
        Ok(())
    }

    /// The command itself, as an interaction record
    fn to_interaction(&self) -> Interaction {
        let mut interaction = Interaction::new(
            &self.user_id,
            &self.session_id,
            self.input.modality(),
            "voice_command",
        );
        match &self.input {
            DecisionInput::Voice {
                transcript,
                confidence,
                ..
            } => {
                interaction = interaction
                    .on_element("voice_interface", "voice_interface")
                    .with_context("transcript", json!(transcript))
                    .with_context("confidence", json!(confidence));
            }
            DecisionInput::VisualDebug {
                debug_action,
                selected_element,
                ..
            } => {
                let element_id = self.input.target_element().unwrap_or("unknown").to_string();
                let element_type = selected_element
                    .get("type")
                    .and_then(|v| v.as_str())
                    .unwrap_or("element")
                    .to_string();
                interaction.action = "visual_debug".to_string();
                interaction = interaction
                    .on_element(element_id, element_type)
                    .with_context("debug_action", json!(debug_action))
                    .with_context("selected_element", Value::Object(selected_element.clone()));
            }
            DecisionInput::Interaction {
                action,
                target,
                parameters,
            } => {
                interaction.action = action.clone();
                interaction.element_id = target.clone();
                if !parameters.is_empty() {
                    interaction = interaction.with_context("parameters", Value::Object(parameters.clone()));
                }
            }
        }
        if !self.device_info.is_empty() {
            interaction = interaction.with_context("device_info", Value::Object(self.device_info.clone()));
        }
        interaction
    }
}

/// Builder for [`SmartUiService`]
pub struct SmartUiServiceBuilder {
    config: ServiceConfig,
    ui_state: Option<Arc<dyn UiStateProvider>>,
    environment: Option<Arc<dyn EnvironmentProvider>>,
    sinks: Vec<Arc<dyn DecisionSink>>,
    strategies: Option<StrategyRegistry>,
    state: Option<FusionState>,
    registry: Option<Registry>,
}

impl SmartUiServiceBuilder {
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            config,
            ui_state: None,
            environment: None,
            sinks: Vec::new(),
            strategies: None,
            state: None,
            registry: None,
        }
    }

    pub fn ui_state_provider(mut self, provider: Arc<dyn UiStateProvider>) -> Self {
        self.ui_state = Some(provider);
        self
    }

    pub fn environment_provider(mut self, provider: Arc<dyn EnvironmentProvider>) -> Self {
        self.environment = Some(provider);
        self
    }

    pub fn sink(mut self, sink: Arc<dyn DecisionSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Replace the engines built from `decision.strategies`
    pub fn strategies(mut self, registry: StrategyRegistry) -> Self {
        self.strategies = Some(registry);
        self
    }

    /// Share weights and history with another service
    pub fn fusion_state(mut self, state: FusionState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn metrics_registry(mut self, registry: Registry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn build(self) -> Result<SmartUiService, SmartUiError> {
        self.config.validate()?;
        let ServiceConfig {
            analyzer,
            decision,
            service,
        } = self.config;

        let registry = self.registry.unwrap_or_default();
        let telemetry = DecisionTelemetry::new()
            .map_err(|e| SmartUiError::Internal(format!("failed to create metrics: {}", e)))?;
        telemetry
            .register(&registry)
            .map_err(|e| SmartUiError::Internal(format!("failed to register metrics: {}", e)))?;

        let strategies = self
            .strategies
            .unwrap_or_else(|| StrategyRegistry::from_kinds(&decision.strategies));
        let state = self.state.unwrap_or_else(|| FusionState::from_config(&decision));
        let fusion = DecisionFusionEngine::with_registry(decision, strategies, state)?
            .with_telemetry(Arc::new(telemetry));

        let defaults = Arc::new(StaticProviders::new());
        let ui_state = self
            .ui_state
            .unwrap_or_else(|| defaults.clone() as Arc<dyn UiStateProvider>);
        let environment = self
            .environment
            .unwrap_or_else(|| defaults as Arc<dyn EnvironmentProvider>);

        info!(
            sinks = self.sinks.len(),
            history_slice = service.history_slice,
            record_commands = service.record_commands,
            "SmartUI service initialized"
        );
        Ok(SmartUiService {
            settings: service,
            analyzer: Arc::new(UserBehaviorAnalyzer::new(analyzer)),
            fusion,
            ui_state,
            environment,
            sinks: self.sinks,
            registry,
        })
    }
}

/// Facade over analyzer, fusion engine, providers and sinks
pub struct SmartUiService {
    settings: ServiceSettings,
    analyzer: Arc<UserBehaviorAnalyzer>,
    fusion: DecisionFusionEngine,
    ui_state: Arc<dyn UiStateProvider>,
    environment: Arc<dyn EnvironmentProvider>,
    sinks: Vec<Arc<dyn DecisionSink>>,
    registry: Registry,
}

impl SmartUiService {
    pub fn builder(config: ServiceConfig) -> SmartUiServiceBuilder {
        SmartUiServiceBuilder::new(config)
    }

    pub fn analyzer(&self) -> &Arc<UserBehaviorAnalyzer> {
        &self.analyzer
    }

    pub fn fusion(&self) -> &DecisionFusionEngine {
        &self.fusion
    }

    /// Validate and record an interaction from the boundary
    pub fn push_interaction(&self, raw: RawInteraction) -> Result<Arc<Interaction>, ValidationError> {
        let interaction = Interaction::try_from(raw)?;
        self.record(interaction)
    }

    /// Record an already-built interaction
    pub fn record(&self, interaction: Interaction) -> Result<Arc<Interaction>, ValidationError> {
        let recorded = self.analyzer.record_interaction(interaction)?;
        debug!(
            user = %recorded.user_id,
            modality = %recorded.modality,
            success = recorded.success,
            "Interaction recorded"
        );
        Ok(recorded)
    }

    /// Run one decision cycle for a command
    #[instrument(skip_all, fields(user = %request.user_id, session = %request.session_id))]
    pub async fn handle_input(&self, request: DecisionRequest) -> Result<DecisionResult, SmartUiError> {
        request.validate()?;

        if self.settings.record_commands {
            if let Err(e) = self.record(request.to_interaction()) {
                warn!(error = %e, "Failed to record command interaction");
            }
        }

        let context = self.build_context(&request).await;
        let result = self.fusion.decide(&context, &request.input).await;

        for sink in &self.sinks {
            if let Err(e) = sink.deliver(&result).await {
                warn!(error = %e, decision = %result.id, "Decision delivery failed");
            }
        }
        Ok(result)
    }

    async fn build_context(&self, request: &DecisionRequest) -> DecisionContext {
        let ui_state = self.ui_state.current_ui_state(&request.session_id).await;
        let environment = self.environment.environment_info(&request.session_id).await;

        let analysis_context = (!request.device_info.is_empty()).then_some(&request.device_info);
        let insight = self
            .analyzer
            .analyze_user_behavior(&request.user_id, analysis_context);
        let profile = self.analyzer.get_or_create_profile(&request.user_id);
        let history = self
            .analyzer
            .store()
            .recent(&request.user_id, self.settings.history_slice);

        DecisionContext::new(request.input.source(), &request.user_id, &request.session_id)
            .with_ui_state(ui_state)
            .with_environment(environment)
            .with_device_info(request.device_info.clone())
            .with_profile(profile)
            .with_insight(insight)
            .with_history(history)
    }

    pub fn user_insights(&self, user_id: &str) -> UserInsights {
        self.analyzer.user_insights(user_id)
    }

    pub fn performance_metrics(&self) -> PerformanceMetrics {
        self.fusion.performance_metrics()
    }

    pub fn analyzer_stats(&self) -> AnalyzerStats {
        self.analyzer.stats()
    }

    /// Prometheus text exposition of the decision metrics
    pub fn render_metrics(&self) -> Result<String, SmartUiError> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(|e| SmartUiError::Internal(format!("failed to encode metrics: {}", e)))?;
        String::from_utf8(buffer).map_err(|e| SmartUiError::Serialization(e.to_string()))
    }

    /// Spawn the periodic cache sweep and idle-user eviction
    pub fn start_maintenance(self: Arc<Self>) -> JoinHandle<()> {
        let period = Duration::from_secs(self.settings.maintenance_interval_secs);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // First tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let report = self.analyzer.run_maintenance_at(Utc::now());
                debug!(
                    expired = report.expired_cache_entries,
                    evicted = report.evicted_users,
                    "Maintenance pass"
                );
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smartui_common::{Intent, Modality};

    #[test]
    fn test_voice_command_interaction() {
        let request = DecisionRequest::new(
            "alice",
            "s1",
            DecisionInput::voice("make it red", 0.92).with_intent(Intent::new("modify")),
        );
        let interaction = request.to_interaction();
        assert_eq!(interaction.modality, Modality::Voice);
        assert_eq!(interaction.action, "voice_command");
        assert_eq!(interaction.element_id.as_deref(), Some("voice_interface"));
        assert_eq!(interaction.context["transcript"], "make it red");
        assert!(interaction.validate().is_ok());
    }

    #[test]
    fn test_visual_command_interaction() {
        let element = json!({"id": "header", "type": "div"});
        let request = DecisionRequest::new(
            "alice",
            "s1",
            DecisionInput::visual("highlight", element.as_object().cloned().unwrap_or_default()),
        )
        .with_device_info(json!({"device_type": "tablet"}).as_object().cloned().unwrap_or_default());

        let interaction = request.to_interaction();
        assert_eq!(interaction.modality, Modality::Visual);
        assert_eq!(interaction.action, "visual_debug");
        assert_eq!(interaction.element_id.as_deref(), Some("header"));
        assert_eq!(interaction.element_type.as_deref(), Some("div"));
        assert_eq!(interaction.device_info().map(|d| d.len()), Some(1));
    }

    #[test]
    fn test_request_requires_ids() {
        let request = DecisionRequest::new("", "s1", DecisionInput::interaction("click", None));
        assert_eq!(request.validate(), Err(ValidationError::MissingField("user_id")));
    }
}
