//! Provider and sink seams
//!
//! The service pulls UI state and environment info from providers when it
//! builds a decision context, and pushes every fused result to its sinks.

use async_trait::async_trait;
use dashmap::DashMap;
use smartui_common::{DecisionResult, JsonMap, SmartUiError};
use tokio::sync::mpsc;
use tracing::info;

/// Current UI state of a session
#[async_trait]
pub trait UiStateProvider: Send + Sync {
    async fn current_ui_state(&self, session_id: &str) -> JsonMap;
}

/// Environment info of a session (locale, `utc_offset_minutes`, ...)
#[async_trait]
pub trait EnvironmentProvider: Send + Sync {
    async fn environment_info(&self, session_id: &str) -> JsonMap;
}

/// Receiver of fused decisions (UI executor, broadcaster)
#[async_trait]
pub trait DecisionSink: Send + Sync {
    async fn deliver(&self, result: &DecisionResult) -> Result<(), SmartUiError>;
}

/// In-memory providers with per-session overrides
#[derive(Debug, Default)]
pub struct StaticProviders {
    default_ui_state: JsonMap,
    default_environment: JsonMap,
    ui_states: DashMap<String, JsonMap>,
    environments: DashMap<String, JsonMap>,
}

impl StaticProviders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_environment(mut self, environment: JsonMap) -> Self {
        self.default_environment = environment;
        self
    }

    pub fn with_default_ui_state(mut self, ui_state: JsonMap) -> Self {
        self.default_ui_state = ui_state;
        self
    }

    pub fn set_ui_state(&self, session_id: impl Into<String>, ui_state: JsonMap) {
        self.ui_states.insert(session_id.into(), ui_state);
    }

    pub fn set_environment(&self, session_id: impl Into<String>, environment: JsonMap) {
        self.environments.insert(session_id.into(), environment);
    }
}

#[async_trait]
impl UiStateProvider for StaticProviders {
    async fn current_ui_state(&self, session_id: &str) -> JsonMap {
        self.ui_states
            .get(session_id)
            .map(|s| s.clone())
            .unwrap_or_else(|| self.default_ui_state.clone())
    }
}

#[async_trait]
impl EnvironmentProvider for StaticProviders {
    async fn environment_info(&self, session_id: &str) -> JsonMap {
        self.environments
            .get(session_id)
            .map(|e| e.clone())
            .unwrap_or_else(|| self.default_environment.clone())
    }
}

/// Forwards decisions into a tokio channel
pub struct ChannelSink {
    tx: mpsc::Sender<DecisionResult>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<DecisionResult>) -> Self {
        Self { tx }
    }

    /// Sink plus the receiving end of a channel of `buffer` slots
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<DecisionResult>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self::new(tx), rx)
    }
}

#[async_trait]
impl DecisionSink for ChannelSink {
    async fn deliver(&self, result: &DecisionResult) -> Result<(), SmartUiError> {
        self.tx
            .send(result.clone())
            .await
            .map_err(|_| SmartUiError::Internal("decision channel closed".into()))
    }
}

/// Logs each decision
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingSink;

#[async_trait]
impl DecisionSink for LoggingSink {
    async fn deliver(&self, result: &DecisionResult) -> Result<(), SmartUiError> {
        match result.ui_modification() {
            Some(modification) => info!(
                decision = %result.id,
                target = %modification.target_element,
                kind = %modification.modification_type,
                confidence = result.confidence,
                "UI modification"
            ),
            None => info!(
                decision = %result.id,
                confidence = result.confidence,
                "Decision needs clarification"
            ),
        }
        Ok(())
    }
}
