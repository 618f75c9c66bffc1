//! # SmartUI Service
//!
//! Facade that turns pushed interactions and incoming commands into fused
//! UI decisions.
//!
//! - [`SmartUiService`]: analyzer, fusion engine, providers and sinks
//! - [`ServiceConfig`]: layered configuration (defaults, TOML, environment)
//! - [`ReplayRecord`]: one line of a JSON Lines replay file

pub mod config;
pub mod providers;
pub mod service;

pub use config::{ServiceConfig, ServiceSettings};
pub use providers::{
    ChannelSink, DecisionSink, EnvironmentProvider, LoggingSink, StaticProviders, UiStateProvider,
};
pub use service::{DecisionRequest, SmartUiService, SmartUiServiceBuilder};

use serde::{Deserialize, Serialize};
use smartui_common::RawInteraction;

/// One replayed event
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReplayRecord {
    Interaction(RawInteraction),
    Decision(DecisionRequest),
}

#[cfg(test)]
mod tests {
    use super::*;
    use smartui_common::DecisionInput;

    #[test]
    fn test_replay_lines_parse() {
        let interaction: ReplayRecord = serde_json::from_str(
            r#"{"type":"interaction","user_id":"u1","session_id":"s1","modality":"voice","action":"speak"}"#,
        )
        .unwrap();
        assert!(matches!(interaction, ReplayRecord::Interaction(ref raw) if raw.success));

        let decision: ReplayRecord = serde_json::from_str(
            r#"{"type":"decision","user_id":"u1","session_id":"s1",
                "input":{"kind":"voice","transcript":"change the color","confidence":0.9}}"#,
        )
        .unwrap();
        match decision {
            ReplayRecord::Decision(request) => {
                assert!(matches!(request.input, DecisionInput::Voice { .. }));
                assert!(request.device_info.is_empty());
            }
            other => panic!("unexpected record: {:?}", other),
        }
    }
}
