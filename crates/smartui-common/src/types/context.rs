//! Decision context and input types

use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::insight::BehaviorInsight;
use super::interaction::{Interaction, Modality};
use super::profile::UserProfile;
use super::JsonMap;

/// Where a decision request originated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputSource {
    Voice,
    Visual,
    UserInteraction,
    System,
    Api,
}

/// Parsed intent attached to a command
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub action: String,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub parameters: JsonMap,
}

impl Intent {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            ..Default::default()
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

/// Input payload handed to strategy engines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecisionInput {
    /// Recognized speech with optional parsed intent
    Voice {
        transcript: String,
        #[serde(default)]
        intent: Option<Intent>,
        #[serde(default)]
        confidence: f64,
    },
    /// Visual debugging command on a selected element
    VisualDebug {
        debug_action: String,
        #[serde(default)]
        selected_element: JsonMap,
        #[serde(default)]
        page_context: JsonMap,
    },
    /// Generic UI interaction
    Interaction {
        action: String,
        #[serde(default)]
        target: Option<String>,
        #[serde(default)]
        parameters: JsonMap,
    },
}

impl DecisionInput {
    pub fn voice(transcript: impl Into<String>, confidence: f64) -> Self {
        DecisionInput::Voice {
            transcript: transcript.into(),
            intent: None,
            confidence,
        }
    }

    pub fn visual(debug_action: impl Into<String>, selected_element: JsonMap) -> Self {
        DecisionInput::VisualDebug {
            debug_action: debug_action.into(),
            selected_element,
            page_context: JsonMap::new(),
        }
    }

    pub fn interaction(action: impl Into<String>, target: Option<String>) -> Self {
        DecisionInput::Interaction {
            action: action.into(),
            target,
            parameters: JsonMap::new(),
        }
    }

    /// Attach an intent to a voice input; no-op for other kinds
    pub fn with_intent(mut self, new_intent: Intent) -> Self {
        if let DecisionInput::Voice { intent, .. } = &mut self {
            *intent = Some(new_intent);
        }
        self
    }

    pub fn source(&self) -> InputSource {
        match self {
            DecisionInput::Voice { .. } => InputSource::Voice,
            DecisionInput::VisualDebug { .. } => InputSource::Visual,
            DecisionInput::Interaction { .. } => InputSource::UserInteraction,
        }
    }

    /// Modality used when the command is recorded as an interaction
    pub fn modality(&self) -> Modality {
        match self {
            DecisionInput::Voice { .. } => Modality::Voice,
            DecisionInput::VisualDebug { .. } => Modality::Visual,
            DecisionInput::Interaction { .. } => Modality::Mouse,
        }
    }

    /// Intent action and target, if the input carries one
    pub fn intent_parts(&self) -> Option<(&str, Option<&str>)> {
        match self {
            DecisionInput::Voice { intent, .. } => intent
                .as_ref()
                .map(|i| (i.action.as_str(), i.target.as_deref())),
            DecisionInput::Interaction { action, target, .. } => {
                Some((action.as_str(), target.as_deref()))
            }
            DecisionInput::VisualDebug { .. } => None,
        }
    }

    /// Short action label for logging and interaction records
    pub fn action_label(&self) -> &str {
        match self {
            DecisionInput::Voice { intent, .. } => intent
                .as_ref()
                .map(|i| i.action.as_str())
                .unwrap_or("voice_command"),
            DecisionInput::VisualDebug { debug_action, .. } => debug_action,
            DecisionInput::Interaction { action, .. } => action,
        }
    }

    /// Element id the input refers to
    pub fn target_element(&self) -> Option<&str> {
        match self {
            DecisionInput::Voice { intent, .. } => intent.as_ref().and_then(|i| i.target.as_deref()),
            DecisionInput::VisualDebug { selected_element, .. } => {
                selected_element.get("id").and_then(|v| v.as_str())
            }
            DecisionInput::Interaction { target, .. } => target.as_deref(),
        }
    }
}

/// Largest UTC offset honoured, in minutes
pub const MAX_UTC_OFFSET_MINUTES: i64 = 14 * 60;

/// Ephemeral snapshot assembled for one decision request
#[derive(Debug, Clone, Serialize)]
pub struct DecisionContext {
    pub input_source: InputSource,
    pub user_id: String,
    pub session_id: String,
    pub ui_state: JsonMap,
    pub profile: Option<UserProfile>,
    pub insight: Option<Arc<BehaviorInsight>>,
    pub recent_history: Vec<Arc<Interaction>>,
    pub device_info: JsonMap,
    pub environment: JsonMap,
    pub timestamp: DateTime<Utc>,
}

impl DecisionContext {
    pub fn new(
        input_source: InputSource,
        user_id: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            input_source,
            user_id: user_id.into(),
            session_id: session_id.into(),
            ui_state: JsonMap::new(),
            profile: None,
            insight: None,
            recent_history: Vec::new(),
            device_info: JsonMap::new(),
            environment: JsonMap::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_ui_state(mut self, ui_state: JsonMap) -> Self {
        self.ui_state = ui_state;
        self
    }

    pub fn with_profile(mut self, profile: UserProfile) -> Self {
        self.profile = Some(profile);
        self
    }

    pub fn with_insight(mut self, insight: Arc<BehaviorInsight>) -> Self {
        self.insight = Some(insight);
        self
    }

    pub fn with_history(mut self, history: Vec<Arc<Interaction>>) -> Self {
        self.recent_history = history;
        self
    }

    pub fn with_device_info(mut self, device_info: JsonMap) -> Self {
        self.device_info = device_info;
        self
    }

    pub fn with_environment(mut self, environment: JsonMap) -> Self {
        self.environment = environment;
        self
    }

    /// UTC offset from `environment["utc_offset_minutes"]`, clamped to ±14h; 0 when absent
    pub fn utc_offset_minutes(&self) -> i64 {
        self.environment
            .get("utc_offset_minutes")
            .and_then(|v| v.as_i64())
            .unwrap_or(0)
            .clamp(-MAX_UTC_OFFSET_MINUTES, MAX_UTC_OFFSET_MINUTES)
    }

    /// Hour of day in the user's local time, the UTC hour if the shift overflows
    pub fn local_hour(&self) -> u32 {
        self.timestamp
            .checked_add_signed(Duration::minutes(self.utc_offset_minutes()))
            .unwrap_or(self.timestamp)
            .hour()
    }

    pub fn screen_width(&self) -> Option<f64> {
        self.device_info.get("screen_width").and_then(|v| v.as_f64())
    }

    /// Explicit `is_mobile` flag or a narrow screen
    pub fn is_mobile(&self) -> bool {
        let flagged = self
            .device_info
            .get("is_mobile")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        flagged || self.screen_width().map(|w| w < 768.0).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_input_deserializes_from_tagged_json() {
        let input: DecisionInput = serde_json::from_value(json!({
            "kind": "voice",
            "transcript": "change the button color",
            "intent": {"action": "modify", "target": "submit"},
            "confidence": 0.92
        }))
        .unwrap();

        assert_eq!(input.source(), InputSource::Voice);
        assert_eq!(input.intent_parts(), Some(("modify", Some("submit"))));
        assert_eq!(input.target_element(), Some("submit"));
    }

    #[test]
    fn test_visual_target_from_selected_element() {
        let mut element = JsonMap::new();
        element.insert("id".into(), json!("header"));
        let input = DecisionInput::visual("inspect", element);
        assert_eq!(input.target_element(), Some("header"));
        assert_eq!(input.intent_parts(), None);
        assert_eq!(input.modality(), Modality::Visual);
    }

    #[test]
    fn test_local_hour_applies_offset() {
        let mut env = JsonMap::new();
        env.insert("utc_offset_minutes".into(), json!(480));
        let ctx = DecisionContext::new(InputSource::Api, "u", "s")
            .at(Utc.with_ymd_and_hms(2024, 3, 1, 3, 30, 0).unwrap())
            .with_environment(env);
        assert_eq!(ctx.local_hour(), 11);
    }

    #[test]
    fn test_local_hour_clamps_absurd_offsets() {
        let mut env = JsonMap::new();
        env.insert("utc_offset_minutes".into(), json!(1_000_000_000_000i64));
        let ctx = DecisionContext::new(InputSource::Api, "u", "s")
            .at(Utc.with_ymd_and_hms(2024, 3, 1, 3, 30, 0).unwrap())
            .with_environment(env);
        assert_eq!(ctx.utc_offset_minutes(), MAX_UTC_OFFSET_MINUTES);
        assert_eq!(ctx.local_hour(), 17);

        let mut env = JsonMap::new();
        env.insert("utc_offset_minutes".into(), json!(i64::MIN));
        let ctx = DecisionContext::new(InputSource::Api, "u", "s")
            .at(Utc.with_ymd_and_hms(2024, 3, 1, 3, 30, 0).unwrap())
            .with_environment(env);
        assert_eq!(ctx.local_hour(), 13);
    }

    #[test]
    fn test_local_hour_falls_back_to_utc_at_calendar_edge() {
        let mut env = JsonMap::new();
        env.insert("utc_offset_minutes".into(), json!(600));
        let ctx = DecisionContext::new(InputSource::Api, "u", "s")
            .at(DateTime::<Utc>::MAX_UTC)
            .with_environment(env);
        assert_eq!(ctx.local_hour(), DateTime::<Utc>::MAX_UTC.hour());
    }

    #[test]
    fn test_is_mobile_from_flag_or_width() {
        let mut device = JsonMap::new();
        device.insert("screen_width".into(), json!(390));
        let ctx = DecisionContext::new(InputSource::Api, "u", "s").with_device_info(device);
        assert!(ctx.is_mobile());

        let mut device = JsonMap::new();
        device.insert("screen_width".into(), json!(1440));
        let ctx = DecisionContext::new(InputSource::Api, "u", "s").with_device_info(device);
        assert!(!ctx.is_mobile());

        let mut device = JsonMap::new();
        device.insert("is_mobile".into(), json!(true));
        let ctx = DecisionContext::new(InputSource::Api, "u", "s").with_device_info(device);
        assert!(ctx.is_mobile());
    }
}
