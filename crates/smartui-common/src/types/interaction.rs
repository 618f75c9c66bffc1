//! Interaction - immutable record of one user or system event
//!
//! Interactions enter the system through [`RawInteraction`], the loosely-typed
//! shape delivered by the transport boundary. Converting it with `TryFrom`
//! is the single validation point: a record that fails validation never
//! reaches the interaction store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::JsonMap;
use crate::error::ValidationError;

/// Input modality of an interaction.
///
/// Declaration order is significant: it is the tie-break order used when two
/// modalities score equally (voice first, gesture last).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    Voice,
    Visual,
    Touch,
    Keyboard,
    Mouse,
    Gesture,
}

impl Modality {
    /// All modalities in tie-break order
    pub const ALL: [Modality; 6] = [
        Modality::Voice,
        Modality::Visual,
        Modality::Touch,
        Modality::Keyboard,
        Modality::Mouse,
        Modality::Gesture,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Modality::Voice => "voice",
            Modality::Visual => "visual",
            Modality::Touch => "touch",
            Modality::Keyboard => "keyboard",
            Modality::Mouse => "mouse",
            Modality::Gesture => "gesture",
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Modality {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "voice" => Ok(Modality::Voice),
            "visual" => Ok(Modality::Visual),
            "touch" => Ok(Modality::Touch),
            "keyboard" => Ok(Modality::Keyboard),
            "mouse" => Ok(Modality::Mouse),
            "gesture" => Ok(Modality::Gesture),
            other => Err(ValidationError::UnknownModality(other.to_string())),
        }
    }
}

/// A validated, immutable interaction record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    /// Unique interaction ID
    pub id: String,
    /// Owning user
    pub user_id: String,
    /// Owning session
    pub session_id: String,
    /// When the interaction happened (UTC)
    pub timestamp: DateTime<Utc>,
    /// Input modality
    pub modality: Modality,
    /// Target element ID, if any
    pub element_id: Option<String>,
    /// Target element type (e.g. "button"), if any
    pub element_type: Option<String>,
    /// Action name (e.g. "click")
    pub action: String,
    /// Free-form context; `device_info` is read by the device detector
    pub context: JsonMap,
    /// Whether the interaction succeeded
    pub success: bool,
    /// Duration in milliseconds (>= 0)
    pub duration_ms: f64,
    /// Error message for failed interactions
    pub error_message: Option<String>,
}

impl Interaction {
    /// Create a successful interaction stamped now
    pub fn new(
        user_id: impl Into<String>,
        session_id: impl Into<String>,
        modality: Modality,
        action: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::now_v7().to_string(),
            user_id: user_id.into(),
            session_id: session_id.into(),
            timestamp: Utc::now(),
            modality,
            element_id: None,
            element_type: None,
            action: action.into(),
            context: JsonMap::new(),
            success: true,
            duration_ms: 0.0,
            error_message: None,
        }
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn on_element(mut self, element_id: impl Into<String>, element_type: impl Into<String>) -> Self {
        self.element_id = Some(element_id.into());
        self.element_type = Some(element_type.into());
        self
    }

    pub fn with_duration(mut self, duration_ms: f64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.context.insert(key.into(), value);
        self
    }

    /// Mark as failed with an error message
    pub fn failed(mut self, error_message: impl Into<String>) -> Self {
        self.success = false;
        self.error_message = Some(error_message.into());
        self
    }

    /// Check required fields and numeric ranges
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::MissingField("id"));
        }
        if self.user_id.trim().is_empty() {
            return Err(ValidationError::MissingField("user_id"));
        }
        if self.session_id.trim().is_empty() {
            return Err(ValidationError::MissingField("session_id"));
        }
        if self.action.trim().is_empty() {
            return Err(ValidationError::MissingField("action"));
        }
        if !self.duration_ms.is_finite() || self.duration_ms < 0.0 {
            return Err(ValidationError::InvalidDuration(self.duration_ms));
        }
        Ok(())
    }

    /// Device information attached to this interaction, if any
    pub fn device_info(&self) -> Option<&JsonMap> {
        self.context.get("device_info").and_then(|v| v.as_object())
    }
}

/// Interaction as delivered by the ingestion boundary, before validation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawInteraction {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default, alias = "interaction_type")]
    pub modality: String,
    #[serde(default)]
    pub element_id: Option<String>,
    #[serde(default)]
    pub element_type: Option<String>,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub context: JsonMap,
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default, alias = "duration")]
    pub duration_ms: f64,
    #[serde(default)]
    pub error_message: Option<String>,
}

fn default_success() -> bool {
    true
}

impl TryFrom<RawInteraction> for Interaction {
    type Error = ValidationError;

    fn try_from(raw: RawInteraction) -> Result<Self, Self::Error> {
        if raw.modality.trim().is_empty() {
            return Err(ValidationError::MissingField("modality"));
        }
        let modality = raw.modality.parse::<Modality>()?;

        let interaction = Interaction {
            id: raw
                .id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| uuid::Uuid::now_v7().to_string()),
            user_id: raw.user_id,
            session_id: raw.session_id,
            timestamp: raw.timestamp.unwrap_or_else(Utc::now),
            modality,
            element_id: raw.element_id,
            element_type: raw.element_type,
            action: raw.action,
            context: raw.context,
            success: raw.success,
            duration_ms: raw.duration_ms,
            error_message: raw.error_message,
        };
        interaction.validate()?;
        Ok(interaction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(modality: &str) -> RawInteraction {
        RawInteraction {
            user_id: "alice".into(),
            session_id: "s1".into(),
            modality: modality.into(),
            action: "click".into(),
            success: true,
            duration_ms: 120.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_modality_parse() {
        assert_eq!("Voice".parse::<Modality>().unwrap(), Modality::Voice);
        assert_eq!(" gesture ".parse::<Modality>().unwrap(), Modality::Gesture);
        assert!(matches!(
            "telepathy".parse::<Modality>(),
            Err(ValidationError::UnknownModality(_))
        ));
    }

    #[test]
    fn test_modality_order_matches_tie_break() {
        let mut sorted = Modality::ALL.to_vec();
        sorted.sort();
        assert_eq!(sorted, Modality::ALL.to_vec());
    }

    #[test]
    fn test_raw_conversion() {
        let interaction = Interaction::try_from(raw("mouse")).unwrap();
        assert_eq!(interaction.modality, Modality::Mouse);
        assert!(!interaction.id.is_empty());
    }

    #[test]
    fn test_raw_rejects_bad_fields() {
        assert_eq!(
            Interaction::try_from(raw("")).unwrap_err(),
            ValidationError::MissingField("modality")
        );

        let mut missing_action = raw("voice");
        missing_action.action = " ".into();
        assert_eq!(
            Interaction::try_from(missing_action).unwrap_err(),
            ValidationError::MissingField("action")
        );

        let mut negative = raw("voice");
        negative.duration_ms = -1.0;
        assert!(matches!(
            Interaction::try_from(negative),
            Err(ValidationError::InvalidDuration(_))
        ));
    }

    #[test]
    fn test_raw_from_json_accepts_aliases() {
        let raw: RawInteraction = serde_json::from_value(json!({
            "user_id": "u",
            "session_id": "s",
            "interaction_type": "touch",
            "action": "tap",
            "duration": 80.0
        }))
        .unwrap();
        let interaction = Interaction::try_from(raw).unwrap();
        assert_eq!(interaction.modality, Modality::Touch);
        assert!(interaction.success);
        assert_eq!(interaction.duration_ms, 80.0);
    }

    #[test]
    fn test_device_info_lookup() {
        let interaction = Interaction::new("u", "s", Modality::Touch, "tap")
            .with_context("device_info", json!({"type": "phone", "screen_width": 390}));
        let info = interaction.device_info().unwrap();
        assert_eq!(info.get("type").unwrap(), "phone");
    }
}
