//! Decision types
//!
//! [`CandidateDecision`] is what a single strategy engine proposes;
//! [`DecisionResult`] is the fused, immutable outcome of one decision cycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::JsonMap;
use crate::clamp_confidence;
use crate::error::SmartUiError;

/// Decision category whose weight is adapted over time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Voice-driven interface changes
    Voice,
    /// Visual debugging and inspection
    Visual,
    /// Profile-driven adaptive UI
    Adaptive,
    /// No dominant modality
    Balanced,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Voice,
        Category::Visual,
        Category::Adaptive,
        Category::Balanced,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Voice => "voice",
            Category::Visual => "visual",
            Category::Adaptive => "adaptive",
            Category::Balanced => "balanced",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strategy engine kind.
///
/// Declaration order is the fusion tie-break priority: rule-based first,
/// then the ML placeholder, then heuristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    RuleBased,
    MlPlaceholder,
    Heuristic,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 3] = [
        StrategyKind::RuleBased,
        StrategyKind::MlPlaceholder,
        StrategyKind::Heuristic,
    ];

    /// Tie-break priority, lower wins
    pub fn priority(&self) -> u8 {
        match self {
            StrategyKind::RuleBased => 0,
            StrategyKind::MlPlaceholder => 1,
            StrategyKind::Heuristic => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::RuleBased => "rule_based",
            StrategyKind::MlPlaceholder => "ml_placeholder",
            StrategyKind::Heuristic => "heuristic",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = SmartUiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rule_based" | "rule" | "rules" => Ok(StrategyKind::RuleBased),
            "ml_placeholder" | "ml" | "ml_based" => Ok(StrategyKind::MlPlaceholder),
            "heuristic" | "heuristics" => Ok(StrategyKind::Heuristic),
            other => Err(SmartUiError::Config(format!("unknown strategy: {}", other))),
        }
    }
}

/// One proposed UI action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiAction {
    /// Action type (e.g. "modify_style")
    #[serde(rename = "type")]
    pub action_type: String,
    /// Target element identifier
    pub target_element: String,
    /// Modification kind (e.g. "style", "debug", "layout")
    pub modification_kind: String,
    /// Action parameters
    #[serde(default)]
    pub parameters: JsonMap,
}

impl UiAction {
    pub fn new(
        action_type: impl Into<String>,
        target_element: impl Into<String>,
        modification_kind: impl Into<String>,
    ) -> Self {
        Self {
            action_type: action_type.into(),
            target_element: target_element.into(),
            modification_kind: modification_kind.into(),
            parameters: JsonMap::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }

    pub fn with_params(mut self, params: JsonMap) -> Self {
        self.parameters.extend(params);
        self
    }

    /// Deduplication key used when merging actions from several engines
    pub fn dedup_key(&self) -> (&str, &str) {
        (&self.action_type, &self.target_element)
    }
}

/// Output of a single strategy engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateDecision {
    pub strategy: StrategyKind,
    pub category: Category,
    pub confidence: f64,
    pub actions: Vec<UiAction>,
    pub reasoning: String,
    #[serde(default)]
    pub metadata: JsonMap,
}

impl CandidateDecision {
    /// Create a candidate; confidence is clamped into [0, 1]
    pub fn new(strategy: StrategyKind, category: Category, confidence: f64) -> Self {
        Self {
            strategy,
            category,
            confidence: clamp_confidence(confidence),
            actions: Vec::new(),
            reasoning: String::new(),
            metadata: JsonMap::new(),
        }
    }

    /// Zero-confidence stand-in for an engine that failed or timed out
    pub fn failed(strategy: StrategyKind, reason: impl Into<String>) -> Self {
        let mut candidate = Self::new(strategy, Category::Balanced, 0.0);
        candidate.reasoning = "engine failed".to_string();
        candidate
            .metadata
            .insert("error".into(), serde_json::Value::String(reason.into()));
        candidate
    }

    pub fn with_action(mut self, action: UiAction) -> Self {
        self.actions.push(action);
        self
    }

    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = reasoning.into();
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Whether a fused decision can be applied directly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionStatus {
    Actionable,
    /// Fused confidence fell below the threshold; ask the user first
    NeedsClarification,
}

/// Fused result of one decision cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionResult {
    pub id: Uuid,
    /// Strategy of the primary engine
    pub strategy: StrategyKind,
    /// Category of the primary engine
    pub category: Category,
    /// Weighted confidence in [0, 1]
    pub confidence: f64,
    pub status: DecisionStatus,
    pub actions: Vec<UiAction>,
    pub reasoning: String,
    pub metadata: JsonMap,
    /// Wall time of the decision cycle in milliseconds
    pub response_time_ms: f64,
    pub timestamp: DateTime<Utc>,
}

impl DecisionResult {
    pub fn is_actionable(&self) -> bool {
        self.status == DecisionStatus::Actionable
    }

    pub fn needs_clarification(&self) -> bool {
        self.status == DecisionStatus::NeedsClarification
    }

    /// Project the first action into a UI modification for an executor.
    ///
    /// Returns `None` when the decision needs clarification or has no actions.
    pub fn ui_modification(&self) -> Option<UiModification> {
        if !self.is_actionable() {
            return None;
        }
        self.actions.first().map(|action| UiModification {
            decision_id: self.id,
            target_element: action.target_element.clone(),
            modification_type: action.modification_kind.clone(),
            modification_data: action.parameters.clone(),
            reason: self.reasoning.clone(),
        })
    }
}

/// UI change handed to the external executor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiModification {
    pub decision_id: Uuid,
    pub target_element: String,
    pub modification_type: String,
    pub modification_data: JsonMap,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn result(status: DecisionStatus, actions: Vec<UiAction>) -> DecisionResult {
        DecisionResult {
            id: Uuid::now_v7(),
            strategy: StrategyKind::RuleBased,
            category: Category::Voice,
            confidence: 0.8,
            status,
            actions,
            reasoning: "matched".into(),
            metadata: JsonMap::new(),
            response_time_ms: 1.0,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_priority_follows_declaration_order() {
        let mut kinds = vec![
            StrategyKind::Heuristic,
            StrategyKind::RuleBased,
            StrategyKind::MlPlaceholder,
        ];
        kinds.sort_by_key(|k| k.priority());
        assert_eq!(kinds, StrategyKind::ALL.to_vec());
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("rule_based".parse::<StrategyKind>().unwrap(), StrategyKind::RuleBased);
        assert_eq!("ML".parse::<StrategyKind>().unwrap(), StrategyKind::MlPlaceholder);
        assert!("oracle".parse::<StrategyKind>().is_err());
    }

    #[test]
    fn test_candidate_clamps_confidence() {
        let c = CandidateDecision::new(StrategyKind::Heuristic, Category::Balanced, 3.0);
        assert_eq!(c.confidence, 1.0);

        let failed = CandidateDecision::failed(StrategyKind::MlPlaceholder, "boom");
        assert_eq!(failed.confidence, 0.0);
        assert!(failed.actions.is_empty());
        assert_eq!(failed.reasoning, "engine failed");
    }

    #[test]
    fn test_ui_modification_projection() {
        let action = UiAction::new("modify_style", "button", "style").with_param("color", json!("red"));
        let actionable = result(DecisionStatus::Actionable, vec![action]);
        let modification = actionable.ui_modification().unwrap();
        assert_eq!(modification.target_element, "button");
        assert_eq!(modification.modification_data.get("color").unwrap(), "red");

        let unclear = result(DecisionStatus::NeedsClarification, Vec::new());
        assert!(unclear.ui_modification().is_none());
    }

    #[test]
    fn test_action_serializes_type_field() {
        let action = UiAction::new("select_element", "submit", "interaction");
        let value = serde_json::to_value(&action).unwrap();
        assert_eq!(value["type"], "select_element");
    }
}
