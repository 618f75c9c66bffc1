//! Keyword and intent rule table

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use smartui_common::{
    CandidateDecision, Category, DecisionContext, DecisionInput, EngineError, StrategyKind,
    UiAction,
};
use tracing::debug;

use super::StrategyEngine;

/// Keywords and confidences used by [`RuleBasedEngine`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleTable {
    pub modify_keywords: Vec<String>,
    pub color_keywords: Vec<String>,
    pub select_keywords: Vec<String>,
    /// Target used when a voice intent names none
    pub default_target: String,
    /// Colour used when a voice intent carries no value
    pub default_color: String,
    pub modify_style_confidence: f64,
    pub select_confidence: f64,
    pub inspect_confidence: f64,
    pub edit_mode_confidence: f64,
    pub intent_modify_confidence: f64,
    pub no_match_confidence: f64,
}

impl Default for RuleTable {
    fn default() -> Self {
        let words = |list: &[&str]| list.iter().map(|w| w.to_string()).collect();
        Self {
            modify_keywords: words(&["modify", "change", "修改", "改變"]),
            color_keywords: words(&["color", "colour", "顏色"]),
            select_keywords: words(&["select", "click", "選擇", "點擊"]),
            default_target: "button".to_string(),
            default_color: "blue".to_string(),
            modify_style_confidence: 0.8,
            select_confidence: 0.75,
            inspect_confidence: 0.9,
            edit_mode_confidence: 0.85,
            intent_modify_confidence: 0.8,
            no_match_confidence: 0.1,
        }
    }
}

fn contains_any(text: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|k| text.contains(k.as_str()))
}

/// Deterministic rule matcher; the first matching rule wins
#[derive(Debug, Clone, Default)]
pub struct RuleBasedEngine {
    table: RuleTable,
}

impl RuleBasedEngine {
    pub fn new(table: RuleTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &RuleTable {
        &self.table
    }

    fn candidate(&self, category: Category, confidence: f64) -> CandidateDecision {
        CandidateDecision::new(StrategyKind::RuleBased, category, confidence)
    }

    fn match_voice(&self, input: &DecisionInput) -> Option<CandidateDecision> {
        let DecisionInput::Voice {
            transcript, intent, ..
        } = input
        else {
            return None;
        };
        let text = transcript.to_lowercase();
        let target = intent
            .as_ref()
            .and_then(|i| i.target.clone())
            .unwrap_or_else(|| self.table.default_target.clone());

        if contains_any(&text, &self.table.modify_keywords) {
            if !contains_any(&text, &self.table.color_keywords) {
                return None;
            }
            let color = intent
                .as_ref()
                .and_then(|i| i.value.clone())
                .unwrap_or_else(|| self.table.default_color.clone());
            return Some(
                self.candidate(Category::Voice, self.table.modify_style_confidence)
                    .with_action(
                        UiAction::new("modify_style", target, "style").with_param("color", json!(color)),
                    )
                    .with_reasoning("voice command matched colour modification rule"),
            );
        }

        if contains_any(&text, &self.table.select_keywords) {
            return Some(
                self.candidate(Category::Voice, self.table.select_confidence)
                    .with_action(
                        UiAction::new("select_element", target, "interaction")
                            .with_param("action", json!("click")),
                    )
                    .with_reasoning("voice command matched selection rule"),
            );
        }
        None
    }

    fn match_visual(&self, input: &DecisionInput) -> Option<CandidateDecision> {
        let DecisionInput::VisualDebug {
            debug_action,
            selected_element,
            ..
        } = input
        else {
            return None;
        };
        let target = selected_element
            .get("id")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        match debug_action.as_str() {
            "inspect" => Some(
                self.candidate(Category::Visual, self.table.inspect_confidence)
                    .with_action(
                        UiAction::new("show_inspector", target, "debug")
                            .with_param("show_properties", json!(true))
                            .with_param("highlight", json!(true)),
                    )
                    .with_reasoning("visual debug inspect rule"),
            ),
            "modify" => Some(
                self.candidate(Category::Visual, self.table.edit_mode_confidence)
                    .with_action(
                        UiAction::new("enable_edit_mode", target, "debug")
                            .with_param("edit_mode", json!(true)),
                    )
                    .with_reasoning("visual debug modify rule"),
            ),
            _ => None,
        }
    }

    fn match_intent(&self, input: &DecisionInput) -> Option<CandidateDecision> {
        let (action, target) = input.intent_parts()?;
        let target = target.filter(|t| !t.is_empty())?;
        if action != "modify" {
            return None;
        }
        let mut ui_action = UiAction::new("ui_modification", target, "modification");
        if let DecisionInput::Interaction { parameters, .. } = input {
            ui_action = ui_action.with_params(parameters.clone());
        }
        Some(
            self.candidate(Category::Balanced, self.table.intent_modify_confidence)
                .with_action(ui_action)
                .with_reasoning("intent requested modification of a target"),
        )
    }
}

#[async_trait]
impl StrategyEngine for RuleBasedEngine {
    fn kind(&self) -> StrategyKind {
        StrategyKind::RuleBased
    }

    async fn decide(
        &self,
        _context: &DecisionContext,
        input: &DecisionInput,
    ) -> Result<CandidateDecision, EngineError> {
        let matched = self
            .match_voice(input)
            .or_else(|| self.match_visual(input))
            .or_else(|| self.match_intent(input));

        let candidate = match matched {
            Some(candidate) => candidate.with_metadata("rule_matches", json!(1)),
            None => self
                .candidate(Category::Balanced, self.table.no_match_confidence)
                .with_action(UiAction::new("unknown", "", "none"))
                .with_reasoning("no rule matched")
                .with_metadata("rule_matches", json!(0)),
        };
        debug!(
            action = candidate.actions.first().map(|a| a.action_type.as_str()).unwrap_or(""),
            confidence = candidate.confidence,
            "Rule evaluation"
        );
        Ok(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smartui_common::{InputSource, Intent, JsonMap};

    fn ctx() -> DecisionContext {
        DecisionContext::new(InputSource::Voice, "alice", "s1")
    }

    async fn decide(input: DecisionInput) -> CandidateDecision {
        RuleBasedEngine::default().decide(&ctx(), &input).await.unwrap()
    }

    #[tokio::test]
    async fn test_voice_colour_change() {
        let input = DecisionInput::voice("Please change the color", 0.9)
            .with_intent(Intent::new("modify").with_target("submit").with_value("red"));
        let candidate = decide(input).await;

        assert_eq!(candidate.category, Category::Voice);
        assert_eq!(candidate.confidence, 0.8);
        let action = &candidate.actions[0];
        assert_eq!(action.action_type, "modify_style");
        assert_eq!(action.target_element, "submit");
        assert_eq!(action.parameters["color"], "red");
    }

    #[tokio::test]
    async fn test_voice_select_defaults_target() {
        let candidate = decide(DecisionInput::voice("click it", 0.7)).await;
        assert_eq!(candidate.confidence, 0.75);
        assert_eq!(candidate.actions[0].action_type, "select_element");
        assert_eq!(candidate.actions[0].target_element, "button");
    }

    #[tokio::test]
    async fn test_chinese_keywords() {
        let candidate = decide(DecisionInput::voice("修改按鈕顏色", 0.9)).await;
        assert_eq!(candidate.actions[0].action_type, "modify_style");
    }

    #[tokio::test]
    async fn test_visual_inspect_and_modify() {
        let mut element = JsonMap::new();
        element.insert("id".into(), json!("header"));

        let inspect = decide(DecisionInput::visual("inspect", element.clone())).await;
        assert_eq!(inspect.confidence, 0.9);
        assert_eq!(inspect.category, Category::Visual);
        assert_eq!(inspect.actions[0].target_element, "header");

        let modify = decide(DecisionInput::visual("modify", element)).await;
        assert_eq!(modify.confidence, 0.85);
        assert_eq!(modify.actions[0].action_type, "enable_edit_mode");
    }

    #[tokio::test]
    async fn test_intent_modify_with_target() {
        let candidate =
            decide(DecisionInput::interaction("modify", Some("sidebar".to_string()))).await;
        assert_eq!(candidate.category, Category::Balanced);
        assert_eq!(candidate.confidence, 0.8);
        assert_eq!(candidate.actions[0].action_type, "ui_modification");
    }

    #[tokio::test]
    async fn test_no_match() {
        let candidate = decide(DecisionInput::interaction("scroll", None)).await;
        assert_eq!(candidate.confidence, 0.1);
        assert_eq!(candidate.actions.len(), 1);
        assert_eq!(candidate.actions[0].action_type, "unknown");
    }
}
