//! Deterministic stand-in for a learned scorer

use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;
use smartui_common::{
    CandidateDecision, Category, DecisionContext, DecisionInput, EngineError, StrategyKind,
    UiAction,
};

use super::StrategyEngine;

const SCORE_FLOOR: f64 = 0.7;
const SCORE_SPAN: f64 = 0.2;
const REFERENCE_SCREEN_WIDTH: f64 = 1920.0;
const DEFAULT_SCREEN_WIDTH: f64 = 1024.0;

/// Feature vector; absent features are not part of the mean
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MlFeatures {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_length: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visual_complexity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_efficiency: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_experience: Option<f64>,
    pub screen_size: f64,
    pub is_mobile: f64,
}

impl MlFeatures {
    pub fn extract(context: &DecisionContext, input: &DecisionInput) -> Self {
        let mut features = MlFeatures::default();

        match input {
            DecisionInput::Voice {
                transcript,
                confidence,
                ..
            } => {
                features.voice_confidence = Some(*confidence);
                features.voice_length = Some(transcript.chars().count() as f64 / 100.0);
            }
            DecisionInput::VisualDebug {
                selected_element, ..
            } => {
                features.visual_complexity = Some(selected_element.len() as f64 / 10.0);
            }
            DecisionInput::Interaction { .. } => {}
        }

        if let Some(profile) = &context.profile {
            features.user_efficiency = Some(profile.success_rate().unwrap_or(0.5));
            features.user_experience = Some(context.recent_history.len() as f64 / 100.0);
        }

        let width = context.screen_width().unwrap_or(DEFAULT_SCREEN_WIDTH);
        features.screen_size = (width / REFERENCE_SCREEN_WIDTH).min(1.0);
        features.is_mobile = if context.is_mobile() { 1.0 } else { 0.0 };
        features
    }

    fn values(&self) -> impl Iterator<Item = f64> + '_ {
        [
            self.voice_confidence,
            self.voice_length,
            self.visual_complexity,
            self.user_efficiency,
            self.user_experience,
            Some(self.screen_size),
            Some(self.is_mobile),
        ]
        .into_iter()
        .flatten()
    }

    /// 0.7 + 0.2 × mean of features clamped to [0, 1]
    pub fn score(&self) -> f64 {
        let clamped: Vec<f64> = self.values().map(smartui_common::clamp_confidence).collect();
        let mean = if clamped.is_empty() {
            0.0
        } else {
            clamped.iter().sum::<f64>() / clamped.len() as f64
        };
        SCORE_FLOOR + SCORE_SPAN * mean
    }
}

/// Scores features deterministically into [0.7, 0.9]
#[derive(Debug, Clone, Copy, Default)]
pub struct MlPlaceholderEngine;

#[async_trait]
impl StrategyEngine for MlPlaceholderEngine {
    fn kind(&self) -> StrategyKind {
        StrategyKind::MlPlaceholder
    }

    async fn decide(
        &self,
        context: &DecisionContext,
        input: &DecisionInput,
    ) -> Result<CandidateDecision, EngineError> {
        let features = MlFeatures::extract(context, input);
        let score = features.score();

        let (category, action) = if features.voice_confidence.unwrap_or(0.0) > 0.8 {
            (
                Category::Voice,
                UiAction::new("voice_response", "voice_interface", "interaction")
                    .with_param("response", json!("voice_command_processed")),
            )
        } else if features.visual_complexity.unwrap_or(0.0) > 0.7 {
            (
                Category::Visual,
                UiAction::new("simplify_interface", "main_container", "layout")
                    .with_param("complexity_reduction", json!(true)),
            )
        } else {
            let user_type = context
                .insight
                .as_ref()
                .map(|i| json!(i.user_type))
                .unwrap_or(serde_json::Value::Null);
            (
                Category::Adaptive,
                UiAction::new("adaptive_ui", "adaptive_container", "smart_adaptation")
                    .with_param("user_type", user_type),
            )
        };

        let features_json = serde_json::to_value(&features).map_err(|e| EngineError::Failed {
            strategy: StrategyKind::MlPlaceholder.to_string(),
            reason: e.to_string(),
        })?;

        Ok(CandidateDecision::new(StrategyKind::MlPlaceholder, category, score)
            .with_action(action)
            .with_reasoning("feature score prediction")
            .with_metadata("features", features_json)
            .with_metadata("model_version", json!("placeholder-1")))
    }
}
