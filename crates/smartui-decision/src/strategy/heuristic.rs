//! Context heuristics: time of day and device class

use async_trait::async_trait;
use serde_json::json;
use smartui_common::{
    CandidateDecision, Category, DecisionContext, DecisionInput, EngineError, StrategyKind,
    UiAction,
};

use super::StrategyEngine;

const BASELINE_CONFIDENCE: f64 = 0.5;
const WORK_HOURS_CONFIDENCE: f64 = 0.7;
const MOBILE_CONFIDENCE: f64 = 0.8;

/// Appends one action per matching heuristic
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicEngine;

#[async_trait]
impl StrategyEngine for HeuristicEngine {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Heuristic
    }

    async fn decide(
        &self,
        context: &DecisionContext,
        _input: &DecisionInput,
    ) -> Result<CandidateDecision, EngineError> {
        let mut matched: Vec<(f64, UiAction, &str)> = Vec::new();

        if (9..=17).contains(&context.local_hour()) {
            matched.push((
                WORK_HOURS_CONFIDENCE,
                UiAction::new("work_mode_ui", "main_container", "theme")
                    .with_param("theme", json!("professional"))
                    .with_param("distractions", json!("minimal")),
                "working hours",
            ));
        }
        if context.is_mobile() {
            matched.push((
                MOBILE_CONFIDENCE,
                UiAction::new("mobile_ui", "responsive_container", "responsive")
                    .with_param("mobile_optimized", json!(true)),
                "mobile device",
            ));
        }

        let confidence = matched
            .iter()
            .map(|(c, _, _)| *c)
            .fold(BASELINE_CONFIDENCE, f64::max);
        let reasoning = if matched.is_empty() {
            "no heuristic applied".to_string()
        } else {
            let applied: Vec<&str> = matched.iter().map(|(_, _, why)| *why).collect();
            format!("heuristics applied: {}", applied.join(", "))
        };

        let mut candidate =
            CandidateDecision::new(StrategyKind::Heuristic, Category::Balanced, confidence)
                .with_reasoning(reasoning)
                .with_metadata("heuristics_applied", json!(matched.len()));
        for (_, action, _) in matched {
            candidate = candidate.with_action(action);
        }
        Ok(candidate)
    }
}
