//! Pure merge of candidate decisions
//!
//! Primary selection, weighted confidence, action deduplication and
//! reasoning assembly. Nothing here depends on completion order: candidates
//! are sorted by strategy priority before anything else happens.

use ordered_float::OrderedFloat;
use serde_json::json;
use smartui_common::{
    CandidateDecision, Category, DecisionStatus, JsonMap, StrategyKind, UiAction,
    DEFAULT_CONFIDENCE_THRESHOLD, MAX_REASONING_CHARS,
};
use std::cmp::Reverse;
use std::collections::HashSet;

use super::weights::CategoryWeights;

/// Separator between engine reasonings
pub const REASONING_DELIMITER: &str = " | ";

/// Merged outcome before it is stamped with an id and timing
#[derive(Debug, Clone, PartialEq)]
pub struct MergedDecision {
    pub strategy: StrategyKind,
    pub category: Category,
    /// Weighted confidence
    pub confidence: f64,
    /// Confidence of the primary candidate alone
    pub primary_confidence: f64,
    pub status: DecisionStatus,
    pub actions: Vec<UiAction>,
    pub reasoning: String,
    pub metadata: JsonMap,
}

/// Stateless candidate merger
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionMerger {
    confidence_threshold: f64,
    max_reasoning_chars: usize,
}

impl Default for FusionMerger {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIDENCE_THRESHOLD)
    }
}

impl FusionMerger {
    pub fn new(confidence_threshold: f64) -> Self {
        Self {
            confidence_threshold,
            max_reasoning_chars: MAX_REASONING_CHARS,
        }
    }

    pub fn merge(&self, mut candidates: Vec<CandidateDecision>, weights: &CategoryWeights) -> MergedDecision {
        if candidates.is_empty() {
            candidates.push(CandidateDecision::failed(
                StrategyKind::RuleBased,
                "no strategy engines available",
            ));
        }
        candidates.sort_by_key(|c| c.strategy.priority());

        // Highest confidence; equal confidence goes to the higher-priority strategy
        let primary_idx = candidates
            .iter()
            .enumerate()
            .max_by_key(|(_, c)| (OrderedFloat(c.confidence), Reverse(c.strategy.priority())))
            .map(|(idx, _)| idx)
            .unwrap_or(0);
        let primary = &candidates[primary_idx];

        let confidence = weighted_confidence(&candidates, weights);
        let status = if confidence < self.confidence_threshold {
            DecisionStatus::NeedsClarification
        } else {
            DecisionStatus::Actionable
        };

        let mut actions: Vec<UiAction> = Vec::new();
        let mut seen: HashSet<(String, String)> = HashSet::new();
        let ordered = std::iter::once(primary).chain(
            candidates
                .iter()
                .enumerate()
                .filter(|(idx, _)| *idx != primary_idx)
                .map(|(_, c)| c),
        );
        for candidate in ordered.clone() {
            for action in &candidate.actions {
                let (kind, target) = action.dedup_key();
                if seen.insert((kind.to_string(), target.to_string())) {
                    actions.push(action.clone());
                }
            }
        }

        let reasoning = self.join_reasoning(ordered.map(|c| c.reasoning.as_str()));

        let engines: Vec<serde_json::Value> = candidates
            .iter()
            .map(|c| {
                json!({
                    "strategy": c.strategy,
                    "category": c.category,
                    "confidence": c.confidence,
                    "failed": c.metadata.contains_key("error"),
                })
            })
            .collect();
        let mut metadata = JsonMap::new();
        metadata.insert("engines".into(), json!(engines));
        metadata.insert("weights".into(), json!(weights));

        MergedDecision {
            strategy: primary.strategy,
            category: primary.category,
            confidence,
            primary_confidence: primary.confidence,
            status,
            actions,
            reasoning,
            metadata,
        }
    }

    fn join_reasoning<'a>(&self, parts: impl Iterator<Item = &'a str>) -> String {
        let joined = parts
            .filter(|r| !r.trim().is_empty())
            .collect::<Vec<_>>()
            .join(REASONING_DELIMITER);
        if joined.chars().count() > self.max_reasoning_chars {
            joined.chars().take(self.max_reasoning_chars).collect()
        } else {
            joined
        }
    }
}

/// Σ(cᵢ·w(catᵢ)) / Σ w(catᵢ) over candidates with positive confidence
pub fn weighted_confidence(candidates: &[CandidateDecision], weights: &CategoryWeights) -> f64 {
    let (numerator, denominator) = candidates
        .iter()
        .filter(|c| c.confidence > 0.0)
        .fold((0.0, 0.0), |(num, den), c| {
            let w = weights.get(c.category);
            (num + c.confidence * w, den + w)
        });
    if denominator > 0.0 {
        smartui_common::clamp_confidence(numerator / denominator)
    } else {
        0.0
    }
}
