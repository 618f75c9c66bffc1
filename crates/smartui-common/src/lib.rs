//! # SmartUI Common
//!
//! Shared types and errors for the SmartUI decision fusion core.
//!
//! ## Core Types
//!
//! - [`Interaction`]: immutable record of one user interaction
//! - [`UserProfile`]: accumulated per-user preferences and metrics
//! - [`DecisionContext`]/[`DecisionInput`]: everything a strategy engine sees
//! - [`CandidateDecision`]/[`DecisionResult`]: strategy output and fused result
//! - [`BehaviorInsight`]: synthesized output of the behavior analyzer

pub mod error;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{DetectorError, EngineError, Result, SmartUiError, ValidationError};
pub use types::{
    context::{DecisionContext, DecisionInput, InputSource, Intent},
    decision::{
        CandidateDecision, Category, DecisionResult, DecisionStatus, StrategyKind, UiAction,
        UiModification,
    },
    insight::{
        AccessibilityData, AccessibilityIndicators, BehaviorInsight, DetectorData, DetectorKind,
        DetectorOutput, DeviceData, EfficiencyData, EfficiencyLevel, ErrorPatternData, ErrorTrend,
        InputPreferenceData, InsightSet, Recommendation, ScreenClass, TimeOfDay, UserType,
    },
    interaction::{Interaction, Modality, RawInteraction},
    profile::UserProfile,
    JsonMap,
};

/// SmartUI version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Per-user ring buffer capacity
pub const DEFAULT_BUFFER_CAPACITY: usize = 1000;

/// Decision history capacity before trimming
pub const DEFAULT_HISTORY_CAPACITY: usize = 10_000;

/// Decision history size retained after trimming
pub const DEFAULT_HISTORY_RETAIN: usize = 5_000;

/// Analysis window in days
pub const DEFAULT_ANALYSIS_WINDOW_DAYS: i64 = 30;

/// Minimum interactions before detectors run
pub const DEFAULT_MIN_INTERACTIONS: usize = 10;

/// Confidence threshold for insights and actionable decisions
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.7;

/// Analysis cache TTL in minutes
pub const DEFAULT_CACHE_TTL_MINUTES: i64 = 15;

/// Maximum fused reasoning length in characters
pub const MAX_REASONING_CHARS: usize = 500;

/// Clamp a confidence value into [0, 1], mapping NaN to 0.
pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_confidence() {
        assert_eq!(clamp_confidence(1.7), 1.0);
        assert_eq!(clamp_confidence(-0.2), 0.0);
        assert_eq!(clamp_confidence(f64::NAN), 0.0);
        assert!((clamp_confidence(0.42) - 0.42).abs() < f64::EPSILON);
    }
}
