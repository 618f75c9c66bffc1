//! Behavior insight types
//!
//! Typed payloads produced by the five pattern detectors and the synthesized
//! [`BehaviorInsight`] returned by the behavior analyzer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::interaction::Modality;
use crate::clamp_confidence;

/// Pattern detector identity, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorKind {
    InputPreference,
    EfficiencyPattern,
    ErrorPattern,
    AccessibilityNeeds,
    DeviceAdaptation,
}

impl DetectorKind {
    pub const ALL: [DetectorKind; 5] = [
        DetectorKind::InputPreference,
        DetectorKind::EfficiencyPattern,
        DetectorKind::ErrorPattern,
        DetectorKind::AccessibilityNeeds,
        DetectorKind::DeviceAdaptation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DetectorKind::InputPreference => "input_preference",
            DetectorKind::EfficiencyPattern => "efficiency_pattern",
            DetectorKind::ErrorPattern => "error_pattern",
            DetectorKind::AccessibilityNeeds => "accessibility_needs",
            DetectorKind::DeviceAdaptation => "device_adaptation",
        }
    }
}

impl fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User classification derived from detector results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    NewUser,
    AccessibilityUser,
    PowerUser,
    NoviceUser,
    VoiceFirstUser,
    VisualUser,
    BalancedUser,
}

/// Personalization recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    OnboardingAssistance,
    UsageTracking,
    ErrorPreventionEnhancement,
    WorkflowSimplification,
    VoiceInterfaceOptimization,
    VisualDebuggingEnhancement,
    EnhancedKeyboardNavigation,
    ExtendedTimeoutSettings,
    SimplifiedWorkflows,
    CrossDeviceSynchronization,
    MobileOptimization,
}

/// Efficiency level bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EfficiencyLevel {
    Beginner,
    Intermediate,
    Proficient,
    Expert,
}

impl EfficiencyLevel {
    /// Bucket a composite efficiency score
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            EfficiencyLevel::Expert
        } else if score >= 0.6 {
            EfficiencyLevel::Proficient
        } else if score >= 0.4 {
            EfficiencyLevel::Intermediate
        } else {
            EfficiencyLevel::Beginner
        }
    }
}

/// Direction of recent error frequency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorTrend {
    InsufficientData,
    Improving,
    Stable,
    Worsening,
}

/// Local time-of-day bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeOfDay {
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            6..=11 => TimeOfDay::Morning,
            12..=17 => TimeOfDay::Afternoon,
            18..=23 => TimeOfDay::Evening,
            _ => TimeOfDay::Night,
        }
    }
}

/// Screen size class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreenClass {
    Small,
    Medium,
    Large,
    Unknown,
}

impl ScreenClass {
    pub fn from_width(width: f64) -> Self {
        if width < 768.0 {
            ScreenClass::Small
        } else if width > 1920.0 {
            ScreenClass::Large
        } else {
            ScreenClass::Medium
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputPreferenceData {
    pub primary_preference: Modality,
    /// frequency × success rate per modality
    pub preference_scores: BTreeMap<Modality, f64>,
    pub input_distribution: BTreeMap<Modality, u64>,
    pub success_rates: BTreeMap<Modality, f64>,
}

impl InputPreferenceData {
    /// Observed modalities ordered by score, ties in declaration order
    pub fn ranked_modalities(&self) -> Vec<Modality> {
        let mut ranked: Vec<(Modality, f64)> =
            self.preference_scores.iter().map(|(m, s)| (*m, *s)).collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.into_iter().map(|(m, _)| m).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyData {
    pub success_rate: f64,
    /// Mean duration of successful interactions (ms)
    pub avg_task_duration_ms: f64,
    /// Mean failure-to-recovery latency on the same element (ms)
    pub avg_error_recovery_ms: f64,
    /// In [-1, 1]
    pub learning_trend: f64,
    pub efficiency_level: EfficiencyLevel,
    pub total_interactions: u64,
    pub error_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPatternData {
    pub error_free: bool,
    pub total_errors: u64,
    pub error_rate: f64,
    pub common_error_types: BTreeMap<String, u64>,
    pub problematic_elements: BTreeMap<String, u64>,
    pub time_distribution: BTreeMap<TimeOfDay, u64>,
    pub trend: ErrorTrend,
    pub needs_assistance: bool,
}

impl ErrorPatternData {
    pub fn error_free() -> Self {
        Self {
            error_free: true,
            total_errors: 0,
            error_rate: 0.0,
            common_error_types: BTreeMap::new(),
            problematic_elements: BTreeMap::new(),
            time_distribution: BTreeMap::new(),
            trend: ErrorTrend::InsufficientData,
            needs_assistance: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessibilityIndicators {
    pub keyboard_navigation: bool,
    pub voice_preference: bool,
    pub slow_interaction_speed: bool,
    pub repetitive_actions: bool,
}

impl AccessibilityIndicators {
    pub fn count(&self) -> usize {
        [
            self.keyboard_navigation,
            self.voice_preference,
            self.slow_interaction_speed,
            self.repetitive_actions,
        ]
        .iter()
        .filter(|i| **i)
        .count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessibilityData {
    /// Mean of the four indicators
    pub accessibility_score: f64,
    pub indicators: AccessibilityIndicators,
    pub recommendations: Vec<Recommendation>,
    pub needs_accessibility_features: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceData {
    pub primary_device: String,
    pub device_distribution: BTreeMap<String, u64>,
    pub screen_preference: ScreenClass,
    pub primary_input_method: String,
    pub input_method_distribution: BTreeMap<String, u64>,
    pub multi_device_user: bool,
    pub sample_count: u64,
}

/// Payload of one detector run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum DetectorData {
    /// Detector had nothing to report or failed
    Empty,
    InputPreference(InputPreferenceData),
    Efficiency(EfficiencyData),
    ErrorPattern(ErrorPatternData),
    Accessibility(AccessibilityData),
    Device(DeviceData),
}

/// `{confidence, data}` pair produced by a detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorOutput {
    pub confidence: f64,
    pub data: DetectorData,
}

impl DetectorOutput {
    pub fn new(confidence: f64, data: DetectorData) -> Self {
        Self {
            confidence: clamp_confidence(confidence),
            data,
        }
    }

    /// Zero-confidence output with no data
    pub fn empty() -> Self {
        Self {
            confidence: 0.0,
            data: DetectorData::Empty,
        }
    }
}

/// Detector outputs that met the insight confidence threshold
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InsightSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_preference: Option<InputPreferenceData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub efficiency_pattern: Option<EfficiencyData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_pattern: Option<ErrorPatternData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accessibility_needs: Option<AccessibilityData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_adaptation: Option<DeviceData>,
}

impl InsightSet {
    /// Keep a detector payload
    pub fn insert(&mut self, data: DetectorData) {
        match data {
            DetectorData::Empty => {}
            DetectorData::InputPreference(d) => self.input_preference = Some(d),
            DetectorData::Efficiency(d) => self.efficiency_pattern = Some(d),
            DetectorData::ErrorPattern(d) => self.error_pattern = Some(d),
            DetectorData::Accessibility(d) => self.accessibility_needs = Some(d),
            DetectorData::Device(d) => self.device_adaptation = Some(d),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.input_preference.is_none()
            && self.efficiency_pattern.is_none()
            && self.error_pattern.is_none()
            && self.accessibility_needs.is_none()
            && self.device_adaptation.is_none()
    }
}

/// Synthesized behavior analysis for one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorInsight {
    pub user_id: String,
    pub analyzed_at: DateTime<Utc>,
    /// Mean of detector confidences
    pub overall_confidence: f64,
    pub user_type: UserType,
    pub recommendations: BTreeSet<Recommendation>,
    pub insights: InsightSet,
    /// Confidence reported by each detector that ran
    pub detector_confidences: BTreeMap<DetectorKind, f64>,
    /// Set when the window was below the minimum sample size
    pub insufficient_data: bool,
}

impl BehaviorInsight {
    /// Fixed insight returned while a user has too few interactions
    pub fn new_user(user_id: impl Into<String>, analyzed_at: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            analyzed_at,
            overall_confidence: 0.3,
            user_type: UserType::NewUser,
            recommendations: [
                Recommendation::OnboardingAssistance,
                Recommendation::UsageTracking,
            ]
            .into_iter()
            .collect(),
            insights: InsightSet::default(),
            detector_confidences: BTreeMap::new(),
            insufficient_data: true,
        }
    }

    /// Preferred modality, when the input preference insight was kept
    pub fn preferred_modality(&self) -> Option<Modality> {
        self.insights
            .input_preference
            .as_ref()
            .map(|d| d.primary_preference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_efficiency_level_buckets() {
        assert_eq!(EfficiencyLevel::from_score(0.85), EfficiencyLevel::Expert);
        assert_eq!(EfficiencyLevel::from_score(0.8), EfficiencyLevel::Expert);
        assert_eq!(EfficiencyLevel::from_score(0.6), EfficiencyLevel::Proficient);
        assert_eq!(EfficiencyLevel::from_score(0.45), EfficiencyLevel::Intermediate);
        assert_eq!(EfficiencyLevel::from_score(0.1), EfficiencyLevel::Beginner);
    }

    #[test]
    fn test_time_of_day_buckets() {
        assert_eq!(TimeOfDay::from_hour(6), TimeOfDay::Morning);
        assert_eq!(TimeOfDay::from_hour(11), TimeOfDay::Morning);
        assert_eq!(TimeOfDay::from_hour(12), TimeOfDay::Afternoon);
        assert_eq!(TimeOfDay::from_hour(18), TimeOfDay::Evening);
        assert_eq!(TimeOfDay::from_hour(23), TimeOfDay::Evening);
        assert_eq!(TimeOfDay::from_hour(0), TimeOfDay::Night);
        assert_eq!(TimeOfDay::from_hour(5), TimeOfDay::Night);
    }

    #[test]
    fn test_screen_class() {
        assert_eq!(ScreenClass::from_width(390.0), ScreenClass::Small);
        assert_eq!(ScreenClass::from_width(768.0), ScreenClass::Medium);
        assert_eq!(ScreenClass::from_width(1920.0), ScreenClass::Medium);
        assert_eq!(ScreenClass::from_width(2560.0), ScreenClass::Large);
    }

    #[test]
    fn test_new_user_insight() {
        let insight = BehaviorInsight::new_user("alice", Utc::now());
        assert_eq!(insight.user_type, UserType::NewUser);
        assert!((insight.overall_confidence - 0.3).abs() < f64::EPSILON);
        assert_eq!(insight.recommendations.len(), 2);
        assert!(insight.recommendations.contains(&Recommendation::OnboardingAssistance));
        assert!(insight.recommendations.contains(&Recommendation::UsageTracking));
        assert!(insight.insights.is_empty());
    }

    #[test]
    fn test_ranked_modalities_tie_break() {
        let data = InputPreferenceData {
            primary_preference: Modality::Voice,
            preference_scores: [
                (Modality::Mouse, 0.4),
                (Modality::Voice, 0.4),
                (Modality::Touch, 0.1),
            ]
            .into_iter()
            .collect(),
            input_distribution: BTreeMap::new(),
            success_rates: BTreeMap::new(),
        };
        assert_eq!(
            data.ranked_modalities(),
            vec![Modality::Voice, Modality::Mouse, Modality::Touch]
        );
    }

    #[test]
    fn test_detector_data_serializes_with_tag() {
        let output = DetectorOutput::new(0.8, DetectorData::ErrorPattern(ErrorPatternData::error_free()));
        let value = serde_json::to_value(&output).unwrap();
        assert_eq!(value["data"]["kind"], "error_pattern");
        assert_eq!(value["data"]["data"]["error_free"], true);
    }
}
