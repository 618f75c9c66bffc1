//! Accessibility needs inferred from input mix, pace and repetition

use smartui_common::{
    AccessibilityData, AccessibilityIndicators, DetectorData, DetectorError, DetectorKind,
    DetectorOutput, Modality, Recommendation,
};
use std::collections::HashMap;

use super::{mean, DetectorInput, PatternDetector};

const KEYBOARD_RATIO: f64 = 0.7;
const VOICE_RATIO: f64 = 0.5;
const SLOW_INTERACTION_MS: f64 = 3000.0;
const REPETITION_LIMIT: u64 = 5;

pub struct AccessibilityDetector;

impl PatternDetector for AccessibilityDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::AccessibilityNeeds
    }

    fn detect(&self, input: &DetectorInput<'_>) -> Result<DetectorOutput, DetectorError> {
        let window = input.window;
        let total = window.len();
        let mut indicators = AccessibilityIndicators::default();

        if total > 0 {
            let ratio = |modality: Modality| {
                window.iter().filter(|i| i.modality == modality).count() as f64 / total as f64
            };
            indicators.keyboard_navigation = ratio(Modality::Keyboard) > KEYBOARD_RATIO;
            indicators.voice_preference = ratio(Modality::Voice) > VOICE_RATIO;
        }

        let positive_durations: Vec<f64> = window
            .iter()
            .map(|i| i.duration_ms)
            .filter(|d| *d > 0.0)
            .collect();
        indicators.slow_interaction_speed =
            !positive_durations.is_empty() && mean(&positive_durations) > SLOW_INTERACTION_MS;

        let mut repeats: HashMap<(Option<&str>, &str), u64> = HashMap::new();
        for interaction in window {
            *repeats
                .entry((interaction.element_id.as_deref(), interaction.action.as_str()))
                .or_insert(0) += 1;
        }
        indicators.repetitive_actions = repeats.values().any(|count| *count > REPETITION_LIMIT);

        let accessibility_score = indicators.count() as f64 / 4.0;

        let mut recommendations = Vec::new();
        if indicators.keyboard_navigation {
            recommendations.push(Recommendation::EnhancedKeyboardNavigation);
        }
        if indicators.voice_preference {
            recommendations.push(Recommendation::VoiceInterfaceOptimization);
        }
        if indicators.slow_interaction_speed {
            recommendations.push(Recommendation::ExtendedTimeoutSettings);
        }
        if indicators.repetitive_actions {
            recommendations.push(Recommendation::SimplifiedWorkflows);
        }

        let confidence = if total >= 15 { 0.6 } else { 0.3 };

        Ok(DetectorOutput::new(
            confidence,
            DetectorData::Accessibility(AccessibilityData {
                accessibility_score,
                indicators,
                recommendations,
                needs_accessibility_features: accessibility_score > 0.3,
            }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::test_support::{at, input};
    use chrono::Utc;
    use smartui_common::{Interaction, UserProfile};
    use std::sync::Arc;

    fn accessibility(output: DetectorOutput) -> AccessibilityData {
        match output.data {
            DetectorData::Accessibility(data) => data,
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn test_slow_keyboard_user_needs_features() {
        let now = Utc::now();
        let window: Vec<_> = (0..16)
            .map(|i| {
                Arc::new(
                    Interaction::new("alice", "s1", Modality::Keyboard, format!("key-{i}"))
                        .at(at(30 - i, now))
                        .with_duration(4500.0),
                )
            })
            .collect();
        let profile = UserProfile::new("alice");

        let output = AccessibilityDetector.detect(&input(&window, &profile, now)).unwrap();
        assert_eq!(output.confidence, 0.6);
        let data = accessibility(output);
        assert!(data.indicators.keyboard_navigation);
        assert!(data.indicators.slow_interaction_speed);
        assert!(!data.indicators.repetitive_actions);
        assert_eq!(data.accessibility_score, 0.5);
        assert!(data.needs_accessibility_features);
        assert_eq!(
            data.recommendations,
            vec![
                Recommendation::EnhancedKeyboardNavigation,
                Recommendation::ExtendedTimeoutSettings
            ]
        );
    }

    #[test]
    fn test_repetition_detected() {
        let now = Utc::now();
        let window: Vec<_> = (0..6)
            .map(|i| {
                Arc::new(
                    Interaction::new("alice", "s1", Modality::Mouse, "click")
                        .at(at(10 - i, now))
                        .on_element("retry", "button"),
                )
            })
            .collect();
        let profile = UserProfile::new("alice");

        let output = AccessibilityDetector.detect(&input(&window, &profile, now)).unwrap();
        assert_eq!(output.confidence, 0.3);
        let data = accessibility(output);
        assert!(data.indicators.repetitive_actions);
        assert_eq!(data.accessibility_score, 0.25);
        assert!(!data.needs_accessibility_features);
    }
}
