//! UserProfile - accumulated per-user preferences and metrics
//!
//! A profile is created lazily the first time a user is seen and is
//! refreshed by the behavior analyzer after every synthesis.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::interaction::Modality;
use super::JsonMap;

/// Per-user behavior profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Owning user
    pub user_id: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last synthesis that touched this profile
    pub updated_at: DateTime<Utc>,
    /// Device usage summary
    pub device_preferences: JsonMap,
    /// Accessibility indicators and recommendations
    pub accessibility_needs: JsonMap,
    /// Input modalities ordered by preference, strongest first
    pub preferred_input_methods: Vec<Modality>,
    /// Input preference details
    pub interaction_patterns: JsonMap,
    /// Numeric efficiency metrics (success rate, durations, trend)
    pub efficiency_metrics: BTreeMap<String, f64>,
    /// Action usage counts
    pub feature_usage: BTreeMap<String, u64>,
    /// Error message counts
    pub error_patterns: BTreeMap<String, u64>,
    /// Explicit UI preferences
    pub ui_preferences: JsonMap,
}

impl UserProfile {
    /// Create an empty profile for a user
    pub fn new(user_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            user_id: user_id.into(),
            created_at: now,
            updated_at: now,
            device_preferences: JsonMap::new(),
            accessibility_needs: JsonMap::new(),
            preferred_input_methods: Vec::new(),
            interaction_patterns: JsonMap::new(),
            efficiency_metrics: BTreeMap::new(),
            feature_usage: BTreeMap::new(),
            error_patterns: BTreeMap::new(),
            ui_preferences: JsonMap::new(),
        }
    }

    /// Fraction of the five tracked sub-fields that are populated
    pub fn completeness(&self) -> f64 {
        let filled = [
            !self.preferred_input_methods.is_empty(),
            !self.interaction_patterns.is_empty(),
            !self.efficiency_metrics.is_empty(),
            !self.device_preferences.is_empty(),
            !self.ui_preferences.is_empty(),
        ]
        .iter()
        .filter(|f| **f)
        .count();

        filled as f64 / 5.0
    }

    /// Observed success rate, if the efficiency detector has reported one
    pub fn success_rate(&self) -> Option<f64> {
        self.efficiency_metrics.get("success_rate").copied()
    }

    /// Strongest preferred modality
    pub fn primary_modality(&self) -> Option<Modality> {
        self.preferred_input_methods.first().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_profile_is_empty() {
        let profile = UserProfile::new("alice");
        assert_eq!(profile.completeness(), 0.0);
        assert!(profile.success_rate().is_none());
        assert!(profile.primary_modality().is_none());
    }

    #[test]
    fn test_completeness_counts_five_fields() {
        let mut profile = UserProfile::new("alice");
        profile.preferred_input_methods.push(Modality::Voice);
        profile.efficiency_metrics.insert("success_rate".into(), 0.9);
        assert!((profile.completeness() - 0.4).abs() < 1e-9);

        profile.interaction_patterns.insert("primary_preference".into(), json!("voice"));
        profile.device_preferences.insert("primary_device".into(), json!("desktop"));
        profile.ui_preferences.insert("theme".into(), json!("dark"));
        assert_eq!(profile.completeness(), 1.0);

        // Counters are not part of completeness
        profile.feature_usage.insert("click".into(), 3);
        assert_eq!(profile.completeness(), 1.0);
    }
}
