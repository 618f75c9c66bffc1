//! Pattern detectors
//!
//! Each detector is a pure analysis over a user's recent interaction
//! window. Detectors never write shared state; the analyzer runs them in
//! the fixed order returned by [`default_detectors`].

mod accessibility;
mod device;
mod efficiency;
mod error_pattern;
mod input_preference;

pub use accessibility::AccessibilityDetector;
pub use device::DeviceAdaptationDetector;
pub use efficiency::EfficiencyDetector;
pub use error_pattern::ErrorPatternDetector;
pub use input_preference::InputPreferenceDetector;

use chrono::{DateTime, Utc};
use smartui_common::{DetectorError, DetectorKind, DetectorOutput, Interaction, JsonMap, UserProfile};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Everything a detector may look at
#[derive(Debug, Clone, Copy)]
pub struct DetectorInput<'a> {
    pub user_id: &'a str,
    /// Chronologically ordered window
    pub window: &'a [Arc<Interaction>],
    pub profile: &'a UserProfile,
    pub context: Option<&'a JsonMap>,
    /// Reference time for relative cutoffs
    pub now: DateTime<Utc>,
    pub utc_offset_minutes: i64,
}

/// A pure behavior analysis
pub trait PatternDetector: Send + Sync {
    fn kind(&self) -> DetectorKind;

    fn detect(&self, input: &DetectorInput<'_>) -> Result<DetectorOutput, DetectorError>;
}

/// The five detectors in execution order
pub fn default_detectors() -> Vec<Box<dyn PatternDetector>> {
    vec![
        Box::new(InputPreferenceDetector),
        Box::new(EfficiencyDetector),
        Box::new(ErrorPatternDetector),
        Box::new(AccessibilityDetector),
        Box::new(DeviceAdaptationDetector),
    ]
}

/// Key with the highest count; ties go to the lexicographically smallest key
pub(crate) fn most_frequent(counts: &BTreeMap<String, u64>) -> Option<&str> {
    counts
        .iter()
        .fold(None, |best: Option<(&String, u64)>, (key, count)| match best {
            Some((_, best_count)) if best_count >= *count => best,
            _ => Some((key, *count)),
        })
        .map(|(key, _)| key.as_str())
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_most_frequent_tie_is_lexicographic() {
        let counts: BTreeMap<String, u64> = [("tablet".to_string(), 3), ("desktop".to_string(), 3)]
            .into_iter()
            .collect();
        assert_eq!(most_frequent(&counts), Some("desktop"));
        assert_eq!(most_frequent(&BTreeMap::new()), None);
    }

    #[test]
    fn test_default_detector_order() {
        let kinds: Vec<_> = default_detectors().iter().map(|d| d.kind()).collect();
        assert_eq!(kinds, DetectorKind::ALL.to_vec());
    }
}
