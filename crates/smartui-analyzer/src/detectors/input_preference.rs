//! Input preference: which modality the user favors and succeeds with

use smartui_common::{
    DetectorData, DetectorError, DetectorKind, DetectorOutput, InputPreferenceData, Modality,
};
use std::collections::BTreeMap;

use super::{DetectorInput, PatternDetector};

/// Scores each modality by frequency × success rate
pub struct InputPreferenceDetector;

impl PatternDetector for InputPreferenceDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::InputPreference
    }

    fn detect(&self, input: &DetectorInput<'_>) -> Result<DetectorOutput, DetectorError> {
        let total = input.window.len();
        if total == 0 {
            return Ok(DetectorOutput::empty());
        }

        let mut counts: BTreeMap<Modality, (u64, u64)> = BTreeMap::new();
        for interaction in input.window {
            let entry = counts.entry(interaction.modality).or_insert((0, 0));
            entry.0 += 1;
            if interaction.success {
                entry.1 += 1;
            }
        }

        let mut preference_scores = BTreeMap::new();
        let mut success_rates = BTreeMap::new();
        let mut input_distribution = BTreeMap::new();
        for (modality, (count, successes)) in &counts {
            let frequency = *count as f64 / total as f64;
            let success_rate = *successes as f64 / *count as f64;
            preference_scores.insert(*modality, frequency * success_rate);
            success_rates.insert(*modality, success_rate);
            input_distribution.insert(*modality, *count);
        }

        // BTreeMap iterates in declaration order, so a strict `>` keeps the earlier modality on ties
        let mut primary: Option<(Modality, f64)> = None;
        for (modality, score) in &preference_scores {
            match primary {
                Some((_, best)) if *score <= best => {}
                _ => primary = Some((*modality, *score)),
            }
        }
        let Some((primary_preference, confidence)) = primary else {
            return Ok(DetectorOutput::empty());
        };

        Ok(DetectorOutput::new(
            confidence,
            DetectorData::InputPreference(InputPreferenceData {
                primary_preference,
                preference_scores,
                input_distribution,
                success_rates,
            }),
        ))
    }
}
