//! Efficiency pattern: success, speed, recovery and learning trend

use smartui_common::{
    DetectorData, DetectorError, DetectorKind, DetectorOutput, EfficiencyData, EfficiencyLevel,
    Interaction,
};
use std::sync::Arc;

use super::{mean, DetectorInput, PatternDetector};

/// Windows shorter than this report a flat learning trend
const MIN_TREND_SAMPLE: usize = 10;

/// Durations at or above this count as fully slow in the efficiency score
const SLOW_TASK_MS: f64 = 5000.0;

pub struct EfficiencyDetector;

impl PatternDetector for EfficiencyDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::EfficiencyPattern
    }

    fn detect(&self, input: &DetectorInput<'_>) -> Result<DetectorOutput, DetectorError> {
        let window = input.window;
        let total = window.len();
        if total == 0 {
            return Ok(DetectorOutput::empty());
        }

        let success_rate = success_rate(window);
        let avg_task_duration_ms = mean(&successful_durations(window));
        let avg_error_recovery_ms = mean(&recovery_latencies(window));
        let learning_trend = learning_trend(window);

        let score = 0.4 * success_rate
            + 0.3 * (1.0 - (avg_task_duration_ms / SLOW_TASK_MS).min(1.0))
            + 0.3 * (learning_trend + 1.0) / 2.0;

        let confidence = if total >= 20 { 0.8 } else { 0.5 };

        Ok(DetectorOutput::new(
            confidence,
            DetectorData::Efficiency(EfficiencyData {
                success_rate,
                avg_task_duration_ms,
                avg_error_recovery_ms,
                learning_trend,
                efficiency_level: EfficiencyLevel::from_score(score),
                total_interactions: total as u64,
                error_rate: 1.0 - success_rate,
            }),
        ))
    }
}

fn success_rate(interactions: &[Arc<Interaction>]) -> f64 {
    if interactions.is_empty() {
        return 0.0;
    }
    interactions.iter().filter(|i| i.success).count() as f64 / interactions.len() as f64
}

fn successful_durations(interactions: &[Arc<Interaction>]) -> Vec<f64> {
    interactions
        .iter()
        .filter(|i| i.success)
        .map(|i| i.duration_ms)
        .collect()
}

/// For each failure on an element, latency to the first later success on it
fn recovery_latencies(window: &[Arc<Interaction>]) -> Vec<f64> {
    window
        .iter()
        .filter(|i| !i.success)
        .filter_map(|failure| {
            window
                .iter()
                .find(|later| {
                    later.success
                        && later.timestamp > failure.timestamp
                        && later.element_id == failure.element_id
                })
                .map(|recovery| (recovery.timestamp - failure.timestamp).num_milliseconds() as f64)
        })
        .collect()
}

/// Average of success-rate gain and relative speed-up between window halves
fn learning_trend(window: &[Arc<Interaction>]) -> f64 {
    if window.len() < MIN_TREND_SAMPLE {
        return 0.0;
    }
    let (early, recent) = window.split_at(window.len() / 2);

    let success_improvement = success_rate(recent) - success_rate(early);

    let early_avg = mean(&successful_durations(early));
    let recent_avg = mean(&successful_durations(recent));
    let speed_improvement = if early_avg > 0.0 {
        (early_avg - recent_avg) / early_avg
    } else {
        0.0
    };

    ((success_improvement + speed_improvement) / 2.0).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::test_support::{at, input};
    use chrono::{Duration, Utc};
    use smartui_common::{Modality, UserProfile};

    fn timed(success: bool, duration_ms: f64, ts: chrono::DateTime<Utc>) -> Arc<Interaction> {
        let i = Interaction::new("alice", "s1", Modality::Mouse, "click")
            .at(ts)
            .on_element("save", "button")
            .with_duration(duration_ms);
        Arc::new(if success { i } else { i.failed("missed") })
    }

    fn efficiency(output: DetectorOutput) -> EfficiencyData {
        match output.data {
            DetectorData::Efficiency(data) => data,
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn test_fast_accurate_user_is_expert() {
        let now = Utc::now();
        let window: Vec<_> = (0..20).map(|i| timed(true, 500.0, at(100 - i, now))).collect();
        let profile = UserProfile::new("alice");

        let output = EfficiencyDetector.detect(&input(&window, &profile, now)).unwrap();
        assert_eq!(output.confidence, 0.8);
        let data = efficiency(output);
        assert_eq!(data.success_rate, 1.0);
        assert_eq!(data.avg_task_duration_ms, 500.0);
        assert_eq!(data.learning_trend, 0.0);
        // 0.4 + 0.3 * 0.9 + 0.15 = 0.82
        assert_eq!(data.efficiency_level, EfficiencyLevel::Expert);
    }

    #[test]
    fn test_small_window_has_flat_trend_and_low_confidence() {
        let now = Utc::now();
        let window: Vec<_> = (0..6)
            .map(|i| timed(i % 2 == 0, 4000.0, at(10 - i, now)))
            .collect();
        let profile = UserProfile::new("alice");

        let output = EfficiencyDetector.detect(&input(&window, &profile, now)).unwrap();
        assert_eq!(output.confidence, 0.5);
        let data = efficiency(output);
        assert_eq!(data.learning_trend, 0.0);
        assert!((data.error_rate - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_error_recovery_uses_first_later_success() {
        let now = Utc::now();
        let t0 = now - Duration::minutes(10);
        let window = vec![
            timed(false, 100.0, t0),
            timed(true, 100.0, t0 + Duration::seconds(2)),
            timed(true, 100.0, t0 + Duration::seconds(9)),
        ];
        let profile = UserProfile::new("alice");

        let data = efficiency(EfficiencyDetector.detect(&input(&window, &profile, now)).unwrap());
        assert_eq!(data.avg_error_recovery_ms, 2000.0);
    }

    #[test]
    fn test_learning_trend_improves() {
        let now = Utc::now();
        let mut window = Vec::new();
        for i in 0..10 {
            window.push(timed(i % 2 == 0, 2000.0, at(100 - i, now)));
        }
        for i in 0..10 {
            window.push(timed(true, 1000.0, at(50 - i, now)));
        }
        let profile = UserProfile::new("alice");

        let data = efficiency(EfficiencyDetector.detect(&input(&window, &profile, now)).unwrap());
        // success +0.5, speed +0.5
        assert!((data.learning_trend - 0.5).abs() < 1e-9);
    }
}
