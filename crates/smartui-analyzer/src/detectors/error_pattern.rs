//! Error pattern: what fails, where, when, and whether it is improving

use chrono::{Duration, Timelike};
use smartui_common::{
    DetectorData, DetectorError, DetectorKind, DetectorOutput, ErrorPatternData, ErrorTrend,
    TimeOfDay,
};
use std::collections::BTreeMap;

use super::{DetectorInput, PatternDetector};

/// Failures needed before a trend is reported
const MIN_TREND_ERRORS: usize = 5;

/// Recent-failure lookback for the trend
const TREND_LOOKBACK_DAYS: i64 = 7;

pub struct ErrorPatternDetector;

impl PatternDetector for ErrorPatternDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::ErrorPattern
    }

    fn detect(&self, input: &DetectorInput<'_>) -> Result<DetectorOutput, DetectorError> {
        let failures: Vec<_> = input.window.iter().filter(|i| !i.success).collect();
        if failures.is_empty() {
            return Ok(DetectorOutput::new(
                0.8,
                DetectorData::ErrorPattern(ErrorPatternData::error_free()),
            ));
        }

        let offset = Duration::minutes(input.utc_offset_minutes);
        let mut common_error_types = BTreeMap::new();
        let mut problematic_elements = BTreeMap::new();
        let mut time_distribution = BTreeMap::new();
        for failure in &failures {
            if let Some(message) = &failure.error_message {
                *common_error_types.entry(message.clone()).or_insert(0u64) += 1;
            }
            if let Some(element_type) = &failure.element_type {
                *problematic_elements.entry(element_type.clone()).or_insert(0u64) += 1;
            }
            let local_hour = (failure.timestamp + offset).hour();
            *time_distribution
                .entry(TimeOfDay::from_hour(local_hour))
                .or_insert(0u64) += 1;
        }

        let trend = if failures.len() < MIN_TREND_ERRORS {
            ErrorTrend::InsufficientData
        } else {
            let cutoff = input.now - Duration::days(TREND_LOOKBACK_DAYS);
            let recent = failures.iter().filter(|f| f.timestamp >= cutoff).count();
            if recent == 0 {
                ErrorTrend::Improving
            } else if recent as f64 > failures.len() as f64 * 0.5 {
                ErrorTrend::Worsening
            } else {
                ErrorTrend::Stable
            }
        };

        let error_rate = failures.len() as f64 / input.window.len() as f64;
        let confidence = if failures.len() >= MIN_TREND_ERRORS { 0.7 } else { 0.4 };

        Ok(DetectorOutput::new(
            confidence,
            DetectorData::ErrorPattern(ErrorPatternData {
                error_free: false,
                total_errors: failures.len() as u64,
                error_rate,
                common_error_types,
                problematic_elements,
                time_distribution,
                trend,
                needs_assistance: error_rate > 0.3,
            }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::test_support::{input, make};
    use chrono::{TimeZone, Utc};
    use smartui_common::{Interaction, Modality, UserProfile};
    use std::sync::Arc;

    fn errors(output: DetectorOutput) -> ErrorPatternData {
        match output.data {
            DetectorData::ErrorPattern(data) => data,
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn test_error_free_window() {
        let now = Utc::now();
        let window = vec![make(Modality::Voice, true, now)];
        let profile = UserProfile::new("alice");

        let output = ErrorPatternDetector.detect(&input(&window, &profile, now)).unwrap();
        assert_eq!(output.confidence, 0.8);
        assert!(errors(output).error_free);
    }

    #[test]
    fn test_worsening_when_most_errors_are_recent() {
        let now = Utc.with_ymd_and_hms(2024, 6, 20, 12, 0, 0).unwrap();
        let mut window = Vec::new();
        window.push(make(Modality::Mouse, false, now - Duration::days(20)));
        for h in 1..=5 {
            window.push(make(Modality::Mouse, false, now - Duration::hours(h)));
        }
        for h in 1..=4 {
            window.push(make(Modality::Mouse, true, now - Duration::hours(h)));
        }
        let profile = UserProfile::new("alice");

        let output = ErrorPatternDetector.detect(&input(&window, &profile, now)).unwrap();
        assert_eq!(output.confidence, 0.7);
        let data = errors(output);
        assert_eq!(data.trend, ErrorTrend::Worsening);
        assert_eq!(data.total_errors, 6);
        assert!(data.needs_assistance);
        assert_eq!(data.common_error_types["element not found"], 6);
    }

    #[test]
    fn test_improving_when_no_recent_errors() {
        let now = Utc::now();
        let window: Vec<_> = (0..5)
            .map(|d| make(Modality::Mouse, false, now - Duration::days(10 + d)))
            .collect();
        let profile = UserProfile::new("alice");

        let data = errors(ErrorPatternDetector.detect(&input(&window, &profile, now)).unwrap());
        assert_eq!(data.trend, ErrorTrend::Improving);
    }

    #[test]
    fn test_few_errors_report_insufficient_trend() {
        let now = Utc::now();
        let window = vec![
            make(Modality::Mouse, false, now),
            make(Modality::Mouse, true, now),
        ];
        let profile = UserProfile::new("alice");

        let output = ErrorPatternDetector.detect(&input(&window, &profile, now)).unwrap();
        assert_eq!(output.confidence, 0.4);
        assert_eq!(errors(output).trend, ErrorTrend::InsufficientData);
    }

    #[test]
    fn test_hour_buckets_use_offset() {
        let ts = Utc.with_ymd_and_hms(2024, 6, 20, 23, 0, 0).unwrap();
        let failure = Arc::new(
            Interaction::new("alice", "s1", Modality::Touch, "tap")
                .at(ts)
                .on_element("menu", "dropdown")
                .failed("timeout"),
        );
        let window = vec![failure];
        let profile = UserProfile::new("alice");
        let mut detector_input = input(&window, &profile, ts);
        detector_input.utc_offset_minutes = 8 * 60;

        let data = errors(ErrorPatternDetector.detect(&detector_input).unwrap());
        // 23:00 UTC is 07:00 at UTC+8
        assert_eq!(data.time_distribution[&TimeOfDay::Morning], 1);
        assert_eq!(data.problematic_elements["dropdown"], 1);
    }
}
