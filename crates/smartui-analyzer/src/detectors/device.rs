//! Device adaptation from `device_info` attached to interactions

use smartui_common::{
    DetectorData, DetectorError, DetectorKind, DetectorOutput, DeviceData, ScreenClass,
};
use std::collections::BTreeMap;

use super::{mean, most_frequent, DetectorInput, PatternDetector};

pub struct DeviceAdaptationDetector;

impl PatternDetector for DeviceAdaptationDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::DeviceAdaptation
    }

    fn detect(&self, input: &DetectorInput<'_>) -> Result<DetectorOutput, DetectorError> {
        let device_infos: Vec<_> = input.window.iter().filter_map(|i| i.device_info()).collect();
        if device_infos.is_empty() {
            return Ok(DetectorOutput::empty());
        }

        let mut device_distribution: BTreeMap<String, u64> = BTreeMap::new();
        let mut input_method_distribution: BTreeMap<String, u64> = BTreeMap::new();
        let mut screen_widths = Vec::new();
        for info in &device_infos {
            let device_type = info
                .get("type")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown");
            *device_distribution.entry(device_type.to_string()).or_insert(0) += 1;

            if let Some(width) = info.get("screen_width").and_then(|v| v.as_f64()) {
                screen_widths.push(width);
            }
            if let Some(method) = info.get("primary_input").and_then(|v| v.as_str()) {
                *input_method_distribution.entry(method.to_string()).or_insert(0) += 1;
            }
        }

        let screen_preference = if screen_widths.is_empty() {
            ScreenClass::Unknown
        } else {
            ScreenClass::from_width(mean(&screen_widths))
        };

        let primary_device = most_frequent(&device_distribution)
            .unwrap_or("unknown")
            .to_string();
        let primary_input_method = most_frequent(&input_method_distribution)
            .unwrap_or("unknown")
            .to_string();

        let sample_count = device_infos.len() as u64;
        let confidence = if sample_count >= 10 { 0.7 } else { 0.4 };

        Ok(DetectorOutput::new(
            confidence,
            DetectorData::Device(DeviceData {
                primary_device,
                multi_device_user: device_distribution.len() > 1,
                device_distribution,
                screen_preference,
                primary_input_method,
                input_method_distribution,
                sample_count,
            }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::test_support::{at, input, make};
    use chrono::Utc;
    use serde_json::json;
    use smartui_common::{Interaction, Modality, UserProfile};
    use std::sync::Arc;

    fn with_device(device_type: &str, width: u32, ts: chrono::DateTime<Utc>) -> Arc<Interaction> {
        Arc::new(
            Interaction::new("alice", "s1", Modality::Touch, "tap")
                .at(ts)
                .with_context(
                    "device_info",
                    json!({"type": device_type, "screen_width": width, "primary_input": "touch"}),
                ),
        )
    }

    #[test]
    fn test_no_device_context_has_zero_confidence() {
        let now = Utc::now();
        let window = vec![make(Modality::Mouse, true, now)];
        let profile = UserProfile::new("alice");

        let output = DeviceAdaptationDetector
            .detect(&input(&window, &profile, now))
            .unwrap();
        assert_eq!(output.confidence, 0.0);
    }

    #[test]
    fn test_multi_device_small_screen() {
        let now = Utc::now();
        let mut window: Vec<_> = (0..8).map(|i| with_device("phone", 390, at(20 - i, now))).collect();
        window.push(with_device("tablet", 800, at(5, now)));
        window.push(with_device("tablet", 800, at(4, now)));
        let profile = UserProfile::new("alice");

        let output = DeviceAdaptationDetector
            .detect(&input(&window, &profile, now))
            .unwrap();
        assert_eq!(output.confidence, 0.7);
        let DetectorData::Device(data) = output.data else {
            panic!("unexpected payload");
        };
        assert_eq!(data.primary_device, "phone");
        assert!(data.multi_device_user);
        // (8 * 390 + 2 * 800) / 10 = 472
        assert_eq!(data.screen_preference, ScreenClass::Small);
        assert_eq!(data.primary_input_method, "touch");
        assert_eq!(data.sample_count, 10);
    }
}
