//! User Behavior Analyzer
//!
//! Runs the pattern detectors over a user's recent window, synthesizes a
//! [`BehaviorInsight`], memoizes it with a TTL and folds the kept insights
//! back into the user's profile.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use smartui_common::{
    BehaviorInsight, DetectorData, DetectorKind, DetectorOutput, EfficiencyLevel, InsightSet,
    Interaction, JsonMap, Modality, Recommendation, ScreenClass, UserProfile, UserType,
    ValidationError,
};
use std::collections::{BTreeMap, BTreeSet};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::cache::{context_fingerprint, AnalysisCache};
use crate::detectors::{default_detectors, DetectorInput, PatternDetector};
use crate::insights::UserInsights;
use crate::store::InteractionStore;
use crate::AnalyzerConfig;

/// Analyzer counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnalyzerStats {
    pub tracked_users: usize,
    pub profiles: usize,
    pub cached_insights: usize,
    pub analyses: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    /// Individual detector invocations
    pub detector_runs: u64,
    pub detector_failures: u64,
}

/// Outcome of one maintenance pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MaintenanceReport {
    pub expired_cache_entries: usize,
    pub evicted_users: usize,
}

/// Orchestrates detectors over the interaction store
pub struct UserBehaviorAnalyzer {
    config: AnalyzerConfig,
    store: Arc<InteractionStore>,
    profiles: DashMap<String, UserProfile>,
    cache: AnalysisCache,
    detectors: Vec<Box<dyn PatternDetector>>,
    analyses: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    detector_runs: AtomicU64,
    detector_failures: AtomicU64,
    /// Millisecond timestamp of the last opportunistic cache sweep
    last_sweep_ms: AtomicI64,
}

impl UserBehaviorAnalyzer {
    /// Create an analyzer with its own store and the default detectors
    pub fn new(config: AnalyzerConfig) -> Self {
        let store = Arc::new(InteractionStore::new(config.buffer_capacity));
        Self::with_store(config, store)
    }

    /// Create an analyzer over an existing store
    pub fn with_store(config: AnalyzerConfig, store: Arc<InteractionStore>) -> Self {
        Self {
            cache: AnalysisCache::new(config.cache_ttl()),
            config,
            store,
            profiles: DashMap::new(),
            detectors: default_detectors(),
            analyses: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
            detector_runs: AtomicU64::new(0),
            detector_failures: AtomicU64::new(0),
            last_sweep_ms: AtomicI64::new(i64::MIN),
        }
    }

    /// Replace the detector list
    pub fn with_detectors(mut self, detectors: Vec<Box<dyn PatternDetector>>) -> Self {
        self.detectors = detectors;
        self
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<InteractionStore> {
        &self.store
    }

    /// Record an interaction and make sure the user has a profile
    pub fn record_interaction(
        &self,
        interaction: Interaction,
    ) -> Result<Arc<Interaction>, ValidationError> {
        let recorded = self.store.record(interaction)?;
        self.profiles
            .entry(recorded.user_id.clone())
            .or_insert_with(|| UserProfile::new(recorded.user_id.clone()));
        Ok(recorded)
    }

    /// Snapshot of a user's profile, created if missing
    pub fn get_or_create_profile(&self, user_id: &str) -> UserProfile {
        self.profiles
            .entry(user_id.to_string())
            .or_insert_with(|| UserProfile::new(user_id))
            .clone()
    }

    pub fn profile(&self, user_id: &str) -> Option<UserProfile> {
        self.profiles.get(user_id).map(|p| p.clone())
    }

    /// Analyze a user's behavior as of now
    pub fn analyze_user_behavior(
        &self,
        user_id: &str,
        context: Option<&JsonMap>,
    ) -> Arc<BehaviorInsight> {
        self.analyze_at(user_id, context, Utc::now())
    }

    /// Analyze a user's behavior as of `now`.
    ///
    /// Detector failures are absorbed as zero-confidence outputs; this never fails.
    #[instrument(skip(self, context))]
    pub fn analyze_at(
        &self,
        user_id: &str,
        context: Option<&JsonMap>,
        now: DateTime<Utc>,
    ) -> Arc<BehaviorInsight> {
        self.analyses.fetch_add(1, Ordering::Relaxed);
        self.maybe_sweep(now);

        let key = context_fingerprint(user_id, context);
        if let Some(cached) = self.cache.get_at(&key, now) {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
            debug!("Analysis cache hit");
            return cached;
        }
        self.cache_misses.fetch_add(1, Ordering::Relaxed);

        let profile = self.get_or_create_profile(user_id);
        let window = self
            .store
            .recent_window_at(user_id, self.config.analysis_window(), now);

        if window.len() < self.config.min_interactions {
            debug!(
                window = window.len(),
                min = self.config.min_interactions,
                "Insufficient data, returning new-user insight"
            );
            return Arc::new(BehaviorInsight::new_user(user_id, now));
        }

        let input = DetectorInput {
            user_id,
            window: &window,
            profile: &profile,
            context,
            now,
            utc_offset_minutes: self.config.utc_offset_minutes,
        };
        let outputs = self.run_detectors(&input);
        let insight = Arc::new(self.synthesize(user_id, &outputs, now));

        self.update_profile(user_id, &insight, &outputs, &window, now);
        self.cache.insert_at(key, user_id, Arc::clone(&insight), now);

        info!(
            user_type = ?insight.user_type,
            confidence = insight.overall_confidence,
            recommendations = insight.recommendations.len(),
            "Behavior analysis complete"
        );
        insight
    }

    /// Sweep expired entries at most once per quarter of the cache TTL
    fn maybe_sweep(&self, now: DateTime<Utc>) {
        let now_ms = now.timestamp_millis();
        let interval_ms = (self.config.cache_ttl().num_milliseconds() / 4).max(1);
        let last = self.last_sweep_ms.load(Ordering::Relaxed);
        if now_ms.saturating_sub(last) < interval_ms {
            return;
        }
        if self
            .last_sweep_ms
            .compare_exchange(last, now_ms, Ordering::AcqRel, Ordering::Relaxed)
            .is_ok()
        {
            let expired = self.cache.sweep_at(now);
            if expired > 0 {
                debug!(expired, "Swept expired analyses");
            }
        }
    }

    fn run_detectors(&self, input: &DetectorInput<'_>) -> Vec<(DetectorKind, DetectorOutput)> {
        self.detectors
            .iter()
            .map(|detector| {
                self.detector_runs.fetch_add(1, Ordering::Relaxed);
                let output = match panic::catch_unwind(AssertUnwindSafe(|| detector.detect(input))) {
                    Ok(Ok(output)) => output,
                    Ok(Err(e)) => {
                        self.detector_failures.fetch_add(1, Ordering::Relaxed);
                        warn!(detector = %detector.kind(), error = %e, "Detector failed");
                        DetectorOutput::empty()
                    }
                    Err(_) => {
                        self.detector_failures.fetch_add(1, Ordering::Relaxed);
                        warn!(detector = %detector.kind(), "Detector panicked");
                        DetectorOutput::empty()
                    }
                };
                (detector.kind(), output)
            })
            .collect()
    }

    fn synthesize(
        &self,
        user_id: &str,
        outputs: &[(DetectorKind, DetectorOutput)],
        now: DateTime<Utc>,
    ) -> BehaviorInsight {
        let overall_confidence = if outputs.is_empty() {
            0.0
        } else {
            outputs.iter().map(|(_, o)| o.confidence).sum::<f64>() / outputs.len() as f64
        };

        let mut insights = InsightSet::default();
        for (_, output) in outputs {
            if output.confidence >= self.config.confidence_threshold {
                insights.insert(output.data.clone());
            }
        }

        BehaviorInsight {
            user_id: user_id.to_string(),
            analyzed_at: now,
            overall_confidence,
            user_type: classify_user_type(outputs),
            recommendations: recommendations(outputs),
            insights,
            detector_confidences: outputs.iter().map(|(k, o)| (*k, o.confidence)).collect(),
            insufficient_data: false,
        }
    }

    fn update_profile(
        &self,
        user_id: &str,
        insight: &BehaviorInsight,
        outputs: &[(DetectorKind, DetectorOutput)],
        window: &[Arc<Interaction>],
        now: DateTime<Utc>,
    ) {
        let mut profile = self
            .profiles
            .entry(user_id.to_string())
            .or_insert_with(|| UserProfile::new(user_id));
        profile.updated_at = now;

        let kept = &insight.insights;
        if let Some(input) = &kept.input_preference {
            profile.preferred_input_methods = input.ranked_modalities();
            if let Some(map) = to_json_map(input) {
                profile.interaction_patterns.extend(map);
            }
        }
        if let Some(efficiency) = &kept.efficiency_pattern {
            let metrics = &mut profile.efficiency_metrics;
            metrics.insert("success_rate".into(), efficiency.success_rate);
            metrics.insert("avg_task_duration_ms".into(), efficiency.avg_task_duration_ms);
            metrics.insert("avg_error_recovery_ms".into(), efficiency.avg_error_recovery_ms);
            metrics.insert("learning_trend".into(), efficiency.learning_trend);
            metrics.insert("error_rate".into(), efficiency.error_rate);
            metrics.insert(
                "total_interactions".into(),
                efficiency.total_interactions as f64,
            );
        }
        if let Some(map) = kept.accessibility_needs.as_ref().and_then(to_json_map) {
            profile.accessibility_needs.extend(map);
        }
        if let Some(map) = kept.device_adaptation.as_ref().and_then(to_json_map) {
            profile.device_preferences.extend(map);
        }

        let mut feature_usage = BTreeMap::new();
        for interaction in window {
            *feature_usage.entry(interaction.action.clone()).or_insert(0u64) += 1;
        }
        profile.feature_usage = feature_usage;

        if let Some(DetectorData::ErrorPattern(errors)) = find(outputs, DetectorKind::ErrorPattern) {
            profile.error_patterns = errors.common_error_types.clone();
        }
    }

    /// Profile, analysis and completeness summary for one user
    pub fn user_insights(&self, user_id: &str) -> UserInsights {
        let recent_analysis = self.analyze_user_behavior(user_id, None);
        let profile = self.get_or_create_profile(user_id);
        UserInsights {
            interaction_count: self.store.len(user_id),
            profile_completeness: profile.completeness(),
            profile,
            recent_analysis,
        }
    }

    /// Sweep expired cache entries and evict idle or excess users
    #[instrument(skip(self))]
    pub fn run_maintenance_at(&self, now: DateTime<Utc>) -> MaintenanceReport {
        let expired_cache_entries = self.cache.sweep_at(now);
        let idle_ttl = self.config.profile_idle_ttl();

        let mut evicted = self.store.evict_idle(now, idle_ttl);
        evicted.extend(self.store.enforce_user_cap(self.config.max_tracked_users));
        for user_id in &evicted {
            self.profiles.remove(user_id);
            self.cache.remove_user(user_id);
        }

        // Profiles created by analysis requests alone have no buffer
        let before = self.profiles.len();
        self.profiles.retain(|user_id, profile| {
            self.store.contains_user(user_id) || now - profile.updated_at < idle_ttl
        });
        let orphaned = before.saturating_sub(self.profiles.len());

        let report = MaintenanceReport {
            expired_cache_entries,
            evicted_users: evicted.len() + orphaned,
        };
        if report != MaintenanceReport::default() {
            info!(
                expired = report.expired_cache_entries,
                evicted = report.evicted_users,
                "Analyzer maintenance"
            );
        }
        report
    }

    pub fn stats(&self) -> AnalyzerStats {
        AnalyzerStats {
            tracked_users: self.store.user_count(),
            profiles: self.profiles.len(),
            cached_insights: self.cache.len(),
            analyses: self.analyses.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            detector_runs: self.detector_runs.load(Ordering::Relaxed),
            detector_failures: self.detector_failures.load(Ordering::Relaxed),
        }
    }
}

fn find(outputs: &[(DetectorKind, DetectorOutput)], kind: DetectorKind) -> Option<&DetectorData> {
    outputs
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, output)| &output.data)
}

fn to_json_map<T: Serialize>(value: &T) -> Option<JsonMap> {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::Object(map)) => Some(map),
        Ok(_) => None,
        Err(e) => {
            warn!(error = %e, "Failed to serialize insight for profile");
            None
        }
    }
}

/// Precedence: accessibility > power > novice > voice-first > visual > balanced
fn classify_user_type(outputs: &[(DetectorKind, DetectorOutput)]) -> UserType {
    let needs_accessibility = matches!(
        find(outputs, DetectorKind::AccessibilityNeeds),
        Some(DetectorData::Accessibility(a)) if a.needs_accessibility_features
    );
    let level = match find(outputs, DetectorKind::EfficiencyPattern) {
        Some(DetectorData::Efficiency(e)) => e.efficiency_level,
        _ => EfficiencyLevel::Intermediate,
    };
    let primary = match find(outputs, DetectorKind::InputPreference) {
        Some(DetectorData::InputPreference(p)) => Some(p.primary_preference),
        _ => None,
    };

    if needs_accessibility {
        UserType::AccessibilityUser
    } else if level == EfficiencyLevel::Expert {
        UserType::PowerUser
    } else if level == EfficiencyLevel::Beginner {
        UserType::NoviceUser
    } else if primary == Some(Modality::Voice) {
        UserType::VoiceFirstUser
    } else if primary == Some(Modality::Visual) {
        UserType::VisualUser
    } else {
        UserType::BalancedUser
    }
}

fn recommendations(outputs: &[(DetectorKind, DetectorOutput)]) -> BTreeSet<Recommendation> {
    let mut recs = BTreeSet::new();

    if let Some(DetectorData::Efficiency(e)) = find(outputs, DetectorKind::EfficiencyPattern) {
        if e.error_rate > 0.2 {
            recs.insert(Recommendation::ErrorPreventionEnhancement);
        }
        if e.avg_task_duration_ms > 3000.0 {
            recs.insert(Recommendation::WorkflowSimplification);
        }
    }

    if let Some(DetectorData::InputPreference(p)) = find(outputs, DetectorKind::InputPreference) {
        match p.primary_preference {
            Modality::Voice => {
                recs.insert(Recommendation::VoiceInterfaceOptimization);
            }
            Modality::Visual => {
                recs.insert(Recommendation::VisualDebuggingEnhancement);
            }
            _ => {}
        }
    }

    if let Some(DetectorData::Accessibility(a)) = find(outputs, DetectorKind::AccessibilityNeeds) {
        if a.needs_accessibility_features {
            recs.extend(a.recommendations.iter().copied());
        }
    }

    if let Some(DetectorData::Device(d)) = find(outputs, DetectorKind::DeviceAdaptation) {
        if d.multi_device_user {
            recs.insert(Recommendation::CrossDeviceSynchronization);
        }
        if d.screen_preference == ScreenClass::Small {
            recs.insert(Recommendation::MobileOptimization);
        }
    }

    recs
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use smartui_common::DetectorError;

    struct FailingDetector;

    struct PanickingDetector;

    impl PatternDetector for PanickingDetector {
        fn kind(&self) -> DetectorKind {
            DetectorKind::AccessibilityNeeds
        }

        fn detect(&self, _input: &DetectorInput<'_>) -> Result<DetectorOutput, DetectorError> {
            panic!("accessibility model crashed")
        }
    }

    impl PatternDetector for FailingDetector {
        fn kind(&self) -> DetectorKind {
            DetectorKind::DeviceAdaptation
        }

        fn detect(&self, _input: &DetectorInput<'_>) -> Result<DetectorOutput, DetectorError> {
            Err(DetectorError::Failed {
                detector: "device_adaptation".into(),
                reason: "boom".into(),
            })
        }
    }

    fn seed(analyzer: &UserBehaviorAnalyzer, now: DateTime<Utc>, count: i64) {
        for i in 0..count {
            analyzer
                .record_interaction(
                    Interaction::new("alice", "s1", Modality::Voice, "speak")
                        .at(now - Duration::minutes(count - i)),
                )
                .unwrap();
        }
    }

    #[test]
    fn test_new_user_insight_is_not_cached() {
        let analyzer = UserBehaviorAnalyzer::new(AnalyzerConfig::default());
        let now = Utc::now();
        seed(&analyzer, now, 9);

        let insight = analyzer.analyze_at("alice", None, now);
        assert_eq!(insight.user_type, UserType::NewUser);
        assert_eq!(analyzer.stats().cached_insights, 0);

        seed(&analyzer, now, 1);
        let insight = analyzer.analyze_at("alice", None, now);
        assert_ne!(insight.user_type, UserType::NewUser);
        assert_eq!(analyzer.stats().cached_insights, 1);
    }

    #[test]
    fn test_failing_detector_is_absorbed() {
        let mut detectors = default_detectors();
        detectors.retain(|d| {
            !matches!(
                d.kind(),
                DetectorKind::DeviceAdaptation | DetectorKind::AccessibilityNeeds
            )
        });
        detectors.push(Box::new(FailingDetector));
        detectors.push(Box::new(PanickingDetector));
        let analyzer =
            UserBehaviorAnalyzer::new(AnalyzerConfig::default()).with_detectors(detectors);
        let now = Utc::now();
        seed(&analyzer, now, 12);

        let insight = analyzer.analyze_at("alice", None, now);
        assert_eq!(
            insight.detector_confidences[&DetectorKind::DeviceAdaptation],
            0.0
        );
        assert_eq!(
            insight.detector_confidences[&DetectorKind::AccessibilityNeeds],
            0.0
        );
        assert_eq!(analyzer.stats().detector_failures, 2);
        assert_eq!(insight.preferred_modality(), Some(Modality::Voice));
    }

    #[test]
    fn test_opportunistic_sweep_is_rate_limited() {
        let config = AnalyzerConfig {
            cache_ttl_secs: 60,
            ..Default::default()
        };
        let analyzer = UserBehaviorAnalyzer::new(config);
        let start = Utc::now();
        seed(&analyzer, start, 12);

        analyzer.analyze_at("alice", None, start);
        assert_eq!(analyzer.stats().cached_insights, 1);

        // sweeps at +50s, entry still fresh
        analyzer.analyze_at("nobody", None, start + Duration::seconds(50));
        assert_eq!(analyzer.stats().cached_insights, 1);

        // expired, but within a quarter TTL of the last sweep
        analyzer.analyze_at("nobody", None, start + Duration::seconds(61));
        assert_eq!(analyzer.stats().cached_insights, 1);

        analyzer.analyze_at("nobody", None, start + Duration::seconds(66));
        assert_eq!(analyzer.stats().cached_insights, 0);
    }

    #[test]
    fn test_profile_updated_from_kept_insights() {
        let analyzer = UserBehaviorAnalyzer::new(AnalyzerConfig::default());
        let now = Utc::now();
        seed(&analyzer, now, 25);

        analyzer.analyze_at("alice", None, now);
        let profile = analyzer.profile("alice").unwrap();
        assert_eq!(profile.preferred_input_methods, vec![Modality::Voice]);
        assert_eq!(profile.success_rate(), Some(1.0));
        assert_eq!(profile.feature_usage["speak"], 25);
        assert!(profile.interaction_patterns.contains_key("primary_preference"));
        assert_eq!(profile.updated_at, now);
    }

    #[test]
    fn test_maintenance_evicts_idle_users() {
        let analyzer = UserBehaviorAnalyzer::new(AnalyzerConfig::default());
        let now = Utc::now();
        seed(&analyzer, now - Duration::days(10), 3);
        analyzer.get_or_create_profile("ghost");

        let report = analyzer.run_maintenance_at(now + Duration::days(8));
        assert_eq!(report.evicted_users, 2);
        assert!(analyzer.profile("alice").is_none());
        assert!(analyzer.profile("ghost").is_none());
        assert_eq!(analyzer.stats().tracked_users, 0);
    }
}
