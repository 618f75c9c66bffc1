//! # SmartUI Analyzer
//!
//! Bounded online analytics over user interactions.
//!
//! ## Components
//!
//! - **Interaction Store**: per-user ring buffers and session grouping
//! - **Pattern Detectors**: five pure analyses over a recent window
//! - **Analysis Cache**: TTL memoization keyed by user and context
//! - **UserBehaviorAnalyzer**: orchestration, synthesis and profile updates

pub mod analyzer;
pub mod cache;
pub mod detectors;
pub mod insights;
pub mod store;

pub use analyzer::{AnalyzerStats, MaintenanceReport, UserBehaviorAnalyzer};
pub use cache::{context_fingerprint, AnalysisCache};
pub use detectors::{default_detectors, DetectorInput, PatternDetector};
pub use insights::UserInsights;
pub use store::{InteractionStore, RealtimeStats, RingBuffer, SessionSummary};

use serde::{Deserialize, Serialize};
use smartui_common::{
    SmartUiError, DEFAULT_ANALYSIS_WINDOW_DAYS, DEFAULT_BUFFER_CAPACITY, DEFAULT_CACHE_TTL_MINUTES,
    DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_MIN_INTERACTIONS,
};

/// Longest accepted analysis window, in days
pub const MAX_ANALYSIS_WINDOW_DAYS: i64 = 3650;

/// Longest accepted idle time before eviction, in hours
pub const MAX_PROFILE_IDLE_TTL_HOURS: i64 = 24 * 3650;

/// Longest accepted analysis cache TTL, in seconds
pub const MAX_CACHE_TTL_SECS: u64 = 7 * 24 * 3600;

/// Analyzer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Per-user ring buffer capacity
    pub buffer_capacity: usize,
    /// Recent window analyzed, in days
    pub analysis_window_days: i64,
    /// Minimum window size before detectors run
    pub min_interactions: usize,
    /// Detector confidence required to keep an insight
    pub confidence_threshold: f64,
    /// Analysis cache TTL in seconds
    pub cache_ttl_secs: u64,
    /// Offset applied when bucketing timestamps by local hour
    pub utc_offset_minutes: i64,
    /// Users idle longer than this are evicted, in hours
    pub profile_idle_ttl_hours: i64,
    /// Maximum number of tracked users
    pub max_tracked_users: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            analysis_window_days: DEFAULT_ANALYSIS_WINDOW_DAYS,
            min_interactions: DEFAULT_MIN_INTERACTIONS,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            cache_ttl_secs: (DEFAULT_CACHE_TTL_MINUTES * 60) as u64,
            utc_offset_minutes: 0,
            profile_idle_ttl_hours: 7 * 24,
            max_tracked_users: 10_000,
        }
    }
}

impl AnalyzerConfig {
    pub fn analysis_window(&self) -> chrono::Duration {
        chrono::Duration::days(self.analysis_window_days)
    }

    pub fn cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.cache_ttl_secs as i64)
    }

    pub fn profile_idle_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.profile_idle_ttl_hours)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), SmartUiError> {
        if self.buffer_capacity == 0 {
            return Err(SmartUiError::Config("analyzer.buffer_capacity must be > 0".into()));
        }
        if !(1..=MAX_ANALYSIS_WINDOW_DAYS).contains(&self.analysis_window_days) {
            return Err(SmartUiError::Config(format!(
                "analyzer.analysis_window_days must be within 1..={}",
                MAX_ANALYSIS_WINDOW_DAYS
            )));
        }
        if self.cache_ttl_secs == 0 || self.cache_ttl_secs > MAX_CACHE_TTL_SECS {
            return Err(SmartUiError::Config(format!(
                "analyzer.cache_ttl_secs must be within 1..={}",
                MAX_CACHE_TTL_SECS
            )));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(SmartUiError::Config(
                "analyzer.confidence_threshold must be within [0, 1]".into(),
            ));
        }
        if self.utc_offset_minutes.abs() > 14 * 60 {
            return Err(SmartUiError::Config(
                "analyzer.utc_offset_minutes out of range".into(),
            ));
        }
        if !(1..=MAX_PROFILE_IDLE_TTL_HOURS).contains(&self.profile_idle_ttl_hours) {
            return Err(SmartUiError::Config(format!(
                "analyzer.profile_idle_ttl_hours must be within 1..={}",
                MAX_PROFILE_IDLE_TTL_HOURS
            )));
        }
        if self.max_tracked_users == 0 {
            return Err(SmartUiError::Config(
                "analyzer.max_tracked_users must be > 0".into(),
            ));
        }
        Ok(())
    }
}
