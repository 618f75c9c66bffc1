//! Per-user insight summary

use serde::Serialize;
use smartui_common::{BehaviorInsight, UserProfile};
use std::sync::Arc;

/// Profile snapshot plus the latest analysis for one user
#[derive(Debug, Clone, Serialize)]
pub struct UserInsights {
    pub profile: UserProfile,
    pub recent_analysis: Arc<BehaviorInsight>,
    /// Interactions currently buffered for the user
    pub interaction_count: usize,
    /// Fraction of the five tracked profile fields that are populated
    pub profile_completeness: f64,
}
