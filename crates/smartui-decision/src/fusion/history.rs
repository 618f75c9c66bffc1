//! Bounded decision history and performance counters

use parking_lot::Mutex;
use serde::Serialize;
use smartui_common::{Category, DecisionResult, StrategyKind};
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

use super::weights::CategoryWeights;

/// Snapshot of fusion performance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceMetrics {
    pub total_decisions: u64,
    pub average_confidence: f64,
    pub category_distribution: BTreeMap<Category, u64>,
    pub strategy_distribution: BTreeMap<StrategyKind, u64>,
    pub current_weights: BTreeMap<Category, f64>,
    pub average_response_time_ms: f64,
    pub history_size: usize,
    pub clarification_count: u64,
    pub failed_engine_count: u64,
}

#[derive(Default)]
struct Aggregates {
    entries: VecDeque<Arc<DecisionResult>>,
    confidence_sum: f64,
    response_time_sum_ms: f64,
    category_counts: BTreeMap<Category, u64>,
    strategy_counts: BTreeMap<StrategyKind, u64>,
}

/// Append-only history trimmed to `retain` entries once it exceeds `capacity`
pub struct DecisionHistory {
    inner: Mutex<Aggregates>,
    capacity: usize,
    retain: usize,
    total_decisions: AtomicU64,
    clarifications: AtomicU64,
    failed_engines: AtomicU64,
}

impl DecisionHistory {
    pub fn new(capacity: usize, retain: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Mutex::new(Aggregates::default()),
            capacity,
            retain: retain.clamp(1, capacity),
            total_decisions: AtomicU64::new(0),
            clarifications: AtomicU64::new(0),
            failed_engines: AtomicU64::new(0),
        }
    }

    /// Append a result; `failed_engines` is the number of engines that failed or timed out
    pub fn record(&self, result: Arc<DecisionResult>, failed_engines: u64) {
        self.failed_engines.fetch_add(failed_engines, Ordering::Relaxed);
        if result.needs_clarification() {
            self.clarifications.fetch_add(1, Ordering::Relaxed);
        }

        let mut inner = self.inner.lock();
        // counted under the lock so totals and sums stay consistent
        self.total_decisions.fetch_add(1, Ordering::Relaxed);
        inner.confidence_sum += result.confidence;
        inner.response_time_sum_ms += result.response_time_ms;
        *inner.category_counts.entry(result.category).or_insert(0) += 1;
        *inner.strategy_counts.entry(result.strategy).or_insert(0) += 1;
        inner.entries.push_back(result);

        if inner.entries.len() > self.capacity {
            let excess = inner.entries.len() - self.retain;
            inner.entries.drain(..excess);
            debug!(retained = self.retain, "Trimmed decision history");
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    /// The newest `n` results, oldest first
    pub fn recent(&self, n: usize) -> Vec<Arc<DecisionResult>> {
        let inner = self.inner.lock();
        let skip = inner.entries.len().saturating_sub(n);
        inner.entries.iter().skip(skip).cloned().collect()
    }

    pub fn metrics(&self, weights: &CategoryWeights) -> PerformanceMetrics {
        let inner = self.inner.lock();
        let total = self.total_decisions.load(Ordering::Relaxed);
        let average = |sum: f64| if total == 0 { 0.0 } else { sum / total as f64 };

        PerformanceMetrics {
            total_decisions: total,
            average_confidence: average(inner.confidence_sum),
            category_distribution: inner.category_counts.clone(),
            strategy_distribution: inner.strategy_counts.clone(),
            current_weights: weights.as_map().clone(),
            average_response_time_ms: average(inner.response_time_sum_ms),
            history_size: inner.entries.len(),
            clarification_count: self.clarifications.load(Ordering::Relaxed),
            failed_engine_count: self.failed_engines.load(Ordering::Relaxed),
        }
    }
}
