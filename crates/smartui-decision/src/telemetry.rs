//! Prometheus telemetry for decision fusion

use prometheus::{GaugeVec, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry};
use smartui_common::{DecisionResult, StrategyKind};

use crate::fusion::CategoryWeights;

/// Decision counters and histograms
#[derive(Clone)]
pub struct DecisionTelemetry {
    pub decisions_total: IntCounterVec,
    pub clarifications_total: IntCounter,
    pub engine_failures_total: IntCounterVec,
    pub decision_duration_seconds: Histogram,
    pub fused_confidence: Histogram,
    pub category_weight: GaugeVec,
}

impl DecisionTelemetry {
    pub fn new() -> prometheus::Result<Self> {
        Ok(Self {
            decisions_total: IntCounterVec::new(
                Opts::new("smartui_decisions_total", "Fused decisions produced"),
                &["strategy", "category"],
            )?,
            clarifications_total: IntCounter::new(
                "smartui_clarifications_total",
                "Decisions below the confidence threshold",
            )?,
            engine_failures_total: IntCounterVec::new(
                Opts::new(
                    "smartui_engine_failures_total",
                    "Strategy engine failures and timeouts",
                ),
                &["strategy"],
            )?,
            decision_duration_seconds: Histogram::with_opts(
                HistogramOpts::new(
                    "smartui_decision_duration_seconds",
                    "Decision cycle duration",
                )
                .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.5, 1.0, 2.5]),
            )?,
            fused_confidence: Histogram::with_opts(
                HistogramOpts::new("smartui_fused_confidence", "Weighted decision confidence")
                    .buckets(vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0]),
            )?,
            category_weight: GaugeVec::new(
                Opts::new("smartui_category_weight", "Current category weight"),
                &["category"],
            )?,
        })
    }

    pub fn register(&self, registry: &Registry) -> prometheus::Result<()> {
        registry.register(Box::new(self.decisions_total.clone()))?;
        registry.register(Box::new(self.clarifications_total.clone()))?;
        registry.register(Box::new(self.engine_failures_total.clone()))?;
        registry.register(Box::new(self.decision_duration_seconds.clone()))?;
        registry.register(Box::new(self.fused_confidence.clone()))?;
        registry.register(Box::new(self.category_weight.clone()))?;
        Ok(())
    }

    /// Record one finished decision cycle
    pub fn observe(
        &self,
        result: &DecisionResult,
        failed: &[StrategyKind],
        weights: &CategoryWeights,
    ) {
        self.decisions_total
            .with_label_values(&[result.strategy.as_str(), result.category.as_str()])
            .inc();
        if result.needs_clarification() {
            self.clarifications_total.inc();
        }
        for kind in failed {
            self.engine_failures_total
                .with_label_values(&[kind.as_str()])
                .inc();
        }
        self.decision_duration_seconds
            .observe(result.response_time_ms / 1000.0);
        self.fused_confidence.observe(result.confidence);
        for (category, weight) in weights.as_map() {
            self.category_weight
                .with_label_values(&[category.as_str()])
                .set(*weight);
        }
    }
}
