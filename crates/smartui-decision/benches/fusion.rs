use criterion::{black_box, criterion_group, criterion_main, Criterion};
use smartui_common::{
    CandidateDecision, Category, DecisionContext, DecisionInput, InputSource, Intent,
    StrategyKind, UiAction,
};
use smartui_decision::{CategoryWeights, DecisionConfig, DecisionFusionEngine, FusionMerger};

fn bench_merge(c: &mut Criterion) {
    let merger = FusionMerger::default();
    let weights = CategoryWeights::equal();
    let candidates = vec![
        CandidateDecision::new(StrategyKind::RuleBased, Category::Voice, 0.8)
            .with_action(UiAction::new("modify_style", "button", "style"))
            .with_reasoning("voice command matched colour modification rule"),
        CandidateDecision::new(StrategyKind::MlPlaceholder, Category::Voice, 0.82)
            .with_action(UiAction::new("voice_response", "voice_interface", "interaction"))
            .with_reasoning("feature score prediction"),
        CandidateDecision::new(StrategyKind::Heuristic, Category::Balanced, 0.7)
            .with_action(UiAction::new("work_mode_ui", "main_container", "theme"))
            .with_reasoning("heuristics applied: working hours"),
    ];

    c.bench_function("fusion_merge_three_candidates", |b| {
        b.iter(|| merger.merge(black_box(candidates.clone()), black_box(&weights)))
    });
}

fn bench_decide(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
    let engine = DecisionFusionEngine::new(DecisionConfig::default()).expect("default engine");
    let ctx = DecisionContext::new(InputSource::Voice, "bench", "bench-session");
    let input = DecisionInput::voice("change the color of the header", 0.9)
        .with_intent(Intent::new("modify").with_target("header").with_value("red"));

    c.bench_function("fusion_decide_default_engines", |b| {
        b.iter(|| runtime.block_on(engine.decide(black_box(&ctx), black_box(&input))))
    });
}

criterion_group!(benches, bench_merge, bench_decide);
criterion_main!(benches);
