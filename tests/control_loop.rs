//! End-to-end feedback loop: route, report outcomes, analyze, optimize, persist.

use std::sync::Arc;
use std::time::Duration;
use switchboard::classifier::{PatternClassifier, TaskClass};
use switchboard::config::{AnalyzerConfig, OptimizerConfig};
use switchboard::optimizer::{Optimizer, RecordStatus};
use switchboard::registry::{Registry, ResourceTier, WorkerKind, WorkerProfile};
use switchboard::routing::{PolicyStore, RouteKind, RouteRequest, Router, RoutingPolicy};
use switchboard::telemetry::{
    OutcomeReport, PerformanceAnalyzer, TelemetryFlusher, TelemetryStore,
};

struct Loop {
    router: Router,
    analyzer: Arc<PerformanceAnalyzer>,
    policy: Arc<PolicyStore>,
    optimizer: Optimizer,
}

/// A single conversational worker, so retrieval requests fall back at 0.5.
fn build(policy: PolicyStore) -> Loop {
    let registry = Arc::new(Registry::new());
    registry
        .add_worker(WorkerProfile::new(
            "llama",
            WorkerKind::generative(),
            [TaskClass::Conversation, TaskClass::TextGeneration],
            0.85,
            ResourceTier::default(),
        ))
        .unwrap();

    let policy = Arc::new(policy);
    let analyzer = Arc::new(PerformanceAnalyzer::new(
        AnalyzerConfig::default(),
        Arc::clone(&policy),
    ));
    let router = Router::new(
        registry,
        Arc::new(PatternClassifier::default()),
        Arc::clone(&policy),
    )
    .with_sink(analyzer.clone());
    let optimizer = Optimizer::new(
        OptimizerConfig::default(),
        Arc::clone(&analyzer),
        Arc::clone(&policy),
    );

    Loop {
        router,
        analyzer,
        policy,
        optimizer,
    }
}

fn route_searches(l: &Loop, count: usize) {
    for i in 0..count {
        let request = RouteRequest::new(format!("search the archive for record {}", i))
            .with_id(format!("req-{}", i));
        let decision = l.router.route_all(&request).unwrap();
        assert_eq!(decision.route_kind, RouteKind::GenericFallback);
        assert_eq!(decision.confidence, 0.5);
    }
}

#[test]
fn low_confidence_traffic_lowers_threshold() {
    let l = build(PolicyStore::new(RoutingPolicy::default()));
    route_searches(&l, 12);

    for i in 0..12 {
        l.analyzer
            .record_outcome(
                &format!("req-{}", i),
                &OutcomeReport {
                    latency_ms: Some(80.0),
                    success: Some(true),
                    ..Default::default()
                },
            )
            .unwrap();
    }

    let before = l.policy.snapshot().low_confidence_threshold;
    let report = l.optimizer.run_cycle();

    let after = l.policy.snapshot();
    assert!(report.changes_applied >= 1);
    assert!(after.low_confidence_threshold < before);
    assert!(after.version >= 1);

    let history = l.optimizer.recent_optimizations(10);
    assert!(!history.is_empty());
    assert!(history
        .iter()
        .all(|r| r.status != RecordStatus::RolledBack));
    assert_eq!(l.optimizer.status().cycles_run, 1);
}

#[test]
fn too_few_decisions_leave_policy_untouched() {
    let l = build(PolicyStore::new(RoutingPolicy::default()));
    route_searches(&l, 3);

    let report = l.optimizer.run_cycle();

    assert_eq!(report.changes_applied, 0);
    assert_eq!(l.policy.snapshot().version, 0);
    assert!(l.optimizer.recent_optimizations(10).is_empty());
}

#[tokio::test]
async fn telemetry_and_policy_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let policy_path = dir.path().join("policy.json");

    let l = build(PolicyStore::load_or(&policy_path, RoutingPolicy::default()));
    route_searches(&l, 12);
    l.optimizer.run_cycle();
    let tuned = l.policy.snapshot().low_confidence_threshold;

    let store = Arc::new(TelemetryStore::new(dir.path()));
    let flusher = TelemetryFlusher::new(
        Arc::clone(&l.analyzer),
        Arc::clone(&store),
        Duration::from_secs(60),
    );
    assert!(flusher.flush().await.unwrap());
    assert!(!flusher.flush().await.unwrap());
    l.policy.persist().unwrap();

    let restarted = build(PolicyStore::load_or(&policy_path, RoutingPolicy::default()));
    restarted
        .analyzer
        .restore(store.load().unwrap().expect("snapshot written"));

    assert_eq!(restarted.analyzer.ledger_len(), 12);
    assert!(restarted.analyzer.entry("req-7").is_some());
    assert!((restarted.policy.snapshot().low_confidence_threshold - tuned).abs() < 1e-9);

    // Restored ids still count as duplicates.
    let duplicate = restarted
        .router
        .route_all(&RouteRequest::new("search again").with_id("req-0"));
    assert!(duplicate.is_err());
}
