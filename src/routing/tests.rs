use super::*;
use crate::classifier::PatternClassifier;
use crate::registry::{ResourceTier, WorkerKind};
use std::collections::HashSet;
use std::sync::Mutex;

#[derive(Default)]
struct MemorySink {
    decisions: Mutex<Vec<RoutingDecision>>,
}

impl DecisionSink for MemorySink {
    fn record_decision(&self, decision: &RoutingDecision) -> Result<(), RoutingError> {
        let mut decisions = self.decisions.lock().unwrap();
        if decisions.iter().any(|d| d.request_id == decision.request_id) {
            return Err(RoutingError::DuplicateRequestId {
                request_id: decision.request_id.clone(),
            });
        }
        decisions.push(decision.clone());
        Ok(())
    }
}

fn worker(id: &str, kind: WorkerKind, tasks: &[TaskClass], score: f64) -> WorkerProfile {
    WorkerProfile::new(id, kind, tasks.iter().copied(), score, ResourceTier::Medium)
}

fn scenario_workers() -> Vec<WorkerProfile> {
    vec![
        worker(
            "w1",
            WorkerKind::embedding(),
            &[TaskClass::Embedding, TaskClass::Similarity],
            0.9,
        ),
        worker(
            "w2",
            WorkerKind::generative(),
            &[TaskClass::Conversation, TaskClass::TextGeneration],
            0.95,
        ),
    ]
}

fn router_with(workers: Vec<WorkerProfile>) -> (Router, Arc<MemorySink>) {
    let registry = Arc::new(Registry::with_allowed_kinds([
        "embedding",
        "generative",
        "code",
    ]));
    for w in workers {
        registry.add_worker(w).unwrap();
    }
    let sink = Arc::new(MemorySink::default());
    let router = Router::new(
        registry,
        Arc::new(PatternClassifier::default()),
        Arc::new(PolicyStore::new(RoutingPolicy::default())),
    )
    .with_sink(sink.clone());
    (router, sink)
}

fn ids(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|s| s.to_string()).collect()
}

#[test]
fn similarity_request_goes_to_embedding_worker() {
    let (router, sink) = router_with(scenario_workers());
    let request = RouteRequest::new("find documents similar to this report").with_id("req-a");

    let decision = router.route(&request, &ids(&["w1", "w2"])).unwrap();

    assert_eq!(decision.task_class, TaskClass::Similarity);
    assert_eq!(decision.selected_worker, "w1");
    assert_eq!(decision.confidence, 0.95);
    assert_eq!(decision.route_kind, RouteKind::Specialized);
    assert_eq!(decision.request_id, "req-a");
    assert_eq!(sink.decisions.lock().unwrap().len(), 1);
}

#[test]
fn missing_specialist_falls_back_to_best_generative() {
    let (router, _) = router_with(vec![
        worker("gen-a", WorkerKind::generative(), &[TaskClass::Conversation], 0.6),
        worker("gen-b", WorkerKind::generative(), &[TaskClass::Conversation], 0.8),
        worker("emb", WorkerKind::embedding(), &[TaskClass::Embedding], 0.99),
    ]);
    let request = RouteRequest::new("write a function in python").with_id("r1");

    let decision = router
        .route(&request, &ids(&["gen-a", "gen-b", "emb"]))
        .unwrap();

    assert_eq!(decision.task_class, TaskClass::CodeGeneration);
    assert_eq!(decision.selected_worker, "gen-b");
    assert_eq!(decision.confidence, GENERIC_FALLBACK_CONFIDENCE);
    assert_eq!(decision.route_kind, RouteKind::GenericFallback);
    assert!(decision.rationale.contains("generic fallback"));
}

#[test]
fn no_generative_worker_uses_first_in_input_order() {
    let (router, _) = router_with(vec![
        worker("emb-a", WorkerKind::embedding(), &[TaskClass::Embedding], 0.4),
        worker("coder", WorkerKind::new("code"), &[TaskClass::CodeGeneration], 0.9),
    ]);
    let request = RouteRequest::new("write a poem about the sea").with_id("r1");

    let decision = router.route(&request, &ids(&["emb-a", "coder"])).unwrap();

    assert_eq!(decision.selected_worker, "emb-a");
    assert_eq!(decision.confidence, LAST_RESORT_CONFIDENCE);
    assert_eq!(decision.route_kind, RouteKind::LastResort);
    assert!(decision.rationale.contains("last-resort fallback"));
}

#[test]
fn empty_worker_set_fails() {
    let (router, sink) = router_with(scenario_workers());
    let request = RouteRequest::new("hello").with_id("r1");

    let result = router.route(&request, &[]);
    assert_eq!(
        result,
        Err(RoutingError::NoWorkersAvailable {
            request_id: "r1".to_string()
        })
    );
    assert!(sink.decisions.lock().unwrap().is_empty());
}

#[test]
fn unregistered_ids_do_not_count_as_available() {
    let (router, _) = router_with(scenario_workers());
    let request = RouteRequest::new("hello").with_id("r1");

    let result = router.route(&request, &ids(&["ghost"]));
    assert!(matches!(result, Err(RoutingError::NoWorkersAvailable { .. })));
}

#[test]
fn duplicate_request_id_is_rejected() {
    let (router, sink) = router_with(scenario_workers());
    let request = RouteRequest::new("hello").with_id("same");

    router.route(&request, &ids(&["w1", "w2"])).unwrap();
    let second = router.route(&request, &ids(&["w1", "w2"]));

    assert_eq!(
        second,
        Err(RoutingError::DuplicateRequestId {
            request_id: "same".to_string()
        })
    );
    assert_eq!(sink.decisions.lock().unwrap().len(), 1);
    assert_eq!(router.routing_stats().total_decisions, 1);
}

#[test]
fn missing_request_id_is_generated() {
    let (router, _) = router_with(scenario_workers());

    let a = router.route_all(&RouteRequest::new("hello")).unwrap();
    let b = router.route_all(&RouteRequest::new("hello")).unwrap();

    assert_ne!(a.request_id, b.request_id);
    assert_eq!(a.request_id.len(), 36);
}

#[test]
fn specialized_tie_breaks_on_lowest_id() {
    let (router, _) = router_with(vec![
        worker("zz", WorkerKind::generative(), &[TaskClass::Reasoning], 0.7),
        worker("aa", WorkerKind::generative(), &[TaskClass::Reasoning], 0.7),
    ]);
    let decision = router
        .route_all(&RouteRequest::new("explain why the sky is blue"))
        .unwrap();
    assert_eq!(decision.selected_worker, "aa");
    assert!((decision.confidence - 0.8).abs() < 1e-9);
}

#[test]
fn policy_adjustment_changes_selection() {
    let (router, _) = router_with(vec![
        worker("a", WorkerKind::generative(), &[TaskClass::Conversation], 0.7),
        worker("b", WorkerKind::generative(), &[TaskClass::Conversation], 0.9),
    ]);
    router
        .policy()
        .update::<_, (), _>(|p| {
            p.worker_adjustments.insert("b".to_string(), -0.3);
            Ok(())
        })
        .unwrap();

    let decision = router.route_all(&RouteRequest::new("hello there")).unwrap();
    assert_eq!(decision.selected_worker, "a");
}

#[test]
fn fast_path_rule_pins_worker() {
    let (router, _) = router_with(scenario_workers());
    router
        .policy()
        .update::<_, (), _>(|p| {
            p.fast_paths.push(FastPathRule {
                prefix: "translate this to".to_string(),
                worker_id: "w1".to_string(),
                created_at: chrono::Utc::now(),
            });
            Ok(())
        })
        .unwrap();

    let decision = router
        .route_all(&RouteRequest::new("Translate this to German please"))
        .unwrap();
    assert_eq!(decision.selected_worker, "w1");
    assert_eq!(decision.route_kind, RouteKind::FastPath);
    assert!(decision.confidence <= CONFIDENCE_CAP);

    // Rule is skipped when its worker is not available
    let decision = router
        .route(
            &RouteRequest::new("Translate this to German please"),
            &ids(&["w2"]),
        )
        .unwrap();
    assert_eq!(decision.selected_worker, "w2");
    assert_ne!(decision.route_kind, RouteKind::FastPath);
}

#[test]
fn preview_is_truncated() {
    let (router, _) = router_with(scenario_workers());
    let text = "hello ".repeat(50);

    let decision = router.route_all(&RouteRequest::new(text)).unwrap();
    assert!(decision.request_preview.chars().count() <= DEFAULT_PREVIEW_CHARS + 3);
}

#[test]
fn best_worker_queries() {
    let (router, sink) = router_with(vec![
        worker("emb-low", WorkerKind::embedding(), &[TaskClass::Embedding], 0.5),
        worker("emb-high", WorkerKind::embedding(), &[TaskClass::Embedding], 0.8),
        worker("gen-chat", WorkerKind::generative(), &[TaskClass::Conversation], 0.9),
        worker("gen-code", WorkerKind::generative(), &[TaskClass::CodeGeneration], 0.6),
    ]);

    assert_eq!(router.best_embedding_worker().unwrap().id, "emb-high");
    assert_eq!(router.best_generative_worker(None).unwrap().id, "gen-chat");
    assert_eq!(
        router
            .best_generative_worker(Some(TaskClass::CodeGeneration))
            .unwrap()
            .id,
        "gen-code"
    );
    assert_eq!(
        router
            .best_generative_worker(Some(TaskClass::Clustering))
            .unwrap()
            .id,
        "gen-chat"
    );

    assert!(router.would_use_embedding("generate embeddings for these sentences"));
    assert!(!router.would_use_embedding("hello there"));

    // Queries have no side effects
    assert!(sink.decisions.lock().unwrap().is_empty());
    assert_eq!(router.routing_stats().total_decisions, 0);
}

#[test]
fn best_worker_queries_on_empty_registry() {
    let (router, _) = router_with(vec![]);
    assert!(router.best_embedding_worker().is_none());
    assert!(router.best_generative_worker(None).is_none());
    assert!(!router.would_use_embedding("anything"));
}

#[test]
fn routing_stats_track_decisions() {
    let (router, _) = router_with(scenario_workers());
    router
        .route_all(&RouteRequest::new("find documents similar to this report"))
        .unwrap();
    router
        .route(&RouteRequest::new("write a function"), &ids(&["w2"]))
        .unwrap();

    let stats = router.routing_stats();
    assert_eq!(stats.total_decisions, 2);
    assert_eq!(stats.by_worker.get("w1"), Some(&1));
    assert_eq!(stats.by_worker.get("w2"), Some(&1));
    assert_eq!(stats.by_task.get(&TaskClass::Similarity), Some(&1));
    assert_eq!(stats.by_route_kind.get(&RouteKind::GenericFallback), Some(&1));
    assert!((stats.fallback_rate - 0.5).abs() < 1e-9);
    assert!((stats.avg_confidence - (0.95 + 0.5) / 2.0).abs() < 1e-6);
}

#[test]
fn concurrent_routes_record_unique_decisions() {
    let (router, sink) = router_with(scenario_workers());
    let router = Arc::new(router);

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let router = Arc::clone(&router);
            std::thread::spawn(move || {
                for i in 0..25 {
                    let request = RouteRequest::new("hello").with_id(format!("{}-{}", t, i));
                    router.route_all(&request).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let decisions = sink.decisions.lock().unwrap();
    let unique: HashSet<_> = decisions.iter().map(|d| d.request_id.clone()).collect();
    assert_eq!(decisions.len(), 200);
    assert_eq!(unique.len(), 200);
    assert_eq!(router.routing_stats().total_decisions, 200);
}

mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_worker(index: usize) -> impl Strategy<Value = WorkerProfile> {
        (
            prop::bool::ANY,
            prop::sample::subsequence(TaskClass::ALL.to_vec(), 0..4),
            0.0f64..=1.0,
        )
            .prop_map(move |(generative, tasks, score)| {
                let kind = if generative {
                    WorkerKind::generative()
                } else {
                    WorkerKind::embedding()
                };
                worker(&format!("w{}", index), kind, &tasks, score)
            })
    }

    proptest! {
        #[test]
        fn non_empty_worker_sets_always_route(
            workers in (1usize..6).prop_flat_map(|n| {
                (0..n).map(arb_worker).collect::<Vec<_>>()
            }),
            text in "[a-z ?]{0,60}",
        ) {
            let (router, _) = router_with(workers.clone());
            let available: Vec<String> = workers.iter().map(|w| w.id.clone()).collect();

            let decision = router.route(&RouteRequest::new(text), &available);
            prop_assert!(decision.is_ok());
            let decision = decision.unwrap();
            prop_assert!(decision.confidence >= 0.0);
            prop_assert!(decision.confidence <= CONFIDENCE_CAP);
            prop_assert!(available.contains(&decision.selected_worker));
        }
    }
}
