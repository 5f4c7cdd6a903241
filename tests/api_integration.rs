//! Integration tests for the HTTP API.

mod common;

use axum::http::StatusCode;
use common::{get, post_empty, post_json, send, test_app, UUID_V4_STRING_LEN};
use serde_json::json;
use tower::Service;

#[tokio::test]
async fn health_reports_workers() {
    let (mut app, _) = test_app();
    let (status, body) = send(&mut app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["workers"], 4);
    assert_eq!(body["policy_version"], 0);
}

#[tokio::test]
async fn route_selects_specialized_worker_and_generates_id() {
    let (mut app, _) = test_app();
    let (status, body) = send(
        &mut app,
        post_json("/v1/route", json!({ "text": "hello, how are you?" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["selected_worker"], "llama");
    assert_eq!(body["task_class"], "conversation");
    assert_eq!(body["route_kind"], "specialized");
    assert!((body["confidence"].as_f64().unwrap() - 0.95).abs() < 1e-9);
    assert_eq!(
        body["request_id"].as_str().unwrap().len(),
        UUID_V4_STRING_LEN
    );
}

#[tokio::test]
async fn route_falls_back_to_generative_worker() {
    let (mut app, _) = test_app();
    let (status, body) = send(
        &mut app,
        post_json(
            "/v1/route",
            json!({ "text": "refactor this rust code", "workers": ["minilm", "llama"] }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["selected_worker"], "llama");
    assert_eq!(body["route_kind"], "generic_fallback");
    assert_eq!(body["confidence"], 0.5);
}

#[tokio::test]
async fn route_last_resort_uses_first_available_worker() {
    let (mut app, _) = test_app();
    let (status, body) = send(
        &mut app,
        post_json(
            "/v1/route",
            json!({ "text": "write a poem about autumn", "workers": ["coder", "minilm"] }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["selected_worker"], "coder");
    assert_eq!(body["route_kind"], "last_resort");
    assert_eq!(body["confidence"], 0.3);
}

#[tokio::test]
async fn route_without_known_workers_is_503() {
    let (mut app, _) = test_app();
    let (status, body) = send(
        &mut app,
        post_json("/v1/route", json!({ "text": "hello", "workers": ["ghost"] })),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "no_workers_available");
}

#[tokio::test]
async fn duplicate_request_id_is_409() {
    let (mut app, state) = test_app();
    let request = json!({ "text": "hello there", "request_id": "turn-1" });

    let (first, _) = send(&mut app, post_json("/v1/route", request.clone())).await;
    let (second, body) = send(&mut app, post_json("/v1/route", request)).await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "duplicate_request_id");
    assert_eq!(state.analyzer.ledger_len(), 1);
}

#[tokio::test]
async fn outcome_for_routed_request_is_recorded() {
    let (mut app, state) = test_app();
    send(
        &mut app,
        post_json("/v1/route", json!({ "text": "find the quarterly report", "request_id": "q1" })),
    )
    .await;

    let (status, _) = send(
        &mut app,
        post_json(
            "/v1/outcomes/q1",
            json!({ "latency_ms": 120.0, "success": true, "user_satisfaction": 0.9 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let entry = state.analyzer.entry("q1").unwrap();
    assert_eq!(entry.outcome.success, Some(true));

    let (_, summary) = send(&mut app, get("/v1/stats/performance")).await;
    assert_eq!(summary["ledger_entries"], 1);
    assert_eq!(summary["outcomes_recorded"], 1);
}

#[tokio::test]
async fn outcome_for_unknown_request_is_404() {
    let (mut app, _) = test_app();
    let (status, body) = send(
        &mut app,
        post_json("/v1/outcomes/never-routed", json!({ "success": false })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "unknown_request");
}

#[tokio::test]
async fn workers_endpoint_includes_effective_score() {
    let (mut app, _) = test_app();
    let (status, body) = send(&mut app, get("/v1/workers")).await;

    assert_eq!(status, StatusCode::OK);
    let workers = body.as_array().unwrap();
    assert_eq!(workers.len(), 4);
    let minilm = workers.iter().find(|w| w["id"] == "minilm").unwrap();
    assert_eq!(minilm["effective_score"], 0.9);
    assert_eq!(minilm["adjustment"], 0.0);
}

#[tokio::test]
async fn routing_stats_count_decisions() {
    let (mut app, _) = test_app();
    for text in ["hello there", "find the report", "hello again"] {
        send(&mut app, post_json("/v1/route", json!({ "text": text }))).await;
    }

    let (status, body) = send(&mut app, get("/v1/stats/routing")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_decisions"], 3);
    assert_eq!(body["by_worker"]["llama"], 2);
    assert_eq!(body["fallback_rate"], 0.0);
}

#[tokio::test]
async fn analysis_reports_insufficient_data() {
    let (mut app, _) = test_app();
    send(&mut app, post_json("/v1/route", json!({ "text": "hello" }))).await;

    let (status, body) = send(&mut app, get("/v1/analysis?window_days=3")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "insufficient_data");
    assert_eq!(body["found"], 1);
    assert_eq!(body["required"], 10);

    let (_, suggestions) = send(&mut app, get("/v1/suggestions")).await;
    assert_eq!(suggestions, json!([]));
}

#[tokio::test]
async fn forced_cycle_without_data_is_skipped() {
    let (mut app, _) = test_app();

    let (status, report) = send(&mut app, post_empty("/v1/optimizer/cycle")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["outcome"], "skipped");
    assert_eq!(report["cycle"], 1);

    let (_, status_body) = send(&mut app, get("/v1/optimizer/status")).await;
    assert_eq!(status_body["cycles_run"], 1);
    assert_eq!(status_body["last_cycle"]["outcome"], "skipped");

    let (_, history) = send(&mut app, get("/v1/optimizer/history?limit=5")).await;
    assert_eq!(history, json!([]));
}

#[tokio::test]
async fn metrics_endpoint_serves_prometheus_text() {
    let (mut app, _) = test_app();
    let response = app.call(get("/metrics")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()["content-type"].to_str().unwrap();
    assert!(content_type.starts_with("text/plain"));
}

#[tokio::test]
async fn unknown_route_is_404() {
    let (mut app, _) = test_app();
    let (status, _) = send(&mut app, get("/v1/nothing-here")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
