//! Shared helpers for Switchboard integration tests.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use switchboard::api::{create_router, AppState};
use switchboard::config::SwitchboardConfig;
use tower::Service;

/// UUID v4 string length: "xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx"
pub const UUID_V4_STRING_LEN: usize = 36;

/// Four workers: two embedding, one generative, one code worker.
pub const TEST_CONFIG: &str = r#"
[registry]
allowed_kinds = ["embedding", "generative", "code"]

[[workers]]
id = "minilm"
kind = "embedding"
supported_tasks = ["embedding", "similarity", "clustering", "search"]
performance_score = 0.9
resource_tier = "low"

[[workers]]
id = "doc-reader"
kind = "embedding"
supported_tasks = ["document_analysis", "search"]
performance_score = 0.8

[[workers]]
id = "llama"
kind = "generative"
supported_tasks = ["conversation", "text_generation", "question_answering", "reasoning"]
performance_score = 0.85
resource_tier = "high"

[[workers]]
id = "coder"
kind = "code"
supported_tasks = ["code_generation"]
performance_score = 0.8
resource_tier = "high"
"#;

pub fn test_config() -> SwitchboardConfig {
    let config: SwitchboardConfig = toml::from_str(TEST_CONFIG).expect("test config parses");
    config.validate().expect("test config is valid");
    config
}

pub fn test_state() -> Arc<AppState> {
    Arc::new(AppState::in_memory(&test_config()).expect("state builds"))
}

pub fn test_app() -> (axum::Router, Arc<AppState>) {
    let state = test_state();
    (create_router(Arc::clone(&state)), state)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn post_empty(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Send a request; the body is parsed as JSON (`Null` when empty or not JSON).
pub async fn send(app: &mut axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.call(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}
