#![allow(dead_code)]

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, Response, header};
use issue_tracker::server::{self, AppState};
use issue_tracker::storage::{IssueStore, SqliteStorage};
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, Once};
use std::time::Instant;
use tower::ServiceExt;
use tracing::info;

static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        issue_tracker::logging::init_test_logging();
    });
}

pub struct TestLogGuard {
    name: String,
    start: Instant,
}

impl TestLogGuard {
    fn new(name: &str) -> Self {
        init_test_logging();
        info!("{name}: starting");
        Self {
            name: name.to_string(),
            start: Instant::now(),
        }
    }
}

impl Drop for TestLogGuard {
    fn drop(&mut self) {
        info!(
            "{}: assertions passed (elapsed {:?})",
            self.name,
            self.start.elapsed()
        );
    }
}

pub fn test_log(name: &str) -> TestLogGuard {
    TestLogGuard::new(name)
}

pub fn test_store() -> Arc<SqliteStorage> {
    init_test_logging();
    Arc::new(SqliteStorage::open_memory().expect("Failed to create test database"))
}

/// Router over a fresh in-memory store, plus the store for direct checks.
pub fn test_app_with_store() -> (Router, Arc<SqliteStorage>) {
    let storage = test_store();
    let store: Arc<dyn IssueStore> = storage.clone();
    (server::router(AppState::new(store), None), storage)
}

pub fn test_app() -> Router {
    test_app_with_store().0
}

pub fn test_app_with_static(dir: &Path) -> Router {
    let store: Arc<dyn IssueStore> = test_store();
    server::router(AppState::new(store), Some(dir))
}

pub fn json_request(method: Method, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("build request")
}

pub fn form_request(method: Method, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .expect("build request")
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .expect("build request")
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone()
        .oneshot(request)
        .await
        .unwrap_or_else(|err| panic!("router request failed: {err}"))
}

pub async fn response_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap_or_else(|err| panic!("failed to read response body: {err}"));
    String::from_utf8(bytes.to_vec()).unwrap_or_else(|err| panic!("body is not UTF-8: {err}"))
}

pub async fn response_json(response: Response<Body>) -> Value {
    let body = response_text(response).await;
    serde_json::from_str(&body)
        .unwrap_or_else(|err| panic!("response body is not JSON: {err}; body={body}"))
}

/// Send a JSON request and return the decoded body, asserting HTTP 200.
pub async fn call_json(app: &Router, method: Method, uri: &str, body: &Value) -> Value {
    let response = send(app, json_request(method, uri, body)).await;
    assert_eq!(response.status(), 200, "unexpected status for {uri}");
    response_json(response).await
}

pub async fn list(app: &Router, uri: &str) -> Vec<Value> {
    let response = send(app, get_request(uri)).await;
    assert_eq!(response.status(), 200);
    match response_json(response).await {
        Value::Array(items) => items,
        other => panic!("expected a JSON array, got {other}"),
    }
}

/// Replace store-assigned values so payloads can be snapshotted.
pub fn normalize_issue(mut value: Value) -> Value {
    if let Some(obj) = value.as_object_mut() {
        for (key, placeholder) in [
            ("_id", "ID"),
            ("created_on", "TIMESTAMP"),
            ("updated_on", "TIMESTAMP"),
        ] {
            if obj.contains_key(key) {
                obj.insert(key.to_string(), Value::String(placeholder.to_string()));
            }
        }
    }
    value
}
