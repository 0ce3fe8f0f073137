//! HTTP-level tests for `/api/issues/{project}`.

mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use common::{
    call_json, form_request, get_request, json_request, list, normalize_issue, response_json,
    response_text, send, test_app, test_app_with_store, test_log,
};
use insta::assert_json_snapshot;
use issue_tracker::error::{Result, TrackerError};
use issue_tracker::model::{Issue, IssueId, IssueUpdate, NewIssue};
use issue_tracker::server::{self, AppState};
use issue_tracker::storage::{IssueQuery, IssueStore};
use issue_tracker::util::time::parse_timestamp;
use serde_json::{Value, json};
use std::sync::Arc;

const URI: &str = "/api/issues/apitest";

async fn create(app: &axum::Router, body: &Value) -> Value {
    call_json(app, Method::POST, URI, body).await
}

async fn create_minimal(app: &axum::Router, title: &str) -> Value {
    create(
        app,
        &json!({"issue_title": title, "issue_text": "text", "created_by": "Functional Test"}),
    )
    .await
}

fn id_of(issue: &Value) -> String {
    issue["_id"].as_str().expect("_id").to_string()
}

#[tokio::test]
async fn create_with_every_field() {
    let _log = test_log("create_with_every_field");
    let app = test_app();

    let body = create(
        &app,
        &json!({
            "issue_title": "Title 1",
            "issue_text": "text",
            "created_by": "Functional Test - Every field filled in",
            "assigned_to": "Chai and Mocha",
            "status_text": "In QA",
        }),
    )
    .await;

    assert_json_snapshot!(normalize_issue(body), @r#"
    {
      "_id": "ID",
      "assigned_to": "Chai and Mocha",
      "created_by": "Functional Test - Every field filled in",
      "created_on": "TIMESTAMP",
      "issue_text": "text",
      "issue_title": "Title 1",
      "open": true,
      "project": "apitest",
      "status_text": "In QA",
      "updated_on": "TIMESTAMP"
    }
    "#);
}

#[tokio::test]
async fn create_with_required_fields_only() {
    let _log = test_log("create_with_required_fields_only");
    let app = test_app();

    let body = create_minimal(&app, "Title 2").await;
    assert_eq!(body["open"], true);
    assert_eq!(body["assigned_to"], "");
    assert_eq!(body["status_text"], "");
    assert_eq!(body["_id"].as_str().map(str::len), Some(24));
    assert_eq!(body["created_on"], body["updated_on"]);
}

#[tokio::test]
async fn create_ignores_client_open_and_id() {
    let _log = test_log("create_ignores_client_open_and_id");
    let app = test_app();

    let body = create(
        &app,
        &json!({
            "issue_title": "T",
            "issue_text": "x",
            "created_by": "C",
            "open": false,
            "_id": "000000000000000000000000",
        }),
    )
    .await;
    assert_eq!(body["open"], true);
    assert_ne!(body["_id"], "000000000000000000000000");
}

#[tokio::test]
async fn create_missing_required_fields_persists_nothing() {
    let _log = test_log("create_missing_required_fields_persists_nothing");
    let (app, store) = test_app_with_store();

    for body in [
        json!({"issue_title": "Title 3", "created_by": "C"}),
        json!({"issue_text": "x", "created_by": "C"}),
        json!({"issue_title": "T", "issue_text": "x"}),
        json!({"issue_title": "T", "issue_text": "x", "created_by": ""}),
        json!({}),
    ] {
        let response = create(&app, &body).await;
        assert_eq!(response, json!({"error": "required field(s) missing"}), "{body}");
    }

    let stored = store
        .find(&IssueQuery::for_project("apitest"))
        .expect("find");
    assert!(stored.is_empty());
}

#[tokio::test]
async fn create_accepts_form_bodies() {
    let _log = test_log("create_accepts_form_bodies");
    let app = test_app();

    let response = send(
        &app,
        form_request(
            Method::POST,
            URI,
            "issue_title=Form+issue&issue_text=a%26b&created_by=Tester&assigned_to=",
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["issue_title"], "Form issue");
    assert_eq!(body["issue_text"], "a&b");
    assert_eq!(body["assigned_to"], "");
}

#[tokio::test]
async fn list_scopes_to_path_project() {
    let _log = test_log("list_scopes_to_path_project");
    let app = test_app();

    create_minimal(&app, "mine").await;
    call_json(
        &app,
        Method::POST,
        "/api/issues/elsewhere",
        &json!({"issue_title": "theirs", "issue_text": "x", "created_by": "C"}),
    )
    .await;

    let issues = list(&app, URI).await;
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0]["issue_title"], "mine");
    assert_eq!(issues[0]["project"], "apitest");

    // A project key in the query never widens the scope.
    let issues = list(&app, "/api/issues/apitest?project=elsewhere").await;
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0]["issue_title"], "mine");

    assert!(list(&app, "/api/issues/nobody").await.is_empty());
}

#[tokio::test]
async fn list_filters_by_open_and_intersects() {
    let _log = test_log("list_filters_by_open_and_intersects");
    let app = test_app();

    let a = create(
        &app,
        &json!({"issue_title": "a", "issue_text": "x", "created_by": "alice", "assigned_to": "bob"}),
    )
    .await;
    let b = create(
        &app,
        &json!({"issue_title": "b", "issue_text": "x", "created_by": "alice"}),
    )
    .await;
    create(
        &app,
        &json!({"issue_title": "c", "issue_text": "x", "created_by": "carol", "assigned_to": "bob"}),
    )
    .await;

    let closed = call_json(
        &app,
        Method::PUT,
        URI,
        &json!({"_id": id_of(&b), "open": "false"}),
    )
    .await;
    assert_eq!(closed["result"], "successfully updated");

    let open = list(&app, "/api/issues/apitest?open=true").await;
    assert_eq!(open.len(), 2);
    assert!(open.iter().all(|issue| issue["open"] == true));

    let closed = list(&app, "/api/issues/apitest?open=false").await;
    assert_eq!(closed.len(), 1);
    assert_eq!(closed[0]["_id"], b["_id"]);

    let both = list(&app, "/api/issues/apitest?created_by=alice&assigned_to=bob").await;
    assert_eq!(both.len(), 1);
    assert_eq!(both[0]["_id"], a["_id"]);

    let none = list(&app, "/api/issues/apitest?created_by=alice&created_by=carol").await;
    assert!(none.is_empty());

    assert!(list(&app, "/api/issues/apitest?open=maybe").await.is_empty());
    assert_eq!(list(&app, "/api/issues/apitest?colour=green").await.len(), 3);
}

#[tokio::test]
async fn read_back_by_id_matches_creation_echo() {
    let _log = test_log("read_back_by_id_matches_creation_echo");
    let app = test_app();

    let created = create(
        &app,
        &json!({
            "issue_title": "Round trip",
            "issue_text": "text",
            "created_by": "C",
            "status_text": "New",
        }),
    )
    .await;

    let found = list(&app, &format!("{URI}?_id={}", id_of(&created))).await;
    assert_eq!(found, vec![created.clone()]);

    let by_time = list(
        &app,
        &format!(
            "{URI}?created_on={}",
            created["created_on"].as_str().expect("created_on")
        ),
    )
    .await;
    assert_eq!(by_time, vec![created]);

    assert!(list(&app, &format!("{URI}?_id=not-an-id")).await.is_empty());
}

#[tokio::test]
async fn update_applies_fields_and_refreshes_updated_on() {
    let _log = test_log("update_applies_fields_and_refreshes_updated_on");
    let app = test_app();

    let created = create_minimal(&app, "Before").await;
    let id = id_of(&created);

    let response = call_json(
        &app,
        Method::PUT,
        URI,
        &json!({"_id": id, "issue_title": "After", "assigned_to": "Tester", "status_text": ""}),
    )
    .await;
    assert_eq!(response, json!({"result": "successfully updated", "_id": id}));

    let stored = list(&app, &format!("{URI}?_id={id}")).await.remove(0);
    assert_eq!(stored["issue_title"], "After");
    assert_eq!(stored["assigned_to"], "Tester");
    assert_eq!(stored["status_text"], "");
    assert_eq!(stored["issue_text"], "text");
    assert_eq!(stored["created_on"], created["created_on"]);

    let ts = |value: &Value, key: &str| {
        parse_timestamp(value[key].as_str().expect("timestamp")).expect("parse timestamp")
    };
    assert!(ts(&stored, "updated_on") >= ts(&created, "updated_on"));
    assert!(ts(&stored, "updated_on") >= ts(&stored, "created_on"));

    call_json(&app, Method::PUT, URI, &json!({"_id": id, "issue_text": "again"})).await;
    let again = list(&app, &format!("{URI}?_id={id}")).await.remove(0);
    assert!(ts(&again, "updated_on") >= ts(&stored, "updated_on"));
}

#[tokio::test]
async fn update_open_coercion() {
    let _log = test_log("update_open_coercion");
    let app = test_app();

    let id = id_of(&create_minimal(&app, "Toggle").await);
    let read = |app: axum::Router, id: String| async move {
        list(&app, &format!("{URI}?_id={id}")).await.remove(0)
    };

    call_json(&app, Method::PUT, URI, &json!({"_id": id, "open": "false"})).await;
    assert_eq!(read(app.clone(), id.clone()).await["open"], false);

    // Empty open is not admitted; the stored value stays false.
    call_json(
        &app,
        Method::PUT,
        URI,
        &json!({"_id": id, "open": "", "status_text": "Parked"}),
    )
    .await;
    let stored = read(app.clone(), id.clone()).await;
    assert_eq!(stored["open"], false);
    assert_eq!(stored["status_text"], "Parked");

    call_json(&app, Method::PUT, URI, &json!({"_id": id, "open": true})).await;
    assert_eq!(read(app.clone(), id.clone()).await["open"], true);
}

#[tokio::test]
async fn update_error_cases() {
    let _log = test_log("update_error_cases");
    let app = test_app();
    let id = id_of(&create_minimal(&app, "Target").await);

    let missing = call_json(&app, Method::PUT, URI, &json!({"issue_text": "x"})).await;
    assert_json_snapshot!(missing, @r#"
    {
      "error": "missing _id"
    }
    "#);

    let no_fields = call_json(&app, Method::PUT, URI, &json!({"_id": id})).await;
    assert_eq!(no_fields, json!({"error": "no update field(s) sent", "_id": id}));

    let blank_fields = call_json(
        &app,
        Method::PUT,
        URI,
        &json!({"_id": id, "issue_title": "", "assigned_to": ""}),
    )
    .await;
    assert_eq!(blank_fields, no_fields);

    let immutable = call_json(
        &app,
        Method::PUT,
        URI,
        &json!({"_id": id, "project": "elsewhere", "created_on": "2020-01-01T00:00:00Z"}),
    )
    .await;
    assert_eq!(immutable, no_fields);

    let malformed = call_json(
        &app,
        Method::PUT,
        URI,
        &json!({"_id": "5871dda29faedc3491ff93bb-bad", "issue_text": "x"}),
    )
    .await;
    assert_json_snapshot!(malformed, @r#"
    {
      "_id": "5871dda29faedc3491ff93bb-bad",
      "error": "could not update"
    }
    "#);

    let unknown = call_json(
        &app,
        Method::PUT,
        URI,
        &json!({"_id": "5871dda29faedc3491ff93bb", "issue_text": "x"}),
    )
    .await;
    assert_eq!(
        unknown,
        json!({"error": "could not update", "_id": "5871dda29faedc3491ff93bb"})
    );
}

#[tokio::test]
async fn delete_error_cases() {
    let _log = test_log("delete_error_cases");
    let app = test_app();

    let missing = call_json(&app, Method::DELETE, URI, &json!({})).await;
    assert_eq!(missing, json!({"error": "missing _id"}));

    let empty_body = send(
        &app,
        Request::builder()
            .method(Method::DELETE)
            .uri(URI)
            .body(Body::empty())
            .expect("request"),
    )
    .await;
    assert_eq!(empty_body.status(), StatusCode::OK);
    assert_eq!(response_json(empty_body).await, missing);

    let malformed = call_json(&app, Method::DELETE, URI, &json!({"_id": "abc"})).await;
    assert_eq!(malformed, json!({"error": "could not delete", "_id": "abc"}));
}

#[tokio::test]
async fn post_put_delete_delete_scenario() {
    let _log = test_log("post_put_delete_delete_scenario");
    let app = test_app();

    let created = create(
        &app,
        &json!({"issue_title": "T", "issue_text": "x", "created_by": "C"}),
    )
    .await;
    assert_eq!(created["open"], true);
    assert_eq!(created["assigned_to"], "");
    let id = id_of(&created);

    let put = call_json(&app, Method::PUT, URI, &json!({"_id": id})).await;
    assert_eq!(put, json!({"error": "no update field(s) sent", "_id": id}));

    let first = call_json(&app, Method::DELETE, URI, &json!({"_id": id})).await;
    assert_eq!(first, json!({"result": "successfully deleted", "_id": id}));

    let second = call_json(&app, Method::DELETE, URI, &json!({"_id": id})).await;
    assert_eq!(second, json!({"error": "could not delete", "_id": id}));

    assert!(list(&app, URI).await.is_empty());
}

#[tokio::test]
async fn delete_with_form_body() {
    let _log = test_log("delete_with_form_body");
    let app = test_app();
    let id = id_of(&create_minimal(&app, "Form delete").await);

    let response = send(&app, form_request(Method::DELETE, URI, &format!("_id={id}"))).await;
    assert_eq!(
        response_json(response).await,
        json!({"result": "successfully deleted", "_id": id})
    );
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let _log = test_log("malformed_json_is_bad_request");
    let app = test_app();

    let response = send(
        &app,
        Request::builder()
            .method(Method::POST)
            .uri(URI)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"issue_title\":"))
            .expect("request"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response_json(response).await,
        json!({"error": "invalid request body"})
    );

    let response = send(&app, json_request(Method::PUT, URI, &json!(["_id"]))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_routes_are_plain_not_found() {
    let _log = test_log("unknown_routes_are_plain_not_found");
    let app = test_app();

    let response = send(&app, get_request("/api/unknown")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response_text(response).await, "Not Found");
}

#[tokio::test]
async fn security_and_cors_headers() {
    let _log = test_log("security_and_cors_headers");
    let app = test_app();

    let response = send(
        &app,
        Request::builder()
            .method(Method::GET)
            .uri(URI)
            .header(header::ORIGIN, "https://example.com")
            .body(Body::empty())
            .expect("request"),
    )
    .await;
    let headers = response.headers();
    assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert!(headers.contains_key(header::X_XSS_PROTECTION));
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

#[tokio::test]
async fn echoed_id_is_stored_key_on_success_and_raw_input_on_error() {
    let _log = test_log("echoed_id_is_stored_key_on_success_and_raw_input_on_error");
    let app = test_app();
    let id = id_of(&create_minimal(&app, "Echo").await);
    let sent = format!(" {} ", id.to_ascii_uppercase());

    let no_fields = call_json(&app, Method::PUT, URI, &json!({"_id": sent})).await;
    assert_eq!(no_fields, json!({"error": "no update field(s) sent", "_id": sent}));

    let updated = call_json(
        &app,
        Method::PUT,
        URI,
        &json!({"_id": sent, "status_text": "Triaged"}),
    )
    .await;
    assert_eq!(updated, json!({"result": "successfully updated", "_id": id}));

    let deleted = call_json(&app, Method::DELETE, URI, &json!({"_id": sent})).await;
    assert_eq!(deleted, json!({"result": "successfully deleted", "_id": id}));

    let again = call_json(&app, Method::DELETE, URI, &json!({"_id": sent})).await;
    assert_eq!(again, json!({"error": "could not delete", "_id": sent}));
}

#[tokio::test]
async fn oversized_body_is_payload_too_large() {
    let _log = test_log("oversized_body_is_payload_too_large");
    let (app, store) = test_app_with_store();

    let body = json!({
        "issue_title": "Big",
        "issue_text": "x".repeat(3 * 1024 * 1024),
        "created_by": "C",
    });
    let response = send(&app, json_request(Method::POST, URI, &body)).await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(
        response_json(response).await,
        json!({"error": "request body too large"})
    );

    let stored = store
        .find(&IssueQuery::for_project("apitest"))
        .expect("find");
    assert!(stored.is_empty());
}

/// A store whose every call fails.
struct UnavailableStore;

impl IssueStore for UnavailableStore {
    fn insert(&self, _new: NewIssue) -> Result<Issue> {
        Err(TrackerError::store_unavailable("disk detached"))
    }

    fn find(&self, _query: &IssueQuery) -> Result<Vec<Issue>> {
        Err(TrackerError::store_unavailable("disk detached"))
    }

    fn find_by_id(&self, _id: &IssueId) -> Result<Option<Issue>> {
        Err(TrackerError::store_unavailable("disk detached"))
    }

    fn update_by_id(&self, _id: &IssueId, _update: &IssueUpdate) -> Result<Option<Issue>> {
        Err(TrackerError::store_unavailable("disk detached"))
    }

    fn delete_by_id(&self, _id: &IssueId) -> Result<Option<Issue>> {
        Err(TrackerError::store_unavailable("disk detached"))
    }
}

/// A store that panics on every call, killing the blocking task.
struct PanickingStore;

impl IssueStore for PanickingStore {
    fn insert(&self, _new: NewIssue) -> Result<Issue> {
        panic!("insert crashed")
    }

    fn find(&self, _query: &IssueQuery) -> Result<Vec<Issue>> {
        panic!("find crashed")
    }

    fn find_by_id(&self, _id: &IssueId) -> Result<Option<Issue>> {
        panic!("find_by_id crashed")
    }

    fn update_by_id(&self, _id: &IssueId, _update: &IssueUpdate) -> Result<Option<Issue>> {
        panic!("update_by_id crashed")
    }

    fn delete_by_id(&self, _id: &IssueId) -> Result<Option<Issue>> {
        panic!("delete_by_id crashed")
    }
}

fn app_over(store: Arc<dyn IssueStore>) -> axum::Router {
    server::router(AppState::new(store), None)
}

async fn assert_store_unavailable(app: &axum::Router, request: Request<Body>) {
    let response = send(app, request).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response_json(response).await,
        json!({"error": "store unavailable"})
    );
}

#[tokio::test]
async fn store_failures_are_server_errors() {
    let _log = test_log("store_failures_are_server_errors");
    let app = app_over(Arc::new(UnavailableStore));
    let id = "5f1d7f3e2a9b4c0d1e2f3a4b";

    assert_store_unavailable(&app, get_request(URI)).await;
    assert_store_unavailable(
        &app,
        json_request(
            Method::POST,
            URI,
            &json!({"issue_title": "T", "issue_text": "x", "created_by": "C"}),
        ),
    )
    .await;
    assert_store_unavailable(
        &app,
        json_request(Method::PUT, URI, &json!({"_id": id, "issue_text": "y"})),
    )
    .await;
    assert_store_unavailable(&app, json_request(Method::DELETE, URI, &json!({"_id": id}))).await;

    // Request errors are still decided before the store is touched.
    let missing = call_json(&app, Method::DELETE, URI, &json!({})).await;
    assert_eq!(missing, json!({"error": "missing _id"}));
}

#[tokio::test]
async fn crashed_store_task_is_a_server_error() {
    let _log = test_log("crashed_store_task_is_a_server_error");
    let app = app_over(Arc::new(PanickingStore));

    assert_store_unavailable(&app, get_request(URI)).await;
    assert_store_unavailable(
        &app,
        json_request(
            Method::POST,
            URI,
            &json!({"issue_title": "T", "issue_text": "x", "created_by": "C"}),
        ),
    )
    .await;
}
