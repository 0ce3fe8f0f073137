//! HTTP surface.
//!
//! Routes the four verbs on `/api/issues/{project}` to the resource
//! handlers, runs them on the blocking pool against the injected store, and
//! renders results as JSON. Optional static front-end routes are mounted when
//! a static directory is configured.

mod payload;
mod response;

pub use payload::{Payload, is_json_content_type};
pub use response::ApiFailure;

use crate::api::{self, Confirmation, Operation};
use crate::error::TrackerError;
use crate::model::Issue;
use crate::storage::IssueStore;
use axum::extract::{Path, RawQuery, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::routing::get;
use axum::{Json, Router};
use std::path::Path as FsPath;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared router state: the injected store handle.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn IssueStore>,
}

impl AppState {
    #[must_use]
    pub fn new(store: Arc<dyn IssueStore>) -> Self {
        Self { store }
    }
}

/// Build the application router.
pub fn router(state: AppState, static_dir: Option<&FsPath>) -> Router {
    let mut app = Router::new().route(
        "/api/issues/{project}",
        get(list_issues)
            .post(create_issue)
            .put(update_issue)
            .delete(delete_issue),
    );

    if let Some(dir) = static_dir {
        app = app.merge(static_routes(dir));
    }

    app.fallback(not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_XSS_PROTECTION,
            HeaderValue::from_static("0"),
        ))
}

fn static_routes(dir: &FsPath) -> Router<AppState> {
    let views = dir.join("views");
    Router::new()
        .nest_service("/public", ServeDir::new(dir.join("public")))
        .route_service("/", ServeFile::new(views.join("index.html")))
        .route_service("/{project}/", ServeFile::new(views.join("issue.html")))
}

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not Found")
}

async fn list_issues(
    State(state): State<AppState>,
    Path(project): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<Json<Vec<Issue>>, ApiFailure> {
    let params: Vec<(String, String)> = query
        .as_deref()
        .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default();
    let issues = blocking(&state, Operation::List, move |store| {
        api::list::execute(store, &project, &params)
    })
    .await?;
    Ok(Json(issues))
}

async fn create_issue(
    State(state): State<AppState>,
    Path(project): Path<String>,
    Payload(payload): Payload,
) -> Result<Json<Issue>, ApiFailure> {
    let issue = blocking(&state, Operation::Create, move |store| {
        api::create::execute(store, &project, &payload)
    })
    .await?;
    Ok(Json(issue))
}

async fn update_issue(
    State(state): State<AppState>,
    Path(project): Path<String>,
    Payload(payload): Payload,
) -> Result<Json<Confirmation>, ApiFailure> {
    let confirmation = blocking(&state, Operation::Update, move |store| {
        api::update::execute(store, &project, &payload)
    })
    .await?;
    Ok(Json(confirmation))
}

async fn delete_issue(
    State(state): State<AppState>,
    Path(project): Path<String>,
    Payload(payload): Payload,
) -> Result<Json<Confirmation>, ApiFailure> {
    let confirmation = blocking(&state, Operation::Delete, move |store| {
        api::delete::execute(store, &project, &payload)
    })
    .await?;
    Ok(Json(confirmation))
}

/// Run a handler on the blocking pool. A lost worker is a store failure.
async fn blocking<T, F>(state: &AppState, op: Operation, f: F) -> Result<T, ApiFailure>
where
    F: FnOnce(&dyn IssueStore) -> crate::error::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let store = Arc::clone(&state.store);
    tokio::task::spawn_blocking(move || f(store.as_ref()))
        .await
        .unwrap_or_else(|err| {
            Err(TrackerError::store_unavailable(format!(
                "{op} task failed: {err}"
            )))
        })
        .map_err(|err| ApiFailure::new(&err, op))
}

/// Resolve when the process receives Ctrl-C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %err, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("Shutdown signal received");
}
