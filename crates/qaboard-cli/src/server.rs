//! HTTP API over the aggregators.
//!
//! Routes:
//! - `GET /api/health`
//! - `GET /api/test-plans/:plan_id/tree?org&project&includeDetails&fields&roots`
//! - `GET /api/bugs`, `/api/pbi`, `/api/tasks` with `?iterationPath&qaName`
//! - `GET /api/metrics/bugs_by_severity?project`
//!
//! Remote failures map to 401 (credential rejected), 404 (not found) or 500.
//! Every request is logged at `info` with its status and latency.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use qaboard_core::testplan::{build_tree, split_list, EnrichmentRequest, PlanTree, TreeRequest};
use qaboard_core::workitems::{bugs_by_severity, fetch_backlog_items, fetch_bugs, fetch_tasks, QaScope};
use qaboard_core::{AdoClient, AdoProject, Config, Error, RemoteKind};
use qaboard_proto::{codes, BacklogItem, Bug, ErrorBody, Health, SeverityCounts, WorkTask};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{error, warn, Level};

/// Shared state of every handler.
#[derive(Debug)]
pub struct AppState {
    config: Config,
    client: AdoClient,
}

impl AppState {
    /// Fails when the configuration has no credential or an unusable base URL.
    pub fn new(config: Config) -> Result<Self, Error> {
        let client = AdoClient::from_config(&config)?;
        Ok(Self { config, client })
    }

    /// Project handle from the configured defaults.
    fn default_project(&self) -> Result<AdoProject, ApiError> {
        let org = self.config.organization_or(None)?;
        let project = self.config.project_or(None)?;
        Ok(self.client.project(org, project))
    }
}

/// Build the API router.
///
/// `cors_origin` of `None` or `"*"` allows any origin.
pub fn router(state: AppState, cors_origin: Option<&str>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/test-plans/:plan_id/tree", get(plan_tree))
        .route("/api/bugs", get(bugs))
        .route("/api/pbi", get(backlog_items))
        .route("/api/tasks", get(tasks))
        .route("/api/metrics/bugs_by_severity", get(severity))
        .layer(cors_layer(cors_origin))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(Arc::new(state))
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    match origin.filter(|o| *o != "*") {
        None => layer.allow_origin(Any),
        Some(origin) => match HeaderValue::from_str(origin) {
            Ok(value) => layer.allow_origin(AllowOrigin::exact(value)),
            Err(_) => {
                warn!(origin, "invalid CORS origin, allowing any");
                layer.allow_origin(Any)
            }
        },
    }
}

/// Handler failure, rendered as an [`ErrorBody`].
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Core(Error),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self::Core(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorBody::new(codes::INVALID_REQUEST, msg)),
            Self::Core(err) => {
                let status = match err.remote_kind() {
                    Some(RemoteKind::Unauthorized) => StatusCode::UNAUTHORIZED,
                    Some(RemoteKind::NotFound) => StatusCode::NOT_FOUND,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                error!(code = err.code(), status = status.as_u16(), "{err}");
                (status, ErrorBody::new(err.code(), err.to_string()))
            }
        };
        (status, Json(body)).into_response()
    }
}

async fn health() -> Json<Health> {
    Json(Health::ok())
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TreeParams {
    org: Option<String>,
    project: Option<String>,
    include_details: Option<String>,
    fields: Option<String>,
    roots: Option<String>,
}

impl TreeParams {
    fn enrichment(&self) -> EnrichmentRequest {
        let mut enrichment = EnrichmentRequest::default();
        if self.include_details.as_deref() == Some("true") {
            enrichment = enrichment.with_details(split_list(self.fields.as_deref().unwrap_or_default()));
        }
        enrichment.with_roots(split_list(self.roots.as_deref().unwrap_or_default()))
    }
}

async fn plan_tree(
    State(state): State<Arc<AppState>>,
    Path(plan_id): Path<i64>,
    Query(params): Query<TreeParams>,
) -> Result<Json<PlanTree>, ApiError> {
    let (Some(org), Some(project)) = (non_empty(&params.org), non_empty(&params.project)) else {
        return Err(ApiError::BadRequest(
            "org and project query parameters are required".to_string(),
        ));
    };

    let gateway = state.client.project(org, project);
    let request = TreeRequest::new(plan_id)
        .with_enrichment(params.enrichment())
        .with_concurrency(state.config.concurrency)
        .with_deadline(Some(state.config.timeout));

    Ok(Json(build_tree(&gateway, &request).await?))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QaParams {
    iteration_path: Option<String>,
    qa_name: Option<String>,
}

impl QaParams {
    fn scope(&self) -> Result<QaScope, ApiError> {
        match (non_empty(&self.iteration_path), non_empty(&self.qa_name)) {
            (Some(path), Some(qa)) => Ok(QaScope::new(path, qa)),
            _ => Err(ApiError::BadRequest(
                "iterationPath and qaName query parameters are required".to_string(),
            )),
        }
    }
}

async fn bugs(
    State(state): State<Arc<AppState>>,
    Query(params): Query<QaParams>,
) -> Result<Json<Vec<Bug>>, ApiError> {
    let scope = params.scope()?;
    let gateway = state.default_project()?;
    Ok(Json(fetch_bugs(&gateway, &scope, state.config.concurrency).await?))
}

async fn backlog_items(
    State(state): State<Arc<AppState>>,
    Query(params): Query<QaParams>,
) -> Result<Json<Vec<BacklogItem>>, ApiError> {
    let scope = params.scope()?;
    let gateway = state.default_project()?;
    Ok(Json(fetch_backlog_items(&gateway, &scope, state.config.concurrency).await?))
}

async fn tasks(
    State(state): State<Arc<AppState>>,
    Query(params): Query<QaParams>,
) -> Result<Json<Vec<WorkTask>>, ApiError> {
    let scope = params.scope()?;
    let gateway = state.default_project()?;
    Ok(Json(fetch_tasks(&gateway, &scope, state.config.concurrency).await?))
}

#[derive(Debug, Default, Deserialize)]
struct SeverityParams {
    project: Option<String>,
}

async fn severity(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SeverityParams>,
) -> Result<Json<SeverityCounts>, ApiError> {
    let Some(project) = non_empty(&params.project).or(state.config.project.as_deref()) else {
        return Err(ApiError::BadRequest("Missing project".to_string()));
    };
    let org = state.config.organization_or(None)?;
    let gateway = state.client.project(org, project);

    let counts = bugs_by_severity(&gateway, &state.config.severity_field, state.config.concurrency).await?;
    Ok(Json(counts))
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
