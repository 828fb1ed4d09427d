//! Local stand-in for the Azure DevOps REST API.
//!
//! Plan 1:
//! - Smoke (10), cases 100 and 101, tester "Ana" on 100
//!   - Login (11), case 110
//! - Regression (20), cases 1000..1250
//!
//! Any other plan is a 404. WIQL queries for bugs return ids 1..=3.

#![allow(dead_code)]

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const PLAN_ID: i64 = 1;

/// `basic_auth("", Some("pat"))`
pub const PAT_AUTH: &str = "Basic OnBhdA==";

#[derive(Default, Debug)]
pub struct Log {
    pub paths: Vec<String>,
    pub auth: Vec<Option<String>>,
    pub batch_sizes: Vec<usize>,
    pub queries: Vec<String>,
}

#[derive(Clone)]
struct Stub {
    base: String,
    fail_with: Option<StatusCode>,
    log: Arc<Mutex<Log>>,
}

impl Stub {
    fn record(&self, uri: &Uri, headers: &HeaderMap) -> Result<(), StatusCode> {
        let mut log = self.log.lock().unwrap();
        log.paths.push(uri.path().to_string());
        log.auth.push(
            headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .map(String::from),
        );
        match self.fail_with {
            Some(status) => Err(status),
            None => Ok(()),
        }
    }
}

pub struct StubServer {
    pub base_url: String,
    pub log: Arc<Mutex<Log>>,
}

/// Serve the stub on an ephemeral port. `fail_with` makes every route answer with that status.
pub async fn spawn(fail_with: Option<StatusCode>) -> StubServer {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let log = Arc::new(Mutex::new(Log::default()));

    let stub = Stub {
        base: base.clone(),
        fail_with,
        log: Arc::clone(&log),
    };

    let app = Router::new()
        .route("/:org/:project/_apis/testplan/Plans/:plan/suites", get(root_suites))
        .route(
            "/:org/:project/_apis/testplan/Plans/:plan/suites/:suite/suites",
            get(child_suites),
        )
        .route(
            "/:org/:project/_apis/testplan/Plans/:plan/Suites/:suite/TestCase",
            get(test_cases),
        )
        .route(
            "/:org/:project/_apis/testplan/Plans/:plan/Suites/:suite/TestPoint",
            get(test_points),
        )
        .route("/:org/:project/_apis/wit/workitemsbatch", post(batch))
        .route("/:org/:project/_apis/wit/wiql", post(wiql))
        .with_state(stub);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    StubServer {
        base_url: format!("{base}/"),
        log,
    }
}

fn suites_under(parent: Option<i64>) -> Vec<(i64, &'static str, bool)> {
    match parent {
        None => vec![(10, "Smoke", true), (20, "Regression", false)],
        Some(10) => vec![(11, "Login", false)],
        Some(_) => Vec::new(),
    }
}

fn cases_of(suite: i64) -> Vec<(i64, String)> {
    match suite {
        10 => vec![(100, "Login works".into()), (101, "Logout works".into())],
        11 => vec![(110, "Password reset".into())],
        20 => (1000..1250).map(|id| (id, format!("Case {id}"))).collect(),
        _ => Vec::new(),
    }
}

fn suite_listing(stub: &Stub, uri: &Uri, params: &HashMap<String, String>, parent: Option<i64>) -> Result<Json<Value>, StatusCode> {
    if params.get("plan").map(String::as_str) != Some("1") {
        return Err(StatusCode::NOT_FOUND);
    }
    // Links reuse the (still percent-encoded) request prefix.
    let path = uri.path();
    let prefix = path.split("/suites").next().unwrap_or(path);
    let value: Vec<Value> = suites_under(parent)
        .into_iter()
        .map(|(id, name, has_children)| {
            json!({
                "id": id,
                "name": name,
                "hasChildren": has_children,
                "_links": {
                    "testCases": { "href": format!("{}{prefix}/Suites/{id}/TestCase", stub.base) },
                    "testPoints": { "href": format!("{}{prefix}/Suites/{id}/TestPoint", stub.base) }
                }
            })
        })
        .collect();
    Ok(Json(json!({ "value": value, "count": value.len() })))
}

async fn root_suites(
    State(stub): State<Stub>,
    Path(params): Path<HashMap<String, String>>,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Json<Value>, StatusCode> {
    stub.record(&uri, &headers)?;
    suite_listing(&stub, &uri, &params, None)
}

async fn child_suites(
    State(stub): State<Stub>,
    Path(params): Path<HashMap<String, String>>,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Json<Value>, StatusCode> {
    stub.record(&uri, &headers)?;
    let parent = params.get("suite").and_then(|s| s.parse().ok());
    suite_listing(&stub, &uri, &params, parent)
}

async fn test_cases(
    State(stub): State<Stub>,
    Path(params): Path<HashMap<String, String>>,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Json<Value>, StatusCode> {
    stub.record(&uri, &headers)?;
    let suite = params.get("suite").and_then(|s| s.parse().ok()).unwrap_or(0);
    let value: Vec<Value> = cases_of(suite)
        .into_iter()
        .map(|(id, name)| json!({ "workItem": { "id": id, "name": name } }))
        .collect();
    Ok(Json(json!({ "value": value })))
}

async fn test_points(
    State(stub): State<Stub>,
    Path(params): Path<HashMap<String, String>>,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Json<Value>, StatusCode> {
    stub.record(&uri, &headers)?;
    let value = match params.get("suite").map(String::as_str) {
        Some("10") => json!([
            { "testCase": { "id": 100 }, "assignedTo": { "displayName": "Ana" } },
            { "testCase": { "id": 101 } }
        ]),
        _ => json!([]),
    };
    Ok(Json(json!({ "value": value })))
}

async fn batch(
    State(stub): State<Stub>,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    stub.record(&uri, &headers)?;
    let ids: Vec<i64> = body["ids"]
        .as_array()
        .map(|ids| ids.iter().filter_map(Value::as_i64).collect())
        .unwrap_or_default();
    stub.log.lock().unwrap().batch_sizes.push(ids.len());

    let value: Vec<Value> = ids
        .iter()
        .map(|id| {
            json!({
                "id": id,
                "fields": {
                    "System.Id": id,
                    "System.State": "Active",
                    "System.Title": format!("Item {id}"),
                    "Microsoft.VSTS.Common.Severity": if id % 2 == 0 { "2 - High" } else { "3 - Medium" },
                    "Custom.AssignQA": if *id == 3 { "Bo" } else { "ana" }
                }
            })
        })
        .collect();
    Ok(Json(json!({ "count": value.len(), "value": value })))
}

async fn wiql(
    State(stub): State<Stub>,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    stub.record(&uri, &headers)?;
    let query = body["query"].as_str().unwrap_or_default().to_string();
    let ids: Vec<i64> = if query.contains("'Bug'") { vec![1, 2, 3] } else { Vec::new() };
    stub.log.lock().unwrap().queries.push(query);

    let refs: Vec<Value> = ids.iter().map(|id| json!({ "id": id })).collect();
    Ok(Json(json!({ "queryType": "flat", "workItems": refs })))
}
