//! Flat work-item views: bugs, backlog items and tasks per iteration and QA,
//! plus open-bug counts by severity.
//!
//! Every view is the same pipeline: query ids, batch-fetch a fixed field list,
//! filter client-side, map to a reduced record.

use crate::ado::{FieldMap, WorkGateway, WorkItem, WorkItemQuery};
use crate::error::Error;
use crate::testplan::fetch_in_chunks;
use qaboard_proto::{BacklogItem, Bug, SeverityCounts, WorkTask};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// Field reference names used by the views.
pub mod fields {
    pub const ID: &str = "System.Id";
    pub const TITLE: &str = "System.Title";
    pub const ASSIGNED_TO: &str = "System.AssignedTo";
    pub const SEVERITY: &str = "Microsoft.VSTS.Common.Severity";
    pub const PRIORITY: &str = "Microsoft.VSTS.Common.Priority";
    pub const COMPLETED_WORK: &str = "Microsoft.VSTS.Scheduling.CompletedWork";
    pub const REMAINING_WORK: &str = "Microsoft.VSTS.Scheduling.RemainingWork";
    pub const TARGETED_RELEASE: &str = "Custom.TargetedRelease";
    pub const ASSIGN_QA: &str = "Custom.AssignQA";
}

/// Work item type names.
pub mod types {
    pub const BUG: &str = "Bug";
    pub const BACKLOG_ITEM: &str = "Product Backlog Item";
    pub const TASK: &str = "Task";
}

/// States that count as no longer open.
pub const CLOSED_STATES: [&str; 4] = ["Closed", "Done", "Resolved", "Removed"];

/// Severity bucket for bugs without one.
pub const UNSPECIFIED_SEVERITY: &str = "Unspecified";

/// Which iteration and which QA engineer a view is scoped to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QaScope {
    pub iteration_path: String,
    pub qa_name: String,
}

impl QaScope {
    #[must_use]
    pub fn new(iteration_path: impl Into<String>, qa_name: impl Into<String>) -> Self {
        Self {
            iteration_path: iteration_path.into(),
            qa_name: qa_name.into(),
        }
    }

    /// Case-insensitive match against the QA name.
    fn matches(&self, name: Option<&str>) -> bool {
        name.is_some_and(|n| n.to_lowercase() == self.qa_name.to_lowercase())
    }
}

/// Bugs of the iteration whose `Custom.AssignQA` is the scoped QA.
pub async fn fetch_bugs<G: WorkGateway>(
    gateway: &G,
    scope: &QaScope,
    concurrency: usize,
) -> Result<Vec<Bug>, Error> {
    let wanted = [
        fields::ID,
        fields::TITLE,
        fields::SEVERITY,
        fields::PRIORITY,
        fields::TARGETED_RELEASE,
        fields::ASSIGN_QA,
    ];
    let items = fetch_iteration_items(gateway, types::BUG, scope, &wanted, concurrency).await?;

    Ok(items
        .into_iter()
        .filter(|wi| scope.matches(text(&wi.fields, fields::ASSIGN_QA).as_deref()))
        .map(|wi| Bug {
            id: wi.id,
            title: text(&wi.fields, fields::TITLE),
            severity: text(&wi.fields, fields::SEVERITY),
            priority: integer(&wi.fields, fields::PRIORITY),
            targeted_release: text(&wi.fields, fields::TARGETED_RELEASE),
            assign_qa: text(&wi.fields, fields::ASSIGN_QA),
        })
        .collect())
}

/// Product backlog items of the iteration whose `Custom.AssignQA` is the scoped QA.
pub async fn fetch_backlog_items<G: WorkGateway>(
    gateway: &G,
    scope: &QaScope,
    concurrency: usize,
) -> Result<Vec<BacklogItem>, Error> {
    let wanted = [
        fields::ID,
        fields::TITLE,
        fields::PRIORITY,
        fields::TARGETED_RELEASE,
        fields::ASSIGN_QA,
    ];
    let items =
        fetch_iteration_items(gateway, types::BACKLOG_ITEM, scope, &wanted, concurrency).await?;

    Ok(items
        .into_iter()
        .filter(|wi| scope.matches(text(&wi.fields, fields::ASSIGN_QA).as_deref()))
        .map(|wi| BacklogItem {
            id: wi.id,
            title: text(&wi.fields, fields::TITLE),
            priority: integer(&wi.fields, fields::PRIORITY),
            targeted_release: text(&wi.fields, fields::TARGETED_RELEASE),
            assign_qa: text(&wi.fields, fields::ASSIGN_QA),
        })
        .collect())
}

/// Tasks of the iteration assigned (`System.AssignedTo`) to the scoped QA.
pub async fn fetch_tasks<G: WorkGateway>(
    gateway: &G,
    scope: &QaScope,
    concurrency: usize,
) -> Result<Vec<WorkTask>, Error> {
    let wanted = [
        fields::ID,
        fields::TITLE,
        fields::ASSIGNED_TO,
        fields::COMPLETED_WORK,
        fields::REMAINING_WORK,
    ];
    let items = fetch_iteration_items(gateway, types::TASK, scope, &wanted, concurrency).await?;

    Ok(items
        .into_iter()
        .filter(|wi| scope.matches(text(&wi.fields, fields::ASSIGNED_TO).as_deref()))
        .map(|wi| WorkTask {
            id: wi.id,
            title: text(&wi.fields, fields::TITLE),
            assign_qa: text(&wi.fields, fields::ASSIGNED_TO),
            completed_work: number(&wi.fields, fields::COMPLETED_WORK),
            remaining_work: number(&wi.fields, fields::REMAINING_WORK),
        })
        .collect())
}

/// Count the project's open bugs by the value of `severity_field`.
pub async fn bugs_by_severity<G: WorkGateway>(
    gateway: &G,
    severity_field: &str,
    concurrency: usize,
) -> Result<SeverityCounts, Error> {
    let query = WorkItemQuery::of_type(types::BUG).excluding_states(CLOSED_STATES);
    let ids = gateway.query_ids(&query).await?;
    let wanted = [severity_field.to_string()];
    let items = fetch_in_chunks(gateway, &ids, &wanted, concurrency).await?;

    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    for item in &items {
        let severity = text(&item.fields, severity_field)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| UNSPECIFIED_SEVERITY.to_string());
        *counts.entry(severity).or_insert(0) += 1;
    }

    Ok(SeverityCounts {
        project: gateway.project().to_string(),
        counts,
    })
}

async fn fetch_iteration_items<G: WorkGateway>(
    gateway: &G,
    work_item_type: &str,
    scope: &QaScope,
    wanted: &[&str],
    concurrency: usize,
) -> Result<Vec<WorkItem>, Error> {
    let query = WorkItemQuery::of_type(work_item_type).in_iteration(scope.iteration_path.clone());
    let ids = gateway.query_ids(&query).await?;
    if ids.is_empty() {
        debug!(work_item_type, iteration = %scope.iteration_path, "no work items found");
        return Ok(Vec::new());
    }

    let wanted: Vec<String> = wanted.iter().map(|f| (*f).to_string()).collect();
    fetch_in_chunks(gateway, &ids, &wanted, concurrency).await
}

/// Read a field as text. Identity fields yield their display name
/// (falling back to the unique name); numbers and booleans are stringified.
fn text(fields: &FieldMap, key: &str) -> Option<String> {
    match fields.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Object(identity) => ["displayName", "uniqueName"]
            .iter()
            .filter_map(|k| identity.get(*k).and_then(Value::as_str))
            .find(|s| !s.is_empty())
            .map(String::from),
        Value::Null | Value::Array(_) => None,
    }
}

/// Numbers and numeric strings; anything else (e.g. "High") is `None`.
fn integer(fields: &FieldMap, key: &str) -> Option<i64> {
    match fields.get(key)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Effort counters default to zero.
fn number(fields: &FieldMap, key: &str) -> f64 {
    fields.get(key).and_then(Value::as_f64).unwrap_or(0.0)
}
