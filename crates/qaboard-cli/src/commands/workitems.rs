//! `qaboard bugs|pbis|tasks|severity`: flat work-item views.

use miette::{IntoDiagnostic, Result};
use qaboard_core::workitems::{bugs_by_severity, fetch_backlog_items, fetch_bugs, fetch_tasks, QaScope};
use qaboard_core::{AdoClient, AdoProject, Config};

/// Which per-QA view to print.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Bugs,
    BacklogItems,
    Tasks,
}

fn gateway(config: &Config, project: Option<&str>) -> Result<AdoProject> {
    let org = config.organization_or(None).into_diagnostic()?;
    let project = config.project_or(project).into_diagnostic()?;
    Ok(AdoClient::from_config(config).into_diagnostic()?.project(org, project))
}

pub async fn run(config: &Config, view: View, scope: QaScope) -> Result<()> {
    let gateway = gateway(config, None)?;
    let concurrency = config.concurrency;

    match view {
        View::Bugs => {
            let bugs = fetch_bugs(&gateway, &scope, concurrency).await.into_diagnostic()?;
            super::print_json(&bugs)
        }
        View::BacklogItems => {
            let items = fetch_backlog_items(&gateway, &scope, concurrency)
                .await
                .into_diagnostic()?;
            super::print_json(&items)
        }
        View::Tasks => {
            let tasks = fetch_tasks(&gateway, &scope, concurrency).await.into_diagnostic()?;
            super::print_json(&tasks)
        }
    }
}

pub async fn severity(config: &Config, project: Option<&str>) -> Result<()> {
    let gateway = gateway(config, project)?;
    let counts = bugs_by_severity(&gateway, &config.severity_field, config.concurrency)
        .await
        .into_diagnostic()?;
    super::print_json(&counts)
}
