//! `qaboard tree`: print a plan's suite tree.

use miette::{IntoDiagnostic, Result};
use qaboard_core::testplan::{build_tree, EnrichmentRequest, TreeRequest};
use qaboard_core::{AdoClient, Config};

#[derive(Debug, Clone)]
pub struct TreeAction {
    pub plan_id: i64,
    pub org: Option<String>,
    pub project: Option<String>,
    pub include_details: bool,
    pub fields: Vec<String>,
    pub roots: Vec<String>,
}

impl TreeAction {
    fn enrichment(&self) -> EnrichmentRequest {
        let mut enrichment = EnrichmentRequest::default();
        if self.include_details {
            enrichment = enrichment.with_details(trimmed(&self.fields));
        }
        enrichment.with_roots(trimmed(&self.roots))
    }
}

fn trimmed(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(String::from)
        .collect()
}

pub async fn run(config: &Config, action: TreeAction) -> Result<()> {
    let org = config.organization_or(action.org.as_deref()).into_diagnostic()?;
    let project = config.project_or(action.project.as_deref()).into_diagnostic()?;
    let gateway = AdoClient::from_config(config)
        .into_diagnostic()?
        .project(org, project);

    let request = TreeRequest::new(action.plan_id)
        .with_enrichment(action.enrichment())
        .with_concurrency(config.concurrency)
        .with_deadline(Some(config.timeout));

    let tree = build_tree(&gateway, &request).await.into_diagnostic()?;
    super::print_json(&tree)
}
