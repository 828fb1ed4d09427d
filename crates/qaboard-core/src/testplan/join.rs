//! Per-suite join: test cases, their testers, and optional extra fields.
//!
//! Test-case and test-point lookups are best-effort: a failure degrades to
//! empty/null data and a warning, so one broken suite never costs the rest of
//! the tree. Field enrichment is opt-in and its failure propagates.

use super::batch::batch_fields;
use super::model::{EnrichmentRequest, TestCase};
use crate::ado::{SuiteRef, TestCaseRef, WorkGateway};
use crate::error::Error;
use std::collections::HashMap;
use tracing::warn;

/// Outcome of one best-effort lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Step<T> {
    /// The lookup succeeded (or was not applicable and yielded its neutral value).
    Ok(T),
    /// The lookup failed; the caller substitutes neutral data.
    Degraded { reason: String },
}

impl<T> Step<T> {
    fn from_result(result: Result<T, Error>) -> Self {
        match result {
            Ok(value) => Self::Ok(value),
            Err(e) => Self::Degraded {
                reason: e.to_string(),
            },
        }
    }

    /// Take the value, or log why the lookup degraded and use `fallback`.
    fn settle(self, suite_id: i64, lookup: &str, fallback: T) -> T {
        match self {
            Self::Ok(value) => value,
            Self::Degraded { reason } => {
                warn!(suite_id, %reason, "could not fetch {lookup}");
                fallback
            }
        }
    }
}

/// Test-case id -> assigned tester display name.
pub type TesterMap = HashMap<i64, Option<String>>;

/// Fetch a suite's test cases. No link means no test cases.
pub async fn fetch_test_cases<G: WorkGateway>(gateway: &G, suite: &SuiteRef) -> Step<Vec<TestCaseRef>> {
    match &suite.test_cases_link {
        Some(link) => Step::from_result(gateway.list_test_cases(link).await),
        None => Step::Ok(Vec::new()),
    }
}

/// Fetch a suite's test points and index the assigned testers by test-case id.
///
/// Later points for the same test case win.
pub async fn fetch_testers<G: WorkGateway>(gateway: &G, suite: &SuiteRef) -> Step<TesterMap> {
    let Some(link) = &suite.test_points_link else {
        return Step::Ok(TesterMap::new());
    };
    Step::from_result(gateway.list_test_points(link).await.map(|points| {
        points
            .into_iter()
            .map(|p| (p.test_case_id, p.assigned_tester))
            .collect()
    }))
}

/// Build the test-case list of one suite.
///
/// # Errors
/// Only when details were requested and a field batch request fails.
pub async fn join_suite<G: WorkGateway>(
    gateway: &G,
    suite: &SuiteRef,
    enrichment: &EnrichmentRequest,
    concurrency: usize,
) -> Result<Vec<TestCase>, Error> {
    let cases = fetch_test_cases(gateway, suite)
        .await
        .settle(suite.id, "test cases", Vec::new());

    if cases.is_empty() {
        return Ok(Vec::new());
    }

    let testers = fetch_testers(gateway, suite)
        .await
        .settle(suite.id, "test points", TesterMap::new());

    let mut test_cases: Vec<TestCase> = cases
        .into_iter()
        .map(|tc| TestCase {
            id: tc.work_item_id,
            name: tc.work_item_name,
            tester: testers.get(&tc.work_item_id).cloned().flatten(),
            fields: None,
        })
        .collect();

    if enrichment.wants_details() {
        let ids: Vec<i64> = test_cases.iter().map(|tc| tc.id).collect();
        let mut details = batch_fields(gateway, &ids, &enrichment.fields, concurrency).await?;
        for tc in &mut test_cases {
            tc.fields = Some(details.remove(&tc.id).unwrap_or_default());
        }
    }

    Ok(test_cases)
}
