//! The seam between aggregation logic and the remote work-tracking API.

use super::types::{SuiteRef, TestCaseRef, TestPointRef, WorkItem, WorkItemQuery};
use crate::error::Error;
use std::future::Future;

/// Read-only access to one project of the remote work-tracking API.
///
/// Implemented by [`AdoProject`](super::AdoProject) for live traffic and by
/// in-memory fakes in tests. Every method is a network round-trip.
pub trait WorkGateway: Send + Sync {
    /// List the suites directly under `parent` (top level when `None`), in remote order.
    fn list_child_suites(
        &self,
        plan_id: i64,
        parent: Option<i64>,
    ) -> impl Future<Output = Result<Vec<SuiteRef>, Error>> + Send;

    /// List the test cases behind a suite's test-cases link.
    fn list_test_cases(
        &self,
        link: &str,
    ) -> impl Future<Output = Result<Vec<TestCaseRef>, Error>> + Send;

    /// List the test points behind a suite's test-points link.
    fn list_test_points(
        &self,
        link: &str,
    ) -> impl Future<Output = Result<Vec<TestPointRef>, Error>> + Send;

    /// Fetch `fields` for at most [`BATCH_CEILING`](crate::testplan::BATCH_CEILING) ids.
    fn batch_fetch_fields(
        &self,
        ids: &[i64],
        fields: &[String],
    ) -> impl Future<Output = Result<Vec<WorkItem>, Error>> + Send;

    /// Run a structured query and return the matching ids.
    fn query_ids(
        &self,
        query: &WorkItemQuery,
    ) -> impl Future<Output = Result<Vec<i64>, Error>> + Send;

    /// Project name, for reporting.
    fn project(&self) -> &str;
}
