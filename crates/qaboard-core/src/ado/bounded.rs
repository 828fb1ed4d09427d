//! Global cap on in-flight remote requests.

use super::gateway::WorkGateway;
use super::types::{SuiteRef, TestCaseRef, TestPointRef, WorkItem, WorkItemQuery};
use crate::error::Error;
use tokio::sync::{Semaphore, SemaphorePermit};

/// Wraps a gateway so that at most `limit` calls are in flight at once,
/// however deep the caller's fan-out nests.
pub struct Bounded<'a, G> {
    inner: &'a G,
    permits: Semaphore,
}

impl<'a, G: WorkGateway> Bounded<'a, G> {
    /// Wrap `inner`, allowing `limit` concurrent calls (at least 1).
    #[must_use]
    pub fn new(inner: &'a G, limit: usize) -> Self {
        Self {
            inner,
            permits: Semaphore::new(limit.max(1)),
        }
    }

    #[cfg(test)]
    fn available(&self) -> usize {
        self.permits.available_permits()
    }

    async fn permit(&self) -> Result<SemaphorePermit<'_>, Error> {
        self.permits
            .acquire()
            .await
            .map_err(|_| Error::transient("request limiter closed"))
    }
}

impl<G: WorkGateway> WorkGateway for Bounded<'_, G> {
    async fn list_child_suites(&self, plan_id: i64, parent: Option<i64>) -> Result<Vec<SuiteRef>, Error> {
        let _permit = self.permit().await?;
        self.inner.list_child_suites(plan_id, parent).await
    }

    async fn list_test_cases(&self, link: &str) -> Result<Vec<TestCaseRef>, Error> {
        let _permit = self.permit().await?;
        self.inner.list_test_cases(link).await
    }

    async fn list_test_points(&self, link: &str) -> Result<Vec<TestPointRef>, Error> {
        let _permit = self.permit().await?;
        self.inner.list_test_points(link).await
    }

    async fn batch_fetch_fields(&self, ids: &[i64], fields: &[String]) -> Result<Vec<WorkItem>, Error> {
        let _permit = self.permit().await?;
        self.inner.batch_fetch_fields(ids, fields).await
    }

    async fn query_ids(&self, query: &WorkItemQuery) -> Result<Vec<i64>, Error> {
        let _permit = self.permit().await?;
        self.inner.query_ids(query).await
    }

    fn project(&self) -> &str {
        self.inner.project()
    }
}
