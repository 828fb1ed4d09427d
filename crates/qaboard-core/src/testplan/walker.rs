//! Recursive expansion of a test plan's suite hierarchy.

use super::join::join_suite;
use super::model::{EnrichmentRequest, PlanTree, SuiteNode};
use crate::ado::{Bounded, SuiteRef, WorkGateway};
use crate::config::{DEFAULT_CONCURRENCY, DEFAULT_TIMEOUT};
use crate::error::Error;
use futures::future::{BoxFuture, FutureExt};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::time::Duration;
use tracing::{debug, info};

/// Inputs of one tree aggregation.
#[derive(Debug, Clone)]
pub struct TreeRequest {
    pub plan_id: i64,
    pub enrichment: EnrichmentRequest,
    /// Maximum remote requests in flight for this call.
    pub concurrency: usize,
    /// Deadline for the whole call; `None` waits indefinitely.
    pub deadline: Option<Duration>,
}

impl TreeRequest {
    /// Request the full tree of `plan_id` with default limits.
    #[must_use]
    pub fn new(plan_id: i64) -> Self {
        Self {
            plan_id,
            enrichment: EnrichmentRequest::default(),
            concurrency: DEFAULT_CONCURRENCY,
            deadline: Some(DEFAULT_TIMEOUT),
        }
    }

    #[must_use]
    pub fn with_enrichment(mut self, enrichment: EnrichmentRequest) -> Self {
        self.enrichment = enrichment;
        self
    }

    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// A zero deadline means no deadline.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline.filter(|d| !d.is_zero());
        self
    }
}

/// Build the suite tree of a plan.
///
/// Suites keep the order of the remote listing at every level. Siblings are
/// expanded concurrently; total in-flight requests never exceed
/// `request.concurrency`.
///
/// # Errors
/// - a suite listing fails at any depth
/// - a requested field batch fails
/// - the deadline expires ([`Error::Timeout`])
pub async fn build_tree<G: WorkGateway>(gateway: &G, request: &TreeRequest) -> Result<PlanTree, Error> {
    info!(plan_id = request.plan_id, "fetching suites recursively");

    let bounded = Bounded::new(gateway, request.concurrency);
    let walk = expand_level(&bounded, request, None);

    let suites = match request.deadline {
        Some(deadline) => tokio::time::timeout(deadline, walk).await.map_err(|_| {
            Error::timeout(format!(
                "building suite tree of plan {} (deadline {}s)",
                request.plan_id,
                deadline.as_secs_f64()
            ))
        })??,
        None => walk.await?,
    };

    let tree = PlanTree {
        plan_id: request.plan_id,
        suites,
    };
    info!(
        plan_id = tree.plan_id,
        suites = tree.suite_count(),
        test_cases = tree.test_case_count(),
        "suite tree built"
    );
    Ok(tree)
}

/// Expand every suite directly under `parent`, in listing order.
fn expand_level<'a, G: WorkGateway>(
    gateway: &'a G,
    request: &'a TreeRequest,
    parent: Option<i64>,
) -> BoxFuture<'a, Result<Vec<SuiteNode>, Error>> {
    async move {
        let listed = gateway.list_child_suites(request.plan_id, parent).await?;
        debug!(parent = ?parent, count = listed.len(), "listed suites");

        let kept: Vec<SuiteRef> = listed
            .into_iter()
            .filter(|suite| parent.is_some() || request.enrichment.admits_root(&suite.name))
            .collect();

        stream::iter(kept)
            .map(|suite| expand_suite(gateway, request, suite))
            .buffered(request.concurrency.max(1))
            .try_collect()
            .await
    }
    .boxed()
}

async fn expand_suite<G: WorkGateway>(
    gateway: &G,
    request: &TreeRequest,
    suite: SuiteRef,
) -> Result<SuiteNode, Error> {
    let test_cases = join_suite(gateway, &suite, &request.enrichment, request.concurrency).await?;

    let children = if suite.has_children {
        expand_level(gateway, request, Some(suite.id)).await?
    } else {
        Vec::new()
    };

    Ok(SuiteNode {
        id: suite.id,
        name: suite.name,
        has_children: suite.has_children,
        test_cases,
        children,
    })
}
