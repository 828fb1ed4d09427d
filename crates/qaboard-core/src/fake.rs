//! In-memory [`WorkGateway`] for unit tests.

use crate::ado::{FieldMap, SuiteRef, TestCaseRef, TestPointRef, WorkGateway, WorkItem, WorkItemQuery};
use crate::error::Error;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Canned responses keyed by request; a `u16` stands for an HTTP failure status.
#[derive(Default)]
pub(crate) struct FakeGateway {
    suites: HashMap<Option<i64>, Result<Vec<SuiteRef>, u16>>,
    cases: HashMap<String, Result<Vec<TestCaseRef>, u16>>,
    points: HashMap<String, Result<Vec<TestPointRef>, u16>>,
    work_items: HashMap<i64, FieldMap>,
    failing_batch_ids: HashSet<i64>,
    queries: HashMap<String, Vec<i64>>,
    delay: Option<Duration>,
    pub batch_calls: Mutex<Vec<Vec<i64>>>,
    pub field_requests: Mutex<Vec<Vec<String>>>,
    pub suite_calls: AtomicUsize,
    in_flight: AtomicUsize,
    /// Most calls ever running at once.
    peak: AtomicUsize,
}

/// Counts one call as running until dropped.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A suite whose links are `cases/{id}` and `points/{id}`.
pub(crate) fn suite(id: i64, name: &str, has_children: bool) -> SuiteRef {
    SuiteRef {
        id,
        name: name.to_string(),
        has_children,
        test_cases_link: Some(format!("cases/{id}")),
        test_points_link: Some(format!("points/{id}")),
    }
}

pub(crate) fn case(id: i64, name: &str) -> TestCaseRef {
    TestCaseRef {
        work_item_id: id,
        work_item_name: Some(name.to_string()),
    }
}

pub(crate) fn point(test_case_id: i64, tester: Option<&str>) -> TestPointRef {
    TestPointRef {
        test_case_id,
        assigned_tester: tester.map(String::from),
    }
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_suites(mut self, parent: Option<i64>, suites: Vec<SuiteRef>) -> Self {
        self.suites.insert(parent, Ok(suites));
        self
    }

    pub fn with_suites_failing(mut self, parent: Option<i64>, status: u16) -> Self {
        self.suites.insert(parent, Err(status));
        self
    }

    pub fn with_cases(mut self, suite_id: i64, cases: Vec<TestCaseRef>) -> Self {
        self.cases.insert(format!("cases/{suite_id}"), Ok(cases));
        self
    }

    pub fn with_cases_failing(mut self, suite_id: i64, status: u16) -> Self {
        self.cases.insert(format!("cases/{suite_id}"), Err(status));
        self
    }

    pub fn with_points(mut self, suite_id: i64, points: Vec<TestPointRef>) -> Self {
        self.points.insert(format!("points/{suite_id}"), Ok(points));
        self
    }

    pub fn with_points_failing(mut self, suite_id: i64, status: u16) -> Self {
        self.points.insert(format!("points/{suite_id}"), Err(status));
        self
    }

    pub fn with_work_item(mut self, id: i64, fields: serde_json::Value) -> Self {
        let fields = match fields {
            serde_json::Value::Object(map) => map,
            _ => FieldMap::new(),
        };
        self.work_items.insert(id, fields);
        self
    }

    /// Any batch containing `id` fails with a 500.
    pub fn with_batch_failing_on(mut self, id: i64) -> Self {
        self.failing_batch_ids.insert(id);
        self
    }

    pub fn with_query(mut self, work_item_type: &str, ids: Vec<i64>) -> Self {
        self.queries.insert(work_item_type.to_string(), ids);
        self
    }

    /// Sleep this long inside every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn batch_call_count(&self) -> usize {
        self.batch_calls.lock().unwrap().len()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn enter(&self) -> InFlight<'_> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        InFlight(&self.in_flight)
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

fn canned<T: Clone>(entry: Option<&Result<Vec<T>, u16>>, context: &str) -> Result<Vec<T>, Error> {
    match entry {
        Some(Ok(items)) => Ok(items.clone()),
        Some(Err(status)) => Err(Error::status(*status, context)),
        None => Ok(Vec::new()),
    }
}

impl WorkGateway for FakeGateway {
    async fn list_child_suites(&self, plan_id: i64, parent: Option<i64>) -> Result<Vec<SuiteRef>, Error> {
        let _call = self.enter();
        self.pause().await;
        self.suite_calls.fetch_add(1, Ordering::SeqCst);
        canned(
            self.suites.get(&parent),
            &format!("listing suites under {parent:?} in plan {plan_id}"),
        )
    }

    async fn list_test_cases(&self, link: &str) -> Result<Vec<TestCaseRef>, Error> {
        let _call = self.enter();
        self.pause().await;
        canned(self.cases.get(link), link)
    }

    async fn list_test_points(&self, link: &str) -> Result<Vec<TestPointRef>, Error> {
        let _call = self.enter();
        self.pause().await;
        canned(self.points.get(link), link)
    }

    async fn batch_fetch_fields(&self, ids: &[i64], fields: &[String]) -> Result<Vec<WorkItem>, Error> {
        let _call = self.enter();
        self.pause().await;
        self.batch_calls.lock().unwrap().push(ids.to_vec());
        self.field_requests.lock().unwrap().push(fields.to_vec());
        if ids.iter().any(|id| self.failing_batch_ids.contains(id)) {
            return Err(Error::status(500, "fetching batch"));
        }
        Ok(ids
            .iter()
            .filter_map(|id| {
                self.work_items.get(id).map(|fields| WorkItem {
                    id: *id,
                    fields: fields.clone(),
                })
            })
            .collect())
    }

    async fn query_ids(&self, query: &WorkItemQuery) -> Result<Vec<i64>, Error> {
        let _call = self.enter();
        self.pause().await;
        Ok(self.queries.get(&query.work_item_type).cloned().unwrap_or_default())
    }

    fn project(&self) -> &str {
        "Fake Project"
    }
}
