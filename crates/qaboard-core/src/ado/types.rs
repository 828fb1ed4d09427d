//! Gateway-level records, decoupled from the remote wire format.

use serde_json::{Map, Value};

/// Field map of one work item (`"System.Title" -> "Login works"`).
pub type FieldMap = Map<String, Value>;

/// A suite as returned by the child-suite listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteRef {
    pub id: i64,
    pub name: String,
    pub has_children: bool,
    /// Absolute URL of the suite's test-case listing, if exposed.
    pub test_cases_link: Option<String>,
    /// Absolute URL of the suite's test-point listing, if exposed.
    pub test_points_link: Option<String>,
}

#[cfg(test)]
impl SuiteRef {
    /// A suite with no links and no children.
    pub(crate) fn leaf(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            has_children: false,
            test_cases_link: None,
            test_points_link: None,
        }
    }
}

/// A test case reference within a suite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCaseRef {
    pub work_item_id: i64,
    pub work_item_name: Option<String>,
}

/// A test point: pairing of a test case with its assigned tester.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestPointRef {
    pub test_case_id: i64,
    pub assigned_tester: Option<String>,
}

/// A work item returned by a batch fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkItem {
    pub id: i64,
    pub fields: FieldMap,
}

/// Structured id query: work items of one type, optionally scoped to an iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItemQuery {
    pub work_item_type: String,
    pub iteration_path: Option<String>,
    /// States to exclude (`System.State NOT IN (...)`).
    pub excluded_states: Vec<String>,
}

impl WorkItemQuery {
    /// Query all items of the given type.
    #[must_use]
    pub fn of_type(work_item_type: impl Into<String>) -> Self {
        Self {
            work_item_type: work_item_type.into(),
            iteration_path: None,
            excluded_states: Vec::new(),
        }
    }

    /// Restrict to one iteration path.
    #[must_use]
    pub fn in_iteration(mut self, iteration_path: impl Into<String>) -> Self {
        self.iteration_path = Some(iteration_path.into());
        self
    }

    /// Exclude items in the given states.
    #[must_use]
    pub fn excluding_states<I, S>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_states = states.into_iter().map(Into::into).collect();
        self
    }

    /// Render as WIQL. String literals are quoted with `'` doubled.
    #[must_use]
    pub fn to_wiql(&self) -> String {
        let mut wiql = format!(
            "SELECT [System.Id] FROM WorkItems WHERE [System.TeamProject] = @project \
             AND [System.WorkItemType] = {}",
            wiql_literal(&self.work_item_type)
        );
        if let Some(path) = &self.iteration_path {
            wiql.push_str(" AND [System.IterationPath] = ");
            wiql.push_str(&wiql_literal(path));
        }
        if !self.excluded_states.is_empty() {
            let states: Vec<String> = self.excluded_states.iter().map(|s| wiql_literal(s)).collect();
            wiql.push_str(" AND [System.State] NOT IN (");
            wiql.push_str(&states.join(","));
            wiql.push(')');
        }
        wiql
    }
}

fn wiql_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
