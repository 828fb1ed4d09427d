//! Test-plan tree types.

use crate::ado::FieldMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Root of an aggregated plan: its top-level suites, fully expanded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanTree {
    pub plan_id: i64,
    pub suites: Vec<SuiteNode>,
}

impl PlanTree {
    /// Total number of suites at every depth.
    #[must_use]
    pub fn suite_count(&self) -> usize {
        self.suites.iter().map(SuiteNode::subtree_len).sum()
    }

    /// Total number of test cases at every depth.
    #[must_use]
    pub fn test_case_count(&self) -> usize {
        self.suites.iter().map(SuiteNode::subtree_test_cases).sum()
    }
}

/// A suite with its test cases and child suites.
///
/// `children` is always present; leaves carry an empty vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiteNode {
    pub id: i64,
    pub name: String,
    pub has_children: bool,
    pub test_cases: Vec<TestCase>,
    pub children: Vec<SuiteNode>,
}

impl SuiteNode {
    fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(Self::subtree_len).sum::<usize>()
    }

    fn subtree_test_cases(&self) -> usize {
        self.test_cases.len() + self.children.iter().map(Self::subtree_test_cases).sum::<usize>()
    }
}

/// A test case attached to a suite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub id: i64,
    pub name: Option<String>,
    pub tester: Option<String>,
    /// Extra work-item fields; only present when details were requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<FieldMap>,
}

/// Per-call enrichment and filtering options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichmentRequest {
    /// Fetch extra fields for every test case.
    pub include_details: bool,
    /// Field reference names to fetch, deduplicated, in request order.
    pub fields: Vec<String>,
    /// Top-level suite names to keep. Empty keeps all.
    pub roots: BTreeSet<String>,
}

impl EnrichmentRequest {
    /// Request extra fields for every test case.
    #[must_use]
    pub fn with_details<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include_details = true;
        for field in fields {
            let field = field.into();
            if !self.fields.contains(&field) {
                self.fields.push(field);
            }
        }
        self
    }

    /// Keep only the named top-level suites.
    #[must_use]
    pub fn with_roots<I, S>(mut self, roots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roots.extend(roots.into_iter().map(Into::into));
        self
    }

    /// Whether field enrichment should run at all.
    #[must_use]
    pub fn wants_details(&self) -> bool {
        self.include_details && !self.fields.is_empty()
    }

    /// Whether a top-level suite with this name is kept.
    #[must_use]
    pub fn admits_root(&self, name: &str) -> bool {
        self.roots.is_empty() || self.roots.contains(name)
    }
}

/// Split a comma-separated query value, trimming entries and dropping empty ones.
#[must_use]
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
