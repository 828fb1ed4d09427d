#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Response types for the qaboard HTTP API.
//!
//! These are the reduced records the reporting UI consumes. Field names
//! are part of the public contract (`assignQA`, `targetedRelease`, ...).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Error code for request validation, alongside the core error codes.
pub mod codes {
    pub const INVALID_REQUEST: &str = "INVALID_REQUEST";
}

/// Body of every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: String,
}

impl ErrorBody {
    #[must_use]
    pub fn new(code: &str, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.to_string(),
        }
    }
}

/// `GET /api/health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
}

impl Health {
    #[must_use]
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

/// A bug assigned to a QA engineer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bug {
    pub id: i64,
    pub title: Option<String>,
    pub severity: Option<String>,
    /// Numeric priority; `None` when the remote value is missing or not a number.
    pub priority: Option<i64>,
    pub targeted_release: Option<String>,
    #[serde(rename = "assignQA")]
    pub assign_qa: Option<String>,
}

/// A product backlog item assigned to a QA engineer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacklogItem {
    pub id: i64,
    pub title: Option<String>,
    /// Numeric priority; `None` when the remote value is missing or not a number.
    pub priority: Option<i64>,
    pub targeted_release: Option<String>,
    #[serde(rename = "assignQA")]
    pub assign_qa: Option<String>,
}

/// A task assigned to a QA engineer, with its effort counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkTask {
    pub id: i64,
    pub title: Option<String>,
    #[serde(rename = "assignQA")]
    pub assign_qa: Option<String>,
    pub completed_work: f64,
    pub remaining_work: f64,
}

/// Open bugs of a project grouped by severity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub project: String,
    pub counts: BTreeMap<String, u64>,
}
