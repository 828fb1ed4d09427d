#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::return_self_not_must_use)]

pub mod ado;
pub mod config;
pub mod error;
pub mod testplan;
pub mod version;
pub mod workitems;

#[cfg(test)]
mod fake;

pub use ado::{AdoClient, AdoProject, Bounded, WorkGateway};
pub use config::Config;
pub use error::{codes, Error, RemoteKind};
pub use testplan::{build_tree, EnrichmentRequest, PlanTree, SuiteNode, TestCase, TreeRequest};
pub use version::VERSION;
pub use workitems::{bugs_by_severity, fetch_backlog_items, fetch_bugs, fetch_tasks, QaScope};
