//! Remote Work API gateway.
//!
//! Provides:
//! - The [`WorkGateway`] trait consumed by the aggregators
//! - [`AdoClient`]/[`AdoProject`], the live Azure DevOps implementation
//! - [`Bounded`], a cap on in-flight requests for any gateway
//! - Gateway-level records independent of the wire format

pub mod bounded;
pub mod client;
pub mod gateway;
pub mod types;

pub use bounded::Bounded;
pub use client::{AdoClient, AdoProject, TESTPLAN_API_VERSION, WIT_API_VERSION};
pub use gateway::WorkGateway;
pub use types::{FieldMap, SuiteRef, TestCaseRef, TestPointRef, WorkItem, WorkItemQuery};
