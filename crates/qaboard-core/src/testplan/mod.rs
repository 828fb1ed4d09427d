//! Hierarchical test-asset aggregation.
//!
//! Walks a test plan's suite tree and attaches to every suite:
//! - its test cases (id + name)
//! - the tester assigned to each case, from the suite's test points
//! - optionally, extra work-item fields fetched in batches

pub mod batch;
pub mod join;
pub mod model;
pub mod walker;

pub use batch::{batch_fields, fetch_in_chunks, BATCH_CEILING};
pub use join::{join_suite, Step, TesterMap};
pub use model::{split_list, EnrichmentRequest, PlanTree, SuiteNode, TestCase};
pub use walker::{build_tree, TreeRequest};
