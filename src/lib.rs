//! VQL - rule-based logical plan optimizer for video queries
//!
//! Plans are trees of scans, filters, projections and inner joins over
//! video tables. The optimizer rewrites them with a configurable set of
//! rules: predicate pushdown, projection pushdown, join elimination and
//! predicate simplification.
//!
//! # Example
//!
//! ```
//! use vql::logical::{FilterNode, InnerJoinNode, PlanTree, ProjectionNode, col, lit};
//! use vql::optimizer::{RuleSet, optimize};
//!
//! let mut tree = PlanTree::new();
//! let t1 = tree.scan("v1");
//! let t2 = tree.scan("v2");
//! let join = tree.join([t1, t2], InnerJoinNode::on(["v1.3", "v2.3"]).unwrap());
//! let filter = tree.filter(join, FilterNode::new(col("v1", 1).eq(lit(4))));
//! let root = tree.project(filter, ProjectionNode::columns(["v1.1", "v2.2"]).unwrap());
//! tree.set_root(root);
//!
//! let optimized = optimize(tree, &RuleSet::all()).unwrap();
//! assert_eq!(optimized[root].children(), &[join]);
//! ```

#![forbid(unsafe_code)]
#![allow(clippy::module_name_repetitions)]

// Re-export core crates
pub use common_config as config;
pub use common_display as display;
pub use common_error as error;
pub use vql_core as core;
pub use vql_logical as logical;
pub use vql_optimizer as optimizer;

/// VQL version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
