//! Logical planning layer for VQL.
//!
//! `vql-logical` provides the plan representation the optimizer rewrites:
//!
//! - **Expression Model**: predicates over qualified columns and constants
//! - **Plan Nodes**: `TableScan`, `Filter`, `Projection` and `InnerJoin`
//! - **Plan Tree**: an arena of nodes with parent/child links and the
//!   mutation primitives rewrite rules are built from
//! - **Validation**: structural and semantic checks on a tree
//!
//! # Example
//!
//! ```rust
//! use vql_logical::{FilterNode, InnerJoinNode, PlanTree, ProjectionNode, col, lit};
//!
//! // Projection [v1.1, v2.2] <- Filter v1.1 = 4 <- InnerJoin(v1, v2)
//! let mut tree = PlanTree::new();
//! let v1 = tree.scan("v1");
//! let v2 = tree.scan("v2");
//! let join = tree.join([v1, v2], InnerJoinNode::on(["v1.3", "v2.3"]).unwrap());
//! let filter = tree.filter(join, FilterNode::new(col("v1", 1).eq(lit(4))));
//! let root = tree.project(filter, ProjectionNode::columns(["v1.1", "v2.2"]).unwrap());
//! tree.set_root(root);
//!
//! println!("{}", tree.explain());
//! ```

pub mod expr;
pub mod ops;
mod tree;
pub mod validation;

pub use tree::{NodeEntry, NodeId, PlanTree, Slot};

pub use ops::{FilterNode, InnerJoinNode, NodeKind, PlanNode, ProjectionNode, TableScanNode};

pub use expr::{BinaryOp, LogicalExpr, col, lit};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_plan() {
        let mut tree = PlanTree::new();
        let v1 = tree.scan("v1");
        let filter = tree.filter(v1, FilterNode::new(col("v1", 7).gt(lit(10))));
        let root = tree.project(filter, ProjectionNode::columns(["v1.3"]).unwrap());
        tree.set_root(root);

        let explain = tree.explain();
        assert!(explain.contains("TableScan v1"));
        assert!(explain.contains("Filter v1.7 > 10"));
        assert!(explain.contains("Projection [v1.3]"));
        assert!(validation::validate_plan(&tree).is_ok());
    }
}
