//! Rule-based optimizer for VQL logical plans.
//!
//! The optimizer rewrites a [`PlanTree`] in place with a caller-selected set
//! of rules and hands the (possibly re-rooted) tree back.
//!
//! ```rust
//! use vql_logical::{InnerJoinNode, PlanTree, ProjectionNode};
//! use vql_optimizer::{RuleSet, optimize};
//!
//! let mut tree = PlanTree::new();
//! let v1 = tree.scan("v1");
//! let v2 = tree.scan("v2");
//! let join = tree.join([v1, v2], InnerJoinNode::on(["v1.1", "v2.1"]).unwrap());
//! let root = tree.project(join, ProjectionNode::columns(["v1.3", "v2.4"]).unwrap());
//! tree.set_root(root);
//!
//! let rules = RuleSet::parse(["PROJECTION_PUSHDOWN_JOIN"]).unwrap();
//! let optimized = optimize(tree, &rules).unwrap();
//! println!("{}", optimized.explain());
//! ```

mod rules;

pub use rules::{
    JoinElimination, OptimizedPlan, Optimizer, OptimizerConfig, PredicatePushdown,
    ProjectionPushdownJoin, ProjectionPushdownSelect, RewriteRule, RuleId, RuleSet, RuleTrace,
    SimplifyPredicate, Transformed,
};

use common_error::VqlResult;
use vql_logical::PlanTree;

/// Optimize a plan tree with the given rules.
///
/// An empty rule set returns the tree unchanged.
pub fn optimize(plan: PlanTree, rules: &RuleSet) -> VqlResult<PlanTree> {
    let optimizer = Optimizer::new(rules);
    Ok(optimizer.optimize(plan)?.plan)
}
