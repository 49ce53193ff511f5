//! Rewrite rules for VQL plan trees.
//!
//! Every rule preserves the rows and columns the plan produces at its root.
//!
//! # Rule Catalog
//!
//! - **Projection Pushdown (join)**: Project each join branch to what is read above it
//! - **Projection Pushdown (select)**: Project below a filter
//! - **Predicate Pushdown**: Move a filter next to the join branch it constrains
//! - **Join Elimination**: Drop joins implied by a foreign key
//! - **Predicate Simplification**: Fold constant filter predicates

mod join_elimination;
mod optimizer;
mod predicate_pushdown;
mod projection_pushdown;
mod rule;
mod simplify_predicate;

pub use join_elimination::JoinElimination;
pub use optimizer::{Optimizer, OptimizerConfig};
pub use predicate_pushdown::PredicatePushdown;
pub use projection_pushdown::{ProjectionPushdownJoin, ProjectionPushdownSelect};
pub use rule::{OptimizedPlan, RewriteRule, RuleId, RuleSet, RuleTrace, Transformed};
pub use simplify_predicate::SimplifyPredicate;
