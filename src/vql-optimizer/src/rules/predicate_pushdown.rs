//! Predicate pushdown optimization rule.
//!
//! Move a filter below a join so it runs before the join.

use common_error::VqlResult;
use log::debug;
use vql_core::VideoSet;
use vql_logical::{NodeId, NodeKind, PlanNode, PlanTree};

use super::rule::{RewriteRule, RuleId, Transformed};

/// Predicate pushdown rule.
///
/// # Pattern
///
/// `Filter S` whose child is `InnerJoin J`.
///
/// # Rewrite
///
/// `J` takes the slot `S` held, and `S` is placed between `J` and the one
/// branch `b` that scans every table `S` references. Other branches are
/// untouched. `S.videos` narrows to the tables of `b` it was scoped to,
/// plus the tables it references.
///
/// # Legal When
///
/// - `S` references at least one table
/// - Exactly one branch of `J` reaches every referenced table
pub struct PredicatePushdown;

impl RewriteRule for PredicatePushdown {
    fn id(&self) -> RuleId {
        RuleId::PredicatePushdown
    }

    fn description(&self) -> &'static str {
        "Move a filter below a join, next to the branch it constrains"
    }

    fn matches(&self, tree: &PlanTree, node: NodeId) -> bool {
        let entry = &tree[node];
        entry.kind() == NodeKind::Filter
            && matches!(entry.children(), [child] if tree[*child].kind() == NodeKind::InnerJoin)
    }

    fn apply(&self, tree: &mut PlanTree, filter: NodeId) -> VqlResult<Transformed> {
        let referenced = match tree[filter].op() {
            PlanNode::Filter(node) => node.referenced_tables(),
            _ => return Ok(Transformed::no(filter)),
        };
        let &[join] = tree[filter].children() else {
            return Ok(Transformed::no(filter));
        };
        if tree[join].kind() != NodeKind::InnerJoin || referenced.is_empty() {
            return Ok(Transformed::no(filter));
        }

        let matching: Vec<(NodeId, VideoSet)> = tree[join]
            .children()
            .iter()
            .map(|&branch| (branch, tree.reachable_tables(branch)))
            .filter(|(_, reachable)| referenced.is_subset(reachable))
            .collect();

        let [(branch, reachable)] = matching.as_slice() else {
            debug!(
                "Filter {} references {} across {} branches, not pushed",
                filter,
                referenced,
                matching.len()
            );
            return Ok(Transformed::no(filter));
        };

        let videos = tree[filter]
            .videos()
            .intersection(reachable)
            .union(&referenced);

        tree.replace_in_slot(filter, join);
        tree.push_below(filter, *branch);
        tree.set_videos(filter, videos);

        Ok(Transformed::yes(join))
    }
}
