//! Projection pushdown optimization rules.
//!
//! Narrow the columns carried below joins and filters to what the operators
//! above them actually read.

use common_error::VqlResult;
use log::trace;
use vql_core::ColumnSet;
use vql_logical::{NodeId, NodeKind, PlanNode, PlanTree, ProjectionNode};

use super::rule::{RewriteRule, RuleId, Transformed};

/// Projection pushdown through a join.
///
/// # Pattern
///
/// `Projection P` whose child is `InnerJoin J`.
///
/// # Rewrite
///
/// Every branch `b` of `J` gets a projection carrying the join columns of
/// `b` followed by the columns of `P` that `b` produces. It goes into the
/// slot of `b`, or below `b` when `b` is a filter over a non-join that reads
/// only those columns. `P` stays where it is. Nested joins are reached when
/// traversal visits the inserted projections.
pub struct ProjectionPushdownJoin;

impl RewriteRule for ProjectionPushdownJoin {
    fn id(&self) -> RuleId {
        RuleId::ProjectionPushdownJoin
    }

    fn description(&self) -> &'static str {
        "Project each join branch down to the columns read above it"
    }

    fn matches(&self, tree: &PlanTree, node: NodeId) -> bool {
        projection_over(tree, node, NodeKind::InnerJoin)
    }

    fn apply(&self, tree: &mut PlanTree, projection: NodeId) -> VqlResult<Transformed> {
        let Some(columns) = projected_columns(tree, projection) else {
            return Ok(Transformed::no(projection));
        };
        let &[join] = tree[projection].children() else {
            return Ok(Transformed::no(projection));
        };
        let join_ids = match tree[join].op() {
            PlanNode::InnerJoin(node) => node.join_ids.clone(),
            _ => return Ok(Transformed::no(projection)),
        };

        let mut changed = false;
        for branch in tree[join].children().to_vec() {
            let reachable = tree.reachable_tables(branch);
            let needed = join_ids
                .restrict_to(&reachable)
                .union(&columns.restrict_to(&reachable));
            let target = below_covered_filters(tree, branch, &needed);
            changed |= project_slot(tree, target, needed);
        }

        Ok(Transformed {
            node: projection,
            changed,
        })
    }
}

/// Projection pushdown through a filter.
///
/// # Pattern
///
/// `Projection P` whose child is `Filter S`.
///
/// # Rewrite
///
/// The slot below `S` gets a projection carrying the columns of `P` and the
/// columns `S` needs. `P` and `S` keep their positions.
pub struct ProjectionPushdownSelect;

impl RewriteRule for ProjectionPushdownSelect {
    fn id(&self) -> RuleId {
        RuleId::ProjectionPushdownSelect
    }

    fn description(&self) -> &'static str {
        "Project below a filter to its own and the projected columns"
    }

    fn matches(&self, tree: &PlanTree, node: NodeId) -> bool {
        projection_over(tree, node, NodeKind::Filter)
    }

    fn apply(&self, tree: &mut PlanTree, projection: NodeId) -> VqlResult<Transformed> {
        let Some(columns) = projected_columns(tree, projection) else {
            return Ok(Transformed::no(projection));
        };
        let &[filter] = tree[projection].children() else {
            return Ok(Transformed::no(projection));
        };
        let filter_columns = match tree[filter].op() {
            PlanNode::Filter(node) => node.column_ids.clone(),
            _ => return Ok(Transformed::no(projection)),
        };
        let &[below] = tree[filter].children() else {
            return Ok(Transformed::no(projection));
        };

        let changed = project_slot(tree, below, columns.union(&filter_columns));

        Ok(Transformed {
            node: projection,
            changed,
        })
    }
}

/// `node` is a projection over a `child_kind` node that may produce rows.
fn projection_over(tree: &PlanTree, node: NodeId, child_kind: NodeKind) -> bool {
    let entry = &tree[node];
    entry.kind() == NodeKind::Projection
        && matches!(
            entry.children(),
            [child] if tree[*child].kind() == child_kind && !tree[*child].produces_no_rows()
        )
}

/// Step down from `occupant` through filters that read nothing outside
/// `needed`. A filter over a join is not passed, since predicate pushdown
/// may still move it.
fn below_covered_filters(tree: &PlanTree, mut occupant: NodeId, needed: &ColumnSet) -> NodeId {
    loop {
        let entry = &tree[occupant];
        let Some(filter) = entry.op().as_filter() else {
            return occupant;
        };
        match entry.children() {
            [child]
                if !entry.produces_no_rows()
                    && tree[*child].kind() != NodeKind::InnerJoin
                    && filter.column_ids.is_subset(needed) =>
            {
                occupant = *child;
            }
            _ => return occupant,
        }
    }
}

fn projected_columns(tree: &PlanTree, node: NodeId) -> Option<ColumnSet> {
    tree[node]
        .op()
        .as_projection()
        .map(|projection| projection.column_ids.clone())
}

/// Restrict the slot held by `occupant` to `needed`.
///
/// A projection already in the slot is narrowed in place instead of getting
/// a second one stacked on top. Nothing happens when `needed` is empty or
/// shares no column with the existing projection.
fn project_slot(tree: &mut PlanTree, occupant: NodeId, needed: ColumnSet) -> bool {
    if needed.is_empty() {
        return false;
    }

    if let Some(PlanNode::Projection(existing)) = tree.op_mut(occupant) {
        let narrowed = existing.column_ids.intersection(&needed);
        if narrowed.is_empty() || narrowed.len() == existing.column_ids.len() {
            return false;
        }
        trace!("Narrowing projection {} to {}", occupant, narrowed);
        existing.column_ids = narrowed;
        return true;
    }

    let inserted = tree.insert_above(occupant, ProjectionNode::new(needed));
    trace!("Inserted projection {} above {}", inserted, occupant);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use vql_logical::{FilterNode, InnerJoinNode, col, lit};

    fn cols(columns: &[&str]) -> ColumnSet {
        ColumnSet::parse(columns.iter().copied()).unwrap()
    }

    fn projection_columns(tree: &PlanTree, node: NodeId) -> &ColumnSet {
        &tree[node].op().as_projection().unwrap().column_ids
    }

    #[test]
    fn test_pushdown_through_join() {
        let mut tree = PlanTree::new();
        let t1 = tree.scan("v1");
        let t2 = tree.scan("v2");
        let j = tree.join([t1, t2], InnerJoinNode::on(["v1.1", "v2.1"]).unwrap());
        let p = tree.project(j, ProjectionNode::columns(["v1.3", "v2.4"]).unwrap());
        tree.set_root(p);

        let result = ProjectionPushdownJoin.apply(&mut tree, p).unwrap();
        assert!(result.changed);
        assert_eq!(result.node, p);

        let [pa, pb] = tree[j].children() else {
            panic!("join lost a branch");
        };
        assert_eq!(projection_columns(&tree, *pa), &cols(&["v1.1", "v1.3"]));
        assert_eq!(projection_columns(&tree, *pb), &cols(&["v2.1", "v2.4"]));
        assert_eq!(tree[*pa].children(), &[t1]);
        assert_eq!(tree[*pb].children(), &[t2]);
        assert_eq!(tree[t2].parent(), Some(*pb));
        assert_eq!(projection_columns(&tree, p), &cols(&["v1.3", "v2.4"]));
    }

    #[test]
    fn test_pushdown_through_join_is_idempotent() {
        let mut tree = PlanTree::new();
        let t1 = tree.scan("v1");
        let t2 = tree.scan("v2");
        let j = tree.join([t1, t2], InnerJoinNode::on(["v1.1", "v2.1"]).unwrap());
        let p = tree.project(j, ProjectionNode::columns(["v1.3", "v2.4"]).unwrap());
        tree.set_root(p);

        assert!(ProjectionPushdownJoin.apply(&mut tree, p).unwrap().changed);
        let once = tree.clone();
        assert!(!ProjectionPushdownJoin.apply(&mut tree, p).unwrap().changed);
        assert_eq!(tree, once);
    }

    #[test]
    fn test_existing_projection_is_narrowed() {
        let mut tree = PlanTree::new();
        let t1 = tree.scan("v1");
        let wide = tree.project(t1, ProjectionNode::columns(["v1.1", "v1.3", "v1.9"]).unwrap());
        let t2 = tree.scan("v2");
        let j = tree.join([wide, t2], InnerJoinNode::on(["v1.1", "v2.1"]).unwrap());
        let p = tree.project(j, ProjectionNode::columns(["v1.3"]).unwrap());
        tree.set_root(p);

        assert!(ProjectionPushdownJoin.apply(&mut tree, p).unwrap().changed);
        assert_eq!(tree[j].children()[0], wide);
        assert_eq!(projection_columns(&tree, wide), &cols(&["v1.1", "v1.3"]));
        // The v2 branch only needs its join column.
        let pb = tree[j].children()[1];
        assert_eq!(projection_columns(&tree, pb), &cols(&["v2.1"]));
    }

    #[test]
    fn test_join_branch_projection_below_covered_filter() {
        let mut tree = PlanTree::new();
        let t1 = tree.scan("v1");
        let s = tree.filter(t1, FilterNode::new(col("v1", 1).eq(lit(4))));
        let t2 = tree.scan("v2");
        let j = tree.join([s, t2], InnerJoinNode::on(["v1.3", "v2.3"]).unwrap());
        let p = tree.project(j, ProjectionNode::columns(["v1.1", "v2.2"]).unwrap());
        tree.set_root(p);

        assert!(ProjectionPushdownJoin.apply(&mut tree, p).unwrap().changed);

        // v1.1 is kept anyway, so the filter stays directly under the join.
        assert_eq!(tree[j].children()[0], s);
        assert_eq!(tree[s].parent(), Some(j));
        let &[below] = tree[s].children() else {
            panic!("filter lost its child");
        };
        assert_eq!(projection_columns(&tree, below), &cols(&["v1.3", "v1.1"]));
        assert_eq!(tree[below].children(), &[t1]);

        let once = tree.clone();
        assert!(!ProjectionPushdownJoin.apply(&mut tree, p).unwrap().changed);
        assert_eq!(tree, once);
    }

    #[test]
    fn test_join_branch_projection_above_filter_reading_dropped_column() {
        let mut tree = PlanTree::new();
        let t1 = tree.scan("v1");
        let t2 = tree.scan("v2");
        let s = tree.filter(t2, FilterNode::new(col("v2", 7).eq(lit("x"))));
        let j = tree.join([t1, s], InnerJoinNode::on(["v1.1", "v2.1"]).unwrap());
        let p = tree.project(j, ProjectionNode::columns(["v1.3", "v2.4"]).unwrap());
        tree.set_root(p);

        assert!(ProjectionPushdownJoin.apply(&mut tree, p).unwrap().changed);

        let pb = tree[j].children()[1];
        assert_eq!(projection_columns(&tree, pb), &cols(&["v2.1", "v2.4"]));
        assert_eq!(tree[pb].children(), &[s]);
        assert_eq!(tree[s].children(), &[t2]);
    }

    #[test]
    fn test_pushdown_through_filter() {
        let mut tree = PlanTree::new();
        let t1 = tree.scan("v1");
        let s = tree.filter(t1, FilterNode::new(col("v1", 7).gt(lit(3))));
        let p = tree.project(s, ProjectionNode::columns(["v1.3", "v1.4"]).unwrap());
        tree.set_root(p);

        assert!(ProjectionPushdownSelect.matches(&tree, p));
        assert!(!ProjectionPushdownJoin.matches(&tree, p));
        let result = ProjectionPushdownSelect.apply(&mut tree, p).unwrap();
        assert!(result.changed);

        let &[below] = tree[s].children() else {
            panic!("filter lost its child");
        };
        assert_eq!(projection_columns(&tree, below), &cols(&["v1.3", "v1.4", "v1.7"]));
        assert_eq!(tree[below].children(), &[t1]);
        assert_eq!(tree[below].parent(), Some(s));
        assert_eq!(tree[p].children(), &[s]);
    }

    #[test]
    fn test_empty_needed_skipped() {
        let mut tree = PlanTree::new();
        let t1 = tree.scan("v1");
        let s = tree.filter(t1, FilterNode::new(lit(1).eq(lit(1))));
        let p = tree.project(s, ProjectionNode::new(ColumnSet::new()));
        tree.set_root(p);

        assert!(!ProjectionPushdownSelect.apply(&mut tree, p).unwrap().changed);
        assert_eq!(tree[s].children(), &[t1]);
    }
}
