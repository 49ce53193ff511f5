//! Join elimination rule.
//!
//! Remove joins whose only effect is guaranteed by a foreign key.

use common_error::VqlResult;
use log::debug;
use vql_core::{ColumnSet, VideoSet};
use vql_logical::{NodeId, NodeKind, PlanNode, PlanTree};

use super::rule::{RewriteRule, RuleId, Transformed};

/// Join elimination rule.
///
/// A join of a branch holding a foreign key with the table the key points
/// to matches every row of the kept branch exactly once. If nothing above
/// the join reads the referenced table, the join and the referenced branch
/// can be dropped.
///
/// # Pattern
///
/// - `InnerJoin J` of two branches whose condition pairs the kept branch's
///   columns, all in `J.foreign_column_ids`, with the referenced table.
/// - `Filter S` over a two-branch `InnerJoin J` whose predicate is
///   `fk = key` with `fk` in `S.foreign_column_ids`. The filter is dropped
///   along with the join.
///
/// # Legal When
///
/// - The referenced branch is a bare scan, possibly under projections
/// - Some ancestor is a projection, and no ancestor reads a column of the
///   referenced table
pub struct JoinElimination;

impl RewriteRule for JoinElimination {
    fn id(&self) -> RuleId {
        RuleId::JoinElimination
    }

    fn description(&self) -> &'static str {
        "Remove a join made redundant by a foreign key"
    }

    fn matches(&self, tree: &PlanTree, node: NodeId) -> bool {
        let entry = &tree[node];
        match entry.kind() {
            NodeKind::InnerJoin => entry.children().len() == 2,
            NodeKind::Filter => matches!(
                entry.children(),
                [child] if tree[*child].kind() == NodeKind::InnerJoin
            ),
            _ => false,
        }
    }

    fn apply(&self, tree: &mut PlanTree, node: NodeId) -> VqlResult<Transformed> {
        let plan = match tree[node].kind() {
            NodeKind::InnerJoin => plan_join_form(tree, node),
            NodeKind::Filter => plan_filter_form(tree, node),
            _ => None,
        };
        let Some(Elimination { kept, referenced }) = plan else {
            return Ok(Transformed::no(node));
        };

        debug!(
            "Eliminating join at {}: {} is determined by a foreign key",
            node, referenced
        );
        tree.replace_in_slot(node, kept);
        tree.discard_subtree(node);
        if let Some(parent) = tree[kept].parent() {
            tree.refresh_videos_upward(parent);
        }

        Ok(Transformed::yes(kept))
    }
}

/// The branch surviving an elimination and the table dropped with the join.
struct Elimination {
    kept: NodeId,
    referenced: String,
}

fn plan_join_form(tree: &PlanTree, join: NodeId) -> Option<Elimination> {
    let node = tree[join].op().as_join()?;
    if node.foreign_column_ids.is_empty() {
        return None;
    }
    let &[left, right] = tree[join].children() else {
        return None;
    };

    for (kept, other) in [(left, right), (right, left)] {
        let Some(referenced) = scanned_table(tree, other) else {
            continue;
        };
        let kept_columns = node.join_ids.restrict_to(&tree.reachable_tables(kept));
        let referenced_columns = node
            .join_ids
            .restrict_to(&VideoSet::singleton(referenced.clone()));

        if kept_columns.is_empty()
            || referenced_columns.is_empty()
            || !kept_columns.is_subset(&node.foreign_column_ids)
        {
            continue;
        }
        if reads_table_above(tree, join, &referenced) {
            continue;
        }
        return Some(Elimination { kept, referenced });
    }
    None
}

fn plan_filter_form(tree: &PlanTree, filter: NodeId) -> Option<Elimination> {
    let node = tree[filter].op().as_filter()?;
    let (left, right) = node.predicate.as_column_equality()?;
    let (foreign, key) = if node.foreign_column_ids.contains(left) {
        (left, right)
    } else if node.foreign_column_ids.contains(right) {
        (right, left)
    } else {
        return None;
    };

    let &[join] = tree[filter].children() else {
        return None;
    };
    let join_node = tree[join].op().as_join()?;
    let &[a, b] = tree[join].children() else {
        return None;
    };

    let kept = if scanned_table(tree, b).as_deref() == Some(key.table.as_str()) {
        a
    } else if scanned_table(tree, a).as_deref() == Some(key.table.as_str()) {
        b
    } else {
        return None;
    };
    if !tree.reachable_tables(kept).contains(&foreign.table) {
        return None;
    }

    // Only the key may tie the referenced table to the rest of the plan.
    let referenced = VideoSet::singleton(key.table.clone());
    let key_only: ColumnSet = [key.clone()].into_iter().collect();
    if !join_node.join_ids.restrict_to(&referenced).is_subset(&key_only)
        || !node.column_ids.restrict_to(&referenced).is_subset(&key_only)
    {
        return None;
    }
    if reads_table_above(tree, filter, &key.table) {
        return None;
    }

    Some(Elimination {
        kept,
        referenced: key.table.clone(),
    })
}

/// The table scanned by `branch` if it is a scan under zero or more
/// projections.
fn scanned_table(tree: &PlanTree, branch: NodeId) -> Option<String> {
    let mut current = branch;
    loop {
        let entry = &tree[current];
        match entry.op() {
            PlanNode::TableScan(scan) => return Some(scan.tablename.clone()),
            PlanNode::Projection(_) => current = *entry.children().first()?,
            PlanNode::Filter(_) | PlanNode::InnerJoin(_) => return None,
        }
    }
}

/// Whether the output above `node` may depend on `table`.
///
/// Without a projection among the ancestors every column reaches the
/// output, so the answer is yes.
fn reads_table_above(tree: &PlanTree, node: NodeId, table: &str) -> bool {
    let mut required = ColumnSet::new();
    let mut projected = false;
    let mut current = tree[node].parent();

    while let Some(id) = current {
        match tree[id].op() {
            PlanNode::Projection(projection) => {
                projected = true;
                required.extend(projection.column_ids.iter().cloned());
            }
            PlanNode::Filter(filter) => {
                required.extend(filter.column_ids.iter().cloned());
                required.extend(filter.predicate.column_refs().iter().cloned());
            }
            PlanNode::InnerJoin(join) => required.extend(join.join_ids.iter().cloned()),
            PlanNode::TableScan(_) => {}
        }
        current = tree[id].parent();
    }

    !projected || required.tables().contains(table)
}
