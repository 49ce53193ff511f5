//! Predicate simplification rule.
//!
//! Evaluate constant predicates at plan time.

use common_error::VqlResult;
use log::debug;
use vql_core::{ColumnSet, Value};
use vql_logical::{BinaryOp, LogicalExpr, NodeId, NodeKind, PlanNode, PlanTree};

use super::rule::{RewriteRule, RuleId, Transformed};

/// Predicate simplification rule.
///
/// # Rewrite
///
/// The filter predicate is constant-folded. A predicate that folds to
/// `true` removes the filter, which is replaced by its child. One that folds
/// to `false` or `NULL` keeps the filter but marks it, and everything below
/// it, as producing no rows. Otherwise the partially folded predicate is
/// kept, and columns only the folded-away part read are dropped from the
/// filter along with the tables they alone brought into its scope.
///
/// # Legal When
///
/// - The folded parts are fully literal
pub struct SimplifyPredicate;

impl RewriteRule for SimplifyPredicate {
    fn id(&self) -> RuleId {
        RuleId::SimplifyPredicate
    }

    fn description(&self) -> &'static str {
        "Fold constant filter predicates"
    }

    fn matches(&self, tree: &PlanTree, node: NodeId) -> bool {
        tree[node].kind() == NodeKind::Filter && !tree[node].produces_no_rows()
    }

    fn apply(&self, tree: &mut PlanTree, filter: NodeId) -> VqlResult<Transformed> {
        if tree[filter].produces_no_rows() {
            return Ok(Transformed::no(filter));
        }
        let predicate = match tree[filter].op() {
            PlanNode::Filter(node) => node.predicate.clone(),
            _ => return Ok(Transformed::no(filter)),
        };

        let (folded, changed) = fold_constants(predicate);

        let truth = match folded.as_literal() {
            Some(Value::Bool(b)) => Some(*b),
            Some(Value::Null) => Some(false),
            _ => None,
        };

        match truth {
            Some(true) => {
                debug!("Filter {} is always true, removing it", filter);
                Ok(match tree.splice_out(filter) {
                    Some(child) => Transformed::yes(child),
                    None => Transformed::no(filter),
                })
            }
            Some(false) => {
                debug!("Filter {} never passes a row", filter);
                set_predicate(tree, filter, folded);
                tree.mark_no_rows(filter);
                Ok(Transformed::yes(filter))
            }
            None if changed => {
                replace_predicate(tree, filter, folded);
                Ok(Transformed::yes(filter))
            }
            None => Ok(Transformed::no(filter)),
        }
    }
}

fn set_predicate(tree: &mut PlanTree, filter: NodeId, predicate: LogicalExpr) {
    if let Some(PlanNode::Filter(node)) = tree.op_mut(filter) {
        node.predicate = predicate;
    }
}

/// Install a partially folded predicate and forget what it no longer reads.
fn replace_predicate(tree: &mut PlanTree, filter: NodeId, predicate: LogicalExpr) {
    let Some(PlanNode::Filter(node)) = tree.op_mut(filter) else {
        return;
    };

    let still_read = predicate.column_refs();
    let dropped: ColumnSet = node
        .predicate
        .column_refs()
        .iter()
        .filter(|column| !still_read.contains(column))
        .cloned()
        .collect();
    node.predicate = predicate;
    if dropped.is_empty() {
        return;
    }

    node.column_ids = without(&node.column_ids, &dropped);
    node.foreign_column_ids = without(&node.foreign_column_ids, &dropped);
    let stale = dropped.tables().difference(&node.referenced_tables());

    debug!("Filter {} no longer reads {}", filter, dropped);
    let videos = tree[filter].videos().difference(&stale);
    tree.set_videos(filter, videos);
}

fn without(columns: &ColumnSet, dropped: &ColumnSet) -> ColumnSet {
    columns
        .iter()
        .filter(|column| !dropped.contains(column))
        .cloned()
        .collect()
}

/// Fold constants in an expression.
///
/// Comparisons involving `NULL` fold to `NULL`; `AND`/`OR` follow
/// three-valued logic.
fn fold_constants(expr: LogicalExpr) -> (LogicalExpr, bool) {
    match expr {
        LogicalExpr::Literal(_) | LogicalExpr::Column(_) => (expr, false),

        LogicalExpr::Binary { left, op, right } => {
            let (folded_left, left_changed) = fold_constants(*left);
            let (folded_right, right_changed) = fold_constants(*right);

            if let (Some(l), Some(r)) = (folded_left.as_literal(), folded_right.as_literal()) {
                if let Some(result) = evaluate_binary(l, op, r) {
                    return (LogicalExpr::Literal(result), true);
                }
            }

            // x AND true = x, x AND false = false
            if op == BinaryOp::And {
                if folded_right.is_bool_literal(true) {
                    return (folded_left, true);
                }
                if folded_left.is_bool_literal(true) {
                    return (folded_right, true);
                }
                if folded_left.is_bool_literal(false) || folded_right.is_bool_literal(false) {
                    return (LogicalExpr::literal(false), true);
                }
            }

            // x OR true = true, x OR false = x
            if op == BinaryOp::Or {
                if folded_left.is_bool_literal(true) || folded_right.is_bool_literal(true) {
                    return (LogicalExpr::literal(true), true);
                }
                if folded_right.is_bool_literal(false) {
                    return (folded_left, true);
                }
                if folded_left.is_bool_literal(false) {
                    return (folded_right, true);
                }
            }

            (
                LogicalExpr::Binary {
                    left: Box::new(folded_left),
                    op,
                    right: Box::new(folded_right),
                },
                left_changed || right_changed,
            )
        }

        LogicalExpr::Not(inner) => {
            let (folded, changed) = fold_constants(*inner);
            match folded.as_literal() {
                Some(Value::Bool(b)) => (LogicalExpr::literal(!b), true),
                Some(Value::Null) => (LogicalExpr::Literal(Value::Null), true),
                _ => (LogicalExpr::Not(Box::new(folded)), changed),
            }
        }
    }
}

/// Evaluate a binary operation on two literal values.
///
/// Returns `None` for operand types that cannot be compared.
fn evaluate_binary(left: &Value, op: BinaryOp, right: &Value) -> Option<Value> {
    if op.is_logical() {
        return match (left, right) {
            (Value::Bool(l), Value::Bool(r)) => Some(Value::Bool(match op {
                BinaryOp::And => *l && *r,
                _ => *l || *r,
            })),
            (Value::Null, Value::Bool(_) | Value::Null)
            | (Value::Bool(_), Value::Null) => evaluate_unknown(left, op, right),
            _ => None,
        };
    }

    if left.is_null() || right.is_null() {
        return Some(Value::Null);
    }
    let ordering = left.compare(right)?;
    op.holds_for(ordering).map(Value::Bool)
}

/// `AND`/`OR` with at least one `NULL` operand.
fn evaluate_unknown(left: &Value, op: BinaryOp, right: &Value) -> Option<Value> {
    let known = [left, right].into_iter().find_map(Value::as_bool);
    let result = match (op, known) {
        (BinaryOp::And, Some(false)) => Value::Bool(false),
        (BinaryOp::Or, Some(true)) => Value::Bool(true),
        _ => Value::Null,
    };
    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vql_core::VideoSet;
    use vql_logical::{FilterNode, InnerJoinNode, ProjectionNode, col, lit};

    #[test]
    fn test_fold_comparison() {
        let (folded, changed) = fold_constants(lit(5).gt(lit(3)));
        assert!(changed);
        assert_eq!(folded, lit(true));

        let (folded, _) = fold_constants(lit(1.5).lte(lit(2)));
        assert_eq!(folded, lit(true));

        let (folded, _) = fold_constants(lit("a").neq(lit("a")));
        assert_eq!(folded, lit(false));
    }

    #[test]
    fn test_fold_null_is_unknown() {
        let (folded, changed) = fold_constants(lit(Value::Null).eq(lit(1)));
        assert!(changed);
        assert_eq!(folded, LogicalExpr::Literal(Value::Null));

        let (folded, _) = fold_constants(lit(Value::Null).eq(lit(1)).and(lit(1).eq(lit(2))));
        assert_eq!(folded, lit(false));

        let (folded, _) = fold_constants(lit(Value::Null).eq(lit(1)).or(lit(1).eq(lit(1))));
        assert_eq!(folded, lit(true));
    }

    #[test]
    fn test_fold_incompatible_types_untouched() {
        let expr = lit("a").eq(lit(1));
        let (folded, changed) = fold_constants(expr.clone());
        assert!(!changed);
        assert_eq!(folded, expr);
    }

    #[test]
    fn test_fold_logical_with_column() {
        let (folded, changed) = fold_constants(col("v1", 1).eq(lit(4)).and(lit(2).eq(lit(2))));
        assert!(changed);
        assert_eq!(folded, col("v1", 1).eq(lit(4)));

        let (folded, _) = fold_constants(col("v1", 1).eq(lit(4)).or(lit(2).eq(lit(2))));
        assert_eq!(folded, lit(true));

        let (folded, changed) = fold_constants(col("v1", 1).eq(lit(4)).not());
        assert!(!changed);
        assert_eq!(folded, col("v1", 1).eq(lit(4)).not());

        let (folded, _) = fold_constants(lit(true).not());
        assert_eq!(folded, lit(false));
    }

    #[test]
    fn test_true_filter_removed() {
        let mut tree = PlanTree::new();
        let t1 = tree.scan("v1");
        let s = tree.filter(t1, FilterNode::new(lit(1).eq(lit(1))));
        let p = tree.project(s, ProjectionNode::columns(["v1.1"]).unwrap());
        tree.set_root(p);

        let result = SimplifyPredicate.apply(&mut tree, s).unwrap();
        assert!(result.changed);
        assert_eq!(result.node, t1);
        assert!(!tree.contains(s));
        assert_eq!(tree[p].children(), &[t1]);
        assert_eq!(tree[t1].parent(), Some(p));
    }

    #[test]
    fn test_false_filter_marked() {
        let mut tree = PlanTree::new();
        let t1 = tree.scan("v1");
        let s = tree.filter(t1, FilterNode::new(col("v1", 2).gt(lit(0)).and(lit(1).eq(lit(0)))));
        tree.set_root(s);

        let result = SimplifyPredicate.apply(&mut tree, s).unwrap();
        assert!(result.changed);
        assert_eq!(result.node, s);
        assert!(tree[s].produces_no_rows());
        assert!(tree[t1].produces_no_rows());
        assert_eq!(tree[s].op().as_filter().unwrap().predicate, lit(false));

        // Already marked: nothing left to do.
        assert!(!SimplifyPredicate.matches(&tree, s));
        assert!(!SimplifyPredicate.apply(&mut tree, s).unwrap().changed);
    }

    #[test]
    fn test_partial_fold_drops_dead_columns() {
        let mut tree = PlanTree::new();
        let t1 = tree.scan("v1");
        let t2 = tree.scan("v2");
        let j = tree.join([t1, t2], InnerJoinNode::on(["v1.3", "v2.3"]).unwrap());
        let dead = col("v1", 1).eq(lit(1)).or(lit(1).eq(lit(1)));
        let s = tree.filter(j, FilterNode::new(col("v2", 1).eq(lit(3)).and(dead)));
        tree.set_root(s);
        assert_eq!(tree[s].videos(), &["v1", "v2"].into_iter().collect::<VideoSet>());

        let result = SimplifyPredicate.apply(&mut tree, s).unwrap();
        assert!(result.changed);
        assert_eq!(result.node, s);

        let node = tree[s].op().as_filter().unwrap();
        assert_eq!(node.predicate, col("v2", 1).eq(lit(3)));
        assert_eq!(node.column_ids, ColumnSet::parse(["v2.1"]).unwrap());
        assert_eq!(tree[s].videos(), &VideoSet::singleton("v2"));
        assert!(!tree[s].produces_no_rows());
    }

    #[test]
    fn test_partial_fold_keeps_declared_scope_of_live_columns() {
        let mut tree = PlanTree::new();
        let t1 = tree.scan("v1");
        let t2 = tree.scan("v2");
        let j = tree.join([t1, t2], InnerJoinNode::on(["v1.3", "v2.3"]).unwrap());
        let predicate = col("v2", 1).eq(lit(3)).and(lit(2).gt(lit(1)));
        let wide: VideoSet = ["v1", "v2"].into_iter().collect();
        let s = tree.filter(j, FilterNode::new(predicate).with_videos(wide.clone()));
        tree.set_root(s);

        assert!(SimplifyPredicate.apply(&mut tree, s).unwrap().changed);
        assert_eq!(tree[s].op().as_filter().unwrap().predicate, col("v2", 1).eq(lit(3)));
        assert_eq!(tree[s].videos(), &wide);
    }

    #[test]
    fn test_non_constant_filter_untouched() {
        let mut tree = PlanTree::new();
        let t1 = tree.scan("v1");
        let s = tree.filter(t1, FilterNode::new(col("v1", 2).gt(lit(0))));
        tree.set_root(s);
        let before = tree.clone();

        assert!(!SimplifyPredicate.apply(&mut tree, s).unwrap().changed);
        assert_eq!(tree, before);
    }
}
