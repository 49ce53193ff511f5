//! Semantic validation for plan trees.
//!
//! Checks the attributes the optimizer trusts:
//! - `videos` agree with the tables actually scanned below each node
//! - Column identifiers only name reachable tables
//! - Foreign-key columns are part of the condition they annotate
//!
//! Assumes the tree already passed structural validation.

use vql_core::{ColumnRef, ColumnSet, VideoSet};

use crate::ops::PlanNode;
use crate::tree::{NodeId, PlanTree};

/// A semantic validation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SemanticValidationError {
    /// A node's `videos` differ from what its subtree scans.
    VideosMismatch {
        node: NodeId,
        operator: &'static str,
        expected: VideoSet,
        actual: VideoSet,
    },

    /// A filter is scoped to tables its child does not scan.
    FilterScopeExceeded {
        node: NodeId,
        videos: VideoSet,
        reachable: VideoSet,
    },

    /// A column names a table that is not scanned below the node.
    UnreachableColumn {
        node: NodeId,
        operator: &'static str,
        column: ColumnRef,
    },

    /// A foreign-key column is not part of the node's condition.
    ForeignColumnNotInCondition { node: NodeId, column: ColumnRef },
}

impl std::fmt::Display for SemanticValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::VideosMismatch {
                node,
                operator,
                expected,
                actual,
            } => write!(
                f,
                "{operator} {node} has videos {actual}, expected {expected}"
            ),
            Self::FilterScopeExceeded {
                node,
                videos,
                reachable,
            } => write!(
                f,
                "Filter {node} is scoped to {videos} but only {reachable} is reachable"
            ),
            Self::UnreachableColumn {
                node,
                operator,
                column,
            } => write!(f, "{operator} {node} references unreachable column {column}"),
            Self::ForeignColumnNotInCondition { node, column } => {
                write!(f, "Foreign column {column} of {node} is not in its condition")
            }
        }
    }
}

impl std::error::Error for SemanticValidationError {}

/// Semantic validator for plan trees.
pub struct SemanticValidator;

impl SemanticValidator {
    /// Validate node attributes against the tree they sit in.
    pub fn validate(tree: &PlanTree) -> Result<(), Vec<SemanticValidationError>> {
        let mut errors = Vec::new();

        if let Some(root) = tree.root() {
            for id in tree.preorder(root) {
                Self::validate_node(tree, id, &mut errors);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_node(tree: &PlanTree, id: NodeId, errors: &mut Vec<SemanticValidationError>) {
        let entry = &tree[id];
        let operator = entry.op().name();
        let reachable = tree.reachable_tables(id);

        match entry.op() {
            PlanNode::TableScan(_) | PlanNode::Projection(_) | PlanNode::InnerJoin(_) => {
                if entry.videos() != &reachable {
                    errors.push(SemanticValidationError::VideosMismatch {
                        node: id,
                        operator,
                        expected: reachable.clone(),
                        actual: entry.videos().clone(),
                    });
                }
            }
            PlanNode::Filter(_) => {
                if !entry.videos().is_subset(&reachable) {
                    errors.push(SemanticValidationError::FilterScopeExceeded {
                        node: id,
                        videos: entry.videos().clone(),
                        reachable: reachable.clone(),
                    });
                }
            }
        }

        let (columns, foreign) = match entry.op() {
            PlanNode::TableScan(_) => return,
            PlanNode::Filter(filter) => (&filter.column_ids, Some(&filter.foreign_column_ids)),
            PlanNode::Projection(projection) => (&projection.column_ids, None),
            PlanNode::InnerJoin(join) => (&join.join_ids, Some(&join.foreign_column_ids)),
        };

        for column in columns {
            if !reachable.contains(&column.table) {
                errors.push(SemanticValidationError::UnreachableColumn {
                    node: id,
                    operator,
                    column: column.clone(),
                });
            }
        }

        for column in foreign.map(ColumnSet::iter).into_iter().flatten() {
            if !columns.contains(column) {
                errors.push(SemanticValidationError::ForeignColumnNotInCondition {
                    node: id,
                    column: column.clone(),
                });
            }
        }
    }
}
