//! Structural validation for plan trees.
//!
//! This module validates the shape of a plan tree:
//! - Parent/child links agree in both directions
//! - Every node has at most one owner and no cycles exist
//! - Operator arity (scan 0, filter/projection 1, join at least 2)

use std::collections::{HashMap, HashSet};

use crate::ops::NodeKind;
use crate::tree::{NodeId, PlanTree};

/// A structural validation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuralValidationError {
    /// The plan has no root.
    EmptyPlan,

    /// The root records a parent.
    RootHasParent { root: NodeId, parent: NodeId },

    /// A node lists a child that was discarded.
    DanglingChild { node: NodeId, child: NodeId },

    /// A child does not point back to the node listing it.
    ParentMismatch {
        node: NodeId,
        child: NodeId,
        recorded: Option<NodeId>,
    },

    /// A node records a parent that does not list it.
    NotListedByParent { node: NodeId, parent: NodeId },

    /// A node appears in more than one `children` position.
    MultipleOwners { node: NodeId, owners: usize },

    /// A live node is neither the root nor attached to a parent.
    Orphan { node: NodeId },

    /// The plan contains a cycle.
    CycleDetected { node: NodeId },

    /// An operator has the wrong number of children.
    InvalidArity {
        node: NodeId,
        operator: &'static str,
        expected: &'static str,
        actual: usize,
    },
}

impl std::fmt::Display for StructuralValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyPlan => write!(f, "Plan is empty"),
            Self::RootHasParent { root, parent } => {
                write!(f, "Root {root} has parent {parent}")
            }
            Self::DanglingChild { node, child } => {
                write!(f, "Node {node} lists discarded child {child}")
            }
            Self::ParentMismatch {
                node,
                child,
                recorded,
            } => match recorded {
                Some(recorded) => write!(
                    f,
                    "Child {child} of {node} points to parent {recorded}"
                ),
                None => write!(f, "Child {child} of {node} has no parent"),
            },
            Self::NotListedByParent { node, parent } => {
                write!(f, "Node {node} is not a child of its parent {parent}")
            }
            Self::MultipleOwners { node, owners } => {
                write!(f, "Node {node} is owned {owners} times")
            }
            Self::Orphan { node } => write!(f, "Node {node} is detached from the plan"),
            Self::CycleDetected { node } => write!(f, "Cycle detected in plan at: {node}"),
            Self::InvalidArity {
                node,
                operator,
                expected,
                actual,
            } => write!(
                f,
                "Invalid arity for {operator} {node}: expected {expected} children, got {actual}"
            ),
        }
    }
}

impl std::error::Error for StructuralValidationError {}

/// Structural validator for plan trees.
pub struct StructuralValidator;

impl StructuralValidator {
    /// Validate the structural integrity of a plan tree.
    ///
    /// Returns `Ok(())` if the plan is structurally valid, or a list of errors.
    pub fn validate(tree: &PlanTree) -> Result<(), Vec<StructuralValidationError>> {
        let mut errors = Vec::new();

        let Some(root) = tree.root() else {
            return Err(vec![StructuralValidationError::EmptyPlan]);
        };
        if !tree.contains(root) {
            return Err(vec![StructuralValidationError::EmptyPlan]);
        }

        Self::validate_links(tree, root, &mut errors);

        // Walking a tree with broken links could loop or index discarded
        // nodes, so shape checks only run on consistent links.
        if errors.is_empty() {
            Self::validate_shape(tree, root, &mut errors);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Check parent/child agreement and single ownership over the arena.
    fn validate_links(tree: &PlanTree, root: NodeId, errors: &mut Vec<StructuralValidationError>) {
        if let Some(parent) = tree[root].parent() {
            errors.push(StructuralValidationError::RootHasParent { root, parent });
        }

        let mut owners: HashMap<NodeId, usize> = HashMap::new();

        for (id, entry) in tree.iter() {
            for &child in entry.children() {
                *owners.entry(child).or_default() += 1;

                match tree.get(child) {
                    None => errors.push(StructuralValidationError::DanglingChild { node: id, child }),
                    Some(c) if c.parent() != Some(id) => {
                        errors.push(StructuralValidationError::ParentMismatch {
                            node: id,
                            child,
                            recorded: c.parent(),
                        });
                    }
                    Some(_) => {}
                }
            }

            match entry.parent() {
                Some(parent) => {
                    let listed = tree
                        .get(parent)
                        .is_some_and(|p| p.children().contains(&id));
                    if !listed {
                        errors.push(StructuralValidationError::NotListedByParent { node: id, parent });
                    }
                }
                None if id != root => errors.push(StructuralValidationError::Orphan { node: id }),
                None => {}
            }
        }

        let mut shared: Vec<_> = owners.into_iter().filter(|&(_, n)| n > 1).collect();
        shared.sort();
        for (node, owners) in shared {
            errors.push(StructuralValidationError::MultipleOwners { node, owners });
        }
    }

    /// Walk from the root checking acyclicity and arity.
    fn validate_shape(tree: &PlanTree, root: NodeId, errors: &mut Vec<StructuralValidationError>) {
        let mut visited = HashSet::new();
        let mut stack = vec![root];

        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                errors.push(StructuralValidationError::CycleDetected { node: id });
                return;
            }

            let entry = &tree[id];
            let actual = entry.children().len();
            let (valid, expected) = match entry.kind() {
                NodeKind::TableScan => (actual == 0, "0"),
                NodeKind::Filter | NodeKind::Projection => (actual == 1, "1"),
                NodeKind::InnerJoin => (actual >= 2, "at least 2"),
            };
            if !valid {
                errors.push(StructuralValidationError::InvalidArity {
                    node: id,
                    operator: entry.op().name(),
                    expected,
                    actual,
                });
            }

            stack.extend(entry.children().iter().copied());
        }
    }
}

/// Check if a plan tree is acyclic when walked from its root.
pub fn is_acyclic(tree: &PlanTree) -> bool {
    let Some(root) = tree.root() else {
        return true;
    };
    let mut visited = HashSet::new();
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        if !visited.insert(id) {
            return false;
        }
        match tree.get(id) {
            Some(entry) => stack.extend(entry.children().iter().copied()),
            None => return false,
        }
    }
    true
}
