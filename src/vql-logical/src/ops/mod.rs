//! Logical operators carried by plan tree nodes.

mod filter;
mod join;
mod project;
mod scan;

pub use filter::FilterNode;
pub use join::InnerJoinNode;
pub use project::ProjectionNode;
pub use scan::TableScanNode;

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of a plan node, used for rule pattern matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    TableScan,
    Filter,
    Projection,
    InnerJoin,
}

impl NodeKind {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::TableScan => "TableScan",
            Self::Filter => "Filter",
            Self::Projection => "Projection",
            Self::InnerJoin => "InnerJoin",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Operator payload of a plan node.
///
/// Tree links and reachable tables live on the enclosing
/// [`NodeEntry`](crate::NodeEntry); the variants only hold what the
/// operator itself declares.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlanNode {
    /// Read every row of one table alias.
    TableScan(TableScanNode),
    /// Keep rows satisfying a predicate.
    Filter(FilterNode),
    /// Keep only the listed columns.
    Projection(ProjectionNode),
    /// Inner join of two or more branches.
    InnerJoin(InnerJoinNode),
}

impl PlanNode {
    /// Get the kind of this operator.
    pub const fn kind(&self) -> NodeKind {
        match self {
            Self::TableScan(_) => NodeKind::TableScan,
            Self::Filter(_) => NodeKind::Filter,
            Self::Projection(_) => NodeKind::Projection,
            Self::InnerJoin(_) => NodeKind::InnerJoin,
        }
    }

    /// Get the name of this operator.
    pub const fn name(&self) -> &'static str {
        self.kind().name()
    }

    pub fn as_scan(&self) -> Option<&TableScanNode> {
        match self {
            Self::TableScan(scan) => Some(scan),
            _ => None,
        }
    }

    pub fn as_filter(&self) -> Option<&FilterNode> {
        match self {
            Self::Filter(filter) => Some(filter),
            _ => None,
        }
    }

    pub fn as_projection(&self) -> Option<&ProjectionNode> {
        match self {
            Self::Projection(projection) => Some(projection),
            _ => None,
        }
    }

    pub fn as_join(&self) -> Option<&InnerJoinNode> {
        match self {
            Self::InnerJoin(join) => Some(join),
            _ => None,
        }
    }
}

impl From<TableScanNode> for PlanNode {
    fn from(node: TableScanNode) -> Self {
        Self::TableScan(node)
    }
}

impl From<FilterNode> for PlanNode {
    fn from(node: FilterNode) -> Self {
        Self::Filter(node)
    }
}

impl From<ProjectionNode> for PlanNode {
    fn from(node: ProjectionNode) -> Self {
        Self::Projection(node)
    }
}

impl From<InnerJoinNode> for PlanNode {
    fn from(node: InnerJoinNode) -> Self {
        Self::InnerJoin(node)
    }
}

impl fmt::Display for PlanNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TableScan(scan) => write!(f, "TableScan {}", scan.tablename),
            Self::Filter(filter) => write!(f, "Filter {}", filter.predicate),
            Self::Projection(projection) => write!(f, "Projection {}", projection.column_ids),
            Self::InnerJoin(join) => write!(f, "InnerJoin on {}", join.join_ids),
        }
    }
}
