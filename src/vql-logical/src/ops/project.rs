//! Projection operator.

use serde::{Deserialize, Serialize};
use vql_core::ColumnSet;

/// Projection to an ordered, duplicate-free set of qualified columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionNode {
    /// Output columns required above this node.
    pub column_ids: ColumnSet,
}

impl ProjectionNode {
    pub fn new(column_ids: ColumnSet) -> Self {
        Self { column_ids }
    }

    /// Build a projection from column literals such as `"v1.3"`.
    pub fn columns<'a>(
        columns: impl IntoIterator<Item = &'a str>,
    ) -> common_error::VqlResult<Self> {
        Ok(Self::new(ColumnSet::parse(columns)?))
    }
}
