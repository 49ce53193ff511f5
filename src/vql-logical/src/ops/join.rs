//! Inner join operator.

use serde::{Deserialize, Serialize};
use vql_core::ColumnSet;

/// Inner join of two or more branches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InnerJoinNode {
    /// Columns forming the join condition, one or more per branch.
    pub join_ids: ColumnSet,
    /// Subset of `join_ids` that are declared foreign keys.
    pub foreign_column_ids: ColumnSet,
}

impl InnerJoinNode {
    pub fn new(join_ids: ColumnSet) -> Self {
        Self {
            join_ids,
            foreign_column_ids: ColumnSet::new(),
        }
    }

    /// Build a join from column literals such as `"v1.3"`.
    pub fn on<'a>(columns: impl IntoIterator<Item = &'a str>) -> common_error::VqlResult<Self> {
        Ok(Self::new(ColumnSet::parse(columns)?))
    }

    /// Declare foreign-key columns of the join condition.
    #[must_use]
    pub fn with_foreign_columns(mut self, columns: ColumnSet) -> Self {
        self.foreign_column_ids = columns;
        self
    }
}
