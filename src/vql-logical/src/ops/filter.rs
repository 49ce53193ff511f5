//! Filter (select) operator.

use serde::{Deserialize, Serialize};
use vql_core::{ColumnSet, VideoSet};

use crate::expr::LogicalExpr;

/// Filter rows by a predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterNode {
    /// Filter predicate.
    pub predicate: LogicalExpr,
    /// Columns the predicate requires, plus any it passes through.
    pub column_ids: ColumnSet,
    /// Subset of `column_ids` functionally determined by a foreign key.
    pub foreign_column_ids: ColumnSet,
    /// Declared table scope, taken by the tree when the filter is attached.
    /// Defaults to the tables of `column_ids`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub videos: Option<VideoSet>,
}

impl FilterNode {
    /// Create a filter whose required columns are the predicate's columns.
    pub fn new(predicate: LogicalExpr) -> Self {
        let column_ids = predicate.column_refs();
        Self {
            predicate,
            column_ids,
            foreign_column_ids: ColumnSet::new(),
            videos: None,
        }
    }

    /// Override the required columns.
    #[must_use]
    pub fn with_column_ids(mut self, column_ids: ColumnSet) -> Self {
        self.column_ids = column_ids;
        self
    }

    /// Declare foreign-key columns.
    #[must_use]
    pub fn with_foreign_columns(mut self, columns: ColumnSet) -> Self {
        self.foreign_column_ids = columns;
        self
    }

    /// Declare a wider table scope, e.g. for a filter placed above a join.
    #[must_use]
    pub fn with_videos(mut self, videos: VideoSet) -> Self {
        self.videos = Some(videos);
        self
    }

    /// Tables this filter actually references: those of its required
    /// columns and of its predicate.
    pub fn referenced_tables(&self) -> VideoSet {
        self.column_ids.tables().union(&self.predicate.tables())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{col, lit};

    #[test]
    fn test_filter_defaults() {
        let filter = FilterNode::new(col("v1", 1).eq(lit(4)));
        assert_eq!(filter.column_ids, ColumnSet::parse(["v1.1"]).unwrap());
        assert!(filter.foreign_column_ids.is_empty());
        assert!(filter.videos.is_none());
        assert_eq!(filter.referenced_tables(), VideoSet::singleton("v1"));
    }

    #[test]
    fn test_referenced_tables_union() {
        let filter = FilterNode::new(col("v1", 1).eq(lit(4)))
            .with_column_ids(ColumnSet::parse(["v2.7"]).unwrap())
            .with_videos(["v1", "v2", "v3"].into_iter().collect());
        let tables = filter.referenced_tables();
        assert!(tables.contains("v1"));
        assert!(tables.contains("v2"));
        assert!(!tables.contains("v3"));
    }
}
