//! Table scan operator.

use serde::{Deserialize, Serialize};

/// Scan of a single table alias. Always a leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableScanNode {
    /// Table alias, e.g. `v1`.
    pub tablename: String,
}

impl TableScanNode {
    pub fn new(tablename: impl Into<String>) -> Self {
        Self {
            tablename: tablename.into(),
        }
    }
}
