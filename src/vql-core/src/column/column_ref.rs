//! Qualified column references.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use common_error::{VqlError, VqlResult, value_err};

/// Reference to a column of a video table, qualified by the table alias.
///
/// Written as `alias.index`, e.g. `v1.3` is column 3 of the table aliased `v1`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ColumnRef {
    /// Alias of the table (video) the column belongs to.
    pub table: String,
    /// Column position within the table.
    pub index: usize,
}

impl ColumnRef {
    /// Create a new column reference.
    pub fn new(table: impl Into<String>, index: usize) -> Self {
        Self {
            table: table.into(),
            index,
        }
    }

    /// Parse a column reference of the form `alias.index`.
    ///
    /// The alias may itself contain dots; the index is taken after the last one.
    pub fn parse(s: &str) -> VqlResult<Self> {
        let Some((table, index)) = s.rsplit_once('.') else {
            value_err!("column '{s}' is not qualified as alias.index");
        };
        if table.is_empty() {
            value_err!("column '{s}' has an empty table alias");
        }
        let index = index
            .parse::<usize>()
            .map_err(|e| VqlError::value_error(format!("column '{s}' has a bad index: {e}")))?;
        Ok(Self::new(table, index))
    }

    /// Check whether this column belongs to the given table alias.
    pub fn belongs_to(&self, table: &str) -> bool {
        self.table == table
    }
}

impl FromStr for ColumnRef {
    type Err = VqlError;

    fn from_str(s: &str) -> VqlResult<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let col = ColumnRef::parse("v1.3").unwrap();
        assert_eq!(col.table, "v1");
        assert_eq!(col.index, 3);
        assert_eq!(col.to_string(), "v1.3");

        let dotted: ColumnRef = "db.v2.10".parse().unwrap();
        assert_eq!(dotted, ColumnRef::new("db.v2", 10));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            ColumnRef::parse("v1"),
            Err(VqlError::ValueError(_))
        ));
        assert!(ColumnRef::parse(".3").is_err());
        assert!(ColumnRef::parse("v1.x").is_err());
        assert!(ColumnRef::parse("v1.-1").is_err());
    }

    #[test]
    fn test_belongs_to() {
        let col = ColumnRef::new("v2", 4);
        assert!(col.belongs_to("v2"));
        assert!(!col.belongs_to("v1"));
    }
}
