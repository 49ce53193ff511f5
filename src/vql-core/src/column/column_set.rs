//! Ordered, duplicate-free column sets.

use std::fmt;

use serde::{Deserialize, Serialize};

use common_error::VqlResult;

use super::{ColumnRef, VideoSet};

/// An insertion-ordered set of qualified columns.
///
/// Order carries no meaning for correctness but is preserved so rewrites are
/// deterministic. Equality is order-sensitive; use [`ColumnSet::same_columns`]
/// for set equality.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSet(Vec<ColumnRef>);

impl ColumnSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a list of `alias.index` literals.
    pub fn parse<'a>(columns: impl IntoIterator<Item = &'a str>) -> VqlResult<Self> {
        columns.into_iter().map(ColumnRef::parse).collect()
    }

    /// Insert a column. Returns `true` if it was not present.
    pub fn insert(&mut self, column: ColumnRef) -> bool {
        if self.0.contains(&column) {
            return false;
        }
        self.0.push(column);
        true
    }

    pub fn contains(&self, column: &ColumnRef) -> bool {
        self.0.contains(column)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ColumnRef> {
        self.0.iter()
    }

    /// Columns of `self` followed by the columns of `other` not already present.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let mut merged = self.clone();
        merged.extend(other.iter().cloned());
        merged
    }

    /// Columns of `self` that also appear in `other`, in `self`'s order.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Self {
        self.iter().filter(|c| other.contains(c)).cloned().collect()
    }

    /// Columns whose table alias is in `tables`, in order.
    #[must_use]
    pub fn restrict_to(&self, tables: &VideoSet) -> Self {
        self.iter()
            .filter(|c| tables.contains(&c.table))
            .cloned()
            .collect()
    }

    /// The set of table aliases referenced by these columns.
    pub fn tables(&self) -> VideoSet {
        self.iter().map(|c| c.table.clone()).collect()
    }

    pub fn is_subset(&self, other: &Self) -> bool {
        self.iter().all(|c| other.contains(c))
    }

    /// Set equality, ignoring order.
    pub fn same_columns(&self, other: &Self) -> bool {
        self.len() == other.len() && self.is_subset(other)
    }
}

impl FromIterator<ColumnRef> for ColumnSet {
    fn from_iter<I: IntoIterator<Item = ColumnRef>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl Extend<ColumnRef> for ColumnSet {
    fn extend<I: IntoIterator<Item = ColumnRef>>(&mut self, iter: I) {
        for column in iter {
            self.insert(column);
        }
    }
}

impl<'a> IntoIterator for &'a ColumnSet {
    type Item = &'a ColumnRef;
    type IntoIter = std::slice::Iter<'a, ColumnRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for ColumnSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cols: Vec<String> = self.iter().map(ToString::to_string).collect();
        write!(f, "[{}]", cols.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn cols(raw: &[&str]) -> ColumnSet {
        ColumnSet::parse(raw.iter().copied()).unwrap()
    }

    #[test]
    fn test_insert_dedups() {
        let mut set = cols(&["v1.1", "v2.2"]);
        assert!(!set.insert(ColumnRef::new("v1", 1)));
        assert!(set.insert(ColumnRef::new("v1", 3)));
        assert_eq!(set, cols(&["v1.1", "v2.2", "v1.3"]));
    }

    #[test]
    fn test_union_preserves_order() {
        let set = cols(&["v1.3", "v1.4"]).union(&cols(&["v1.7", "v1.3"]));
        assert_eq!(set, cols(&["v1.3", "v1.4", "v1.7"]));
    }

    #[test]
    fn test_restrict_and_tables() {
        let set = cols(&["v1.1", "v2.1", "v1.3", "v3.9"]);
        let tables: VideoSet = ["v1", "v3"].into_iter().collect();

        assert_eq!(set.restrict_to(&tables), cols(&["v1.1", "v1.3", "v3.9"]));
        assert_eq!(set.tables().len(), 3);
    }

    #[test]
    fn test_same_columns_ignores_order() {
        assert!(cols(&["v1.1", "v1.3"]).same_columns(&cols(&["v1.3", "v1.1"])));
        assert!(!cols(&["v1.1"]).same_columns(&cols(&["v1.1", "v1.3"])));
    }

    #[test]
    fn test_parse_error() {
        assert!(ColumnSet::parse(["v1.1", "broken"]).is_err());
    }

    #[test]
    fn test_serde_roundtrip() {
        let set = cols(&["v2.4", "v1.1"]);
        let json = serde_json::to_string(&set).unwrap();
        let back: ColumnSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
    }

    fn arb_column() -> impl Strategy<Value = ColumnRef> {
        ("v[1-4]", 0usize..6).prop_map(|(table, index)| ColumnRef::new(table, index))
    }

    proptest! {
        #[test]
        fn prop_never_holds_duplicates(columns in prop::collection::vec(arb_column(), 0..30)) {
            let set: ColumnSet = columns.iter().cloned().collect();
            for (i, a) in set.iter().enumerate() {
                for b in set.iter().skip(i + 1) {
                    prop_assert_ne!(a, b);
                }
            }
            for c in &columns {
                prop_assert!(set.contains(c));
            }
        }

        #[test]
        fn prop_union_and_intersection(
            left in prop::collection::vec(arb_column(), 0..12),
            right in prop::collection::vec(arb_column(), 0..12),
        ) {
            let l: ColumnSet = left.into_iter().collect();
            let r: ColumnSet = right.into_iter().collect();

            let union = l.union(&r);
            prop_assert!(l.is_subset(&union));
            prop_assert!(r.is_subset(&union));

            let inter = l.intersection(&r);
            prop_assert!(inter.is_subset(&l));
            prop_assert!(inter.is_subset(&r));
        }
    }
}
