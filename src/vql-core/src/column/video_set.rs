//! Sets of table aliases reachable under a plan node.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// An ordered set of video (table) aliases.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoSet(BTreeSet<String>);

impl VideoSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a set holding a single alias.
    pub fn singleton(alias: impl Into<String>) -> Self {
        let mut set = Self::new();
        set.insert(alias);
        set
    }

    /// Insert an alias. Returns `true` if it was not present.
    pub fn insert(&mut self, alias: impl Into<String>) -> bool {
        self.0.insert(alias.into())
    }

    /// Check whether the alias is in the set.
    pub fn contains(&self, alias: &str) -> bool {
        self.0.contains(alias)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over aliases in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn is_subset(&self, other: &Self) -> bool {
        self.0.is_subset(&other.0)
    }

    /// Check whether the two sets share at least one alias.
    pub fn intersects(&self, other: &Self) -> bool {
        !self.0.is_disjoint(&other.0)
    }

    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self(self.0.union(&other.0).cloned().collect())
    }

    #[must_use]
    pub fn intersection(&self, other: &Self) -> Self {
        Self(self.0.intersection(&other.0).cloned().collect())
    }

    #[must_use]
    pub fn difference(&self, other: &Self) -> Self {
        Self(self.0.difference(&other.0).cloned().collect())
    }
}

impl FromIterator<String> for VideoSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> FromIterator<&'a str> for VideoSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self(iter.into_iter().map(str::to_string).collect())
    }
}

impl Extend<String> for VideoSet {
    fn extend<I: IntoIterator<Item = String>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl fmt::Display for VideoSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let aliases: Vec<&str> = self.iter().collect();
        write!(f, "{{{}}}", aliases.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_operations() {
        let a: VideoSet = ["v1", "v2"].into_iter().collect();
        let b: VideoSet = ["v2", "v3"].into_iter().collect();

        assert_eq!(a.union(&b).len(), 3);
        assert_eq!(a.intersection(&b), VideoSet::singleton("v2"));
        assert_eq!(a.difference(&b), VideoSet::singleton("v1"));
        assert!(a.intersects(&b));
        assert!(VideoSet::singleton("v1").is_subset(&a));
        assert!(!VideoSet::singleton("v3").intersects(&a));
    }

    #[test]
    fn test_display_sorted() {
        let set: VideoSet = ["v3", "v1"].into_iter().collect();
        assert_eq!(set.to_string(), "{v1, v3}");
        assert_eq!(VideoSet::new().to_string(), "{}");
    }
}
