//! Constant value representation.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Constant value appearing in a predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit floating point.
    Float64(f64),
    /// UTF-8 string.
    String(String),
}

impl Value {
    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Try to get as boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get as i64.
    pub fn as_int64(&self) -> Option<i64> {
        match self {
            Self::Int64(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get as f64, widening integers.
    pub fn as_float64(&self) -> Option<f64> {
        match self {
            Self::Float64(f) => Some(*f),
            Self::Int64(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Get the type name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "Null",
            Self::Bool(_) => "Bool",
            Self::Int64(_) => "Int64",
            Self::Float64(_) => "Float64",
            Self::String(_) => "String",
        }
    }

    /// Compare two values of compatible types.
    ///
    /// Integers and floats compare numerically. Returns `None` when either
    /// side is null, the types are incompatible, or a float is NaN.
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Int64(l), Self::Int64(r)) => Some(l.cmp(r)),
            (Self::Bool(l), Self::Bool(r)) => Some(l.cmp(r)),
            (Self::String(l), Self::String(r)) => Some(l.cmp(r)),
            (Self::Int64(_) | Self::Float64(_), Self::Int64(_) | Self::Float64(_)) => {
                let l = self.as_float64()?;
                let r = other.as_float64()?;
                l.partial_cmp(&r)
            }
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int64(i) => write!(f, "{i}"),
            Self::Float64(v) => write!(f, "{v}"),
            Self::String(s) => write!(f, "'{s}'"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int64(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int64(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float64(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_same_type() {
        assert_eq!(Value::Int64(1).compare(&Value::Int64(2)), Some(Ordering::Less));
        assert_eq!(
            Value::from("b").compare(&Value::from("a")),
            Some(Ordering::Greater)
        );
        assert_eq!(
            Value::Bool(true).compare(&Value::Bool(true)),
            Some(Ordering::Equal)
        );
    }

    #[test]
    fn test_compare_numeric_widening() {
        assert_eq!(
            Value::Int64(4).compare(&Value::Float64(4.0)),
            Some(Ordering::Equal)
        );
        assert_eq!(
            Value::Float64(2.5).compare(&Value::Int64(3)),
            Some(Ordering::Less)
        );
    }

    #[test]
    fn test_compare_incompatible() {
        assert_eq!(Value::Null.compare(&Value::Null), None);
        assert_eq!(Value::Int64(1).compare(&Value::from("1")), None);
        assert_eq!(Value::Float64(f64::NAN).compare(&Value::Float64(1.0)), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Null.to_string(), "NULL");
        assert_eq!(Value::from(4).to_string(), "4");
        assert_eq!(Value::from("cat").to_string(), "'cat'");
    }
}
