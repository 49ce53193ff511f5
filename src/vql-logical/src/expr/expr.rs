//! Logical predicate expressions.

use std::fmt;

use serde::{Deserialize, Serialize};
use vql_core::{ColumnRef, ColumnSet, Value, VideoSet};

use super::BinaryOp;

/// A predicate expression attached to a filter node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LogicalExpr {
    /// Qualified column reference.
    Column(ColumnRef),
    /// Constant value.
    Literal(Value),
    /// Comparison or logical connective.
    Binary {
        left: Box<LogicalExpr>,
        op: BinaryOp,
        right: Box<LogicalExpr>,
    },
    /// Logical negation.
    Not(Box<LogicalExpr>),
}

impl LogicalExpr {
    /// Create a literal expression.
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    /// Create a binary expression.
    pub fn binary(left: LogicalExpr, op: BinaryOp, right: LogicalExpr) -> Self {
        Self::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    pub fn eq(self, other: LogicalExpr) -> Self {
        Self::binary(self, BinaryOp::Eq, other)
    }

    pub fn neq(self, other: LogicalExpr) -> Self {
        Self::binary(self, BinaryOp::NotEq, other)
    }

    pub fn gt(self, other: LogicalExpr) -> Self {
        Self::binary(self, BinaryOp::Gt, other)
    }

    pub fn gte(self, other: LogicalExpr) -> Self {
        Self::binary(self, BinaryOp::GtEq, other)
    }

    pub fn lt(self, other: LogicalExpr) -> Self {
        Self::binary(self, BinaryOp::Lt, other)
    }

    pub fn lte(self, other: LogicalExpr) -> Self {
        Self::binary(self, BinaryOp::LtEq, other)
    }

    pub fn and(self, other: LogicalExpr) -> Self {
        Self::binary(self, BinaryOp::And, other)
    }

    pub fn or(self, other: LogicalExpr) -> Self {
        Self::binary(self, BinaryOp::Or, other)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Get the literal value if this expression is a constant.
    pub fn as_literal(&self) -> Option<&Value> {
        match self {
            Self::Literal(v) => Some(v),
            _ => None,
        }
    }

    /// Check whether this expression is exactly the boolean literal `value`.
    pub fn is_bool_literal(&self, value: bool) -> bool {
        matches!(self, Self::Literal(Value::Bool(b)) if *b == value)
    }

    /// All qualified columns referenced by this expression, in first-seen order.
    pub fn column_refs(&self) -> ColumnSet {
        let mut refs = ColumnSet::new();
        self.collect_columns(&mut refs);
        refs
    }

    fn collect_columns(&self, refs: &mut ColumnSet) {
        match self {
            Self::Column(c) => {
                refs.insert(c.clone());
            }
            Self::Literal(_) => {}
            Self::Binary { left, right, .. } => {
                left.collect_columns(refs);
                right.collect_columns(refs);
            }
            Self::Not(inner) => inner.collect_columns(refs),
        }
    }

    /// Table aliases referenced by this expression.
    pub fn tables(&self) -> VideoSet {
        self.column_refs().tables()
    }

    /// Check whether the expression references no column at all.
    pub fn is_constant(&self) -> bool {
        self.column_refs().is_empty()
    }

    /// Match an equality between two columns, `a = b`.
    pub fn as_column_equality(&self) -> Option<(&ColumnRef, &ColumnRef)> {
        match self {
            Self::Binary {
                left,
                op: BinaryOp::Eq,
                right,
            } => match (left.as_ref(), right.as_ref()) {
                (Self::Column(l), Self::Column(r)) => Some((l, r)),
                _ => None,
            },
            _ => None,
        }
    }
}

impl fmt::Display for LogicalExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Column(c) => write!(f, "{c}"),
            Self::Literal(v) => write!(f, "{v}"),
            Self::Binary { left, op, right } if op.is_logical() => {
                write!(f, "({left} {op} {right})")
            }
            Self::Binary { left, op, right } => write!(f, "{left} {op} {right}"),
            Self::Not(inner) => write!(f, "NOT ({inner})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{col, lit};

    #[test]
    fn test_column_refs() {
        let expr = col("v1", 1)
            .eq(lit(4))
            .and(col("v2", 3).gt(col("v1", 1)));

        let refs = expr.column_refs();
        assert_eq!(refs, ColumnSet::parse(["v1.1", "v2.3"]).unwrap());
        assert_eq!(expr.tables().len(), 2);
        assert!(!expr.is_constant());
        assert!(lit(1).eq(lit(0)).is_constant());
    }

    #[test]
    fn test_column_equality() {
        let join_cond = col("v1", 3).eq(col("v2", 3));
        let (l, r) = join_cond.as_column_equality().unwrap();
        assert_eq!(l, &ColumnRef::new("v1", 3));
        assert_eq!(r, &ColumnRef::new("v2", 3));

        assert!(col("v1", 3).eq(lit(1)).as_column_equality().is_none());
        assert!(col("v1", 3).lt(col("v2", 3)).as_column_equality().is_none());
    }

    #[test]
    fn test_display() {
        let expr = col("v1", 1).eq(lit(4)).or(lit(true).not());
        assert_eq!(expr.to_string(), "(v1.1 = 4 OR NOT (true))");
    }

    #[test]
    fn test_bool_literal() {
        assert!(lit(true).is_bool_literal(true));
        assert!(!lit(true).is_bool_literal(false));
        assert!(!lit(1).is_bool_literal(true));
    }
}
