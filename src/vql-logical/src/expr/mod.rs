//! Predicate expression model.
//!
//! The optimizer only inspects operator kinds, operand kinds, and the
//! qualified columns an expression touches; evaluation belongs to the
//! execution engine.

mod binary;
#[allow(clippy::module_inception)]
mod expr;

pub use binary::BinaryOp;
pub use expr::LogicalExpr;

use vql_core::{ColumnRef, Value};

/// Create a column reference expression.
pub fn col(table: impl Into<String>, index: usize) -> LogicalExpr {
    LogicalExpr::Column(ColumnRef::new(table, index))
}

/// Create a literal expression.
pub fn lit(value: impl Into<Value>) -> LogicalExpr {
    LogicalExpr::Literal(value.into())
}
