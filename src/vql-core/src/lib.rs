//! Core data model for VQL plans.
//!
//! This crate provides the leaf types the optimizer reasons about:
//! - `Value` for constants appearing in predicates
//! - `ColumnRef` for qualified columns (`alias.index`)
//! - `ColumnSet` and `VideoSet` for the column and table sets carried by plan nodes

pub mod column;
pub mod types;

pub use column::{ColumnRef, ColumnSet, VideoSet};
pub use types::Value;
