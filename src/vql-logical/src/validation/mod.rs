//! Validation layer for VQL plan trees.
//!
//! Rewrites trust the links and attributes of the tree they are given, so a
//! malformed plan is rejected up front instead of being rewritten into a
//! silently wrong one.
//!
//! ## Structural Validation
//!
//! - Parent/child links agree in both directions
//! - Single ownership, no cycles, no orphans
//! - Operator arity
//!
//! ## Semantic Validation
//!
//! - `videos` match the tables scanned below each node
//! - Column references only name reachable tables
//!
//! # Example
//!
//! ```rust
//! use vql_logical::{FilterNode, PlanTree, col, lit};
//! use vql_logical::validation::validate_plan;
//!
//! let mut tree = PlanTree::new();
//! let scan = tree.scan("v1");
//! let filter = tree.filter(scan, FilterNode::new(col("v1", 1).eq(lit(4))));
//! tree.set_root(filter);
//!
//! assert!(validate_plan(&tree).is_ok());
//! ```

mod semantic;
mod structural;

pub use semantic::{SemanticValidationError, SemanticValidator};
pub use structural::{StructuralValidationError, StructuralValidator, is_acyclic};

use common_error::{VqlError, VqlResult};

use crate::PlanTree;

/// A validation error that can occur during plan validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Structural validation error.
    Structural(StructuralValidationError),
    /// Semantic validation error.
    Semantic(SemanticValidationError),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Structural(e) => write!(f, "Structural error: {e}"),
            Self::Semantic(e) => write!(f, "Semantic error: {e}"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Run both validators and collect every violation.
///
/// Semantic checks only run once the structure is sound.
pub fn collect_violations(tree: &PlanTree) -> Result<(), Vec<ValidationError>> {
    StructuralValidator::validate(tree)
        .map_err(|errors| errors.into_iter().map(ValidationError::Structural).collect::<Vec<_>>())?;
    SemanticValidator::validate(tree)
        .map_err(|errors| errors.into_iter().map(ValidationError::Semantic).collect())
}

/// Validate a plan tree, reporting every violation as one `InvalidPlan`.
pub fn validate_plan(tree: &PlanTree) -> VqlResult<()> {
    collect_violations(tree).map_err(|errors| {
        let listing = errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        VqlError::invalid_plan(listing)
    })
}
