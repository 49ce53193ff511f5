//! Error types and result aliases for VQL.
//!
//! Every crate in the workspace reports failures through [`VqlError`].

mod error;

pub use error::{VqlError, VqlResult};
