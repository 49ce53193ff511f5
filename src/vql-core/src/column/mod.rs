//! Qualified column identifiers and the sets plan nodes carry.

mod column_ref;
mod column_set;
mod video_set;

pub use column_ref::ColumnRef;
pub use column_set::ColumnSet;
pub use video_set::VideoSet;
