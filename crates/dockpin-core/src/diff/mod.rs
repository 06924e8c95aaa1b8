//! Change summaries
//!
//! `aggregate` folds per-path differences to a bounded list; `container_diff`
//! reads the reports those differences usually come from.

mod aggregate;
pub mod container_diff;

pub use aggregate::{aggregate, DiffEntry};
pub use container_diff::{ContainerDiffReport, PackageDiff, SizeDiff};
