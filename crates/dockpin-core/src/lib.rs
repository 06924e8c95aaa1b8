//! dockpin core library
//!
//! Rewrites Dockerfiles without disturbing them: base-image references are
//! swapped token for token, a follow-tag label records the tag a pinned image
//! tracks, APT install instructions are pinned to the newest published
//! versions, and image diffs are folded into short summaries.

pub mod diff;
pub mod dockerfile;
pub mod error;
pub mod image;
pub mod obs;
pub mod packages;
pub mod rewrite;
pub mod telemetry;

pub use diff::{aggregate, ContainerDiffReport, DiffEntry, PackageDiff, SizeDiff};
pub use dockerfile::{locate_froms, parse, Instruction, InstructionKind, Layers, LocatedInstruction};
pub use error::{PinError, Result};
pub use image::ImageReference;
pub use packages::{
    pin_apt_packages, Directive, PackageChange, PackagePinResolver, PinResult, VersionCache,
};
pub use rewrite::{
    replace_from_at, replace_froms, retag_froms, rewrite_froms, rewrite_last, sync_follow_tag,
    Retagged, Selection, FOLLOW_TAG_LABEL,
};

pub use obs::{emit_diff_aggregated, emit_from_rewritten, emit_packages_pinned, FileSpan};
pub use telemetry::init_tracing;

/// dockpin version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
