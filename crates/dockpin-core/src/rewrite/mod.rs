//! Text rewriting over located instructions
//!
//! All rewriters locate once against the input text, queue per-line edits
//! and rebuild the output in a single pass.

mod base_image;
pub(crate) mod editor;
mod label;
mod retag;

pub use base_image::{replace_from_at, replace_froms, rewrite_froms, rewrite_last, Selection};
pub use label::{find_follow_tags, sync_follow_tag, FollowTagLabel, FOLLOW_TAG_LABEL};
pub use retag::{retag_froms, Retagged};
