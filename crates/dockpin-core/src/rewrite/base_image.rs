//! Base-image reference rewriting

use tracing::debug;

use super::editor::LineEditor;
use super::label::sync_follow_tag;
use crate::dockerfile::locate_froms;
use crate::error::{PinError, Result};

/// Which base-image declarations a rewrite touches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Every declaration, in source order
    All,
    /// Only the declaration at this 0-based occurrence index
    At(usize),
}

/// Replace the image token of the selected `FROM` lines.
///
/// Occurrence `i` receives `images[i]`. Keyword spacing, `--platform` flags,
/// stage aliases and everything else in the file are kept byte for byte.
pub fn rewrite_froms<S: AsRef<str>>(
    text: &str,
    images: &[S],
    selection: Selection,
) -> Result<String> {
    let located = locate_froms(text);
    if located.is_empty() {
        return Err(PinError::not_found("FROM instruction"));
    }

    let required = match selection {
        Selection::All => located.len(),
        Selection::At(index) if index >= located.len() => {
            return Err(PinError::NotFound {
                instruction: format!("FROM instruction #{}", index),
            });
        }
        Selection::At(index) => index + 1,
    };
    if images.len() < required {
        return Err(PinError::ArgumentMismatch {
            expected: required,
            actual: images.len(),
        });
    }

    let mut editor = LineEditor::new(text);
    let mut rewritten = 0;
    for (occurrence, from) in located.iter().enumerate() {
        if selection != Selection::All && selection != Selection::At(occurrence) {
            continue;
        }
        let image = images[occurrence].as_ref();
        debug!(
            line = from.line_number(),
            from = %from.reference,
            to = image,
            "Rewriting base image"
        );
        editor.replace(from.line_index, from.with_reference(image));
        rewritten += 1;
    }
    crate::obs::emit_from_rewritten(rewritten, located.len());
    Ok(editor.finish())
}

/// Replace every base-image reference in order
pub fn replace_froms<S: AsRef<str>>(text: &str, images: &[S]) -> Result<String> {
    rewrite_froms(text, images, Selection::All)
}

/// Replace only occurrence `index` with `images[index]`
pub fn replace_from_at<S: AsRef<str>>(text: &str, images: &[S], index: usize) -> Result<String> {
    rewrite_froms(text, images, Selection::At(index))
}

/// Replace the last base-image reference and record the followed tag.
pub fn rewrite_last(text: &str, image: &str, tag: &str) -> Result<String> {
    let located = locate_froms(text);
    let last = located
        .last()
        .ok_or_else(|| PinError::not_found("FROM instruction"))?;

    let mut editor = LineEditor::new(text);
    editor.replace(last.line_index, last.with_reference(image));
    sync_follow_tag(&editor.finish(), tag)
}
