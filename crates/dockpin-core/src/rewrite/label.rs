//! Follow-tag marker label

use std::collections::BTreeMap;
use std::ops::Range;

use tracing::debug;

use super::editor::LineEditor;
use crate::dockerfile::{locate_froms, parse, split_lines, InstructionKind, Line};
use crate::error::{PinError, Result};

/// Label key recording which tag a pinned base image follows
pub const FOLLOW_TAG_LABEL: &str = "com.atomist.follow-tag";

/// A `com.atomist.follow-tag=<value>` pair of some `LABEL` instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowTagLabel {
    pub line_index: usize,
    pub value: String,
}

/// Location of one follow-tag pair inside its physical line
#[derive(Debug, Clone)]
struct LabelPair {
    line_index: usize,
    /// Byte range of the `key=value` token
    token: Range<usize>,
    /// Byte range of the value, inside quotes when quoted
    value: Range<usize>,
    /// Another token (possibly the continuation backslash) follows on the line
    followed: bool,
}

/// One `LABEL` instruction with its follow-tag pairs
#[derive(Debug)]
struct LabelBlock {
    lines: Range<usize>,
    pair_count: usize,
    follow_tags: Vec<LabelPair>,
}

/// Byte ranges of the whitespace-separated tokens of `body`
fn tokens(body: &str) -> Vec<Range<usize>> {
    let mut out = Vec::new();
    let mut start = None;
    for (i, c) in body.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(s)) => {
                out.push(s..i);
                start = None;
            }
            (false, None) => start = Some(i),
            _ => {}
        }
    }
    if let Some(s) = start {
        out.push(s..body.len());
    }
    out
}

fn value_range(body: &str, token: &Range<usize>, key_len: usize) -> Range<usize> {
    let start = token.start + key_len + 1;
    let raw = &body[start..token.end];
    if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
        start + 1..token.end - 1
    } else {
        start..token.end
    }
}

fn scan_line(block: &mut LabelBlock, line_index: usize, body: &str, skip_keyword: bool) {
    let mut spans = tokens(body);
    if skip_keyword && !spans.is_empty() {
        spans.remove(0);
    }
    let count = spans.len();
    for (n, mut token) in spans.into_iter().enumerate() {
        // `key=value\` at the end of a continued line
        if n + 1 == count && token.len() > 1 && body[token.clone()].ends_with('\\') {
            token.end -= 1;
        }
        let Some((key, _)) = body[token.clone()].split_once('=') else {
            continue;
        };
        block.pair_count += 1;
        if key.eq_ignore_ascii_case(FOLLOW_TAG_LABEL) {
            block.follow_tags.push(LabelPair {
                line_index,
                value: value_range(body, &token, key.len()),
                followed: n + 1 < count,
                token,
            });
        }
    }
}

fn label_blocks(text: &str, lines: &[Line<'_>]) -> Vec<LabelBlock> {
    parse(text)
        .into_iter()
        .filter(|i| i.kind == InstructionKind::Label)
        .map(|instruction| {
            let first = instruction.start_line - 1;
            let mut block = LabelBlock {
                lines: first..instruction.line_number,
                pair_count: 0,
                follow_tags: Vec::new(),
            };
            for line_index in block.lines.clone() {
                let Some(line) = lines.get(line_index) else {
                    break;
                };
                let trimmed = line.body.trim();
                if line_index != first && (trimmed.is_empty() || trimmed.starts_with('#')) {
                    continue;
                }
                scan_line(&mut block, line_index, line.body, line_index == first);
            }
            block
        })
        .collect()
}

/// Span removed when a duplicate pair is dropped from a line that keeps
/// other content
fn removal_range(body: &str, pair: &LabelPair) -> Range<usize> {
    if pair.followed {
        let rest = &body[pair.token.end..];
        let gap = rest.len() - rest.trim_start().len();
        pair.token.start..pair.token.end + gap
    } else {
        let before = &body[..pair.token.start];
        before.trim_end().len()..pair.token.end
    }
}

/// Find every follow-tag pair, in order.
///
/// Every `key=value` pair of every `LABEL` instruction is considered,
/// including pairs on continuation lines and lines carrying other labels.
pub fn find_follow_tags(text: &str) -> Vec<FollowTagLabel> {
    let lines = split_lines(text);
    label_blocks(text, &lines)
        .into_iter()
        .flat_map(|block| block.follow_tags)
        .map(|pair| FollowTagLabel {
            line_index: pair.line_index,
            value: lines[pair.line_index].body[pair.value].to_string(),
        })
        .collect()
}

/// Make the file carry exactly one follow-tag label with value `tag`.
///
/// The first existing pair gets its value replaced in place and every other
/// follow-tag pair is dropped, leaving any other labels on those lines
/// untouched. Without one, a new label line goes directly after the last
/// `FROM` instruction (after its final continuation line).
pub fn sync_follow_tag(text: &str, tag: &str) -> Result<String> {
    let lines = split_lines(text);
    let blocks = label_blocks(text, &lines);
    let mut editor = LineEditor::new(text);

    let first = blocks
        .iter()
        .enumerate()
        .find_map(|(i, b)| b.follow_tags.first().map(|p| (i, p)));

    if let Some((first_block, kept)) = first {
        let mut splices: BTreeMap<usize, Vec<(Range<usize>, &str)>> = BTreeMap::new();
        if lines[kept.line_index].body[kept.value.clone()] != *tag {
            debug!(line = kept.line_index + 1, to = tag, "Updating follow-tag label");
            splices
                .entry(kept.line_index)
                .or_default()
                .push((kept.value.clone(), tag));
        }

        for (i, block) in blocks.iter().enumerate().skip(first_block) {
            let duplicates = if i == first_block {
                &block.follow_tags[1..]
            } else {
                &block.follow_tags[..]
            };
            if duplicates.is_empty() {
                continue;
            }
            if i != first_block && duplicates.len() == block.pair_count {
                debug!(line = block.lines.start + 1, "Dropping duplicate follow-tag label");
                for line_index in block.lines.clone() {
                    editor.delete(line_index);
                }
                continue;
            }
            for duplicate in duplicates {
                debug!(line = duplicate.line_index + 1, "Dropping duplicate follow-tag pair");
                let body = lines[duplicate.line_index].body;
                splices
                    .entry(duplicate.line_index)
                    .or_default()
                    .push((removal_range(body, duplicate), ""));
            }
        }

        for (line_index, mut edits) in splices {
            let mut body = lines[line_index].body.to_string();
            edits.sort_by(|a, b| b.0.start.cmp(&a.0.start));
            for (range, replacement) in edits {
                body.replace_range(range, replacement);
            }
            editor.replace(line_index, body);
        }
        return Ok(editor.finish());
    }

    let last = locate_froms(text)
        .pop()
        .ok_or_else(|| PinError::not_found("FROM instruction"))?;
    let mut end = last.line_index;
    while end + 1 < editor.line_count()
        && editor
            .body(end)
            .is_some_and(|body| body.trim_end().ends_with('\\'))
    {
        end += 1;
    }
    debug!(line = end + 1, tag, "Inserting follow-tag label");
    editor.insert_after(end, format!("LABEL {}={}", FOLLOW_TAG_LABEL, tag));
    Ok(editor.finish())
}
