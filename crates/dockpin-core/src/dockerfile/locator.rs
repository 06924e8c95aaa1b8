//! Line-anchored instruction locator
//!
//! Scans Dockerfile text once and returns an immutable record per matching
//! line. Rewriters work from these records and never re-scan text they
//! have already modified.

use super::{split_lines, FROM_KEYWORD};
use serde::{Deserialize, Serialize};

/// A located instruction line, split into rewrite-relevant spans
///
/// `prefix + reference + trailing == line` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocatedInstruction {
    /// 0-based physical line index
    pub line_index: usize,
    /// The full line, without its terminator
    pub line: String,
    /// Leading whitespace, keyword, separating whitespace and any `--flag`s
    pub prefix: String,
    /// The image (or other) reference token
    pub reference: String,
    /// Everything after the reference: stage alias, continuation, comments
    pub trailing: String,
}

impl LocatedInstruction {
    /// 1-based line number
    pub fn line_number(&self) -> usize {
        self.line_index + 1
    }

    /// The line with `reference` swapped in
    pub fn with_reference(&self, reference: &str) -> String {
        format!("{}{}{}", self.prefix, reference, self.trailing)
    }
}

/// Length of the whitespace run starting at `from`
fn whitespace_len(s: &str, from: usize) -> usize {
    s[from..]
        .find(|c: char| !c.is_whitespace())
        .unwrap_or(s.len() - from)
}

/// Length of the non-whitespace token starting at `from`
fn token_len(s: &str, from: usize) -> usize {
    s[from..].find(char::is_whitespace).unwrap_or(s.len() - from)
}

/// Match a single line against `keyword`
fn match_line(line_index: usize, line: &str, keyword: &str) -> Option<LocatedInstruction> {
    let indent = whitespace_len(line, 0);
    let head = line.get(indent..indent + keyword.len())?;
    if !head.eq_ignore_ascii_case(keyword) {
        return None;
    }

    let mut pos = indent + keyword.len();
    if pos < line.len() && !line[pos..].starts_with(char::is_whitespace) {
        // FROMAGE is not FROM
        return None;
    }
    pos += whitespace_len(line, pos);

    while line[pos..].starts_with("--") {
        pos += token_len(line, pos);
        pos += whitespace_len(line, pos);
    }

    let end = pos + token_len(line, pos);
    Some(LocatedInstruction {
        line_index,
        line: line.to_string(),
        prefix: line[..pos].to_string(),
        reference: line[pos..end].to_string(),
        trailing: line[end..].to_string(),
    })
}

/// Locate every line starting with `keyword` (case-insensitive), in order
pub fn locate(text: &str, keyword: &str) -> Vec<LocatedInstruction> {
    split_lines(text)
        .iter()
        .enumerate()
        .filter_map(|(idx, line)| match_line(idx, line.body, keyword))
        .collect()
}

/// Locate every base-image declaration
pub fn locate_froms(text: &str) -> Vec<LocatedInstruction> {
    locate(text, FROM_KEYWORD)
}
