//! Line-level text builder
//!
//! Edits are keyed by physical line index of the original text and applied
//! in one pass, so no edit ever sees offsets shifted by another.

use std::collections::BTreeMap;

use crate::dockerfile::{split_lines, Line};

#[derive(Debug, Default)]
struct LineEdit {
    replace: Option<String>,
    delete: bool,
    insert_after: Vec<String>,
}

/// Accumulates per-line edits against an unmodified source text
#[derive(Debug)]
pub(crate) struct LineEditor<'a> {
    lines: Vec<Line<'a>>,
    edits: BTreeMap<usize, LineEdit>,
}

impl<'a> LineEditor<'a> {
    pub(crate) fn new(text: &'a str) -> Self {
        LineEditor {
            lines: split_lines(text),
            edits: BTreeMap::new(),
        }
    }

    pub(crate) fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Body of line `index` in the source text
    pub(crate) fn body(&self, index: usize) -> Option<&'a str> {
        self.lines.get(index).map(|l| l.body)
    }

    /// Replace the body of line `index`, keeping its terminator
    pub(crate) fn replace(&mut self, index: usize, body: String) {
        self.edits.entry(index).or_default().replace = Some(body);
    }

    /// Drop line `index` together with its terminator
    pub(crate) fn delete(&mut self, index: usize) {
        self.edits.entry(index).or_default().delete = true;
    }

    /// Add a new line directly after line `index`
    pub(crate) fn insert_after(&mut self, index: usize, body: String) {
        self.edits.entry(index).or_default().insert_after.push(body);
    }

    /// Terminator used for inserted lines: the line's own, else the first one
    /// in the file, else `\n`.
    pub(crate) fn newline_for(&self, index: usize) -> &'a str {
        let own = self.lines[index].ending;
        if !own.is_empty() {
            return own;
        }
        self.lines
            .iter()
            .map(|l| l.ending)
            .find(|e| !e.is_empty())
            .unwrap_or("\n")
    }

    /// Rebuild the text with every edit applied
    pub(crate) fn finish(self) -> String {
        let mut out = String::new();
        for (idx, line) in self.lines.iter().enumerate() {
            let Some(edit) = self.edits.get(&idx) else {
                out.push_str(line.body);
                out.push_str(line.ending);
                continue;
            };

            if !edit.delete {
                out.push_str(edit.replace.as_deref().unwrap_or(line.body));
            }
            if edit.insert_after.is_empty() {
                if !edit.delete {
                    out.push_str(line.ending);
                }
                continue;
            }

            let newline = self.newline_for(idx);
            for (n, inserted) in edit.insert_after.iter().enumerate() {
                if n > 0 || !edit.delete {
                    out.push_str(newline);
                }
                out.push_str(inserted);
            }
            out.push_str(line.ending);
        }
        out
    }
}
