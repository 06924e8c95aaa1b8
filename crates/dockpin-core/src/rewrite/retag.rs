//! Tag updates: swap one image reference for another wherever it is the
//! base image.

use tracing::debug;

use super::editor::LineEditor;
use crate::dockerfile::locate_froms;
use crate::error::{PinError, Result};

/// Outcome of a tag update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Retagged {
    pub text: String,
    /// 1-based line numbers of the rewritten declarations
    pub lines: Vec<usize>,
}

/// Point every `FROM <from>` at `to`.
///
/// The match is on the exact image token, so `FROM ubuntu:focal` does not
/// match `FROM ubuntu:focal@sha256:...`.
pub fn retag_froms(text: &str, from: &str, to: &str) -> Result<Retagged> {
    let mut editor = LineEditor::new(text);
    let mut lines = Vec::new();

    for located in locate_froms(text).iter().filter(|l| l.reference == from) {
        debug!(line = located.line_number(), from, to, "Retagging base image");
        editor.replace(located.line_index, located.with_reference(to));
        lines.push(located.line_number());
    }

    if lines.is_empty() {
        return Err(PinError::NotFound {
            instruction: format!("FROM {}", from),
        });
    }
    Ok(Retagged {
        text: editor.finish(),
        lines,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retag_all_matching() {
        let text = "FROM node:14 AS build\nRUN x\nFROM node:14\nFROM node:14-slim\n";
        let out = retag_froms(text, "node:14", "node:16").unwrap();
        assert_eq!(
            out.text,
            "FROM node:16 AS build\nRUN x\nFROM node:16\nFROM node:14-slim\n"
        );
        assert_eq!(out.lines, vec![1, 3]);
    }

    #[test]
    fn test_retag_no_match() {
        let err = retag_froms("FROM alpine", "debian", "debian:12").unwrap_err();
        assert_eq!(err.to_string(), "FROM debian not found");
    }
}
