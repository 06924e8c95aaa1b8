//! Dockerfile reading: parsing, locating and stage partitioning.
//!
//! - `parser`: comment-preserving instruction stream with line ranges
//! - `locator`: line-anchored match records for a keyword
//! - `layers`: build-stage partition of an instruction stream

pub mod layers;
pub mod locator;
pub mod parser;

pub use layers::Layers;
pub use locator::{locate, locate_froms, LocatedInstruction};
pub use parser::{parse, Instruction, InstructionKind};

/// Base-image declaration keyword
pub const FROM_KEYWORD: &str = "FROM";

/// A physical line split from its terminator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Line<'a> {
    pub body: &'a str,
    /// `"\n"`, `"\r\n"` or `""` for an unterminated last line
    pub ending: &'a str,
}

/// Split text into physical lines, keeping terminators so the text can be
/// rebuilt byte for byte.
pub(crate) fn split_lines(text: &str) -> Vec<Line<'_>> {
    text.split_inclusive('\n')
        .map(|chunk| {
            let body_len = chunk
                .strip_suffix("\r\n")
                .or_else(|| chunk.strip_suffix('\n'))
                .map_or(chunk.len(), str::len);
            Line {
                body: &chunk[..body_len],
                ending: &chunk[body_len..],
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_lines_round_trip() {
        let text = "FROM a\r\nRUN b\n\nCMD c";
        let lines = split_lines(text);
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0].body, "FROM a");
        assert_eq!(lines[0].ending, "\r\n");
        assert_eq!(lines[2].body, "");
        assert_eq!(lines[3].ending, "");

        let rebuilt: String = lines.iter().flat_map(|l| [l.body, l.ending]).collect();
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn test_split_lines_empty() {
        assert!(split_lines("").is_empty());
    }
}
