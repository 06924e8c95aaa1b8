//! Inline author directives for install instructions
//!
//! ```text
//! # atomist:apt-source=deb https://packages.example.com/apt stable main
//! # atomist:apt-ignore
//! ```
//!
//! A directive applies to the instruction directly after it and nowhere else.

use std::sync::OnceLock;

use apt_index::SourceLine;
use regex::Regex;

use crate::dockerfile::Instruction;

/// A per-instruction pinning directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Extra package source, consulted for the next instruction only
    SourceOverride(String),
    /// Leave the next instruction alone
    Ignore,
}

fn source_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^#\s*atomist:apt-source=(.*)$").expect("valid regex"))
}

fn ignore_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^#\s*atomist:apt-ignore\s*$").expect("valid regex"))
}

impl Directive {
    /// Parse a comment line. Anything unrecognized or malformed is `None`,
    /// including a source override whose value is not a `deb` source line.
    pub fn parse(comment: &str) -> Option<Self> {
        let comment = comment.trim();
        if ignore_pattern().is_match(comment) {
            return Some(Directive::Ignore);
        }
        let source = source_pattern().captures(comment)?.get(1)?.as_str().trim();
        match SourceLine::parse(source) {
            Ok(Some(_)) => Some(Directive::SourceOverride(source.to_string())),
            _ => None,
        }
    }

    /// Directive carried by `instruction`, if it is a comment
    pub fn from_instruction(instruction: &Instruction) -> Option<Self> {
        if instruction.is_comment() {
            Directive::parse(&instruction.raw_args)
        } else {
            None
        }
    }
}
