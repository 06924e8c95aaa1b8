//! Comment-preserving Dockerfile parser
//!
//! Produces a flat, ordered instruction stream with 1-based line ranges.
//! Backslash continuations are joined with a single space; comment lines
//! inside a continuation are dropped, top-level comments become
//! [`InstructionKind::Comment`] instructions.

use serde::{Deserialize, Serialize};

/// Instruction keyword
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstructionKind {
    /// Base-image declaration
    From,
    Run,
    Label,
    /// A `#` line outside any continuation
    Comment,
    /// Any other keyword, upper-cased
    Other(String),
}

impl InstructionKind {
    fn from_keyword(keyword: &str) -> Self {
        let upper = keyword.to_ascii_uppercase();
        match upper.as_str() {
            "FROM" => InstructionKind::From,
            "RUN" => InstructionKind::Run,
            "LABEL" => InstructionKind::Label,
            _ => InstructionKind::Other(upper),
        }
    }

    /// Keyword as written in a Dockerfile (`#` for comments)
    pub fn keyword(&self) -> &str {
        match self {
            InstructionKind::From => "FROM",
            InstructionKind::Run => "RUN",
            InstructionKind::Label => "LABEL",
            InstructionKind::Comment => "#",
            InstructionKind::Other(keyword) => keyword,
        }
    }
}

/// One logical Dockerfile statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub kind: InstructionKind,
    /// First physical line (1-based)
    pub start_line: usize,
    /// Last physical line (1-based)
    pub line_number: usize,
    /// Argument text with continuations joined; the whole line for comments
    pub raw_args: String,
    /// `raw_args` split on whitespace
    pub args_tokens: Vec<String>,
}

impl Instruction {
    fn new(kind: InstructionKind, start_line: usize, line_number: usize, raw_args: String) -> Self {
        let args_tokens = raw_args.split_whitespace().map(str::to_string).collect();
        Instruction {
            kind,
            start_line,
            line_number,
            raw_args,
            args_tokens,
        }
    }

    pub fn is_from(&self) -> bool {
        self.kind == InstructionKind::From
    }

    pub fn is_comment(&self) -> bool {
        self.kind == InstructionKind::Comment
    }

    /// Number of physical lines the instruction spans
    pub fn line_span(&self) -> usize {
        self.line_number - self.start_line + 1
    }
}

struct Pending {
    kind: InstructionKind,
    start_line: usize,
    args: String,
}

impl Pending {
    fn push(&mut self, body: &str) {
        if body.is_empty() {
            return;
        }
        if !self.args.is_empty() {
            self.args.push(' ');
        }
        self.args.push_str(body);
    }

    fn finish(self, line_number: usize) -> Instruction {
        Instruction::new(self.kind, self.start_line, line_number, self.args)
    }
}

/// Strip a trailing line-continuation backslash
fn split_continuation(text: &str) -> (&str, bool) {
    match text.strip_suffix('\\') {
        Some(body) => (body.trim_end(), true),
        None => (text, false),
    }
}

/// Parse Dockerfile text into an ordered instruction list
pub fn parse(text: &str) -> Vec<Instruction> {
    let mut instructions = Vec::new();
    let mut pending: Option<Pending> = None;
    let mut last_line = 0;

    for (idx, raw) in text.split('\n').enumerate() {
        let line_no = idx + 1;
        let trimmed = raw.trim();

        if let Some(mut open) = pending.take() {
            if trimmed.is_empty() || trimmed.starts_with('#') {
                pending = Some(open);
                continue;
            }
            last_line = line_no;
            let (body, continues) = split_continuation(trimmed);
            open.push(body);
            if continues {
                pending = Some(open);
            } else {
                instructions.push(open.finish(line_no));
            }
            continue;
        }

        if trimmed.is_empty() {
            continue;
        }
        last_line = line_no;

        if trimmed.starts_with('#') {
            instructions.push(Instruction::new(
                InstructionKind::Comment,
                line_no,
                line_no,
                trimmed.to_string(),
            ));
            continue;
        }

        let (keyword, rest) = match trimmed.split_once(char::is_whitespace) {
            Some((keyword, rest)) => (keyword, rest.trim()),
            None => (trimmed, ""),
        };
        let (body, continues) = split_continuation(rest);
        let mut open = Pending {
            kind: InstructionKind::from_keyword(keyword),
            start_line: line_no,
            args: String::new(),
        };
        open.push(body);
        if continues {
            pending = Some(open);
        } else {
            instructions.push(open.finish(line_no));
        }
    }

    // Continuation left open at end of file
    if let Some(open) = pending {
        instructions.push(open.finish(last_line));
    }

    instructions
}
