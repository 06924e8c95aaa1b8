//! `apt-get install` instructions and their canonical form
//!
//! A rewritten instruction always has this shape:
//!
//! ```text
//! RUN apt-get update && apt-get install -y \
//!     curl=7.68.0-1ubuntu2.7 \
//!     git=1:2.25.1-1ubuntu3.6 \
//!  && rm -rf /var/lib/apt/lists/*
//! ```

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::dockerfile::{Instruction, InstructionKind};

const PACKAGE_INDENT: &str = "    ";
const SEGMENT_JOIN: &str = " && ";

fn install_instruction_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^apt-get\s*update\s*&&\s*apt-get\s*install").expect("valid regex")
    })
}

fn install_segment_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"apt-get(\s+-\S+)*\s+install").expect("valid regex"))
}

/// A bare `apt-get update`, which the install command re-emits
fn is_index_refresh(segment: &str) -> bool {
    segment.contains("apt-get")
        && segment.split_whitespace().any(|t| t == "update")
        && !install_segment_pattern().is_match(segment)
}

/// `RUN apt-get update && apt-get install ...`
pub fn is_apt_install(instruction: &Instruction) -> bool {
    instruction.kind == InstructionKind::Run
        && install_instruction_pattern().is_match(&instruction.raw_args)
}

/// `name` or `name=version`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageSpec {
    pub name: String,
    pub version: Option<String>,
}

impl PackageSpec {
    pub fn parse(token: &str) -> Self {
        match token.split_once('=') {
            Some((name, version)) if !version.trim().is_empty() => PackageSpec {
                name: name.trim().to_string(),
                version: Some(version.trim().to_string()),
            },
            Some((name, _)) => PackageSpec {
                name: name.trim().to_string(),
                version: None,
            },
            None => PackageSpec {
                name: token.trim().to_string(),
                version: None,
            },
        }
    }
}

impl fmt::Display for PackageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}={}", self.name, version),
            None => f.write_str(&self.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Install {
        flags: Vec<String>,
        packages: Vec<PackageSpec>,
    },
    Other(String),
}

impl Segment {
    fn parse_install(segment: &str) -> Self {
        let mut tokens: Vec<&str> = segment.split_whitespace().collect();
        for word in ["apt-get", "install"] {
            if let Some(pos) = tokens.iter().position(|t| *t == word) {
                tokens.remove(pos);
            }
        }

        let (flags, packages): (Vec<&str>, Vec<&str>) =
            tokens.into_iter().partition(|t| t.starts_with('-'));
        Segment::Install {
            flags: flags.into_iter().map(str::to_string).collect(),
            packages: packages.into_iter().map(PackageSpec::parse).collect(),
        }
    }

    fn render(&self, newline: &str) -> String {
        match self {
            Segment::Other(text) => text.clone(),
            Segment::Install { flags, packages } => {
                let mut out = String::from("apt-get update && apt-get install");
                for flag in flags {
                    out.push(' ');
                    out.push_str(flag);
                }
                let mut rendered: Vec<String> = packages.iter().map(ToString::to_string).collect();
                rendered.sort();
                for package in rendered {
                    out.push_str(" \\");
                    out.push_str(newline);
                    out.push_str(PACKAGE_INDENT);
                    out.push_str(&package);
                }
                out
            }
        }
    }
}

/// The `&&`-separated commands of an install instruction, with the index
/// refresh folded into the install command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallCommand {
    segments: Vec<Segment>,
}

impl InstallCommand {
    /// Split instruction arguments into commands.
    ///
    /// Standalone `apt-get update` commands are dropped; every install
    /// command re-emits it.
    pub fn parse(args: &str) -> Self {
        let segments = args
            .split("&&")
            .filter(|s| !is_index_refresh(s))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                if install_segment_pattern().is_match(s) {
                    Segment::parse_install(s)
                } else {
                    Segment::Other(s.to_string())
                }
            })
            .collect();
        InstallCommand { segments }
    }

    pub fn packages(&self) -> impl Iterator<Item = &PackageSpec> {
        self.segments.iter().flat_map(|s| match s {
            Segment::Install { packages, .. } => packages.as_slice(),
            Segment::Other(_) => Default::default(),
        })
    }

    pub fn packages_mut(&mut self) -> impl Iterator<Item = &mut PackageSpec> {
        self.segments.iter_mut().flat_map(|s| match s {
            Segment::Install { packages, .. } => packages.as_mut_slice(),
            Segment::Other(_) => Default::default(),
        })
    }

    /// Canonical multi-line `RUN` text, packages sorted per command
    pub fn render(&self) -> String {
        self.render_with("\n")
    }

    /// [`render`](Self::render) with `newline` between physical lines
    pub fn render_with(&self, newline: &str) -> String {
        let body: Vec<String> = self.segments.iter().map(|s| s.render(newline)).collect();
        let separator = format!(" \\{}{}", newline, SEGMENT_JOIN);
        format!("RUN {}", body.join(&separator))
    }
}
