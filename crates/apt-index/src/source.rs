//! APT source lines
//!
//! Parses the one-line `sources.list` format
//! (`deb [options] uri suite [component...]`) and derives the `Packages`
//! index URLs a source exposes for a given architecture.

use crate::error::AptError;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A parsed `deb` source line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLine {
    /// Bracketed options such as `arch=amd64` or `signed-by=...`
    pub options: BTreeMap<String, String>,
    /// Repository base URI
    pub uri: String,
    /// Distribution suite (`focal`, `bookworm-updates`) or flat directory (`./`)
    pub suite: String,
    /// Components (`main`, `universe`); empty for flat repositories
    pub components: Vec<String>,
}

/// Candidate index files for one component of a source, in fetch order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexLocation {
    /// Human-readable label used in logs and errors
    pub label: String,
    /// URLs to try; the first that answers wins
    pub candidates: Vec<String>,
}

impl SourceLine {
    /// Parse a single source line.
    ///
    /// Blank lines, comments and `deb-src` entries yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<SourceLine>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let rest = match line.split_once(char::is_whitespace) {
            Some(("deb", rest)) => rest.trim_start(),
            Some(("deb-src", _)) => return Ok(None),
            _ => return Err(AptError::InvalidSource(line.to_string())),
        };

        let mut options = BTreeMap::new();
        let rest = if let Some(bracketed) = rest.strip_prefix('[') {
            let (inner, after) = bracketed
                .split_once(']')
                .ok_or_else(|| AptError::InvalidSource(line.to_string()))?;
            for option in inner.split_whitespace() {
                let (key, value) = option
                    .split_once('=')
                    .ok_or_else(|| AptError::InvalidSource(line.to_string()))?;
                options.insert(key.to_string(), value.to_string());
            }
            after
        } else {
            rest
        };

        let mut fields = rest.split_whitespace();
        let uri = fields
            .next()
            .ok_or_else(|| AptError::InvalidSource(line.to_string()))?;
        let suite = fields
            .next()
            .ok_or_else(|| AptError::InvalidSource(line.to_string()))?;
        let components: Vec<String> = fields.map(str::to_string).collect();

        let flat = suite.ends_with('/');
        if flat != components.is_empty() {
            return Err(AptError::InvalidSource(line.to_string()));
        }

        Ok(Some(SourceLine {
            options,
            uri: uri.trim_end_matches('/').to_string(),
            suite: suite.to_string(),
            components,
        }))
    }

    /// Parse every line, skipping entries that carry no binary index
    pub fn parse_all<S: AsRef<str>>(lines: &[S]) -> Result<Vec<SourceLine>> {
        let mut parsed = Vec::new();
        for line in lines {
            if let Some(source) = SourceLine::parse(line.as_ref())? {
                parsed.push(source);
            }
        }
        Ok(parsed)
    }

    /// Whether this is a flat repository (suite is a directory path)
    pub fn is_flat(&self) -> bool {
        self.components.is_empty()
    }

    /// Whether the source publishes packages for `arch`
    ///
    /// Sources without an `arch=` option are assumed to serve every
    /// architecture.
    pub fn supports_arch(&self, arch: &str) -> bool {
        match self.options.get("arch") {
            Some(archs) => archs.split(',').any(|a| a == arch),
            None => true,
        }
    }

    /// Index locations for `arch`, one per component
    pub fn index_locations(&self, arch: &str) -> Vec<IndexLocation> {
        if self.is_flat() {
            let dir = self.suite.trim_start_matches("./");
            let base = format!("{}/{}Packages", self.uri, dir);
            return vec![IndexLocation {
                label: format!("{} {}", self.uri, self.suite),
                candidates: vec![format!("{}.gz", base), base],
            }];
        }

        self.components
            .iter()
            .map(|component| {
                let base = format!(
                    "{}/dists/{}/{}/binary-{}/Packages",
                    self.uri, self.suite, component, arch
                );
                IndexLocation {
                    label: format!("{} {}/{} [{}]", self.uri, self.suite, component, arch),
                    candidates: vec![format!("{}.gz", base), base],
                }
            })
            .collect()
    }
}

impl std::fmt::Display for SourceLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "deb ")?;
        if !self.options.is_empty() {
            let options: Vec<String> = self
                .options
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            write!(f, "[{}] ", options.join(" "))?;
        }
        write!(f, "{} {}", self.uri, self.suite)?;
        for component in &self.components {
            write!(f, " {}", component)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_source() {
        let source = SourceLine::parse("deb http://archive.ubuntu.com/ubuntu/ focal main universe")
            .unwrap()
            .unwrap();
        assert_eq!(source.uri, "http://archive.ubuntu.com/ubuntu");
        assert_eq!(source.suite, "focal");
        assert_eq!(source.components, vec!["main", "universe"]);
        assert!(source.options.is_empty());
    }

    #[test]
    fn test_parse_options() {
        let source = SourceLine::parse(
            "deb [arch=amd64,arm64 signed-by=/usr/share/keyrings/node.gpg] https://deb.nodesource.com/node_14.x hirsute main",
        )
        .unwrap()
        .unwrap();
        assert_eq!(source.options.get("arch").unwrap(), "amd64,arm64");
        assert!(source.supports_arch("arm64"));
        assert!(!source.supports_arch("s390x"));
        assert_eq!(source.uri, "https://deb.nodesource.com/node_14.x");
    }

    #[test]
    fn test_skips_comments_and_deb_src() {
        assert!(SourceLine::parse("# deb http://x focal main").unwrap().is_none());
        assert!(SourceLine::parse("deb-src http://x focal main").unwrap().is_none());
        assert!(SourceLine::parse("   ").unwrap().is_none());
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(SourceLine::parse("rpm http://x focal main").is_err());
        assert!(SourceLine::parse("deb http://x").is_err());
        assert!(SourceLine::parse("deb http://x focal").is_err());
        assert!(SourceLine::parse("deb [arch=amd64 http://x focal main").is_err());
    }

    #[test]
    fn test_index_locations() {
        let source = SourceLine::parse("deb http://deb.debian.org/debian bookworm main")
            .unwrap()
            .unwrap();
        let locations = source.index_locations("arm64");
        assert_eq!(locations.len(), 1);
        assert_eq!(
            locations[0].candidates,
            vec![
                "http://deb.debian.org/debian/dists/bookworm/main/binary-arm64/Packages.gz",
                "http://deb.debian.org/debian/dists/bookworm/main/binary-arm64/Packages",
            ]
        );
    }

    #[test]
    fn test_flat_repository() {
        let source = SourceLine::parse("deb https://repo.example.com/apt ./")
            .unwrap()
            .unwrap();
        assert!(source.is_flat());
        let locations = source.index_locations("amd64");
        assert_eq!(
            locations[0].candidates[1],
            "https://repo.example.com/apt/Packages"
        );
    }

    #[test]
    fn test_display_round_trips_normalized() {
        let line = "deb [arch=amd64] http://archive.ubuntu.com/ubuntu focal main";
        let source = SourceLine::parse(line).unwrap().unwrap();
        assert_eq!(source.to_string(), line);
    }
}
