//! Package index snapshots
//!
//! A `PackageIndex` is the immutable result of one refresh: the newest
//! version of every package published by a set of sources for one
//! architecture.

use crate::source::SourceLine;
use crate::version;
use sha2::{Digest, Sha256};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

/// One stanza of a `Packages` file, reduced to the fields we use
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageStanza {
    pub package: String,
    pub version: String,
    pub architecture: Option<String>,
}

/// Parse the deb822 stanzas of a `Packages` file
///
/// Stanzas missing `Package` or `Version` are dropped.
pub fn parse_packages(text: &str) -> Vec<PackageStanza> {
    let mut stanzas = Vec::new();
    let mut package = None;
    let mut version = None;
    let mut architecture = None;

    let mut flush = |package: &mut Option<String>,
                     version: &mut Option<String>,
                     architecture: &mut Option<String>| {
        if let (Some(p), Some(v)) = (package.take(), version.take()) {
            stanzas.push(PackageStanza {
                package: p,
                version: v,
                architecture: architecture.take(),
            });
        }
        *package = None;
        *version = None;
        *architecture = None;
    };

    for line in text.lines() {
        if line.trim().is_empty() {
            flush(&mut package, &mut version, &mut architecture);
            continue;
        }
        // Continuation of a multi-line field
        if line.starts_with(' ') || line.starts_with('\t') {
            continue;
        }
        if let Some((field, value)) = line.split_once(':') {
            let value = value.trim().to_string();
            match field {
                "Package" => package = Some(value),
                "Version" => version = Some(value),
                "Architecture" => architecture = Some(value),
                _ => {}
            }
        }
    }
    flush(&mut package, &mut version, &mut architecture);

    stanzas
}

/// Newest known version per package for one set of sources
#[derive(Debug, Clone)]
pub struct PackageIndex {
    arch: String,
    sources: Vec<String>,
    packages: HashMap<String, String>,
}

impl PackageIndex {
    /// Create an empty index for `arch` covering `sources`
    pub fn new(arch: &str, sources: &[SourceLine]) -> Self {
        let mut normalized: Vec<String> = sources.iter().map(ToString::to_string).collect();
        normalized.sort();
        normalized.dedup();
        PackageIndex {
            arch: arch.to_string(),
            sources: normalized,
            packages: HashMap::new(),
        }
    }

    /// Record a version, keeping whichever is newer
    pub fn insert(&mut self, name: &str, candidate: &str) {
        match self.packages.get_mut(name) {
            Some(current) => {
                if version::compare(candidate, current) == Ordering::Greater {
                    *current = candidate.to_string();
                }
            }
            None => {
                self.packages.insert(name.to_string(), candidate.to_string());
            }
        }
    }

    /// Merge the contents of a `Packages` file into the index
    ///
    /// Stanzas for other architectures are ignored; `all` always applies.
    pub fn merge_packages(&mut self, text: &str) -> usize {
        let mut merged = 0;
        for stanza in parse_packages(text) {
            let applies = match stanza.architecture.as_deref() {
                Some(arch) => arch == self.arch || arch == "all",
                None => true,
            };
            if applies {
                self.insert(&stanza.package, &stanza.version);
                merged += 1;
            }
        }
        debug!(arch = %self.arch, merged, "merged package stanzas");
        merged
    }

    /// Newest version of `name`, if any source publishes it
    pub fn latest(&self, name: &str) -> Option<&str> {
        self.packages.get(name).map(String::as_str)
    }

    /// Newest version for each of `names`, in order
    pub fn get_latest<S: AsRef<str>>(&self, names: &[S]) -> Vec<(String, Option<String>)> {
        names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                (name.to_string(), self.latest(name).map(str::to_string))
            })
            .collect()
    }

    /// Stable identity of the sources and architecture behind this index
    ///
    /// Two indexes refreshed from the same sources for the same architecture
    /// share a fingerprint regardless of source order.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.arch.as_bytes());
        hasher.update(b"\0");
        for source in &self.sources {
            hasher.update(source.as_bytes());
            hasher.update(b"\0");
        }
        hex::encode(hasher.finalize())
    }

    /// Target architecture
    pub fn arch(&self) -> &str {
        &self.arch
    }

    /// Normalized source lines covered by this index
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    /// Number of distinct packages
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    /// Whether no package is known
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}
