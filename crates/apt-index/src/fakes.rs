//! In-memory fakes for `PackageRepository` (testing only)
//!
//! `MemoryRepository` serves fixed package tables per source line and records
//! every refresh it is asked to perform.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::client::PackageRepository;
use crate::error::AptError;
use crate::index::PackageIndex;
use crate::source::SourceLine;
use crate::Result;

/// A recorded call to `update`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshRequest {
    pub sources: Vec<String>,
    pub arch: String,
}

/// In-memory package repository keyed by normalized source line.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    tables: HashMap<String, Vec<(String, String)>>,
    failing: HashSet<String>,
    requests: Mutex<Vec<RefreshRequest>>,
}

fn normalize(source: &str) -> String {
    match SourceLine::parse(source) {
        Ok(Some(parsed)) => parsed.to_string(),
        _ => source.trim().to_string(),
    }
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish `name` at `version` from `source`
    pub fn with_package(mut self, source: &str, name: &str, version: &str) -> Self {
        self.tables
            .entry(normalize(source))
            .or_default()
            .push((name.to_string(), version.to_string()));
        self
    }

    /// Make every refresh that includes `source` fail
    pub fn failing_source(mut self, source: &str) -> Self {
        self.failing.insert(normalize(source));
        self
    }

    /// All refreshes performed so far, oldest first
    pub fn requests(&self) -> Vec<RefreshRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PackageRepository for MemoryRepository {
    async fn update(&self, sources: &[String], arch: &str) -> Result<PackageIndex> {
        self.requests.lock().unwrap().push(RefreshRequest {
            sources: sources.to_vec(),
            arch: arch.to_string(),
        });

        let parsed = SourceLine::parse_all(sources)?;
        let mut index = PackageIndex::new(arch, &parsed);
        for source in &parsed {
            let key = source.to_string();
            if self.failing.contains(&key) {
                return Err(AptError::NoIndex(key));
            }
            if let Some(packages) = self.tables.get(&key) {
                for (name, version) in packages {
                    index.insert(name, version);
                }
            }
        }
        Ok(index)
    }
}
