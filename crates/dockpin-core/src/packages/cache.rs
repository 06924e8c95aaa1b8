//! Per-run memo of latest-version lookups

use std::collections::HashMap;

use apt_index::PackageIndex;

/// Latest versions keyed by package name and repository coordinates.
///
/// The coordinates are [`PackageIndex::fingerprint`], so two refreshes of the
/// same sources for the same architecture share entries. Owned by the caller
/// for the duration of one run; nothing is global.
#[derive(Debug, Default, Clone)]
pub struct VersionCache {
    entries: HashMap<(String, String), Option<String>>,
    hits: usize,
}

impl VersionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest version of `name` in `index`, memoized under `coordinates`
    pub fn latest(&mut self, index: &PackageIndex, coordinates: &str, name: &str) -> Option<String> {
        let key = (name.to_string(), coordinates.to_string());
        if let Some(cached) = self.entries.get(&key) {
            self.hits += 1;
            return cached.clone();
        }
        let latest = index.latest(name).map(str::to_string);
        self.entries.insert(key, latest.clone());
        latest
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Lookups answered from the cache
    pub fn hits(&self) -> usize {
        self.hits
    }
}
