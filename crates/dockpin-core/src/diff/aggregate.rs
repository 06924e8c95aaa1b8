//! Bounded-size folding of per-path differences

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Numeric difference for one path, or a summary of several below it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffEntry {
    pub path: String,
    pub current: i64,
    pub proposed: i64,
    /// Leaves folded into this entry; only set on summaries of 2 or more
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff: Option<i64>,
}

impl DiffEntry {
    pub fn new(path: impl Into<String>, current: i64, proposed: i64) -> Self {
        DiffEntry {
            path: path.into(),
            current,
            proposed,
            children: None,
            diff: Some(proposed - current),
        }
    }

    /// `proposed - current`
    pub fn delta(&self) -> i64 {
        self.proposed - self.current
    }

    fn leaf_count(&self) -> usize {
        self.children.unwrap_or(1)
    }
}

/// Working node: an entry plus the one leaf path it stands for, while it
/// stands for exactly one.
#[derive(Debug)]
struct Node {
    entry: DiffEntry,
    sole_leaf: Option<String>,
}

impl Node {
    fn leaf(entry: DiffEntry) -> Self {
        let sole_leaf = match entry.children {
            None | Some(1) => Some(entry.path.clone()),
            Some(_) => None,
        };
        Node { entry, sole_leaf }
    }

    /// Re-key under `path`. Folded entries become summaries.
    fn rekey(mut self, path: String, folded: bool) -> Self {
        if folded {
            self.entry.children = Some(self.entry.leaf_count());
            self.entry.diff = Some(self.entry.delta());
        } else if self.entry.diff.is_none() {
            self.entry.diff = Some(self.entry.delta());
        }
        self.entry.path = path;
        self
    }

    fn absorb(&mut self, other: Node) {
        let leaves = self.entry.leaf_count() + other.entry.leaf_count();
        self.entry.current += other.entry.current;
        self.entry.proposed += other.entry.proposed;
        self.entry.children = Some(leaves);
        self.entry.diff = Some(self.entry.delta());
        self.sole_leaf = None;
    }

    fn finish(self) -> DiffEntry {
        let mut entry = self.entry;
        if entry.children == Some(1) {
            if let Some(leaf) = self.sole_leaf {
                entry.path = leaf;
            }
            entry.children = None;
        }
        entry
    }
}

fn segments(path: &str) -> usize {
    path.split('/').count()
}

/// Parent directory, POSIX style: `a` → `.`, `/a` → `/`, `a/b/` → `a`
pub(crate) fn dirname(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return if path.is_empty() { "." } else { "/" }.to_string();
    }
    match trimmed.rfind('/') {
        None => ".".to_string(),
        Some(idx) => {
            let parent = trimmed[..idx].trim_end_matches('/');
            if parent.is_empty() {
                "/".to_string()
            } else {
                parent.to_string()
            }
        }
    }
}

/// One folding pass: everything at the deepest level moves into its parent.
fn fold_deepest(nodes: Vec<Node>, max_depth: usize) -> Vec<Node> {
    let mut folded: BTreeMap<String, Node> = BTreeMap::new();
    for node in nodes {
        let deepest = segments(&node.entry.path) + 1 > max_depth;
        let key = if deepest {
            dirname(&node.entry.path)
        } else {
            node.entry.path.clone()
        };
        match folded.entry(key) {
            Entry::Occupied(mut existing) => existing.get_mut().absorb(node),
            Entry::Vacant(slot) => {
                let key = slot.key().clone();
                slot.insert(node.rekey(key, deepest));
            }
        }
    }
    folded.into_values().collect()
}

/// Fold `entries` into at most `limit` entries.
///
/// The deepest level is folded into parent directories, one level at a
/// time, until the count fits or everything sits at a root (`/` or `.`). Inputs already
/// within `limit` are returned unchanged. Every input leaf is counted by
/// exactly one output entry and `current`/`proposed` sums are preserved.
/// Summaries of a single leaf are reported under that leaf's path.
pub fn aggregate(entries: &[DiffEntry], limit: usize) -> Vec<DiffEntry> {
    if entries.len() <= limit {
        return entries.to_vec();
    }

    let mut nodes: Vec<Node> = entries.iter().cloned().map(Node::leaf).collect();
    let mut max_depth = nodes.iter().map(|n| segments(&n.entry.path)).max().unwrap_or(0);

    // Roots (`/`, `.`) fold into themselves, so the level is lowered even
    // when they keep the observed depth up.
    while nodes.len() > limit && max_depth > 0 {
        nodes = fold_deepest(nodes, max_depth);
        let depth = nodes.iter().map(|n| segments(&n.entry.path)).max().unwrap_or(0);
        debug!(entries = nodes.len(), depth, "Folded diff level");
        max_depth = depth.min(max_depth - 1);
    }

    let aggregated: Vec<DiffEntry> = nodes.into_iter().map(Node::finish).collect();
    crate::obs::emit_diff_aggregated(entries.len(), aggregated.len(), limit);
    aggregated
}
