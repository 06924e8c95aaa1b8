//! Reports produced by the `container-diff` tool
//!
//! The report is a JSON array of `{"DiffType": ..., "Diff": ...}` objects.
//! Only the analyzers dockpin summarizes are read; others are skipped.

use serde::{Deserialize, Serialize};

use super::aggregate::DiffEntry;
use crate::error::Result;

/// Package analyzers whose `InfoDiff` lists version changes
pub const PACKAGE_DIFF_TYPES: [&str; 4] = ["Apt", "RPM", "Node", "pip"];

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ReportItem {
    diff_type: String,
    #[serde(default)]
    diff: serde_json::Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct FileDiff {
    adds: Option<Vec<FileInfo>>,
    dels: Option<Vec<FileInfo>>,
    mods: Option<Vec<FileModification>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct FileInfo {
    name: String,
    #[serde(default)]
    size: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct FileModification {
    name: String,
    #[serde(default)]
    size1: i64,
    #[serde(default)]
    size2: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SizeRecord {
    #[serde(default)]
    size1: i64,
    #[serde(default)]
    size2: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct PackageInfoDiff {
    info_diff: Option<Vec<InfoDiffItem>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InfoDiffItem {
    package: String,
    #[serde(default)]
    info1: Versions,
    #[serde(default)]
    info2: Versions,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct VersionInfo {
    #[serde(default)]
    version: String,
}

/// A single package info object or a list of them
#[derive(Debug, Default, Deserialize)]
#[serde(untagged)]
enum Versions {
    Many(Vec<VersionInfo>),
    One(VersionInfo),
    #[default]
    None,
}

impl Versions {
    fn joined(&self) -> String {
        match self {
            Versions::Many(infos) => infos
                .iter()
                .map(|i| i.version.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            Versions::One(info) => info.version.clone(),
            Versions::None => String::new(),
        }
    }
}

/// Image size before and after
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeDiff {
    pub current: i64,
    pub proposed: i64,
}

/// A package whose installed version(s) differ between images
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDiff {
    pub package: String,
    /// Versions in the current image, `", "`-joined
    pub current: String,
    pub proposed: String,
    /// Analyzer that reported it (`Apt`, `RPM`, `Node`, `pip`)
    pub kind: String,
}

/// A parsed `container-diff` report
#[derive(Debug, Clone)]
pub struct ContainerDiffReport {
    items: Vec<ReportItem>,
}

impl ContainerDiffReport {
    pub fn from_json(json: &str) -> Result<Self> {
        let items: Vec<ReportItem> = serde_json::from_str(json)?;
        Ok(ContainerDiffReport { items })
    }

    fn of_type<'a>(&'a self, diff_type: &'a str) -> impl Iterator<Item = &'a ReportItem> + 'a {
        self.items.iter().filter(move |i| i.diff_type == diff_type)
    }

    /// Per-file size changes as leaf entries, sorted by path
    pub fn file_entries(&self) -> Result<Vec<DiffEntry>> {
        let mut entries = Vec::new();
        for item in self.of_type("File") {
            let diff = FileDiff::deserialize(&item.diff)?;
            for add in diff.adds.unwrap_or_default() {
                entries.push(DiffEntry::new(add.name, 0, add.size));
            }
            for del in diff.dels.unwrap_or_default() {
                entries.push(DiffEntry::new(del.name, del.size, 0));
            }
            for modified in diff.mods.unwrap_or_default() {
                entries.push(DiffEntry::new(modified.name, modified.size1, modified.size2));
            }
        }
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }

    /// Whole-image size change, when the report has a size analysis
    pub fn size_diff(&self) -> Result<Option<SizeDiff>> {
        let Some(item) = self.of_type("Size").next() else {
            return Ok(None);
        };
        let records = Vec::<SizeRecord>::deserialize(&item.diff)?;
        Ok(records.first().map(|r| SizeDiff {
            current: r.size1,
            proposed: r.size2,
        }))
    }

    /// Package version changes across all package analyzers, sorted by package
    pub fn package_diffs(&self) -> Result<Vec<PackageDiff>> {
        let mut diffs = Vec::new();
        for item in self
            .items
            .iter()
            .filter(|i| PACKAGE_DIFF_TYPES.contains(&i.diff_type.as_str()))
        {
            let diff = PackageInfoDiff::deserialize(&item.diff)?;
            for info in diff.info_diff.unwrap_or_default() {
                diffs.push(PackageDiff {
                    package: info.package,
                    current: info.info1.joined(),
                    proposed: info.info2.joined(),
                    kind: item.diff_type.clone(),
                });
            }
        }
        diffs.sort_by(|a, b| a.package.cmp(&b.package));
        Ok(diffs)
    }
}
