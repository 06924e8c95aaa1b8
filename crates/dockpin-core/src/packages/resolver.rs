//! Latest-version pinning for APT install instructions

use apt_index::{PackageIndex, PackageRepository, DEFAULT_ARCH};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::cache::VersionCache;
use super::command::{is_apt_install, InstallCommand};
use super::directive::Directive;
use crate::dockerfile::{parse, Layers};
use crate::error::{PinError, Result};
use crate::rewrite::editor::LineEditor;

/// A package whose pin moved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageChange {
    pub name: String,
    /// The version now pinned
    pub version: String,
}

/// Rewritten build file plus what changed in it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinResult {
    pub dockerfile: String,
    pub changes: Vec<PackageChange>,
}

/// Pins packages in the install instructions of one build stage to the
/// newest versions the configured sources publish.
pub struct PackagePinResolver<'r> {
    repository: &'r dyn PackageRepository,
    arch: String,
    cache: VersionCache,
}

impl<'r> PackagePinResolver<'r> {
    pub fn new(repository: &'r dyn PackageRepository) -> Self {
        PackagePinResolver {
            repository,
            arch: DEFAULT_ARCH.to_string(),
            cache: VersionCache::new(),
        }
    }

    pub fn with_arch(mut self, arch: &str) -> Self {
        self.arch = arch.to_string();
        self
    }

    /// Start from a cache carried over from earlier work in the same run
    pub fn with_cache(mut self, cache: VersionCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache(&self) -> &VersionCache {
        &self.cache
    }

    /// Hand the cache back for the next file of the run
    pub fn into_cache(self) -> VersionCache {
        self.cache
    }

    async fn refresh(&self, sources: &[String]) -> Result<PackageIndex> {
        self.repository
            .update(sources, &self.arch)
            .await
            .map_err(PinError::RepositoryRefreshFailed)
    }

    /// Rewrite the install instructions of stage `layer` (0-based).
    ///
    /// The index for `sources` is refreshed before anything is resolved. An
    /// `atomist:apt-source=` comment right above an instruction adds a source
    /// for that instruction only; `atomist:apt-ignore` skips it. A failed
    /// refresh aborts the whole stage and no text is returned.
    pub async fn pin(&mut self, text: &str, layer: usize, sources: &[String]) -> Result<PinResult> {
        let instructions = parse(text);
        let layers = Layers::partition(&instructions);
        let stage = layers.stage(layer)?;

        let base = self.refresh(sources).await?;
        let base_coordinates = base.fingerprint();
        info!(
            layer,
            sources = sources.len(),
            packages = base.len(),
            "Resolving APT package pins"
        );

        let mut editor = LineEditor::new(text);
        let mut changes = Vec::new();
        let mut install_count = 0;

        for (pos, instruction) in stage.iter().enumerate() {
            if !is_apt_install(instruction) {
                continue;
            }
            install_count += 1;

            let directive = pos
                .checked_sub(1)
                .and_then(|prev| Directive::from_instruction(&stage[prev]));

            let scoped: PackageIndex;
            let scoped_coordinates: String;
            let (index, coordinates) = match directive {
                Some(Directive::Ignore) => {
                    info!(line = instruction.start_line, "Skipping install instruction (apt-ignore)");
                    continue;
                }
                Some(Directive::SourceOverride(extra)) => {
                    info!(line = instruction.start_line, source = %extra, "Using extra APT source");
                    let mut extended = Vec::with_capacity(sources.len() + 1);
                    extended.push(extra);
                    extended.extend_from_slice(sources);
                    scoped = self.refresh(&extended).await?;
                    scoped_coordinates = scoped.fingerprint();
                    (&scoped, scoped_coordinates.as_str())
                }
                None => (&base, base_coordinates.as_str()),
            };

            let mut command = InstallCommand::parse(&instruction.raw_args);
            let mut changed = false;
            for package in command.packages_mut() {
                let latest = self
                    .cache
                    .latest(index, coordinates, &package.name)
                    .or_else(|| package.version.clone());
                if latest == package.version {
                    continue;
                }
                if let Some(version) = latest {
                    debug!(
                        package = %package.name,
                        from = package.version.as_deref().unwrap_or("<unpinned>"),
                        to = %version,
                        "Pinning package"
                    );
                    changes.push(PackageChange {
                        name: package.name.clone(),
                        version: version.clone(),
                    });
                    package.version = Some(version);
                    changed = true;
                }
            }

            if changed {
                let first = instruction.start_line - 1;
                let last = instruction.line_number - 1;
                let newline = editor.newline_for(first);
                editor.replace(first, command.render_with(newline));
                for line in first + 1..=last {
                    editor.delete(line);
                }
            }
        }

        crate::obs::emit_packages_pinned(layer, install_count, changes.len());
        Ok(PinResult {
            dockerfile: editor.finish(),
            changes,
        })
    }
}

/// One-shot pinning with a fresh cache
pub async fn pin_apt_packages(
    text: &str,
    layer: usize,
    sources: &[String],
    arch: &str,
    repository: &dyn PackageRepository,
) -> Result<PinResult> {
    PackagePinResolver::new(repository)
        .with_arch(arch)
        .pin(text, layer, sources)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use apt_index::fakes::MemoryRepository;

    const FOCAL: &str = "deb http://archive.ubuntu.com/ubuntu focal main";

    fn repository() -> MemoryRepository {
        MemoryRepository::new()
            .with_package(FOCAL, "curl", "7.68.0-1ubuntu2.7")
            .with_package(FOCAL, "git", "1:2.25.1-1ubuntu3.6")
    }

    fn sources() -> Vec<String> {
        vec![FOCAL.to_string()]
    }

    #[tokio::test]
    async fn test_pins_unpinned_packages() {
        let repo = repository();
        let text = "FROM ubuntu:focal\nRUN apt-get update && apt-get install -y git curl\n";
        let result = pin_apt_packages(text, 0, &sources(), "amd64", &repo).await.unwrap();

        assert_eq!(
            result.dockerfile,
            "FROM ubuntu:focal\nRUN apt-get update && apt-get install -y \\\n    curl=7.68.0-1ubuntu2.7 \\\n    git=1:2.25.1-1ubuntu3.6\n"
        );
        assert_eq!(
            result.changes,
            vec![
                PackageChange {
                    name: "git".to_string(),
                    version: "1:2.25.1-1ubuntu3.6".to_string()
                },
                PackageChange {
                    name: "curl".to_string(),
                    version: "7.68.0-1ubuntu2.7".to_string()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_up_to_date_is_untouched() {
        let repo = repository();
        let text = "FROM ubuntu:focal\nRUN apt-get update && apt-get install curl=7.68.0-1ubuntu2.7\n";
        let result = pin_apt_packages(text, 0, &sources(), "amd64", &repo).await.unwrap();
        assert_eq!(result.dockerfile, text);
        assert!(result.changes.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_package_is_kept() {
        let repo = repository();
        let text = "FROM ubuntu:focal\nRUN apt-get update && apt-get install mystery\n";
        let result = pin_apt_packages(text, 0, &sources(), "amd64", &repo).await.unwrap();
        assert_eq!(result.dockerfile, text);
        assert!(result.changes.is_empty());
    }

    #[tokio::test]
    async fn test_layer_out_of_range() {
        let repo = repository();
        let err = pin_apt_packages("FROM a\n", 1, &sources(), "amd64", &repo)
            .await
            .unwrap_err();
        assert!(matches!(err, PinError::ParseInconsistency(_)));
        assert!(repo.requests().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_failure_is_fatal() {
        let repo = repository().failing_source(FOCAL);
        let err = pin_apt_packages(
            "FROM a\nRUN apt-get update && apt-get install curl\n",
            0,
            &sources(),
            "amd64",
            &repo,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, PinError::RepositoryRefreshFailed(_)));
    }

    #[tokio::test]
    async fn test_cache_carries_across_files() {
        let repo = repository();
        let text = "FROM ubuntu:focal\nRUN apt-get update && apt-get install curl\n";

        let mut resolver = PackagePinResolver::new(&repo);
        resolver.pin(text, 0, &sources()).await.unwrap();
        let cache = resolver.into_cache();
        assert_eq!(cache.hits(), 0);

        let mut resolver = PackagePinResolver::new(&repo).with_cache(cache);
        resolver.pin(text, 0, &sources()).await.unwrap();
        assert_eq!(resolver.cache().hits(), 1);
        assert_eq!(repo.requests().len(), 2);
    }
}
