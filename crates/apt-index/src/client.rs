//! APT repository client
//!
//! Downloads the `Packages` indexes published by a set of `deb` sources and
//! folds them into a [`PackageIndex`].

use crate::error::AptError;
use crate::index::PackageIndex;
use crate::source::{IndexLocation, SourceLine};
use crate::{Result, DEFAULT_ARCH};
use async_trait::async_trait;
use flate2::read::GzDecoder;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::time::Duration;
use tracing::{debug, info, warn};

/// A source of package metadata.
///
/// `update` is the equivalent of `apt-get update`: it must complete before
/// any version lookup, and each call yields a fresh, immutable snapshot.
#[async_trait]
pub trait PackageRepository: Send + Sync {
    /// Refresh the index for `sources` and `arch`.
    async fn update(&self, sources: &[String], arch: &str) -> Result<PackageIndex>;
}

/// APT client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AptConfig {
    /// Default architecture when the caller does not supply one
    pub arch: String,
    /// Per-request timeout
    pub timeout_secs: u64,
    /// User agent sent to mirrors
    pub user_agent: String,
}

impl Default for AptConfig {
    fn default() -> Self {
        AptConfig {
            arch: std::env::var("DOCKPIN_APT_ARCH").unwrap_or_else(|_| DEFAULT_ARCH.to_string()),
            timeout_secs: std::env::var("DOCKPIN_APT_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            user_agent: format!("dockpin-apt-index/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl AptConfig {
    /// Create a new config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Override the default architecture
    pub fn with_arch(mut self, arch: &str) -> Self {
        self.arch = arch.to_string();
        self
    }

    /// Override the request timeout
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// HTTP-backed APT client
pub struct AptClient {
    config: AptConfig,
    http_client: reqwest::Client,
}

impl AptClient {
    /// Create a new APT client
    pub fn new(config: AptConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(AptClient {
            config,
            http_client,
        })
    }

    /// Create client from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(AptConfig::from_env())
    }

    /// Client configuration
    pub fn config(&self) -> &AptConfig {
        &self.config
    }

    /// Fetch one index location, trying each candidate URL in turn
    async fn fetch_location(&self, location: &IndexLocation) -> Result<String> {
        for url in &location.candidates {
            match self.fetch(url).await? {
                Some(body) => {
                    debug!(url = %url, bytes = body.len(), "fetched package index");
                    return Ok(body);
                }
                None => debug!(url = %url, "index candidate not published"),
            }
        }
        Err(AptError::NoIndex(location.label.clone()))
    }

    /// GET a single index file; `None` when the mirror does not publish it
    async fn fetch(&self, url: &str) -> Result<Option<String>> {
        let response = self.http_client.get(url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND || status == reqwest::StatusCode::FORBIDDEN {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(AptError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await?;
        if url.ends_with(".gz") {
            let owned_url = url.to_string();
            let text = tokio::task::spawn_blocking(move || inflate(&bytes))
                .await
                .map_err(|e| AptError::Decompress {
                    url: owned_url.clone(),
                    reason: e.to_string(),
                })?
                .map_err(|e| AptError::Decompress {
                    url: owned_url,
                    reason: e.to_string(),
                })?;
            Ok(Some(text))
        } else {
            Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
        }
    }
}

fn inflate(bytes: &[u8]) -> std::io::Result<String> {
    let mut decoder = GzDecoder::new(bytes);
    let mut raw = Vec::new();
    decoder.read_to_end(&mut raw)?;
    Ok(String::from_utf8_lossy(&raw).into_owned())
}

#[async_trait]
impl PackageRepository for AptClient {
    async fn update(&self, sources: &[String], arch: &str) -> Result<PackageIndex> {
        let parsed = SourceLine::parse_all(sources)?;
        let mut index = PackageIndex::new(arch, &parsed);

        let locations: Vec<IndexLocation> = parsed
            .iter()
            .filter(|s| {
                let supported = s.supports_arch(arch);
                if !supported {
                    debug!(source = %s, arch = %arch, "source does not publish architecture");
                }
                supported
            })
            .flat_map(|s| s.index_locations(arch))
            .collect();

        if locations.is_empty() {
            warn!(arch = %arch, "no usable APT sources, index is empty");
            return Ok(index);
        }

        info!(
            arch = %arch,
            sources = parsed.len(),
            indexes = locations.len(),
            "refreshing APT package index"
        );

        let bodies = join_all(locations.iter().map(|l| self.fetch_location(l))).await;
        for body in bodies {
            index.merge_packages(&body?);
        }

        info!(arch = %arch, packages = index.len(), "APT package index refreshed");
        Ok(index)
    }
}
