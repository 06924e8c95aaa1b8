//! Container image references
//!
//! `[host/]name[:tag][@digest]`, as they appear after `FROM`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PinError, Result};

/// Registry host assumed for references without one
pub const DEFAULT_REGISTRY: &str = "hub.docker.com";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageReference {
    pub host: String,
    pub name: String,
    pub tag: Option<String>,
    pub digest: Option<String>,
}

impl ImageReference {
    /// Parse an image token
    pub fn parse(token: &str) -> Result<Self> {
        let token = token.trim();
        if token.is_empty() {
            return Err(PinError::ParseInconsistency(
                "empty image reference".to_string(),
            ));
        }

        let (rest, digest) = match token.split_once('@') {
            Some((rest, digest)) => (rest, Some(digest.to_string())),
            None => (token, None),
        };

        let (host, path) = match rest.split_once('/') {
            Some((first, path))
                if first.contains('.') || first.contains(':') || first == "localhost" =>
            {
                (first.to_string(), path)
            }
            _ => (DEFAULT_REGISTRY.to_string(), rest),
        };

        let last_component = path.rfind('/').map_or(0, |i| i + 1);
        let (name, tag) = match path[last_component..].rfind(':') {
            Some(i) => {
                let split = last_component + i;
                (&path[..split], Some(path[split + 1..].to_string()))
            }
            None => (path, None),
        };
        if name.is_empty() {
            return Err(PinError::ParseInconsistency(format!(
                "image reference '{}' has no name",
                token
            )));
        }

        Ok(ImageReference {
            host,
            name: name.to_string(),
            tag,
            digest,
        })
    }

    /// Copy pinned to `digest`, keeping the tag for readability
    pub fn pinned(&self, digest: &str) -> Self {
        ImageReference {
            digest: Some(digest.to_string()),
            ..self.clone()
        }
    }

    pub fn is_pinned(&self) -> bool {
        self.digest.is_some()
    }

    /// Host-qualified repository, without tag or digest
    pub fn repository(&self) -> String {
        if self.host == DEFAULT_REGISTRY {
            self.name.clone()
        } else {
            format!("{}/{}", self.host, self.name)
        }
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repository())?;
        if let Some(tag) = &self.tag {
            write!(f, ":{}", tag)?;
        }
        if let Some(digest) = &self.digest {
            write!(f, "@{}", digest)?;
        }
        Ok(())
    }
}

impl FromStr for ImageReference {
    type Err = PinError;

    fn from_str(s: &str) -> Result<Self> {
        ImageReference::parse(s)
    }
}
