//! apt-index: APT package metadata for dockpin
//!
//! This crate answers one question for the package pinning engine: what is
//! the newest version of a package published by a set of APT sources for a
//! given architecture.
//!
//! - [`SourceLine`] parses `deb` source lines and derives index URLs
//! - [`PackageIndex`] is an immutable snapshot produced by one refresh
//! - [`PackageRepository`] is the refresh seam; [`AptClient`] implements it
//!   over HTTP and [`fakes::MemoryRepository`] in memory
//! - [`version::compare`] orders Debian version strings

pub mod client;
pub mod error;
pub mod fakes;
pub mod index;
pub mod source;
pub mod version;

pub use client::{AptClient, AptConfig, PackageRepository};
pub use error::AptError;
pub use index::{parse_packages, PackageIndex, PackageStanza};
pub use source::{IndexLocation, SourceLine};
pub use version::DebianVersion;

/// Result type for apt-index operations
pub type Result<T> = std::result::Result<T, AptError>;

/// Architecture assumed when none is known
pub const DEFAULT_ARCH: &str = "amd64";
