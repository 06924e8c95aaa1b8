//! APT package pinning
//!
//! - `command`: install instruction model and canonical rendering
//! - `directive`: `# atomist:apt-*` comments
//! - `cache`: per-run latest-version memo
//! - `resolver`: stage-scoped pin resolution against a `PackageRepository`

mod cache;
mod command;
mod directive;
mod resolver;

pub use cache::VersionCache;
pub use command::{is_apt_install, InstallCommand, PackageSpec};
pub use directive::Directive;
pub use resolver::{pin_apt_packages, PackageChange, PackagePinResolver, PinResult};
