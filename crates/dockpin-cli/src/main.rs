//! dockpin - Dockerfile pinning from the command line
//!
//! ## Commands
//!
//! - `pin-from`: replace base-image references (usually with digests)
//! - `follow`: pin the last base image and record the tag it follows
//! - `retag`: move every `FROM <ref>` to another reference
//! - `pin-apt`: pin APT packages of one stage to their latest versions
//! - `aggregate`: summarize a container-diff report

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use apt_index::{AptClient, AptConfig, PackageRepository};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn, Level};

use dockpin_core::{
    aggregate, rewrite_froms, rewrite_last, retag_froms, ContainerDiffReport, DiffEntry, FileSpan,
    ImageReference, PackageDiff, PackagePinResolver, Selection, SizeDiff,
};

#[derive(Parser)]
#[command(name = "dockpin")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Pin Dockerfile base images and APT packages", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replace base-image references in order
    PinFrom {
        /// Dockerfile to rewrite
        file: PathBuf,

        /// Replacement image per FROM line, in order
        #[arg(short, long = "image", required = true)]
        images: Vec<String>,

        /// Digest to pin each image to, in the same order as --image
        #[arg(short, long = "digest")]
        digests: Vec<String>,

        /// Only rewrite the FROM line at this 0-based position
        #[arg(long)]
        index: Option<usize>,

        /// Print the result instead of writing it back
        #[arg(long)]
        dry_run: bool,
    },

    /// Pin the last base image and record the tag it follows
    Follow {
        file: PathBuf,

        /// Replacement for the last FROM image
        #[arg(short, long)]
        image: String,

        /// Tag to record (default: the tag of --image)
        #[arg(short, long)]
        tag: Option<String>,

        /// Pin --image to this digest, keeping its tag
        #[arg(short, long)]
        digest: Option<String>,

        #[arg(long)]
        dry_run: bool,
    },

    /// Point every FROM <from> at <to>
    Retag {
        file: PathBuf,

        #[arg(long)]
        from: String,

        #[arg(long)]
        to: String,

        #[arg(long)]
        dry_run: bool,
    },

    /// Pin APT packages of one build stage to their latest versions
    PinApt {
        file: PathBuf,

        /// 0-based build stage
        #[arg(short, long, default_value = "0")]
        layer: usize,

        /// APT source line, e.g. "deb http://archive.ubuntu.com/ubuntu focal main"
        #[arg(short, long = "source", required = true)]
        sources: Vec<String>,

        /// Target architecture (default: DOCKPIN_APT_ARCH, else amd64)
        #[arg(long)]
        arch: Option<String>,

        #[arg(long)]
        dry_run: bool,
    },

    /// Summarize a container-diff JSON report
    Aggregate {
        /// Report written by `container-diff diff --json`
        report: PathBuf,

        /// Maximum number of file entries
        #[arg(short, long, env = "DOCKPIN_DIFF_LIMIT", default_value = "100")]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    dockpin_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::PinFrom {
            file,
            images,
            digests,
            index,
            dry_run,
        } => cmd_pin_from(&file, &images, &digests, index, dry_run),
        Commands::Follow {
            file,
            image,
            tag,
            digest,
            dry_run,
        } => cmd_follow(&file, &image, tag.as_deref(), digest.as_deref(), dry_run),
        Commands::Retag {
            file,
            from,
            to,
            dry_run,
        } => cmd_retag(&file, &from, &to, dry_run),
        Commands::PinApt {
            file,
            layer,
            sources,
            arch,
            dry_run,
        } => {
            let config = apt_config(arch.as_deref());
            let arch = config.arch.clone();
            let client = AptClient::new(config).context("Failed to create APT client")?;
            cmd_pin_apt(&client, &file, layer, &sources, &arch, dry_run).await
        }
        Commands::Aggregate { report, limit } => cmd_aggregate(&report, limit),
    }
}

/// APT settings from the environment, with `--arch` taking precedence
fn apt_config(arch: Option<&str>) -> AptConfig {
    let config = AptConfig::from_env();
    match arch {
        Some(arch) => config.with_arch(arch),
        None => config,
    }
}

/// Parse `image`, pinning it to `digest` when one is given
fn replacement_image(image: &str, digest: Option<&str>) -> Result<ImageReference> {
    let parsed = ImageReference::parse(image)
        .with_context(|| format!("Invalid image reference: {}", image))?;
    Ok(match digest {
        Some(digest) => parsed.pinned(digest),
        None => parsed,
    })
}

fn read_dockerfile(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read Dockerfile: {:?}", path))
}

/// Write `updated` back to `path`, or print it for a dry run.
fn write_back(path: &Path, original: &str, updated: &str, dry_run: bool) -> Result<()> {
    if dry_run {
        print!("{}", updated);
        return Ok(());
    }
    if original == updated {
        info!("{:?} already up to date", path);
        return Ok(());
    }
    std::fs::write(path, updated).with_context(|| format!("Failed to write {:?}", path))?;
    info!("Updated {:?}", path);
    Ok(())
}

/// Replace base-image references
fn cmd_pin_from(
    path: &Path,
    images: &[String],
    digests: &[String],
    index: Option<usize>,
    dry_run: bool,
) -> Result<()> {
    let _span = FileSpan::enter(&path.display().to_string());
    if !digests.is_empty() && digests.len() != images.len() {
        anyhow::bail!(
            "{} digests given for {} images",
            digests.len(),
            images.len()
        );
    }

    let mut replacements = Vec::with_capacity(images.len());
    for (i, image) in images.iter().enumerate() {
        let parsed = replacement_image(image, digests.get(i).map(String::as_str))?;
        if !parsed.is_pinned() {
            warn!(image = %parsed, "Replacement image is not pinned to a digest");
        }
        replacements.push(parsed.to_string());
    }

    let dockerfile = read_dockerfile(path)?;
    let selection = index.map_or(Selection::All, Selection::At);
    let updated = rewrite_froms(&dockerfile, &replacements, selection)
        .with_context(|| format!("Failed to rewrite {:?}", path))?;
    write_back(path, &dockerfile, &updated, dry_run)
}

/// Pin the last base image and sync the follow-tag label
fn cmd_follow(
    path: &Path,
    image: &str,
    tag: Option<&str>,
    digest: Option<&str>,
    dry_run: bool,
) -> Result<()> {
    let _span = FileSpan::enter(&path.display().to_string());
    let reference = replacement_image(image, digest)?;
    let tag = match tag {
        Some(tag) => tag.to_string(),
        None => reference
            .tag
            .clone()
            .with_context(|| format!("{} has no tag; pass --tag", image))?,
    };

    let dockerfile = read_dockerfile(path)?;
    let updated = rewrite_last(&dockerfile, &reference.to_string(), &tag)
        .with_context(|| format!("Failed to rewrite {:?}", path))?;
    write_back(path, &dockerfile, &updated, dry_run)
}

/// Move base images from one reference to another
fn cmd_retag(path: &Path, from: &str, to: &str, dry_run: bool) -> Result<()> {
    let _span = FileSpan::enter(&path.display().to_string());
    let dockerfile = read_dockerfile(path)?;
    let retagged = retag_froms(&dockerfile, from, to)
        .with_context(|| format!("Failed to retag {:?}", path))?;
    for line in &retagged.lines {
        info!("Line {}: {} -> {}", line, from, to);
    }
    write_back(path, &dockerfile, &retagged.text, dry_run)
}

/// Pin APT packages of one stage
async fn cmd_pin_apt(
    repository: &dyn PackageRepository,
    path: &Path,
    layer: usize,
    sources: &[String],
    arch: &str,
    dry_run: bool,
) -> Result<()> {
    let _span = FileSpan::enter(&path.display().to_string());
    let dockerfile = read_dockerfile(path)?;

    let mut resolver = PackagePinResolver::new(repository).with_arch(arch);
    let result = resolver
        .pin(&dockerfile, layer, sources)
        .await
        .with_context(|| format!("Failed to pin APT packages in {:?}", path))?;

    if result.changes.is_empty() {
        println!("No package updates");
    } else if !dry_run {
        for change in &result.changes {
            println!("{}={}", change.name, change.version);
        }
    }
    write_back(path, &dockerfile, &result.dockerfile, dry_run)
}

#[derive(Debug, Serialize)]
struct DiffSummary {
    files: Vec<DiffEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    size: Option<SizeDiff>,
    packages: Vec<PackageDiff>,
}

fn summarize(json: &str, limit: usize) -> Result<DiffSummary> {
    let report = ContainerDiffReport::from_json(json)?;
    Ok(DiffSummary {
        files: aggregate(&report.file_entries()?, limit),
        size: report.size_diff()?,
        packages: report.package_diffs()?,
    })
}

/// Print a bounded summary of a container-diff report
fn cmd_aggregate(path: &Path, limit: usize) -> Result<()> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read report: {:?}", path))?;
    let summary = summarize(&json, limit).with_context(|| format!("Invalid report {:?}", path))?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
