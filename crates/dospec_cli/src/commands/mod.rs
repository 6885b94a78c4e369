//! CLI command definitions.
//!
//! Each subcommand maps to one step of getting an app onto App Platform.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dospec_publish::{AppManifest, PublishConfig};
use tracing::debug;

pub mod preview;
pub mod publish;
pub mod validate;

/// Default manifest file name, looked up in the current directory.
pub const DEFAULT_MANIFEST: &str = "dospec.yaml";

/// dospec - App Platform spec generator
#[derive(Parser)]
#[command(name = "dospec")]
#[command(version, about = "dospec - generate DigitalOcean App Platform specs")]
#[command(long_about = r#"
dospec turns a declarative application manifest into a DigitalOcean
App Platform App Spec and a doctl deploy script.

COMMANDS:
  publish   → Write app.yaml and deploy.sh to the output directory
  preview   → Print the generated spec without writing files
  validate  → Check a region slug or a manifest

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments
  3 - Validation failure
  5 - Publish error
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate the App Spec and deploy script
    Publish(publish::PublishArgs),

    /// Print the App Spec to stdout
    Preview(preview::PreviewArgs),

    /// Validate a region or a manifest
    Validate(validate::ValidateArgs),
}

/// Load a manifest, failing with a readable message when it is missing.
pub fn load_manifest(path: &Path) -> Result<AppManifest> {
    if !path.exists() {
        anyhow::bail!("Manifest not found: {}", path.display());
    }
    let manifest = AppManifest::from_file(path)?;
    Ok(manifest)
}

/// Publish settings for a run: the manifest's `app:` section, or a separate
/// settings file when one is given.
///
/// Git discovery still starts from the manifest's directory unless the
/// settings file names its own `working_dir`.
pub fn load_config(manifest: &AppManifest, config_file: Option<&Path>) -> Result<PublishConfig> {
    let Some(path) = config_file else {
        return Ok(manifest.app.clone());
    };

    let mut config = PublishConfig::from_file(path)
        .with_context(|| format!("Failed to load settings from {}", path.display()))?;
    if config.working_dir.is_none() {
        config.working_dir = manifest.app.working_dir.clone();
    }
    debug!("Using publish settings from {:?}", path);
    Ok(config)
}

/// Resolve the manifest path argument.
pub fn manifest_path(arg: Option<PathBuf>) -> PathBuf {
    arg.unwrap_or_else(|| PathBuf::from(DEFAULT_MANIFEST))
}
