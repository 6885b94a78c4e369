//! Preview command - Print the generated App Spec.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Args, ValueEnum};
use dospec_core::{AppSpec, AppSpecWriter};
use dospec_publish::{AppPlatformPublisher, CommandGitProvider};

use super::{load_config, load_manifest, manifest_path};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Yaml,
    Json,
}

#[derive(Args)]
pub struct PreviewArgs {
    /// Path to the application manifest [default: dospec.yaml]
    #[arg(short, long)]
    pub manifest: Option<PathBuf>,

    /// Publish settings file used instead of the manifest's `app:` section
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "yaml")]
    pub format: OutputFormat,

    /// Region or datacenter override
    #[arg(short, long)]
    pub region: Option<String>,

    /// Skip git repository discovery
    #[arg(long)]
    pub no_git: bool,
}

/// Render a spec in the requested format.
pub fn render(spec: &AppSpec, format: OutputFormat) -> Result<String> {
    let content = match format {
        OutputFormat::Yaml => AppSpecWriter::to_yaml(spec)?,
        OutputFormat::Json => AppSpecWriter::to_json(spec)?,
    };
    Ok(content)
}

pub async fn execute(args: PreviewArgs) -> Result<()> {
    let manifest = load_manifest(&manifest_path(args.manifest))?;

    let mut config = load_config(&manifest, args.config.as_deref())?;
    if let Some(region) = args.region {
        config = config.with_region(region);
    }
    if args.no_git {
        config = config.without_git();
    }

    let git = CommandGitProvider::new().with_timeout(config.git_timeout());
    let publisher = AppPlatformPublisher::new(config, Arc::new(git));
    let spec = publisher.preview(&manifest.to_model()).await?;

    let content = render(&spec, args.format)?;
    print!("{}", content);
    if !content.ends_with('\n') {
        println!();
    }
    Ok(())
}
