//! Publish command - Write the App Spec and deploy script.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use dospec_publish::{AppManifest, AppPlatformPublisher, CommandGitProvider, PublishConfig};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::{load_config, load_manifest, manifest_path};

#[derive(Args)]
pub struct PublishArgs {
    /// Path to the application manifest [default: dospec.yaml]
    #[arg(short, long)]
    pub manifest: Option<PathBuf>,

    /// Publish settings file used instead of the manifest's `app:` section
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output directory for app.yaml and deploy.sh
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Region or datacenter (e.g. nyc3, ams3)
    #[arg(short, long)]
    pub region: Option<String>,

    /// Container registry for image-published resources
    #[arg(long)]
    pub registry: Option<String>,

    /// Skip git repository discovery
    #[arg(long)]
    pub no_git: bool,
}

/// Apply command-line overrides on top of the manifest's settings.
pub fn apply_overrides(mut config: PublishConfig, args: &PublishArgs) -> PublishConfig {
    if let Some(output) = &args.output {
        config = config.with_output_dir(output);
    }
    if let Some(region) = &args.region {
        config = config.with_region(region);
    }
    if let Some(registry) = &args.registry {
        config = config.with_registry(registry);
    }
    if args.no_git {
        config = config.without_git();
    }
    config
}

pub async fn execute(args: PublishArgs) -> Result<()> {
    let path = manifest_path(args.manifest.clone());
    info!("Publishing from manifest {:?}", path);

    let manifest: AppManifest = load_manifest(&path)?;
    let config = apply_overrides(load_config(&manifest, args.config.as_deref())?, &args);
    let git = CommandGitProvider::new().with_timeout(config.git_timeout());
    let publisher = AppPlatformPublisher::new(config, Arc::new(git));

    let cancel = CancellationToken::new();
    let ctrl_c_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, canceling publish");
            ctrl_c_token.cancel();
        }
    });

    let outcome = publisher
        .publish(&manifest.to_model(), &cancel)
        .await
        .context("Failed to publish app")?;

    println!("✅ Published '{}' ({} components)", outcome.app_name, outcome.component_count);
    println!("   📄 {}", outcome.spec_path.display());
    println!("   🚀 {}", outcome.script_path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> PublishArgs {
        PublishArgs {
            manifest: None,
            config: None,
            output: None,
            region: None,
            registry: None,
            no_git: false,
        }
    }

    #[test]
    fn test_overrides_replace_manifest_values() {
        let config = PublishConfig::new("shop").with_region("ams3");
        let overridden = apply_overrides(
            config.clone(),
            &PublishArgs {
                output: Some(PathBuf::from("out")),
                region: Some("sfo3".to_string()),
                registry: Some("acme".to_string()),
                no_git: true,
                ..args()
            },
        );
        assert_eq!(overridden.output_dir, PathBuf::from("out"));
        assert_eq!(overridden.region, "sfo3");
        assert_eq!(overridden.registry.as_deref(), Some("acme"));
        assert!(!overridden.detect_git);

        assert_eq!(apply_overrides(config.clone(), &args()), config);
    }

    #[tokio::test]
    async fn test_execute_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("dospec.yaml");
        std::fs::write(
            &manifest,
            "app:\n  app_name: shop\nresources:\n  - name: web\n    kind: container\n    image: nginx\n    endpoints:\n      - { name: http, scheme: http, target_port: 80 }\n",
        )
        .unwrap();

        let output = dir.path().join("publish");
        execute(PublishArgs {
            manifest: Some(manifest),
            output: Some(output.clone()),
            no_git: true,
            ..args()
        })
        .await
        .unwrap();

        let spec = std::fs::read_to_string(output.join("app.yaml")).unwrap();
        assert!(spec.contains("repository: nginx"));
        assert!(output.join("deploy.sh").exists());
    }

    #[tokio::test]
    async fn test_execute_with_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("dospec.yaml");
        std::fs::write(
            &manifest,
            "app:\n  app_name: shop\nresources:\n  - name: job\n    kind: container\n    image: busybox\n",
        )
        .unwrap();
        let settings = dir.path().join("staging.yaml");
        std::fs::write(
            &settings,
            "app_name: shop-staging\nregion: lon1\nspec_file_name: staging.yaml\nscript_file_name: deploy-staging.sh\n",
        )
        .unwrap();

        let output = dir.path().join("publish");
        execute(PublishArgs {
            manifest: Some(manifest),
            config: Some(settings),
            output: Some(output.clone()),
            no_git: true,
            ..args()
        })
        .await
        .unwrap();

        let spec = std::fs::read_to_string(output.join("staging.yaml")).unwrap();
        assert!(spec.starts_with("name: shop-staging\nregion: lon\n"));
        let script = std::fs::read_to_string(output.join("deploy-staging.sh")).unwrap();
        assert!(script.contains("SPEC_FILE=\"$SCRIPT_DIR/staging.yaml\""));
        assert!(!output.join("app.yaml").exists());
    }
}
