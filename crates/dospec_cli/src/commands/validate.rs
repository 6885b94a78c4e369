//! Validate command - Check a region or a manifest.

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgGroup, Args};
use dospec_core::{is_valid_name, sanitize, Region};
use dospec_publish::is_recognized_region;
use tracing::info;

use super::load_manifest;

#[derive(Args)]
#[command(group(ArgGroup::new("target").required(true).args(["region", "manifest"])))]
pub struct ValidateArgs {
    /// Region or datacenter slug to check (e.g. nyc3)
    #[arg(short, long)]
    pub region: Option<String>,

    /// Manifest to check
    #[arg(short, long)]
    pub manifest: Option<PathBuf>,
}

/// Check a region slug, returning the region it maps to.
pub fn validate_region(slug: &str) -> Result<Region> {
    if !is_recognized_region(slug) {
        anyhow::bail!("Unknown region '{}'", slug);
    }
    Ok(Region::normalize(slug))
}

pub async fn execute(args: ValidateArgs) -> Result<()> {
    let mut all_passed = true;

    if let Some(slug) = &args.region {
        println!("🌍 Validating region...");
        match validate_region(slug) {
            Ok(region) => println!("   ✅ '{}' maps to region '{}'", slug, region),
            Err(e) => {
                all_passed = false;
                println!("   ❌ {}", e);
            }
        }
    }

    if let Some(path) = &args.manifest {
        println!("📋 Validating manifest...");
        info!("Validating manifest {:?}", path);

        let manifest = load_manifest(path)?;
        manifest.app.validate()?;

        let model = manifest.to_model();
        println!(
            "   ✅ Manifest parsed: {} resource(s), {} eligible for publishing",
            model.len(),
            model.eligible_resources().len()
        );

        if !is_recognized_region(&manifest.app.region) {
            println!(
                "   ⚠️  Unknown region '{}', '{}' will be used",
                manifest.app.region,
                Region::normalize(&manifest.app.region)
            );
        }

        for resource in model.eligible_resources() {
            if !is_valid_name(&resource.name) {
                println!(
                    "   ⚠️  '{}' will be published as '{}'",
                    resource.name,
                    sanitize(&resource.name)
                );
            }
        }
    }

    if !all_passed {
        anyhow::bail!("Validation failed");
    }

    println!("\n✅ Validation passed");
    Ok(())
}
