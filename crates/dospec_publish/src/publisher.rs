//! Publish orchestration.
//!
//! Turns an [`AppModel`] into an App Spec file and a deploy script on disk.
//! Everything is rendered in memory first; nothing is written once the
//! cancellation token fires.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dospec_core::{AppSpec, AppSpecBuilder, AppSpecWriter, GitRepoInfo};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::PublishConfig;
use crate::error::{PublishError, PublishResult};
use crate::git::GitProvider;
use crate::model::AppModel;
use crate::script::{render_deploy_script, write_script};

/// Result of a successful publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOutcome {
    /// Sanitized app name written into the spec.
    pub app_name: String,
    pub spec_path: PathBuf,
    pub script_path: PathBuf,
    /// Number of services, workers, databases, static sites and functions.
    pub component_count: usize,
}

/// Publishes an application model for App Platform.
pub struct AppPlatformPublisher {
    config: PublishConfig,
    git: Arc<dyn GitProvider>,
}

impl AppPlatformPublisher {
    pub fn new(config: PublishConfig, git: Arc<dyn GitProvider>) -> Self {
        Self { config, git }
    }

    pub fn config(&self) -> &PublishConfig {
        &self.config
    }

    /// Build the spec without touching the filesystem.
    pub async fn preview(&self, model: &AppModel) -> PublishResult<AppSpec> {
        self.config.validate()?;

        let eligible = model.eligible_resources();
        debug!(
            "{} of {} resource(s) eligible for publishing",
            eligible.len(),
            model.len()
        );

        let mut builder = AppSpecBuilder::new(&self.config.app_name, &self.config.region);
        if let Some(registry) = self.registry(model) {
            builder = builder.with_registry(registry);
        }
        if let Some(git) = self.detect_git().await {
            builder = builder.with_git_info(git);
        }

        Ok(builder.build(eligible))
    }

    /// Write the spec and deploy script into the output directory.
    ///
    /// Returns [`PublishError::Canceled`] without writing anything if
    /// `cancel` fires before rendering completes.
    pub async fn publish(
        &self,
        model: &AppModel,
        cancel: &CancellationToken,
    ) -> PublishResult<PublishOutcome> {
        let spec = self.preview(model).await?;
        let spec_content = AppSpecWriter::to_yaml(&spec)?;
        let script_content = render_deploy_script(&spec.name, &self.config.spec_file_name);

        if cancel.is_cancelled() {
            info!("Publish of '{}' canceled, nothing written", spec.name);
            return Err(PublishError::Canceled);
        }

        let output_dir = &self.config.output_dir;
        fs::create_dir_all(output_dir).map_err(|source| PublishError::Write {
            path: output_dir.clone(),
            source,
        })?;

        let spec_path = self.config.spec_path();
        write_file(&spec_path, &spec_content)?;
        let script_path = self.config.script_path();
        write_script(&script_path, &script_content)?;

        info!(
            "Published '{}' to {:?} ({} components)",
            spec.name,
            output_dir,
            spec.component_count()
        );

        Ok(PublishOutcome {
            app_name: spec.name.clone(),
            spec_path,
            script_path,
            component_count: spec.component_count(),
        })
    }

    /// Registry from the configuration, else from the model.
    fn registry<'a>(&'a self, model: &'a AppModel) -> Option<&'a str> {
        self.config.registry.as_deref().or_else(|| model.registry_name())
    }

    async fn detect_git(&self) -> Option<GitRepoInfo> {
        if !self.config.detect_git {
            debug!("Git discovery disabled");
            return None;
        }

        let start = match &self.config.working_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().ok()?,
        };
        self.git.detect(&start).await
    }
}

fn write_file(path: &Path, content: &str) -> PublishResult<()> {
    fs::write(path, content).map_err(|source| PublishError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Wrote {:?}", path);
    Ok(())
}
