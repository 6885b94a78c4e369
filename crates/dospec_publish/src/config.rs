//! Publish configuration.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use dospec_core::{is_known_datacenter, Region};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{PublishError, PublishResult};

fn default_region() -> String {
    "nyc".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("publish")
}

fn default_spec_file_name() -> String {
    "app.yaml".to_string()
}

fn default_script_file_name() -> String {
    "deploy.sh".to_string()
}

fn default_detect_git() -> bool {
    true
}

fn default_git_timeout_secs() -> u64 {
    5
}

/// Settings for one publish invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishConfig {
    /// App name; sanitized before use.
    pub app_name: String,
    /// Region or datacenter code, normalized before use.
    #[serde(default = "default_region")]
    pub region: String,
    /// Fallback registry for resources published as images.
    #[serde(default)]
    pub registry: Option<String>,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_spec_file_name")]
    pub spec_file_name: String,
    #[serde(default = "default_script_file_name")]
    pub script_file_name: String,
    /// Whether to look for an enclosing git repository.
    #[serde(default = "default_detect_git")]
    pub detect_git: bool,
    #[serde(default = "default_git_timeout_secs")]
    pub git_timeout_secs: u64,
    /// Where git discovery starts; the current directory when unset.
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
}

impl PublishConfig {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            region: default_region(),
            registry: None,
            output_dir: default_output_dir(),
            spec_file_name: default_spec_file_name(),
            script_file_name: default_script_file_name(),
            detect_git: default_detect_git(),
            git_timeout_secs: default_git_timeout_secs(),
            working_dir: None,
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_registry(mut self, registry: impl Into<String>) -> Self {
        self.registry = Some(registry.into());
        self
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    pub fn with_working_dir(mut self, working_dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(working_dir.into());
        self
    }

    pub fn without_git(mut self) -> Self {
        self.detect_git = false;
        self
    }

    pub fn with_git_timeout(mut self, seconds: u64) -> Self {
        self.git_timeout_secs = seconds;
        self
    }

    pub fn git_timeout(&self) -> Duration {
        Duration::from_secs(self.git_timeout_secs)
    }

    /// Path of the generated spec file.
    pub fn spec_path(&self) -> PathBuf {
        self.output_dir.join(&self.spec_file_name)
    }

    /// Path of the generated deploy script.
    pub fn script_path(&self) -> PathBuf {
        self.output_dir.join(&self.script_file_name)
    }

    /// Reject configurations that cannot produce output.
    ///
    /// An unrecognized region is only a warning; it falls back to the
    /// default region when the spec is built.
    pub fn validate(&self) -> PublishResult<()> {
        if self.app_name.trim().is_empty() {
            return Err(PublishError::InvalidConfig("app_name must not be empty".to_string()));
        }

        for (field, value) in [
            ("spec_file_name", &self.spec_file_name),
            ("script_file_name", &self.script_file_name),
        ] {
            if !is_plain_file_name(value) {
                return Err(PublishError::InvalidConfig(format!(
                    "{} must be a plain file name of [A-Za-z0-9._-], got '{}'",
                    field, value
                )));
            }
        }

        if self.spec_file_name == self.script_file_name {
            return Err(PublishError::InvalidConfig(
                "spec_file_name and script_file_name must differ".to_string(),
            ));
        }

        if !is_recognized_region(&self.region) {
            warn!(
                "Unknown region '{}', falling back to '{}'",
                self.region,
                Region::normalize(&self.region)
            );
        }

        Ok(())
    }

    /// Load configuration from a YAML file.
    ///
    /// A relative `working_dir` resolves against the file's directory.
    pub fn from_file(path: &Path) -> PublishResult<Self> {
        let content = fs::read_to_string(path)?;
        let mut config: PublishConfig = serde_yaml::from_str(&content)?;
        if let (Some(dir), Some(parent)) = (&config.working_dir, path.parent()) {
            config.working_dir = Some(parent.join(dir));
        }
        Ok(config)
    }
}

/// File names are interpolated into the deploy script, so only a
/// shell-inert character set is accepted.
fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name.chars().any(|c| c != '.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

/// A region is recognized when it is a datacenter code or a region slug.
pub fn is_recognized_region(region: &str) -> bool {
    let lower = region.trim().to_lowercase();
    is_known_datacenter(&lower) || Region::all().iter().any(|r| r.as_str() == lower)
}
