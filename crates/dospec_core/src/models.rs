//! App Spec document model.
//!
//! These types mirror the App Platform App Spec schema. Field order here is
//! the field order in the rendered document, and every optional field is
//! skipped when absent so the output stays minimal.

use serde::{Deserialize, Serialize};

use crate::region::Region;

/// Smallest App Platform instance size.
pub const DEFAULT_INSTANCE_SIZE: &str = "apps-s-1vcpu-0.5gb";

/// Instance count applied when nothing overrides it.
pub const DEFAULT_INSTANCE_COUNT: u32 = 1;

/// Root App Spec document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSpec {
    pub name: String,
    pub region: Region,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub services: Option<Vec<ServiceSpec>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<Vec<WorkerSpec>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub databases: Option<Vec<DatabaseSpec>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub static_sites: Option<Vec<StaticSiteSpec>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub functions: Option<Vec<FunctionSpec>>,
}

impl AppSpec {
    /// Create an empty spec. The name is used verbatim; callers are expected
    /// to have sanitized it.
    pub fn new(name: impl Into<String>, region: Region) -> Self {
        Self {
            name: name.into(),
            region,
            services: None,
            workers: None,
            databases: None,
            static_sites: None,
            functions: None,
        }
    }

    /// Total number of components across every list.
    pub fn component_count(&self) -> usize {
        self.services.as_ref().map_or(0, Vec::len)
            + self.workers.as_ref().map_or(0, Vec::len)
            + self.databases.as_ref().map_or(0, Vec::len)
            + self.static_sites.as_ref().map_or(0, Vec::len)
            + self.functions.as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.component_count() == 0
    }

    /// Look up a service by its sanitized name.
    pub fn service(&self, name: &str) -> Option<&ServiceSpec> {
        self.services.as_ref()?.iter().find(|s| s.name == name)
    }

    /// Look up a worker by its sanitized name.
    pub fn worker(&self, name: &str) -> Option<&WorkerSpec> {
        self.workers.as_ref()?.iter().find(|w| w.name == name)
    }

    /// Look up a database by its sanitized name.
    pub fn database(&self, name: &str) -> Option<&DatabaseSpec> {
        self.databases.as_ref()?.iter().find(|d| d.name == name)
    }
}

/// An HTTP-reachable component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_port: Option<u16>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub internal_ports: Vec<u16>,
    pub instance_count: u32,
    pub instance_size_slug: String,
    #[serde(default, skip_serializing_if = "health_check_is_absent")]
    pub health_check: Option<HealthCheck>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment_slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_dir: Option<String>,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub source: Option<DeploymentSource>,
}

impl ServiceSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            http_port: None,
            internal_ports: Vec::new(),
            instance_count: DEFAULT_INSTANCE_COUNT,
            instance_size_slug: DEFAULT_INSTANCE_SIZE.to_string(),
            health_check: None,
            environment_slug: None,
            source_dir: None,
            source: None,
        }
    }

    pub fn github(&self) -> Option<&GithubSource> {
        self.source.as_ref().and_then(DeploymentSource::as_github)
    }

    pub fn image(&self) -> Option<&ImageSource> {
        self.source.as_ref().and_then(DeploymentSource::as_image)
    }
}

/// A background component with no public HTTP route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub internal_ports: Vec<u16>,
    pub instance_count: u32,
    pub instance_size_slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment_slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_dir: Option<String>,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub source: Option<DeploymentSource>,
}

impl WorkerSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            internal_ports: Vec::new(),
            instance_count: DEFAULT_INSTANCE_COUNT,
            instance_size_slug: DEFAULT_INSTANCE_SIZE.to_string(),
            environment_slug: None,
            source_dir: None,
            source: None,
        }
    }

    pub fn github(&self) -> Option<&GithubSource> {
        self.source.as_ref().and_then(DeploymentSource::as_github)
    }

    pub fn image(&self) -> Option<&ImageSource> {
        self.source.as_ref().and_then(DeploymentSource::as_image)
    }
}

/// A static site built from source and served from the CDN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticSiteSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_document: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_document: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment_slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_dir: Option<String>,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub source: Option<DeploymentSource>,
}

impl StaticSiteSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            build_command: None,
            output_dir: None,
            index_document: None,
            error_document: None,
            environment_slug: None,
            source_dir: None,
            source: None,
        }
    }
}

/// A serverless functions component. Functions only deploy from source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_dir: Option<String>,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub source: Option<DeploymentSource>,
}

impl FunctionSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source_dir: None,
            source: None,
        }
    }
}

/// A managed database attached to the app.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSpec {
    pub name: String,
    pub engine: DatabaseEngine,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Always `false`: dev databases only, promotion is left to the operator.
    #[serde(default)]
    pub production: bool,
}

impl DatabaseSpec {
    pub fn new(name: impl Into<String>, engine: DatabaseEngine) -> Self {
        Self {
            name: name.into(),
            engine,
            version: None,
            production: false,
        }
    }
}

/// Managed database engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DatabaseEngine {
    #[serde(alias = "pg", alias = "postgres")]
    Pg,
    #[serde(alias = "mysql")]
    Mysql,
    #[serde(alias = "redis")]
    Redis,
    #[serde(alias = "valkey")]
    Valkey,
    #[serde(alias = "mongodb")]
    Mongodb,
}

impl DatabaseEngine {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseEngine::Pg => "PG",
            DatabaseEngine::Mysql => "MYSQL",
            DatabaseEngine::Redis => "REDIS",
            DatabaseEngine::Valkey => "VALKEY",
            DatabaseEngine::Mongodb => "MONGODB",
        }
    }

    /// Whether the engine is a key-value cache rather than a relational or
    /// document store.
    pub fn is_cache(&self) -> bool {
        matches!(self, DatabaseEngine::Redis | DatabaseEngine::Valkey)
    }
}

impl std::fmt::Display for DatabaseEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Health check settings for a service. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheck {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_delay_seconds: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_seconds: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_threshold: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_threshold: Option<u32>,
}

impl HealthCheck {
    pub fn http(path: impl Into<String>) -> Self {
        Self {
            http_path: Some(path.into()),
            ..Default::default()
        }
    }

    /// True when no field is set; such a check is dropped from the output.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn health_check_is_absent(check: &Option<HealthCheck>) -> bool {
    check.as_ref().map_or(true, HealthCheck::is_empty)
}

/// Where a component's artifact comes from.
///
/// Flattened into the component, so it renders as a `github:` or `image:`
/// key next to the other component fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentSource {
    Github(GithubSource),
    Image(ImageSource),
}

impl DeploymentSource {
    pub fn as_github(&self) -> Option<&GithubSource> {
        match self {
            DeploymentSource::Github(github) => Some(github),
            DeploymentSource::Image(_) => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImageSource> {
        match self {
            DeploymentSource::Image(image) => Some(image),
            DeploymentSource::Github(_) => None,
        }
    }
}

/// Source-based deployment from a GitHub repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GithubSource {
    /// Repository in `owner/repo` form.
    pub repo: String,
    pub branch: String,
    pub deploy_on_push: bool,
}

/// Image-based deployment from a container registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSource {
    pub registry_type: RegistryType,
    pub repository: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

/// Container registry kinds understood by App Platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegistryType {
    /// The provider's own container registry.
    Docr,
    DockerHub,
    Ghcr,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_defaults() {
        let service = ServiceSpec::new("api");
        assert_eq!(service.instance_count, 1);
        assert_eq!(service.instance_size_slug, "apps-s-1vcpu-0.5gb");
        assert!(service.source.is_none());
    }

    #[test]
    fn test_health_check_empty() {
        assert!(HealthCheck::default().is_empty());
        assert!(!HealthCheck::http("/health").is_empty());
    }

    #[test]
    fn test_engine_slugs() {
        let yaml = serde_yaml::to_string(&DatabaseEngine::Pg).unwrap();
        assert_eq!(yaml.trim(), "PG");
        let yaml = serde_yaml::to_string(&RegistryType::DockerHub).unwrap();
        assert_eq!(yaml.trim(), "DOCKER_HUB");
        assert!(DatabaseEngine::Redis.is_cache());
        assert!(!DatabaseEngine::Pg.is_cache());
    }

    #[test]
    fn test_component_count() {
        let mut spec = AppSpec::new("app", Region::Nyc);
        assert!(spec.is_empty());
        spec.services = Some(vec![ServiceSpec::new("web")]);
        spec.databases = Some(vec![DatabaseSpec::new("db", DatabaseEngine::Pg)]);
        assert_eq!(spec.component_count(), 2);
        assert!(spec.service("web").is_some());
        assert!(spec.database("db").is_some());
        assert!(spec.worker("web").is_none());
    }
}
