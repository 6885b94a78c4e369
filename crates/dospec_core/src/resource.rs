//! Resource model read by the spec builder.
//!
//! A [`Resource`] is a named node from the hosting model with a kind and a
//! bag of annotations. The builder never mutates resources; it only queries
//! their capabilities.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::models::{
    DatabaseEngine, DatabaseSpec, FunctionSpec, ServiceSpec, StaticSiteSpec, WorkerSpec,
};

/// Post-build customization of a service spec.
pub type ServiceCallback = Arc<dyn Fn(&mut ServiceSpec) + Send + Sync>;

/// Post-build customization of a worker spec.
pub type WorkerCallback = Arc<dyn Fn(&mut WorkerSpec) + Send + Sync>;

/// Post-build customization of a static site spec.
pub type StaticSiteCallback = Arc<dyn Fn(&mut StaticSiteSpec) + Send + Sync>;

pub type FunctionCallback = Arc<dyn Fn(&mut FunctionSpec) + Send + Sync>;

pub type DatabaseCallback = Arc<dyn Fn(&mut DatabaseSpec) + Send + Sync>;

/// Runtime of a managed project, used to pick a buildpack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectRuntime {
    #[default]
    Dotnet,
    Node,
    Python,
    Go,
    Ruby,
    Php,
}

impl ProjectRuntime {
    /// Buildpack environment slug for source-based builds.
    pub fn environment_slug(&self) -> &'static str {
        match self {
            ProjectRuntime::Dotnet => "dotnet",
            ProjectRuntime::Node => "node-js",
            ProjectRuntime::Python => "python",
            ProjectRuntime::Go => "go",
            ProjectRuntime::Ruby => "ruby",
            ProjectRuntime::Php => "php",
        }
    }
}

/// What a resource is, as declared by the hosting model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceKind {
    /// A managed project with source on disk.
    Project { path: PathBuf, runtime: ProjectRuntime },
    /// A container, either from a prebuilt image or a local build context.
    Container {
        image: String,
        build_context: Option<PathBuf>,
    },
    /// A resource that declares its managed database category.
    Database {
        engine: DatabaseEngine,
        version: Option<String>,
    },
    /// A framework resource known only by its type name.
    Typed { type_name: String },
    /// A container registry; only a source of the registry name.
    ContainerRegistry { registry_name: String },
    /// The App Platform environment itself.
    AppPlatformEnvironment,
    Generic,
}

/// Stems of framework type names recognized as managed databases.
///
/// Matched exactly after stripping a trailing `Resource`, never as a
/// substring.
const KNOWN_DATABASE_TYPES: &[(&str, DatabaseEngine)] = &[
    ("postgres", DatabaseEngine::Pg),
    ("postgresql", DatabaseEngine::Pg),
    ("postgresserver", DatabaseEngine::Pg),
    ("postgresdatabase", DatabaseEngine::Pg),
    ("azurepostgresflexibleserver", DatabaseEngine::Pg),
    ("mysql", DatabaseEngine::Mysql),
    ("mysqlserver", DatabaseEngine::Mysql),
    ("mysqldatabase", DatabaseEngine::Mysql),
    ("mongodb", DatabaseEngine::Mongodb),
    ("mongodbserver", DatabaseEngine::Mongodb),
    ("mongodbdatabase", DatabaseEngine::Mongodb),
    ("redis", DatabaseEngine::Redis),
    ("garnet", DatabaseEngine::Redis),
    ("valkey", DatabaseEngine::Valkey),
];

/// Map a framework type name such as `PostgresServerResource` to an engine.
pub fn engine_from_type_name(type_name: &str) -> Option<DatabaseEngine> {
    let lower = type_name.trim().to_lowercase();
    let stem = lower.strip_suffix("resource").unwrap_or(&lower);
    KNOWN_DATABASE_TYPES
        .iter()
        .find(|(known, _)| *known == stem)
        .map(|(_, engine)| *engine)
}

/// An endpoint declared on a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointAnnotation {
    pub name: String,
    pub scheme: String,
    #[serde(default)]
    pub target_port: Option<u16>,
    #[serde(default)]
    pub is_external: bool,
}

impl EndpointAnnotation {
    pub fn new(name: impl Into<String>, scheme: impl Into<String>, target_port: u16) -> Self {
        Self {
            name: name.into(),
            scheme: scheme.into(),
            target_port: Some(target_port),
            is_external: false,
        }
    }

    pub fn is_http(&self) -> bool {
        self.scheme.eq_ignore_ascii_case("http") || self.scheme.eq_ignore_ascii_case("https")
    }
}

/// Health check declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheckAnnotation {
    pub path: String,
}

/// Request to publish the resource as a container image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePublishAnnotation {
    #[serde(default)]
    pub registry: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
}

/// Explicit GitHub source for the resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GithubSourceAnnotation {
    pub repo: String,
    pub branch: String,
    #[serde(default = "default_deploy_on_push")]
    pub deploy_on_push: bool,
    #[serde(default)]
    pub source_dir: Option<String>,
}

fn default_deploy_on_push() -> bool {
    true
}

/// Instance sizing overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizingAnnotation {
    #[serde(default)]
    pub instance_count: Option<u32>,
    #[serde(default)]
    pub instance_size_slug: Option<String>,
}

/// Build settings for a static site.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticSiteSettings {
    #[serde(default)]
    pub build_command: Option<String>,
    #[serde(default)]
    pub output_dir: Option<String>,
    #[serde(default)]
    pub index_document: Option<String>,
    #[serde(default)]
    pub error_document: Option<String>,
}

/// Explicit choice of output component kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeploymentTarget {
    Service,
    Worker,
    StaticSite(StaticSiteSettings),
    Function,
}

/// A typed metadata record attached to a resource.
#[derive(Clone)]
pub enum Annotation {
    Endpoint(EndpointAnnotation),
    HealthCheck(HealthCheckAnnotation),
    PublishAsImage(ImagePublishAnnotation),
    GithubSource(GithubSourceAnnotation),
    Sizing(SizingAnnotation),
    Target(DeploymentTarget),
    ExcludeFromPublish,
    ConfigureService(ServiceCallback),
    ConfigureWorker(WorkerCallback),
    ConfigureStaticSite(StaticSiteCallback),
    ConfigureFunction(FunctionCallback),
    ConfigureDatabase(DatabaseCallback),
}

impl fmt::Debug for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Annotation::Endpoint(e) => f.debug_tuple("Endpoint").field(e).finish(),
            Annotation::HealthCheck(h) => f.debug_tuple("HealthCheck").field(h).finish(),
            Annotation::PublishAsImage(i) => f.debug_tuple("PublishAsImage").field(i).finish(),
            Annotation::GithubSource(g) => f.debug_tuple("GithubSource").field(g).finish(),
            Annotation::Sizing(s) => f.debug_tuple("Sizing").field(s).finish(),
            Annotation::Target(t) => f.debug_tuple("Target").field(t).finish(),
            Annotation::ExcludeFromPublish => f.write_str("ExcludeFromPublish"),
            Annotation::ConfigureService(_) => f.write_str("ConfigureService(..)"),
            Annotation::ConfigureWorker(_) => f.write_str("ConfigureWorker(..)"),
            Annotation::ConfigureStaticSite(_) => f.write_str("ConfigureStaticSite(..)"),
            Annotation::ConfigureFunction(_) => f.write_str("ConfigureFunction(..)"),
            Annotation::ConfigureDatabase(_) => f.write_str("ConfigureDatabase(..)"),
        }
    }
}

/// A resource in the hosting model.
#[derive(Debug, Clone)]
pub struct Resource {
    pub name: String,
    pub kind: ResourceKind,
    pub annotations: Vec<Annotation>,
}

impl Resource {
    pub fn new(name: impl Into<String>, kind: ResourceKind) -> Self {
        Self {
            name: name.into(),
            kind,
            annotations: Vec::new(),
        }
    }

    pub fn project(name: impl Into<String>, path: impl Into<PathBuf>, runtime: ProjectRuntime) -> Self {
        Self::new(
            name,
            ResourceKind::Project {
                path: path.into(),
                runtime,
            },
        )
    }

    pub fn container(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self::new(
            name,
            ResourceKind::Container {
                image: image.into(),
                build_context: None,
            },
        )
    }

    pub fn database(name: impl Into<String>, engine: DatabaseEngine) -> Self {
        Self::new(
            name,
            ResourceKind::Database {
                engine,
                version: None,
            },
        )
    }

    pub fn typed(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::new(
            name,
            ResourceKind::Typed {
                type_name: type_name.into(),
            },
        )
    }

    pub fn container_registry(name: impl Into<String>, registry_name: impl Into<String>) -> Self {
        Self::new(
            name,
            ResourceKind::ContainerRegistry {
                registry_name: registry_name.into(),
            },
        )
    }

    pub fn generic(name: impl Into<String>) -> Self {
        Self::new(name, ResourceKind::Generic)
    }

    /// Attach an annotation in place.
    pub fn annotate(&mut self, annotation: Annotation) {
        self.annotations.push(annotation);
    }

    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotate(annotation);
        self
    }

    pub fn with_endpoint(self, name: impl Into<String>, scheme: impl Into<String>, target_port: u16) -> Self {
        self.with_annotation(Annotation::Endpoint(EndpointAnnotation::new(name, scheme, target_port)))
    }

    pub fn with_http_endpoint(self, target_port: u16) -> Self {
        self.with_endpoint("http", "http", target_port)
    }

    pub fn with_https_endpoint(self, target_port: u16) -> Self {
        self.with_endpoint("https", "https", target_port)
    }

    /// Mark every HTTP endpoint as externally reachable.
    pub fn with_external_http_endpoints(mut self) -> Self {
        for annotation in &mut self.annotations {
            if let Annotation::Endpoint(endpoint) = annotation {
                if endpoint.is_http() {
                    endpoint.is_external = true;
                }
            }
        }
        self
    }

    pub fn with_health_check(self, path: impl Into<String>) -> Self {
        self.with_annotation(Annotation::HealthCheck(HealthCheckAnnotation { path: path.into() }))
    }

    pub fn publish_as_image(self, publish: ImagePublishAnnotation) -> Self {
        self.with_annotation(Annotation::PublishAsImage(publish))
    }

    pub fn with_github_source(self, source: GithubSourceAnnotation) -> Self {
        self.with_annotation(Annotation::GithubSource(source))
    }

    pub fn with_sizing(self, instance_count: Option<u32>, instance_size_slug: Option<&str>) -> Self {
        self.with_annotation(Annotation::Sizing(SizingAnnotation {
            instance_count,
            instance_size_slug: instance_size_slug.map(str::to_string),
        }))
    }

    /// Build a container from a local context instead of pulling its image.
    pub fn with_build_context(mut self, context: impl Into<PathBuf>) -> Self {
        if let ResourceKind::Container { build_context, .. } = &mut self.kind {
            *build_context = Some(context.into());
        }
        self
    }

    /// Pin the version of a declared database.
    pub fn with_version(mut self, new_version: impl Into<String>) -> Self {
        if let ResourceKind::Database { version, .. } = &mut self.kind {
            *version = Some(new_version.into());
        }
        self
    }

    pub fn as_service(self) -> Self {
        self.with_annotation(Annotation::Target(DeploymentTarget::Service))
    }

    pub fn as_worker(self) -> Self {
        self.with_annotation(Annotation::Target(DeploymentTarget::Worker))
    }

    pub fn as_static_site(self, settings: StaticSiteSettings) -> Self {
        self.with_annotation(Annotation::Target(DeploymentTarget::StaticSite(settings)))
    }

    pub fn as_function(self) -> Self {
        self.with_annotation(Annotation::Target(DeploymentTarget::Function))
    }

    pub fn exclude_from_publish(self) -> Self {
        self.with_annotation(Annotation::ExcludeFromPublish)
    }

    pub fn configure_service<F>(self, callback: F) -> Self
    where
        F: Fn(&mut ServiceSpec) + Send + Sync + 'static,
    {
        self.with_annotation(Annotation::ConfigureService(Arc::new(callback)))
    }

    pub fn configure_worker<F>(self, callback: F) -> Self
    where
        F: Fn(&mut WorkerSpec) + Send + Sync + 'static,
    {
        self.with_annotation(Annotation::ConfigureWorker(Arc::new(callback)))
    }

    pub fn configure_static_site<F>(self, callback: F) -> Self
    where
        F: Fn(&mut StaticSiteSpec) + Send + Sync + 'static,
    {
        self.with_annotation(Annotation::ConfigureStaticSite(Arc::new(callback)))
    }

    pub fn configure_function<F>(self, callback: F) -> Self
    where
        F: Fn(&mut FunctionSpec) + Send + Sync + 'static,
    {
        self.with_annotation(Annotation::ConfigureFunction(Arc::new(callback)))
    }

    pub fn configure_database<F>(self, callback: F) -> Self
    where
        F: Fn(&mut DatabaseSpec) + Send + Sync + 'static,
    {
        self.with_annotation(Annotation::ConfigureDatabase(Arc::new(callback)))
    }

    // Capability queries. Single-valued annotations resolve to the last one
    // attached.

    /// Declared endpoints, in declaration order.
    pub fn endpoints(&self) -> impl Iterator<Item = &EndpointAnnotation> {
        self.annotations.iter().filter_map(|a| match a {
            Annotation::Endpoint(e) => Some(e),
            _ => None,
        })
    }

    pub fn health_check(&self) -> Option<&HealthCheckAnnotation> {
        self.annotations.iter().rev().find_map(|a| match a {
            Annotation::HealthCheck(h) => Some(h),
            _ => None,
        })
    }

    pub fn image_publish(&self) -> Option<&ImagePublishAnnotation> {
        self.annotations.iter().rev().find_map(|a| match a {
            Annotation::PublishAsImage(i) => Some(i),
            _ => None,
        })
    }

    pub fn github_source(&self) -> Option<&GithubSourceAnnotation> {
        self.annotations.iter().rev().find_map(|a| match a {
            Annotation::GithubSource(g) => Some(g),
            _ => None,
        })
    }

    pub fn sizing(&self) -> Option<&SizingAnnotation> {
        self.annotations.iter().rev().find_map(|a| match a {
            Annotation::Sizing(s) => Some(s),
            _ => None,
        })
    }

    pub fn target(&self) -> Option<&DeploymentTarget> {
        self.annotations.iter().rev().find_map(|a| match a {
            Annotation::Target(t) => Some(t),
            _ => None,
        })
    }

    pub fn is_excluded(&self) -> bool {
        self.annotations
            .iter()
            .any(|a| matches!(a, Annotation::ExcludeFromPublish))
    }

    /// Service callbacks, in registration order.
    pub fn service_callbacks(&self) -> impl Iterator<Item = &ServiceCallback> {
        self.annotations.iter().filter_map(|a| match a {
            Annotation::ConfigureService(cb) => Some(cb),
            _ => None,
        })
    }

    /// Worker callbacks, in registration order.
    pub fn worker_callbacks(&self) -> impl Iterator<Item = &WorkerCallback> {
        self.annotations.iter().filter_map(|a| match a {
            Annotation::ConfigureWorker(cb) => Some(cb),
            _ => None,
        })
    }

    /// Static site callbacks, in registration order.
    pub fn static_site_callbacks(&self) -> impl Iterator<Item = &StaticSiteCallback> {
        self.annotations.iter().filter_map(|a| match a {
            Annotation::ConfigureStaticSite(cb) => Some(cb),
            _ => None,
        })
    }

    pub fn function_callbacks(&self) -> impl Iterator<Item = &FunctionCallback> {
        self.annotations.iter().filter_map(|a| match a {
            Annotation::ConfigureFunction(cb) => Some(cb),
            _ => None,
        })
    }

    pub fn database_callbacks(&self) -> impl Iterator<Item = &DatabaseCallback> {
        self.annotations.iter().filter_map(|a| match a {
            Annotation::ConfigureDatabase(cb) => Some(cb),
            _ => None,
        })
    }

    /// Projects and containers; the kinds classified by their endpoints.
    pub fn is_compute(&self) -> bool {
        matches!(
            self.kind,
            ResourceKind::Project { .. } | ResourceKind::Container { .. }
        )
    }

    pub fn is_project(&self) -> bool {
        matches!(self.kind, ResourceKind::Project { .. })
    }

    pub fn runtime(&self) -> Option<ProjectRuntime> {
        match &self.kind {
            ResourceKind::Project { runtime, .. } => Some(*runtime),
            _ => None,
        }
    }

    /// On-disk source location, if the resource is built from source.
    pub fn source_path(&self) -> Option<&Path> {
        match &self.kind {
            ResourceKind::Project { path, .. } => Some(path),
            ResourceKind::Container { build_context, .. } => build_context.as_deref(),
            _ => None,
        }
    }

    /// Managed database engine, declared or inferred from the type name.
    pub fn managed_engine(&self) -> Option<DatabaseEngine> {
        match &self.kind {
            ResourceKind::Database { engine, .. } => Some(*engine),
            ResourceKind::Typed { type_name } => engine_from_type_name(type_name),
            _ => None,
        }
    }

    pub fn database_version(&self) -> Option<&str> {
        match &self.kind {
            ResourceKind::Database { version, .. } => version.as_deref(),
            _ => None,
        }
    }

    pub fn registry_name(&self) -> Option<&str> {
        match &self.kind {
            ResourceKind::ContainerRegistry { registry_name } => Some(registry_name),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_from_type_name() {
        assert_eq!(engine_from_type_name("PostgresServerResource"), Some(DatabaseEngine::Pg));
        assert_eq!(engine_from_type_name("PostgresDatabaseResource"), Some(DatabaseEngine::Pg));
        assert_eq!(engine_from_type_name("RedisResource"), Some(DatabaseEngine::Redis));
        assert_eq!(engine_from_type_name("ValkeyResource"), Some(DatabaseEngine::Valkey));
        assert_eq!(engine_from_type_name("MySqlServerResource"), Some(DatabaseEngine::Mysql));
    }

    #[test]
    fn test_engine_from_type_name_rejects_substrings() {
        assert_eq!(engine_from_type_name("MyRedisClientWrapper"), None);
        assert_eq!(engine_from_type_name("PostgresAdminDashboardResource"), None);
        assert_eq!(engine_from_type_name("NotRedisResource"), None);
        assert_eq!(engine_from_type_name(""), None);
    }

    #[test]
    fn test_last_annotation_wins() {
        let r = Resource::generic("x")
            .with_health_check("/a")
            .with_health_check("/b");
        assert_eq!(r.health_check().map(|h| h.path.as_str()), Some("/b"));
    }

    #[test]
    fn test_endpoints_keep_order() {
        let r = Resource::container("c", "nginx")
            .with_endpoint("grpc", "grpc", 9090)
            .with_http_endpoint(8080);
        let ports: Vec<_> = r.endpoints().filter_map(|e| e.target_port).collect();
        assert_eq!(ports, vec![9090, 8080]);
    }

    #[test]
    fn test_external_http_endpoints() {
        let r = Resource::container("c", "nginx")
            .with_http_endpoint(80)
            .with_endpoint("tcp", "tcp", 6000)
            .with_external_http_endpoints();
        let external: Vec<_> = r.endpoints().map(|e| e.is_external).collect();
        assert_eq!(external, vec![true, false]);
    }

    #[test]
    fn test_source_path() {
        let project = Resource::project("api", "/repo/src/api", ProjectRuntime::Dotnet);
        assert_eq!(project.source_path(), Some(Path::new("/repo/src/api")));

        let image = Resource::container("cache", "redis");
        assert!(image.source_path().is_none());

        let built = Resource::container("web", "web").with_build_context("/repo/web");
        assert_eq!(built.source_path(), Some(Path::new("/repo/web")));
    }

    #[test]
    fn test_runtime_slugs() {
        assert_eq!(ProjectRuntime::Dotnet.environment_slug(), "dotnet");
        assert_eq!(ProjectRuntime::Node.environment_slug(), "node-js");
    }
}
