//! Resource classification and App Spec assembly.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::endpoint::EndpointInference;
use crate::models::{
    AppSpec, DatabaseEngine, DatabaseSpec, DeploymentSource, FunctionSpec, HealthCheck,
    ServiceSpec, StaticSiteSpec, WorkerSpec,
};
use crate::naming::{sanitize, MAX_NAME_LEN};
use crate::region::Region;
use crate::resource::{DeploymentTarget, Resource, ResourceKind, SizingAnnotation, StaticSiteSettings};
use crate::source::{GitRepoInfo, ResolvedSource, SourceResolver};

/// Output component kind chosen for a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Service,
    Worker,
    Database(DatabaseEngine),
    StaticSite(StaticSiteSettings),
    Function,
    Excluded,
}

impl Classification {
    /// Classify a resource. The first matching rule wins:
    ///
    /// 1. excluded resources, registries and the environment are dropped
    /// 2. explicit static site and function markers
    /// 3. projects and containers, by their HTTP endpoints
    /// 4. managed databases and caches
    /// 5. service and worker markers on any other kind
    pub fn of(resource: &Resource) -> Self {
        if resource.is_excluded()
            || matches!(
                resource.kind,
                ResourceKind::ContainerRegistry { .. } | ResourceKind::AppPlatformEnvironment
            )
        {
            return Classification::Excluded;
        }

        match resource.target() {
            Some(DeploymentTarget::StaticSite(settings)) => {
                return Classification::StaticSite(settings.clone())
            }
            Some(DeploymentTarget::Function) => return Classification::Function,
            _ => {}
        }

        if resource.is_compute() {
            return if EndpointInference::infer(resource).is_http_service {
                Classification::Service
            } else {
                Classification::Worker
            };
        }

        if let Some(engine) = resource.managed_engine() {
            return Classification::Database(engine);
        }

        match resource.target() {
            Some(DeploymentTarget::Service) => Classification::Service,
            Some(DeploymentTarget::Worker) => Classification::Worker,
            _ => Classification::Excluded,
        }
    }
}

/// Builds an [`AppSpec`] from a set of resources.
#[derive(Debug, Clone)]
pub struct AppSpecBuilder {
    name: String,
    region: Region,
    registry: Option<String>,
    git: Option<GitRepoInfo>,
}

impl AppSpecBuilder {
    /// Create a builder. The name is sanitized and the region normalized.
    pub fn new(app_name: &str, region: &str) -> Self {
        Self {
            name: sanitize(app_name),
            region: Region::normalize(region),
            registry: None,
            git: None,
        }
    }

    /// Registry used by publish-as-image annotations that name none.
    pub fn with_registry(mut self, registry: impl Into<String>) -> Self {
        self.registry = Some(registry.into());
        self
    }

    pub fn with_git_info(mut self, git: GitRepoInfo) -> Self {
        self.git = Some(git);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn region(&self) -> Region {
        self.region
    }

    /// Classify every resource and assemble the spec.
    ///
    /// Components keep the order their resources were encountered in, and
    /// lists that end up empty are left absent. Component names are unique
    /// across the whole spec; a sanitized name that is already taken gets a
    /// numeric suffix.
    pub fn build<'r, I>(&self, resources: I) -> AppSpec
    where
        I: IntoIterator<Item = &'r Resource>,
    {
        let resolver = SourceResolver::new(self.registry.as_deref(), self.git.as_ref());

        let mut services = Vec::new();
        let mut workers = Vec::new();
        let mut databases = Vec::new();
        let mut static_sites = Vec::new();
        let mut functions = Vec::new();
        let mut names = ComponentNames::default();

        for resource in resources {
            let classification = Classification::of(resource);
            debug!("Classified {} as {:?}", resource.name, classification);
            if classification == Classification::Excluded {
                continue;
            }

            let name = names.claim(&resource.name);
            match classification {
                Classification::Service => services.push(build_service(resource, name, &resolver)),
                Classification::Worker => workers.push(build_worker(resource, name, &resolver)),
                Classification::Database(engine) => {
                    databases.push(build_database(resource, name, engine))
                }
                Classification::StaticSite(settings) => {
                    static_sites.push(build_static_site(resource, name, settings, &resolver))
                }
                Classification::Function => {
                    functions.push(build_function(resource, name, &resolver))
                }
                Classification::Excluded => {}
            }
        }

        let mut spec = AppSpec::new(self.name.clone(), self.region);
        spec.services = non_empty(services);
        spec.workers = non_empty(workers);
        spec.databases = non_empty(databases);
        spec.static_sites = non_empty(static_sites);
        spec.functions = non_empty(functions);

        info!(
            "Built app spec '{}' in {} with {} components",
            spec.name,
            spec.region,
            spec.component_count()
        );
        spec
    }
}

/// Build an App Spec in one call.
pub fn build(
    app_name: &str,
    region: &str,
    resources: &[Resource],
    registry: Option<&str>,
    git: Option<&GitRepoInfo>,
) -> AppSpec {
    let mut builder = AppSpecBuilder::new(app_name, region);
    if let Some(registry) = registry {
        builder = builder.with_registry(registry);
    }
    if let Some(git) = git {
        builder = builder.with_git_info(git.clone());
    }
    builder.build(resources)
}

/// Component names handed out during one build.
#[derive(Debug, Default)]
struct ComponentNames {
    taken: HashSet<String>,
}

impl ComponentNames {
    /// Sanitize `resource_name` and make it unique among the names claimed
    /// so far by appending `-2`, `-3`, ...
    fn claim(&mut self, resource_name: &str) -> String {
        let base = sanitize(resource_name);
        if self.taken.insert(base.clone()) {
            return base;
        }

        let mut n = 2;
        loop {
            let suffix = format!("-{}", n);
            let mut stem = base.clone();
            stem.truncate(MAX_NAME_LEN - suffix.len());
            let candidate = format!("{}{}", stem.trim_end_matches('-'), suffix);
            if self.taken.insert(candidate.clone()) {
                warn!(
                    "Component name '{}' from {} is already in use; renamed to '{}'",
                    base, resource_name, candidate
                );
                return candidate;
            }
            n += 1;
        }
    }
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

fn apply_sizing(sizing: Option<&SizingAnnotation>, count: &mut u32, slug: &mut String) {
    let Some(sizing) = sizing else {
        return;
    };
    if let Some(instance_count) = sizing.instance_count {
        // App Platform requires at least one instance.
        *count = instance_count.max(1);
    }
    if let Some(size) = &sizing.instance_size_slug {
        *slug = size.clone();
    }
}

fn build_service(resource: &Resource, name: String, resolver: &SourceResolver<'_>) -> ServiceSpec {
    let endpoints = EndpointInference::infer(resource);
    let ResolvedSource {
        source,
        environment_slug,
        source_dir,
    } = resolver.resolve(resource);

    let mut service = ServiceSpec::new(name);
    service.http_port = endpoints.http_port;
    service.internal_ports = endpoints.internal_ports;
    service.health_check = endpoints.health_check_path.map(HealthCheck::http);
    service.source = source;
    service.environment_slug = environment_slug;
    service.source_dir = source_dir;
    apply_sizing(
        resource.sizing(),
        &mut service.instance_count,
        &mut service.instance_size_slug,
    );

    for callback in resource.service_callbacks() {
        callback(&mut service);
    }
    service
}

fn build_worker(resource: &Resource, name: String, resolver: &SourceResolver<'_>) -> WorkerSpec {
    let endpoints = EndpointInference::infer(resource);
    let ResolvedSource {
        source,
        environment_slug,
        source_dir,
    } = resolver.resolve(resource);

    let mut worker = WorkerSpec::new(name);
    worker.internal_ports = endpoints.internal_ports;
    worker.source = source;
    worker.environment_slug = environment_slug;
    worker.source_dir = source_dir;
    apply_sizing(
        resource.sizing(),
        &mut worker.instance_count,
        &mut worker.instance_size_slug,
    );

    for callback in resource.worker_callbacks() {
        callback(&mut worker);
    }
    worker
}

fn build_static_site(
    resource: &Resource,
    name: String,
    settings: StaticSiteSettings,
    resolver: &SourceResolver<'_>,
) -> StaticSiteSpec {
    let ResolvedSource {
        source,
        environment_slug,
        source_dir,
    } = resolver.resolve(resource);

    let mut site = StaticSiteSpec::new(name);
    site.build_command = settings.build_command;
    site.output_dir = settings.output_dir;
    site.index_document = settings.index_document;
    site.error_document = settings.error_document;
    site.source = source;
    site.environment_slug = environment_slug;
    site.source_dir = source_dir;

    for callback in resource.static_site_callbacks() {
        callback(&mut site);
    }
    site
}

fn build_database(resource: &Resource, name: String, engine: DatabaseEngine) -> DatabaseSpec {
    let mut database = DatabaseSpec::new(name, engine);
    database.version = resource.database_version().map(str::to_string);

    for callback in resource.database_callbacks() {
        callback(&mut database);
    }
    database
}

fn build_function(resource: &Resource, name: String, resolver: &SourceResolver<'_>) -> FunctionSpec {
    let resolved = resolver.resolve(resource);

    let mut function = FunctionSpec::new(name);
    function.source_dir = resolved.source_dir;
    function.source = match resolved.source {
        Some(DeploymentSource::Image(image)) => {
            warn!(
                "Function {} cannot deploy from image {}; leaving source unset",
                resource.name, image.repository
            );
            None
        }
        other => other,
    };

    for callback in resource.function_callbacks() {
        callback(&mut function);
    }
    function
}
