//! Application model: the ordered resource collection a publish reads.

use dospec_core::{Resource, ResourceKind};
use tracing::debug;

/// Ordered collection of resources declared by the application.
#[derive(Debug, Clone, Default)]
pub struct AppModel {
    resources: Vec<Resource>,
}

impl AppModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_resource(&mut self, resource: Resource) -> &mut Resource {
        self.resources.push(resource);
        let last = self.resources.len() - 1;
        &mut self.resources[last]
    }

    pub fn with_resource(mut self, resource: Resource) -> Self {
        self.resources.push(resource);
        self
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn find(&self, name: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.name == name)
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut Resource> {
        self.resources.iter_mut().find(|r| r.name == name)
    }

    /// Register the App Platform environment.
    ///
    /// Registration is idempotent: when the model already holds an
    /// environment resource, that resource is returned and nothing is added.
    pub fn add_app_platform_environment(&mut self, name: &str) -> &Resource {
        let existing = self
            .resources
            .iter()
            .position(|r| matches!(r.kind, ResourceKind::AppPlatformEnvironment));

        let index = match existing {
            Some(index) => {
                debug!(
                    "App Platform environment '{}' already registered",
                    self.resources[index].name
                );
                index
            }
            None => {
                self.resources
                    .push(Resource::new(name, ResourceKind::AppPlatformEnvironment));
                self.resources.len() - 1
            }
        };

        &self.resources[index]
    }

    pub fn has_app_platform_environment(&self) -> bool {
        self.resources
            .iter()
            .any(|r| matches!(r.kind, ResourceKind::AppPlatformEnvironment))
    }

    /// Registry name of the first container registry resource.
    pub fn registry_name(&self) -> Option<&str> {
        self.resources.iter().find_map(Resource::registry_name)
    }

    /// Resources that take part in spec generation, in declaration order.
    pub fn eligible_resources(&self) -> Vec<&Resource> {
        self.resources
            .iter()
            .filter(|r| {
                !r.is_excluded()
                    && !matches!(
                        r.kind,
                        ResourceKind::AppPlatformEnvironment | ResourceKind::ContainerRegistry { .. }
                    )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dospec_core::DatabaseEngine;

    #[test]
    fn test_environment_registration_is_idempotent() {
        let mut model = AppModel::new();
        model.add_resource(Resource::container("web", "nginx"));

        let first = model.add_app_platform_environment("do").name.clone();
        let second = model.add_app_platform_environment("other").name.clone();

        assert_eq!(first, "do");
        assert_eq!(second, "do");
        assert_eq!(model.len(), 2);
        assert!(model.has_app_platform_environment());
    }

    #[test]
    fn test_registry_name() {
        let model = AppModel::new()
            .with_resource(Resource::container("web", "nginx"))
            .with_resource(Resource::container_registry("registry", "acme"))
            .with_resource(Resource::container_registry("backup", "acme-2"));
        assert_eq!(model.registry_name(), Some("acme"));
        assert_eq!(AppModel::new().registry_name(), None);
    }

    #[test]
    fn test_eligible_resources() {
        let mut model = AppModel::new()
            .with_resource(Resource::container("web", "nginx"))
            .with_resource(Resource::container_registry("registry", "acme"))
            .with_resource(Resource::database("db", DatabaseEngine::Pg))
            .with_resource(Resource::container("debug", "busybox").exclude_from_publish());
        model.add_app_platform_environment("do");

        let names: Vec<_> = model
            .eligible_resources()
            .into_iter()
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(names, vec!["web", "db"]);
    }

    #[test]
    fn test_add_resource_returns_handle() {
        let mut model = AppModel::new();
        model
            .add_resource(Resource::container("web", "nginx"))
            .annotate(dospec_core::Annotation::ExcludeFromPublish);
        assert!(model.find("web").unwrap().is_excluded());
        assert!(model.find_mut("missing").is_none());
    }
}
