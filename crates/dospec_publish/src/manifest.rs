//! Declarative application manifests.
//!
//! A manifest is a YAML document holding the publish settings under `app:`
//! and the hosting model under `resources:`:
//!
//! ```yaml
//! app:
//!   app_name: shop
//!   region: ams3
//! resources:
//!   - name: api
//!     kind: project
//!     path: src/Api
//!     endpoints:
//!       - { name: http, scheme: http, target_port: 8080 }
//!     health_check: /healthz
//!   - name: db
//!     kind: database
//!     engine: pg
//! ```
//!
//! Relative paths resolve against the manifest's directory. Configure
//! callbacks have no YAML form.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use dospec_core::{
    sanitize, Annotation, DatabaseEngine, EndpointAnnotation, GithubSourceAnnotation, ImagePublishAnnotation,
    ProjectRuntime, Resource, SizingAnnotation, StaticSiteSettings,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::PublishConfig;
use crate::error::{PublishError, PublishResult};
use crate::model::AppModel;

/// Kind-specific part of a resource entry, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum KindDecl {
    Project {
        path: PathBuf,
        #[serde(default)]
        runtime: ProjectRuntime,
    },
    Container {
        image: String,
        #[serde(default)]
        build_context: Option<PathBuf>,
    },
    Database {
        engine: DatabaseEngine,
        #[serde(default)]
        version: Option<String>,
    },
    Typed {
        type_name: String,
    },
    ContainerRegistry {
        registry_name: String,
    },
    Generic,
}

/// Output component kind requested by a resource entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetDecl {
    Service,
    Worker,
    StaticSite,
    Function,
}

/// One resource entry in a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDecl {
    pub name: String,
    #[serde(flatten)]
    pub kind: KindDecl,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub endpoints: Vec<EndpointAnnotation>,
    /// Marks every HTTP endpoint as externally reachable.
    #[serde(default)]
    pub external_http: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_check: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_image: Option<ImagePublishAnnotation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<GithubSourceAnnotation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sizing: Option<SizingAnnotation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<TargetDecl>,
    /// Build settings; only read when `target` is `static_site`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub static_site: Option<StaticSiteSettings>,
    #[serde(default)]
    pub exclude: bool,
}

impl ResourceDecl {
    /// Convert the entry into a model resource, resolving relative paths
    /// against `base_dir`.
    pub fn to_resource(&self, base_dir: &Path) -> Resource {
        let mut resource = match &self.kind {
            KindDecl::Project { path, runtime } => {
                Resource::project(&self.name, base_dir.join(path), *runtime)
            }
            KindDecl::Container {
                image,
                build_context,
            } => {
                let resource = Resource::container(&self.name, image);
                match build_context {
                    Some(context) => resource.with_build_context(base_dir.join(context)),
                    None => resource,
                }
            }
            KindDecl::Database { engine, version } => {
                let resource = Resource::database(&self.name, *engine);
                match version {
                    Some(version) => resource.with_version(version),
                    None => resource,
                }
            }
            KindDecl::Typed { type_name } => Resource::typed(&self.name, type_name),
            KindDecl::ContainerRegistry { registry_name } => {
                Resource::container_registry(&self.name, registry_name)
            }
            KindDecl::Generic => Resource::generic(&self.name),
        };

        for endpoint in &self.endpoints {
            resource = resource.with_annotation(Annotation::Endpoint(endpoint.clone()));
        }
        if self.external_http {
            resource = resource.with_external_http_endpoints();
        }
        if let Some(path) = &self.health_check {
            resource = resource.with_health_check(path);
        }
        if let Some(publish) = &self.publish_image {
            resource = resource.publish_as_image(publish.clone());
        }
        if let Some(github) = &self.github {
            resource = resource.with_github_source(github.clone());
        }
        if let Some(sizing) = &self.sizing {
            resource = resource.with_sizing(sizing.instance_count, sizing.instance_size_slug.as_deref());
        }
        resource = match self.target {
            Some(TargetDecl::Service) => resource.as_service(),
            Some(TargetDecl::Worker) => resource.as_worker(),
            Some(TargetDecl::StaticSite) => {
                resource.as_static_site(self.static_site.clone().unwrap_or_default())
            }
            Some(TargetDecl::Function) => resource.as_function(),
            None => resource,
        };
        if self.exclude {
            resource = resource.exclude_from_publish();
        }

        resource
    }
}

/// A publish configuration plus the resources it publishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppManifest {
    pub app: PublishConfig,
    #[serde(default)]
    pub resources: Vec<ResourceDecl>,
    /// Directory relative paths resolve against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl AppManifest {
    /// Parse a manifest from YAML text.
    pub fn from_yaml(content: &str, base_dir: impl Into<PathBuf>) -> Result<Self, String> {
        let mut manifest: AppManifest =
            serde_yaml::from_str(content).map_err(|e| e.to_string())?;
        manifest.base_dir = base_dir.into();
        manifest.check_names()?;
        Ok(manifest)
    }

    /// Load a manifest file.
    ///
    /// Git discovery starts from the manifest's directory unless the
    /// manifest sets `working_dir`.
    pub fn from_file(path: &Path) -> PublishResult<Self> {
        let manifest_error = |message: String| PublishError::Manifest {
            path: path.to_path_buf(),
            message,
        };

        let content = fs::read_to_string(path).map_err(|e| manifest_error(e.to_string()))?;
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let base_dir = parent.canonicalize().unwrap_or(parent);

        let mut manifest = Self::from_yaml(&content, &base_dir).map_err(manifest_error)?;
        manifest.app.working_dir = Some(match manifest.app.working_dir.take() {
            Some(dir) => base_dir.join(dir),
            None => base_dir,
        });

        debug!(
            "Loaded manifest {:?} with {} resource(s)",
            path,
            manifest.resources.len()
        );
        Ok(manifest)
    }

    /// Names must be unique after sanitization, since that is the name the
    /// component gets in the spec.
    fn check_names(&self) -> Result<(), String> {
        let mut seen: HashMap<String, &str> = HashMap::new();
        for decl in &self.resources {
            if decl.name.trim().is_empty() {
                return Err("resource name must not be empty".to_string());
            }
            let component = sanitize(&decl.name);
            if let Some(previous) = seen.insert(component.clone(), &decl.name) {
                return Err(if previous == decl.name {
                    format!("duplicate resource name '{}'", decl.name)
                } else {
                    format!(
                        "duplicate resource name: '{}' and '{}' both become '{}'",
                        previous, decl.name, component
                    )
                });
            }
        }
        Ok(())
    }

    /// Build the hosting model in declaration order.
    pub fn to_model(&self) -> AppModel {
        self.resources
            .iter()
            .fold(AppModel::new(), |model, decl| {
                model.with_resource(decl.to_resource(&self.base_dir))
            })
    }
}
