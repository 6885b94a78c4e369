//! # dospec_core
//!
//! App Spec generation engine for dospec.
//!
//! This crate turns a hosting model of resources into an App Platform
//! App Spec document. It performs no I/O: git discovery, file writes and
//! the deploy script live in `dospec_publish`.
//!
//! ## Pipeline
//!
//! - **Classification**: each resource becomes a service, worker, database,
//!   static site, function, or is left out
//! - **Endpoint inference**: HTTP port, internal ports and health check path
//! - **Source resolution**: image, GitHub repository, or nothing
//! - **Configure-last callbacks**: user overrides applied after all defaults
//! - **Rendering**: minimal YAML with absent fields omitted
//!
//! ## Example
//!
//! ```rust
//! use dospec_core::{AppSpecBuilder, AppSpecWriter, Resource};
//!
//! let resources = vec![
//!     Resource::container("web", "nginx:1.25")
//!         .with_http_endpoint(80)
//!         .with_health_check("/health"),
//! ];
//!
//! let spec = AppSpecBuilder::new("My Shop", "nyc3").build(&resources);
//! let yaml = AppSpecWriter::to_yaml(&spec).unwrap();
//! assert!(yaml.starts_with("name: myshop\nregion: nyc\n"));
//! ```

pub mod builder;
pub mod endpoint;
pub mod error;
pub mod image;
pub mod models;
pub mod naming;
pub mod region;
pub mod resource;
pub mod source;
pub mod writer;

pub use builder::{build, AppSpecBuilder, Classification};
pub use endpoint::EndpointInference;
pub use error::{CoreError, CoreResult};
pub use image::ImageReference;
pub use models::*;
pub use naming::{is_valid_name, sanitize};
pub use region::{is_known_datacenter, Region, KNOWN_DATACENTERS};
pub use resource::{
    engine_from_type_name, Annotation, DeploymentTarget, EndpointAnnotation,
    GithubSourceAnnotation, HealthCheckAnnotation, ImagePublishAnnotation, ProjectRuntime,
    Resource, ResourceKind, SizingAnnotation, StaticSiteSettings,
};
pub use source::{GitRepoInfo, ResolvedSource, SourceResolver};
pub use writer::{to_external_format, AppSpecWriter};
