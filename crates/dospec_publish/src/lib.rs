//! # dospec_publish
//!
//! Publishing for dospec: everything around spec generation that touches
//! the outside world.
//!
//! ## Features
//!
//! - **Configuration**: publish settings loaded from YAML
//! - **Manifests**: declarative resource models in YAML
//! - **Git discovery**: branch and GitHub remote of the working tree
//! - **Deploy script**: a `doctl` script that creates or updates the app
//! - **Publisher**: renders in memory, honors cancellation, then writes
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use dospec_core::Resource;
//! use dospec_publish::{AppModel, AppPlatformPublisher, CommandGitProvider, PublishConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> dospec_publish::PublishResult<()> {
//! let model = AppModel::new().with_resource(Resource::container("web", "nginx").with_http_endpoint(80));
//! let publisher = AppPlatformPublisher::new(
//!     PublishConfig::new("shop").with_region("ams3"),
//!     Arc::new(CommandGitProvider::new()),
//! );
//! let outcome = publisher.publish(&model, &CancellationToken::new()).await?;
//! println!("wrote {:?}", outcome.spec_path);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod git;
pub mod manifest;
pub mod model;
pub mod publisher;
pub mod script;

pub use config::{is_recognized_region, PublishConfig};
pub use error::{PublishError, PublishResult};
pub use git::{
    parse_repository, CommandGitProvider, GitProvider, StaticGitProvider, DEFAULT_BRANCH,
    DEFAULT_GIT_TIMEOUT,
};
pub use manifest::{AppManifest, KindDecl, ResourceDecl, TargetDecl};
pub use model::AppModel;
pub use publisher::{AppPlatformPublisher, PublishOutcome};
pub use script::{render_deploy_script, write_script};
