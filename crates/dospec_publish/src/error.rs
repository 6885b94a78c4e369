//! Error types for publishing.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for publish operations.
pub type PublishResult<T> = Result<T, PublishError>;

/// Errors that can abort a publish step.
///
/// Git discovery problems never surface here; they degrade to "no git info".
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Publish canceled before writing output")]
    Canceled,

    #[error("Invalid publish configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid manifest {path}: {message}")]
    Manifest { path: PathBuf, message: String },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Spec rendering error: {0}")]
    Core(#[from] dospec_core::CoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
