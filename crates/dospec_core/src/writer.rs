//! App Spec rendering.

use tracing::debug;

use crate::error::CoreResult;
use crate::models::AppSpec;

/// Renders an [`AppSpec`] into its external formats.
pub struct AppSpecWriter;

impl AppSpecWriter {
    /// Render the spec as YAML, the format consumed by `doctl`.
    ///
    /// Keys are snake_case, absent values and empty lists are omitted at
    /// every level, and components keep their build order.
    pub fn to_yaml(spec: &AppSpec) -> CoreResult<String> {
        let content = serde_yaml::to_string(spec)?;
        debug!("Rendered app spec '{}' ({} bytes)", spec.name, content.len());
        Ok(content)
    }

    /// Render the spec as pretty-printed JSON, the form accepted by the API.
    pub fn to_json(spec: &AppSpec) -> CoreResult<String> {
        Ok(serde_json::to_string_pretty(spec)?)
    }
}

/// Render the spec in the wire format App Platform tooling expects.
pub fn to_external_format(spec: &AppSpec) -> CoreResult<String> {
    AppSpecWriter::to_yaml(spec)
}
