//! Endpoint inference.

use crate::resource::Resource;

/// Ports and health check derived from a resource's endpoint declarations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointInference {
    pub is_http_service: bool,
    pub http_port: Option<u16>,
    pub internal_ports: Vec<u16>,
    pub health_check_path: Option<String>,
}

impl EndpointInference {
    /// Infer HTTP classification, ports and health check path.
    ///
    /// The primary port is the target port of the first `http`/`https`
    /// endpoint in declaration order; external exposure does not reorder
    /// endpoints. Every non-HTTP endpoint contributes its target port to
    /// `internal_ports`, in order and without deduplication. A project with
    /// no endpoints at all is still treated as an HTTP service.
    pub fn infer(resource: &Resource) -> Self {
        let mut inference = Self {
            health_check_path: resource.health_check().map(|h| h.path.clone()),
            ..Default::default()
        };

        let mut declared_any = false;
        let mut saw_http = false;

        for endpoint in resource.endpoints() {
            declared_any = true;
            if endpoint.is_http() {
                if !saw_http {
                    saw_http = true;
                    inference.http_port = endpoint.target_port;
                }
            } else if let Some(port) = endpoint.target_port {
                inference.internal_ports.push(port);
            }
        }

        inference.is_http_service = saw_http || (resource.is_project() && !declared_any);
        inference
    }
}
