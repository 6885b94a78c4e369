//! Container image reference parsing.
//!
//! This is a best-effort heuristic, not a full reference grammar: it only
//! needs to tell the App Platform which registry type to pull from.

use crate::models::{ImageSource, RegistryType};

/// Hostname of the provider's own container registry.
pub const DOCR_HOST: &str = "registry.digitalocean.com";

/// Hostname of the GitHub container registry.
pub const GHCR_HOST: &str = "ghcr.io";

/// Tag used when a reference carries none.
pub const DEFAULT_TAG: &str = "latest";

/// A container image reference split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    pub repository: String,
    pub tag: Option<String>,
    pub digest: Option<String>,
    pub registry_type: RegistryType,
}

impl ImageReference {
    /// Parse an image reference such as `nginx`, `ghcr.io/org/app:1.2` or
    /// `registry.digitalocean.com/team/api@sha256:...`.
    ///
    /// Digest-pinned references keep the digest and carry no tag. Otherwise
    /// the text after the last `:` is the tag, unless it contains a `/`
    /// (then the colon belonged to a registry port). A missing tag becomes
    /// `latest`. Parsing never fails.
    pub fn parse(image: &str) -> Self {
        let image = image.trim();

        let (name, tag, digest) = match image.split_once('@') {
            Some((name, digest)) => {
                // A tag before the digest is redundant; the digest wins.
                let name = match name.rsplit_once(':') {
                    Some((repo, tag)) if !tag.contains('/') => repo,
                    _ => name,
                };
                (name, None, Some(digest.to_string()))
            }
            None => match image.rsplit_once(':') {
                Some((repo, tag)) if !tag.contains('/') => {
                    let tag = if tag.is_empty() { DEFAULT_TAG } else { tag };
                    (repo, Some(tag.to_string()), None)
                }
                _ => (image, Some(DEFAULT_TAG.to_string()), None),
            },
        };

        let (repository, registry_type) = classify_registry(name);

        Self {
            repository,
            tag,
            digest,
            registry_type,
        }
    }

    pub fn into_source(self) -> ImageSource {
        ImageSource {
            registry_type: self.registry_type,
            repository: self.repository,
            tag: self.tag,
            digest: self.digest,
        }
    }
}

/// Classify the registry from the repository prefix.
///
/// The provider's own hostname is stripped; the GHCR hostname is kept
/// because App Platform expects it in the repository.
fn classify_registry(name: &str) -> (String, RegistryType) {
    if let Some(rest) = name.strip_prefix(DOCR_HOST).and_then(|r| r.strip_prefix('/')) {
        return (rest.to_string(), RegistryType::Docr);
    }
    if name.strip_prefix(GHCR_HOST).is_some_and(|r| r.starts_with('/')) {
        return (name.to_string(), RegistryType::Ghcr);
    }
    (name.to_string(), RegistryType::DockerHub)
}
