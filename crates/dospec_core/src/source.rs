//! Deployment-source resolution.
//!
//! Decides whether a component deploys from an image, from a GitHub
//! repository, or is left without a source. Strategies are tried in a fixed
//! order and the first match wins:
//!
//! 1. an explicit publish-as-image annotation
//! 2. an explicit GitHub source annotation
//! 3. the ambient git repository, for resources with source on disk
//! 4. the literal image reference of a container resource
//! 5. nothing

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::image::{ImageReference, DEFAULT_TAG};
use crate::models::{DeploymentSource, GithubSource, ImageSource, RegistryType};
use crate::naming::sanitize;
use crate::resource::{Resource, ResourceKind};

/// Git metadata discovered from the working tree for one publish run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitRepoInfo {
    /// Repository in `owner/repo` form, when a usable remote exists.
    pub repository: Option<String>,
    pub branch: String,
    pub repo_root: PathBuf,
}

/// Outcome of source resolution for a single resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedSource {
    pub source: Option<DeploymentSource>,
    pub environment_slug: Option<String>,
    pub source_dir: Option<String>,
}

/// Resolves deployment sources against a fallback registry and git context.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceResolver<'a> {
    registry: Option<&'a str>,
    git: Option<&'a GitRepoInfo>,
}

impl<'a> SourceResolver<'a> {
    pub fn new(registry: Option<&'a str>, git: Option<&'a GitRepoInfo>) -> Self {
        Self { registry, git }
    }

    pub fn resolve(&self, resource: &Resource) -> ResolvedSource {
        if let Some(publish) = resource.image_publish() {
            let registry = publish.registry.as_deref().or(self.registry);
            let image = publish
                .image
                .clone()
                .unwrap_or_else(|| sanitize(&resource.name));
            let repository = match registry {
                Some(registry) => format!("{}/{}", registry, image),
                None => image,
            };
            debug!("{}: deploying as published image {}", resource.name, repository);
            return ResolvedSource {
                source: Some(DeploymentSource::Image(ImageSource {
                    registry_type: RegistryType::Docr,
                    repository,
                    tag: Some(publish.tag.clone().unwrap_or_else(|| DEFAULT_TAG.to_string())),
                    digest: None,
                })),
                ..Default::default()
            };
        }

        if let Some(github) = resource.github_source() {
            debug!("{}: deploying from explicit GitHub source {}", resource.name, github.repo);
            return ResolvedSource {
                source: Some(DeploymentSource::Github(GithubSource {
                    repo: github.repo.clone(),
                    branch: github.branch.clone(),
                    deploy_on_push: github.deploy_on_push,
                })),
                environment_slug: buildpack_slug(resource),
                source_dir: github.source_dir.clone(),
            };
        }

        if let Some((git, repository, path)) = self.ambient_repository(resource) {
            debug!("{}: deploying from detected repository {}", resource.name, repository);
            return ResolvedSource {
                source: Some(DeploymentSource::Github(GithubSource {
                    repo: repository.to_string(),
                    branch: git.branch.clone(),
                    deploy_on_push: true,
                })),
                environment_slug: buildpack_slug(resource),
                source_dir: relative_source_dir(path, &git.repo_root),
            };
        }

        if let ResourceKind::Container { image, .. } = &resource.kind {
            debug!("{}: deploying container image {}", resource.name, image);
            return ResolvedSource {
                source: Some(DeploymentSource::Image(ImageReference::parse(image).into_source())),
                ..Default::default()
            };
        }

        debug!("{}: no deployment source resolved", resource.name);
        ResolvedSource::default()
    }

    fn ambient_repository<'r>(
        &self,
        resource: &'r Resource,
    ) -> Option<(&'a GitRepoInfo, &'a str, &'r Path)> {
        let git = self.git?;
        let repository = git.repository.as_deref()?;
        let path = resource.source_path()?;
        Some((git, repository, path))
    }
}

fn buildpack_slug(resource: &Resource) -> Option<String> {
    resource.runtime().map(|r| r.environment_slug().to_string())
}

/// Express `path` relative to `repo_root` with `/` separators.
///
/// Both paths are normalized lexically first, so `..` and `.` components
/// are resolved without touching the filesystem. Relative paths are taken as
/// already relative to the repository root. Paths outside the repository,
/// or the root itself, yield `None`.
pub fn relative_source_dir(path: &Path, repo_root: &Path) -> Option<String> {
    let Some(normalized) = normalize_lexically(path) else {
        debug!("{} climbs above its root", path.display());
        return None;
    };

    let relative = if normalized.is_absolute() {
        let root = normalize_lexically(repo_root)?;
        match normalized.strip_prefix(&root) {
            Ok(rel) => rel.to_path_buf(),
            Err(_) => {
                debug!("{} is outside repository root {}", path.display(), repo_root.display());
                return None;
            }
        }
    } else {
        normalized
    };

    let parts: Vec<String> = relative
        .iter()
        .map(|part| part.to_string_lossy().into_owned())
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

/// Resolve `.` and `..` components. Backslashes count as separators.
///
/// Returns `None` when a `..` would step above the start of the path.
fn normalize_lexically(path: &Path) -> Option<PathBuf> {
    let mut normalized = PathBuf::new();
    let mut depth = 0usize;

    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => normalized.push(component),
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return None;
                }
                normalized.pop();
                depth -= 1;
            }
            Component::Normal(part) => {
                for piece in part.to_string_lossy().split('\\') {
                    match piece {
                        "" | "." => {}
                        ".." => {
                            if depth == 0 {
                                return None;
                            }
                            normalized.pop();
                            depth -= 1;
                        }
                        piece => {
                            normalized.push(piece);
                            depth += 1;
                        }
                    }
                }
            }
        }
    }

    Some(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{GithubSourceAnnotation, ImagePublishAnnotation, ProjectRuntime};

    fn git_info() -> GitRepoInfo {
        GitRepoInfo {
            repository: Some("acme/shop".to_string()),
            branch: "develop".to_string(),
            repo_root: PathBuf::from("/work/shop"),
        }
    }

    #[test]
    fn test_image_annotation_beats_github_annotation() {
        let r = Resource::container("A", "ignored")
            .publish_as_image(ImagePublishAnnotation {
                registry: Some("r".to_string()),
                image: Some("i".to_string()),
                tag: Some("v1".to_string()),
            })
            .with_github_source(GithubSourceAnnotation {
                repo: "o/r".to_string(),
                branch: "main".to_string(),
                deploy_on_push: true,
                source_dir: None,
            });

        let resolved = SourceResolver::default().resolve(&r);
        let image = resolved.source.as_ref().and_then(DeploymentSource::as_image).unwrap();
        assert_eq!(image.repository, "r/i");
        assert_eq!(image.tag.as_deref(), Some("v1"));
        assert_eq!(image.registry_type, RegistryType::Docr);
    }

    #[test]
    fn test_image_annotation_defaults() {
        let r = Resource::project("My_Api", "/work/shop/api", ProjectRuntime::Dotnet)
            .publish_as_image(ImagePublishAnnotation::default());

        let resolved = SourceResolver::new(Some("fallback"), None).resolve(&r);
        let image = resolved.source.as_ref().and_then(DeploymentSource::as_image).unwrap();
        assert_eq!(image.repository, "fallback/my-api");
        assert_eq!(image.tag.as_deref(), Some("latest"));
        assert!(resolved.environment_slug.is_none());

        let resolved = SourceResolver::default().resolve(&r);
        let image = resolved.source.as_ref().and_then(DeploymentSource::as_image).unwrap();
        assert_eq!(image.repository, "my-api");
    }

    #[test]
    fn test_explicit_github_beats_ambient_git() {
        let git = git_info();
        let r = Resource::project("api", "/work/shop/api", ProjectRuntime::Node)
            .with_github_source(GithubSourceAnnotation {
                repo: "other/repo".to_string(),
                branch: "main".to_string(),
                deploy_on_push: false,
                source_dir: Some("services/api".to_string()),
            });

        let resolved = SourceResolver::new(None, Some(&git)).resolve(&r);
        let github = resolved.source.as_ref().and_then(DeploymentSource::as_github).unwrap();
        assert_eq!(github.repo, "other/repo");
        assert!(!github.deploy_on_push);
        assert_eq!(resolved.source_dir.as_deref(), Some("services/api"));
        assert_eq!(resolved.environment_slug.as_deref(), Some("node-js"));
    }

    #[test]
    fn test_ambient_git_for_project() {
        let git = git_info();
        let r = Resource::project("api", "/work/shop/src/Api", ProjectRuntime::Dotnet);

        let resolved = SourceResolver::new(None, Some(&git)).resolve(&r);
        let github = resolved.source.as_ref().and_then(DeploymentSource::as_github).unwrap();
        assert_eq!(github.repo, "acme/shop");
        assert_eq!(github.branch, "develop");
        assert!(github.deploy_on_push);
        assert_eq!(resolved.source_dir.as_deref(), Some("src/Api"));
        assert_eq!(resolved.environment_slug.as_deref(), Some("dotnet"));
    }

    #[test]
    fn test_ambient_git_without_repository_falls_through() {
        let git = GitRepoInfo {
            repository: None,
            ..git_info()
        };
        let r = Resource::project("api", "/work/shop/api", ProjectRuntime::Dotnet);
        assert_eq!(SourceResolver::new(None, Some(&git)).resolve(&r), ResolvedSource::default());
    }

    #[test]
    fn test_prebuilt_container_ignores_ambient_git() {
        let git = git_info();
        let r = Resource::container("cache", "redis:7");
        let resolved = SourceResolver::new(None, Some(&git)).resolve(&r);
        let image = resolved.source.as_ref().and_then(DeploymentSource::as_image).unwrap();
        assert_eq!(image.repository, "redis");
        assert_eq!(image.tag.as_deref(), Some("7"));
        assert_eq!(image.registry_type, RegistryType::DockerHub);
    }

    #[test]
    fn test_built_container_uses_ambient_git_without_buildpack() {
        let git = git_info();
        let r = Resource::container("web", "web").with_build_context("/work/shop/web");
        let resolved = SourceResolver::new(None, Some(&git)).resolve(&r);
        assert!(resolved.source.as_ref().and_then(DeploymentSource::as_github).is_some());
        assert_eq!(resolved.source_dir.as_deref(), Some("web"));
        assert!(resolved.environment_slug.is_none());
    }

    #[test]
    fn test_resolved_sources_have_total_equality() {
        fn assert_eq_impl<T: Eq>() {}
        assert_eq_impl::<DeploymentSource>();
        assert_eq_impl::<ResolvedSource>();

        let git = git_info();
        let r = Resource::project("api", "/work/shop/api", ProjectRuntime::Go);
        let resolver = SourceResolver::new(None, Some(&git));
        assert_eq!(resolver.resolve(&r), resolver.resolve(&r));
    }

    #[test]
    fn test_generic_resource_has_no_source() {
        let r = Resource::generic("thing").as_worker();
        assert_eq!(SourceResolver::default().resolve(&r), ResolvedSource::default());
    }

    #[test]
    fn test_relative_source_dir() {
        let root = Path::new("/repo");
        assert_eq!(relative_source_dir(Path::new("/repo/a/b"), root).as_deref(), Some("a/b"));
        assert_eq!(relative_source_dir(Path::new("/repo"), root), None);
        assert_eq!(relative_source_dir(Path::new("/elsewhere/a"), root), None);
        assert_eq!(relative_source_dir(Path::new("./svc/api"), root).as_deref(), Some("svc/api"));
        assert_eq!(relative_source_dir(Path::new("svc\\api"), root).as_deref(), Some("svc/api"));
    }

    #[test]
    fn test_relative_source_dir_resolves_parent_components() {
        let root = Path::new("/repo");
        assert_eq!(
            relative_source_dir(Path::new("/repo/apphost/../src/Api"), root).as_deref(),
            Some("src/Api")
        );
        assert_eq!(
            relative_source_dir(Path::new("/repo/apphost/./../src/./Api/"), root).as_deref(),
            Some("src/Api")
        );
        assert_eq!(
            relative_source_dir(Path::new("/repo/../elsewhere/Api"), root),
            None
        );
        assert_eq!(relative_source_dir(Path::new("/repo/src/.."), root), None);
        assert_eq!(relative_source_dir(Path::new("../outside"), root), None);
        assert_eq!(
            relative_source_dir(Path::new("apphost\\..\\src\\Api"), root).as_deref(),
            Some("src/Api")
        );
        assert_eq!(
            relative_source_dir(Path::new("/repo/src/Api"), Path::new("/work/../repo")).as_deref(),
            Some("src/Api")
        );
    }

    #[test]
    fn test_ambient_git_with_parent_relative_project_path() {
        let git = git_info();
        let r = Resource::project("api", "/work/shop/apphost/../src/Api", ProjectRuntime::Dotnet);
        let resolved = SourceResolver::new(None, Some(&git)).resolve(&r);
        assert_eq!(resolved.source_dir.as_deref(), Some("src/Api"));
    }
}
