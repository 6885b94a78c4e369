//! Integration tests for App Spec generation.

use std::path::PathBuf;

use dospec_core::{
    build, sanitize, to_external_format, AppSpecBuilder, AppSpecWriter, DatabaseEngine,
    DeploymentSource, GitRepoInfo, GithubSourceAnnotation, ImagePublishAnnotation,
    ProjectRuntime, Region, RegistryType, Resource,
};
use regex::Regex;

fn name_grammar() -> Regex {
    Regex::new(r"^[a-z0-9][a-z0-9-]*[a-z0-9]$").unwrap()
}

fn shop_git() -> GitRepoInfo {
    GitRepoInfo {
        repository: Some("acme/shop".to_string()),
        branch: "main".to_string(),
        repo_root: PathBuf::from("/work/shop"),
    }
}

#[test]
fn test_sanitizer_grammar_and_idempotence() {
    let grammar = name_grammar();
    let inputs = [
        "My.App.Name",
        "a",
        "_",
        "",
        "---x---",
        "Service_With.Lots-Of_Separators.And.Mixed.CASE.Beyond.Limit",
        "emoji🚀service",
        "  spaced name  ",
        "123",
    ];

    for input in inputs {
        let once = sanitize(input);
        assert!(grammar.is_match(&once), "{:?} -> {:?}", input, once);
        assert!(once.len() <= 32);
        assert_eq!(sanitize(&once), once);
    }
}

#[test]
fn test_sanitizer_oracles() {
    assert_eq!(sanitize("My.App.Name"), "my-app-name");
    assert_eq!(sanitize("a"), "app-a");
    assert_eq!(sanitize("_"), "app");
}

#[test]
fn test_region_total_function() {
    assert_eq!(Region::normalize("NYC3"), Region::Nyc);
    assert_eq!(Region::normalize("nyc3"), Region::Nyc);
    assert_eq!(Region::normalize(""), Region::Nyc);
    assert_eq!(Region::normalize("LoN1"), Region::Lon);
    assert_eq!(Region::normalize("unknown"), Region::Nyc);
}

#[test]
fn test_image_annotation_precedence() {
    let resources = vec![Resource::container("A", "whatever")
        .with_http_endpoint(8080)
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
        })];

    let spec = build("app", "nyc", &resources, None, Some(&shop_git()));
    let service = spec.service("app-a").unwrap();
    let image = service.image().unwrap();
    assert_eq!(image.repository, "r/i");
    assert_eq!(image.tag.as_deref(), Some("v1"));
    assert!(service.github().is_none());
}

#[test]
fn test_configure_last_override() {
    let resources = vec![Resource::project("api", "/work/shop/api", ProjectRuntime::Dotnet)
        .configure_service(|service| service.instance_count = 3)];

    let spec = build("app", "nyc", &resources, None, None);
    assert_eq!(spec.service("api").unwrap().instance_count, 3);
}

#[test]
fn test_endpoint_inference_ordering() {
    let resources = vec![Resource::container("svc", "img")
        .with_endpoint("grpc", "grpc", 9090)
        .with_http_endpoint(8080)];

    let spec = build("app", "nyc", &resources, None, None);
    let service = spec.service("svc").unwrap();
    assert_eq!(service.http_port, Some(8080));
    assert_eq!(service.internal_ports, vec![9090]);
}

#[test]
fn test_round_trip_on_empty_input() {
    let spec = build("my-app", "nyc", &[], None, None);
    let yaml = to_external_format(&spec).unwrap();
    assert_eq!(yaml, "name: my-app\nregion: nyc\n");
}

#[test]
fn test_type_name_false_positive() {
    let resources = vec![
        Resource::typed("client", "MyRedisClientWrapper"),
        Resource::typed("cache", "RedisResource"),
    ];
    let spec = build("app", "nyc", &resources, None, None);

    let databases = spec.databases.unwrap();
    assert_eq!(databases.len(), 1);
    assert_eq!(databases[0].name, "cache");
    assert_eq!(databases[0].engine, DatabaseEngine::Redis);
    assert!(spec.services.is_none());
    assert!(spec.workers.is_none());
}

#[test]
fn test_full_application() {
    let resources = vec![
        Resource::container_registry("registry", "acme-registry"),
        Resource::project("Catalog.Api", "/work/shop/src/Catalog.Api", ProjectRuntime::Dotnet)
            .with_https_endpoint(8443)
            .with_http_endpoint(8080)
            .with_external_http_endpoints()
            .with_health_check("/healthz"),
        Resource::project("Order.Processor", "/work/shop/src/Order.Processor", ProjectRuntime::Dotnet)
            .with_endpoint("amqp", "tcp", 5672),
        Resource::project("frontend", "/work/shop/web", ProjectRuntime::Node)
            .publish_as_image(ImagePublishAnnotation::default())
            .with_http_endpoint(3000),
        Resource::container("proxy", "ghcr.io/acme/proxy:2.1").with_http_endpoint(80),
        Resource::typed("orders-db", "PostgresDatabaseResource"),
        Resource::typed("cache", "RedisResource"),
    ];

    let spec = AppSpecBuilder::new("Acme Shop", "fra1")
        .with_registry("acme-registry")
        .with_git_info(shop_git())
        .build(&resources);

    assert_eq!(spec.name, "acmeshop");
    assert_eq!(spec.region, Region::Fra);

    let services = spec.services.as_ref().unwrap();
    let names: Vec<_> = services.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["catalog-api", "frontend", "proxy"]);

    let catalog = &services[0];
    assert_eq!(catalog.http_port, Some(8443));
    assert_eq!(catalog.environment_slug.as_deref(), Some("dotnet"));
    assert_eq!(catalog.source_dir.as_deref(), Some("src/Catalog.Api"));
    let github = catalog.github().unwrap();
    assert_eq!(github.repo, "acme/shop");
    assert_eq!(github.branch, "main");
    assert!(github.deploy_on_push);

    let frontend = &services[1];
    let image = frontend.image().unwrap();
    assert_eq!(image.repository, "acme-registry/frontend");
    assert_eq!(image.registry_type, RegistryType::Docr);

    let proxy = &services[2];
    assert!(matches!(
        &proxy.source,
        Some(DeploymentSource::Image(image)) if image.registry_type == RegistryType::Ghcr
            && image.repository == "ghcr.io/acme/proxy"
            && image.tag.as_deref() == Some("2.1")
    ));

    let workers = spec.workers.as_ref().unwrap();
    assert_eq!(workers.len(), 1);
    assert_eq!(workers[0].name, "order-processor");
    assert_eq!(workers[0].internal_ports, vec![5672]);

    let databases = spec.databases.as_ref().unwrap();
    assert_eq!(databases.len(), 2);
    assert_eq!(databases[0].engine, DatabaseEngine::Pg);
    assert_eq!(databases[1].engine, DatabaseEngine::Redis);

    let yaml = AppSpecWriter::to_yaml(&spec).unwrap();
    assert!(yaml.starts_with("name: acmeshop\nregion: fra\nservices:\n"));
    assert!(!yaml.contains("static_sites"));
    assert!(!yaml.contains("functions"));
    assert!(!yaml.contains("registry:"));
}

#[test]
fn test_component_names_unique_across_kinds() {
    let resources = vec![
        Resource::container("My.Api", "nginx").with_http_endpoint(80),
        Resource::container("my_api", "busybox"),
        Resource::database("MY_API", DatabaseEngine::Pg),
        Resource::container("my-api", "caddy").with_http_endpoint(80),
    ];
    let spec = build("app", "nyc", &resources, None, None);
    let yaml = AppSpecWriter::to_yaml(&spec).unwrap();

    let value: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
    let mut names: Vec<&str> = ["services", "workers", "databases"]
        .iter()
        .flat_map(|list| value[*list].as_sequence().into_iter().flatten())
        .filter_map(|component| component["name"].as_str())
        .collect();
    assert_eq!(names.len(), 4);
    assert!(names.iter().all(|name| name_grammar().is_match(name)));
    names.sort_unstable();
    names.dedup();
    assert_eq!(names, vec!["my-api", "my-api-2", "my-api-3", "my-api-4"]);
}
