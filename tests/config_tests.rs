use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use crudrouter::config::{AppConfig, SessionKind, NAVIGATION_ENV};
use crudrouter::daos::MemoryDao;
use crudrouter::error::ConfigError;
use crudrouter::router::Navigation;
use crudrouter::{AppService, CrudRequest, DaoRegistry};
use serde_json::json;
use std::io::Write;

const BLOG: &str = r#"
navigation: tree
resources:
  authors:
    articles: ~
  articles:
    authors: ~
session: cookie
authentication:
  realm: blog
  users:
    ada: lovelace
caching:
  prefix: blog
serialization:
  default_charset: iso-8859-1
"#;

fn write_config(raw: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(raw.as_bytes()).unwrap();
    file
}

fn memory_daos(config: &AppConfig) -> DaoRegistry {
    DaoRegistry::from_factory(config.resources.all_names(), |name| MemoryDao::new(name))
}

#[test]
fn test_load_from_file() {
    let file = write_config(BLOG);
    let config = AppConfig::load(file.path()).unwrap();
    assert_eq!(config.resources.all_names(), vec!["articles", "authors"]);
    assert_eq!(config.session, SessionKind::Cookie);
    assert_eq!(config.authentication.as_ref().unwrap().realm, "blog");
    assert_eq!(config.caching.as_ref().unwrap().prefix, "blog");
}

#[test]
fn test_load_missing_file_reports_path() {
    let err = AppConfig::load("/definitely/not/here.yaml").unwrap_err();
    assert!(format!("{err:#}").contains("/definitely/not/here.yaml"));
}

#[test]
fn test_configured_service_end_to_end() {
    let config = AppConfig::from_yaml(BLOG).unwrap();
    let service = AppService::from_config(&config, &memory_daos(&config)).unwrap();
    assert_eq!(service.router().navigation(), Navigation::Tree);

    let auth = format!("Basic {}", STANDARD.encode("ada:lovelace"));
    let created = service.handle(
        CrudRequest::post("/authors/5/articles")
            .with_header("Authorization", auth.clone())
            .with_header("Cookie", "seen=1")
            .with_json(&json!({ "id": 9, "title": "Graphs" })),
    );
    assert_eq!(created.status, 201);
    assert_eq!(created.get_header("location"), Some("/authors/5/articles/9"));
    assert_eq!(
        created.get_header("content-type"),
        Some("application/json; charset=iso-8859-1")
    );
    assert_eq!(created.get_header("set-cookie"), Some("seen=1; Path=/"));

    let fetched = service.handle(CrudRequest::get("/authors/5/articles/9"));
    assert_eq!(fetched.status, 200);
    assert!(fetched.get_header("etag").is_some());

    let rejected = service.handle(
        CrudRequest::get("/articles").with_header("Authorization", "Basic bm9ib2R5Om5vcGU="),
    );
    assert_eq!(rejected.status, 401);
}

#[test]
fn test_invalid_navigation_is_config_error() {
    let config = AppConfig::from_yaml("navigation: spiral\nresources:\n  articles: ~").unwrap();
    let err = AppService::from_config(&config, &memory_daos(&config)).unwrap_err();
    assert_eq!(
        err,
        ConfigError::UnknownNavigation {
            name: "spiral".to_string()
        }
    );
}

#[test]
fn test_unbound_resource_is_config_error() {
    let config = AppConfig::from_yaml(BLOG).unwrap();
    let err = AppService::from_config(&config, &DaoRegistry::new()).unwrap_err();
    assert!(matches!(err, ConfigError::UnboundResource { .. }));
}

#[test]
fn test_environment_overrides_navigation() {
    let mut config = AppConfig::from_yaml("navigation: flat").unwrap();
    std::env::set_var(NAVIGATION_ENV, "tree");
    config.apply_env_overrides();
    std::env::remove_var(NAVIGATION_ENV);
    assert_eq!(config.navigation().unwrap(), Navigation::Tree);
}
