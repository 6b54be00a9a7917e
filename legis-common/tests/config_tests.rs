//! Configuration loading from TOML files and the process environment
//!
//! Tests that touch process environment variables are marked #[serial].

use legis_common::config::{load_toml_config, CliOverrides, Config};
use legis_common::Error;
use serial_test::serial;
use std::env;
use std::path::PathBuf;

const ENV_KEYS: &[&str] = &[
    "LEGIS_CONFIG",
    "LEGIS_DATABASE_PATH",
    "LEGIS_BIND_ADDR",
    "LEGIS_HTTP_TIMEOUT",
    "OPENAI_API_KEY",
    "CAMARA_API_BASE_URL",
    "IBGE_API_BASE_URL",
    "OPENAI_BASE_URL",
    "LEGIS_AI_MODEL",
    "LEGIS_EMBEDDING_MODEL",
];

fn clear_env() {
    for key in ENV_KEYS {
        env::remove_var(key);
    }
}

fn write_config(contents: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, contents).unwrap();
    (dir, path)
}

#[test]
fn test_toml_file_parsed() {
    let (_dir, path) = write_config(
        r#"
        database_path = "/srv/legis/legis.db"
        http_timeout_secs = 10
        ai_model = "gpt-4o-mini"
        "#,
    );

    let toml_config = load_toml_config(&path).unwrap();
    assert_eq!(toml_config.database_path, Some(PathBuf::from("/srv/legis/legis.db")));
    assert_eq!(toml_config.http_timeout_secs, Some(10));
    assert_eq!(toml_config.ai_model.as_deref(), Some("gpt-4o-mini"));
    assert!(toml_config.bind_addr.is_none());
}

#[test]
fn test_invalid_toml_is_config_error() {
    let (_dir, path) = write_config("http_timeout_secs = \"ten\"");
    assert!(matches!(load_toml_config(&path), Err(Error::Config(_))));
}

#[test]
#[serial]
fn test_explicit_file_values_used() {
    clear_env();
    let (_dir, path) = write_config("bind_addr = \"0.0.0.0:9000\"\nopenai_api_key = \"sk-file\"\n");

    let config = Config::load(Some(&path), &CliOverrides::default()).unwrap();
    assert_eq!(config.bind_addr, "0.0.0.0:9000");
    assert!(config.ai_enabled());
}

#[test]
#[serial]
fn test_environment_overrides_file() {
    clear_env();
    let (_dir, path) = write_config("bind_addr = \"0.0.0.0:9000\"\n");
    env::set_var("LEGIS_CONFIG", &path);
    env::set_var("LEGIS_BIND_ADDR", "127.0.0.1:7000");

    let config = Config::load(None, &CliOverrides::default()).unwrap();
    assert_eq!(config.bind_addr, "127.0.0.1:7000");

    clear_env();
}

#[test]
#[serial]
fn test_cli_overrides_environment() {
    clear_env();
    env::set_var("LEGIS_DATABASE_PATH", "/env/legis.db");
    let (_dir, path) = write_config("");

    let cli = CliOverrides {
        database_path: Some(PathBuf::from("/cli/legis.db")),
        bind_addr: None,
    };
    let config = Config::load(Some(&path), &cli).unwrap();
    assert_eq!(config.database_path, PathBuf::from("/cli/legis.db"));

    clear_env();
}
