//! Configuration loading
//!
//! Every setting is resolved with the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";
pub const DEFAULT_CAMARA_API_BASE_URL: &str = "https://dadosabertos.camara.leg.br/api/v2";
pub const DEFAULT_IBGE_API_BASE_URL: &str = "https://servicodados.ibge.gov.br/api/v1/localidades";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_AI_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Raw contents of `config.toml`; every key is optional
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub database_path: Option<PathBuf>,
    pub bind_addr: Option<String>,
    pub camara_api_base_url: Option<String>,
    pub ibge_api_base_url: Option<String>,
    pub http_timeout_secs: Option<u64>,
    pub openai_api_key: Option<String>,
    pub openai_base_url: Option<String>,
    pub ai_model: Option<String>,
    pub embedding_model: Option<String>,
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub database_path: Option<PathBuf>,
    pub bind_addr: Option<String>,
}

/// Fully resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: PathBuf,
    pub bind_addr: String,
    pub camara_api_base_url: String,
    pub ibge_api_base_url: String,
    pub http_timeout_secs: u64,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub ai_model: String,
    pub embedding_model: String,
}

impl Config {
    /// Load configuration from the process environment and the TOML file
    ///
    /// `config_file` is the explicit `--config` path; when absent, `LEGIS_CONFIG`
    /// and then the platform config directory are tried.
    pub fn load(config_file: Option<&Path>, cli: &CliOverrides) -> Result<Self> {
        let toml_config = match locate_config_file(config_file) {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                load_toml_config(&path)?
            }
            None => {
                debug!("No config file found, using environment and defaults");
                TomlConfig::default()
            }
        };

        Self::from_sources(toml_config, |key| std::env::var(key).ok(), cli)
    }

    /// Resolve configuration from explicit sources
    ///
    /// `env` looks up an environment variable by name.
    pub fn from_sources<F>(toml_config: TomlConfig, env: F, cli: &CliOverrides) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let database_path = cli
            .database_path
            .clone()
            .or_else(|| env("LEGIS_DATABASE_PATH").map(PathBuf::from))
            .or(toml_config.database_path)
            .unwrap_or_else(default_database_path);

        let bind_addr = cli
            .bind_addr
            .clone()
            .or_else(|| env("LEGIS_BIND_ADDR"))
            .or(toml_config.bind_addr)
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        let http_timeout_secs = match env("LEGIS_HTTP_TIMEOUT") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                Error::Config(format!("LEGIS_HTTP_TIMEOUT must be a number of seconds, got '{}'", raw))
            })?,
            None => toml_config
                .http_timeout_secs
                .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
        };
        if http_timeout_secs == 0 {
            return Err(Error::Config("HTTP timeout must be greater than zero".to_string()));
        }

        let openai_api_key = env("OPENAI_API_KEY")
            .or(toml_config.openai_api_key)
            .filter(|k| !k.trim().is_empty());

        Ok(Self {
            database_path,
            bind_addr,
            camara_api_base_url: trim_base_url(
                env("CAMARA_API_BASE_URL")
                    .or(toml_config.camara_api_base_url)
                    .unwrap_or_else(|| DEFAULT_CAMARA_API_BASE_URL.to_string()),
            ),
            ibge_api_base_url: trim_base_url(
                env("IBGE_API_BASE_URL")
                    .or(toml_config.ibge_api_base_url)
                    .unwrap_or_else(|| DEFAULT_IBGE_API_BASE_URL.to_string()),
            ),
            http_timeout_secs,
            openai_api_key,
            openai_base_url: trim_base_url(
                env("OPENAI_BASE_URL")
                    .or(toml_config.openai_base_url)
                    .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            ),
            ai_model: env("LEGIS_AI_MODEL")
                .or(toml_config.ai_model)
                .unwrap_or_else(|| DEFAULT_AI_MODEL.to_string()),
            embedding_model: env("LEGIS_EMBEDDING_MODEL")
                .or(toml_config.embedding_model)
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
        })
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn ai_enabled(&self) -> bool {
        self.openai_api_key.is_some()
    }
}

/// Parse a TOML configuration file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Invalid config file {}: {}", path.display(), e)))
}

fn locate_config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var("LEGIS_CONFIG") {
        return Some(PathBuf::from(path));
    }

    dirs::config_dir()
        .map(|d| d.join("legis").join("config.toml"))
        .filter(|p| p.exists())
}

/// OS-dependent default database location
fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("legis"))
        .unwrap_or_else(|| PathBuf::from("./legis_data"))
        .join("legis.db")
}

fn trim_base_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
