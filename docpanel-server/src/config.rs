//! Server configuration
//!
//! Read from a TOML file (`DOCPANEL_CONFIG`, default `docpanel.toml`), falling
//! back to defaults when the file is absent. `STORE_URI`, `PORT` and `HOST`
//! override the file.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

pub const CONFIG_ENV: &str = "DOCPANEL_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "docpanel.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid {name}: {message}")]
    Env { name: &'static str, message: String },
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// `memory://`, `file://<dir>` or a bare directory path
    pub store_uri: String,
    /// Database used when a request names none
    pub default_database: String,
    /// Allowed browser origins; empty allows any origin
    pub cors_origins: Vec<String>,
    /// Default tracing filter when `RUST_LOG` is unset
    pub log_level: String,
    /// File the configuration was read from, if any
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: "0.0.0.0".to_string(),
            port: 5000,
            store_uri: "memory://".to_string(),
            default_database: "test".to_string(),
            cors_origins: Vec::new(),
            log_level: "info".to_string(),
            source: None,
        }
    }
}

impl Config {
    /// Load from `DOCPANEL_CONFIG` (or `docpanel.toml`) and the process environment
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = Self::from_file(Path::new(&path))?;
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Parse `path`, or return defaults if it does not exist
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    /// Apply `STORE_URI`, `PORT` and `HOST` from `lookup`
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(uri) = lookup("STORE_URI") {
            self.store_uri = uri;
        }
        if let Some(port) = lookup("PORT") {
            self.port = port.trim().parse().map_err(|_| ConfigError::Env {
                name: "PORT",
                message: format!("'{}' is not a port number", port),
            })?;
        }
        if let Some(host) = lookup("HOST") {
            self.host = host;
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
