/// Service configuration loader - parses climate.toml
///
/// Every key is optional. Precedence, lowest first: built-in defaults,
/// `climate.toml`, the `DATABASE_URL` environment variable (a `.env` file
/// is loaded if present), then command-line `Overrides`.

use log::info;
use serde::Deserialize;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::db::{self, DbConfigError};

pub const DEFAULT_CONFIG_PATH: &str = "climate.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Worker threads answering requests.
    pub workers: usize,
    /// Reject start/end dates that are not `yyyy-mm-dd` with 400 instead of
    /// returning an empty result.
    pub strict_dates: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            workers: 4,
            strict_dates: false,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// PostgreSQL connection string.
    pub url: Option<String>,
}

/// Values given on the command line; `None` / `false` leave the setting alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database_url: Option<String>,
    pub strict_dates: bool,
}

/// Root configuration structure for TOML parsing
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
}

impl ServiceConfig {
    pub fn from_toml(contents: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Overrides `database.url` with `DATABASE_URL` when set.
    pub fn apply_env(&mut self) {
        dotenv::dotenv().ok();
        self.apply_database_url_env(env::var("DATABASE_URL").ok());
    }

    /// The `DATABASE_URL` step of `apply_env`, given the variable's value.
    pub fn apply_database_url_env(&mut self, database_url: Option<String>) {
        if let Some(url) = database_url {
            self.database.url = Some(url);
        }
    }

    /// Applies command-line values on top of file and environment settings.
    pub fn apply_overrides(&mut self, overrides: Overrides) {
        if let Some(host) = overrides.host {
            self.server.host = host;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(url) = overrides.database_url {
            self.database.url = Some(url);
        }
        if overrides.strict_dates {
            self.server.strict_dates = true;
        }
    }

    /// The configured connection string, validated.
    pub fn database_url(&self) -> Result<&str, DbConfigError> {
        let url = self
            .database
            .url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or(DbConfigError::MissingDatabaseUrl)?;
        db::validate_url(url)?;
        Ok(url)
    }
}

/// Loads configuration from `path`.
pub fn load_config(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    ServiceConfig::from_toml(&contents, path)
}

/// Like `load_config`, but a missing file yields the defaults.
pub fn load_config_or_default(path: &Path) -> Result<ServiceConfig, ConfigError> {
    match load_config(path) {
        Err(ConfigError::Read { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
            info!("{} not found, using default configuration", path.display());
            Ok(ServiceConfig::default())
        }
        other => other,
    }
}
