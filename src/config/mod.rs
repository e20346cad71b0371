//! Configuration management for mongo-save
//!
//! This module handles loading configuration from:
//! - An explicit `--config` file, or the first of `mongo-save.toml` and
//!   `mongo-save.config.json` in the working directory
//! - A `.env` file and the `MONGODB_URI` environment variable
//!
//! Configuration precedence (highest to lowest):
//! 1. Command-line arguments
//! 2. Configuration file
//! 3. Environment variables
//! 4. Default values

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::connection::sanitize_uri;
use crate::error::{ConfigError, Result};

/// Files probed in the working directory when no `--config` is given
pub const CONFIG_FILE_NAMES: [&str; 2] = ["mongo-save.toml", "mongo-save.config.json"];

/// Environment variable holding the connection URI
pub const URI_ENV_VAR: &str = "MONGODB_URI";

/// Main configuration structure
///
/// Every top-level field is optional so that a partial file only overrides
/// what it names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// MongoDB connection URI
    pub uri: Option<String>,

    /// Database name
    pub db: Option<String>,

    /// Backup output root
    pub out: Option<PathBuf>,

    /// Restore input root
    #[serde(rename = "in")]
    pub input: Option<PathBuf>,

    /// Collections to include (empty or absent means all)
    pub collections: Option<Vec<String>>,

    /// Pretty-print snapshot files on backup
    pub pretty: Option<bool>,

    /// Clear destination collections before restoring
    pub drop: Option<bool>,

    /// Connection configuration
    pub connection: ConnectionConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Connection-related configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Server selection and connect timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// Enable timestamps in logs
    #[serde(default = "default_log_timestamps")]
    pub timestamps: bool,
}

/// Log level options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

// Default value functions
fn default_timeout() -> u64 {
    5
}

fn default_log_level() -> LogLevel {
    LogLevel::Warn
}

fn default_log_timestamps() -> bool {
    false
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            timestamps: default_log_timestamps(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a file
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file (`.json` is read as JSON,
    ///   anything else as TOML)
    ///
    /// # Returns
    /// * `Result<Config>` - Loaded configuration or error
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound(path.display().to_string())
            } else {
                ConfigError::InvalidFormat(format!("{}: {}", path.display(), e))
            }
        })?;

        let is_json = path.extension().is_some_and(|ext| ext == "json");
        let config: Config = if is_json {
            serde_json::from_str(&text)
                .map_err(|e| ConfigError::InvalidFormat(format!("{}: {}", path.display(), e)))?
        } else {
            toml::from_str(&text)?
        };

        config.validate()?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Validate the configuration
    ///
    /// # Returns
    /// * `Result<()>` - Ok if valid, error otherwise
    pub fn validate(&self) -> Result<()> {
        self.connection.validate()?;
        if let Some(uri) = &self.uri {
            if !uri.starts_with("mongodb://") && !uri.starts_with("mongodb+srv://") {
                return Err(ConfigError::InvalidValue {
                    field: "uri".to_string(),
                    value: sanitize_uri(uri),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Load configuration for a run
    ///
    /// An explicit path must exist. Without one, the working directory is
    /// probed for [`CONFIG_FILE_NAMES`]; finding none yields the defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let cwd = std::env::current_dir()?;
        Self::load_from(&cwd, explicit)
    }

    /// Like [`Config::load`] with `dir` standing in for the working directory
    pub fn load_from(dir: &Path, explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(dir.join(path));
        }

        match Self::discover(dir) {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// First config file present in `dir`
    pub fn discover(dir: &Path) -> Option<PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }

}

impl ConnectionConfig {
    /// A zero timeout would make server selection fail immediately
    pub fn validate(&self) -> Result<()> {
        if self.timeout == 0 {
            return Err(ConfigError::InvalidValue {
                field: "connection.timeout".to_string(),
                value: "0".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

/// Load `.env` from the working directory (or a parent) if present
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => debug!("Ignoring .env: {}", e),
    }
}

/// The URI from the environment, if set and non-empty
pub fn env_uri() -> Option<String> {
    std::env::var(URI_ENV_VAR).ok().filter(|uri| !uri.is_empty())
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}
