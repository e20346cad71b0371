use std::path::PathBuf;
use std::{fmt, io};

use crate::error::mongo::format_mongodb_error;

/// Crate-wide `Result` type using [`MongoSaveError`] as the error.
///
/// This alias is re-exported by the parent `error` module and is intended
/// to be used throughout the crate for fallible operations.
pub type Result<T> = std::result::Result<T, MongoSaveError>;

/// Top-level error type for backup and restore runs.
///
/// Every variant except `Io` and `MongoDb` maps to a condition the pipelines
/// raise on purpose; `Io` and `MongoDb` wrap failures surfaced by the
/// filesystem and the driver while streaming.
#[derive(Debug)]
pub enum MongoSaveError {
    /// Cannot reach or authenticate to the database.
    Connection(ConnectionError),

    /// Restore input is missing required structure.
    InvalidSnapshot(SnapshotError),

    /// A snapshot data file could not be decoded.
    MalformedDocument(DocumentError),

    /// A document holds a value the snapshot format cannot represent.
    UnsupportedValue(String),

    /// Configuration errors.
    Config(ConfigError),

    /// I/O errors.
    Io(io::Error),

    /// MongoDB driver errors.
    MongoDb(mongodb::error::Error),
}

/// Connection-specific errors.
#[derive(Debug)]
pub enum ConnectionError {
    /// Failed to establish a connection.
    ConnectionFailed(String),

    /// Server selection did not complete in time.
    Timeout,

    /// Invalid connection URI.
    InvalidUri(String),

    /// Ping command failed.
    PingFailed(String),
}

/// Snapshot structure errors raised before restore touches the target.
#[derive(Debug)]
pub enum SnapshotError {
    /// The `data` directory is absent.
    MissingDataDir(PathBuf),

    /// A requested collection has no directory under `data`.
    MissingCollection(String),

    /// `manifest.json` exists but cannot be parsed.
    InvalidManifest(String),
}

/// Decode failure for a single snapshot document.
#[derive(Debug)]
pub struct DocumentError {
    /// File the text came from, when known.
    pub source: Option<PathBuf>,

    /// What went wrong.
    pub reason: String,
}

/// Configuration-specific errors.
#[derive(Debug)]
pub enum ConfigError {
    /// Config file not found.
    FileNotFound(String),

    /// Invalid config format.
    InvalidFormat(String),

    /// Missing required field.
    MissingField(String),

    /// Invalid field value.
    InvalidValue { field: String, value: String },
}

impl DocumentError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            source: None,
            reason: reason.into(),
        }
    }

    /// Attach the file the document was read from.
    pub fn in_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.source = Some(path.into());
        self
    }
}

impl MongoSaveError {
    /// Attach a file path to a `MalformedDocument` error; other variants pass through.
    pub fn in_file(self, path: impl Into<PathBuf>) -> Self {
        match self {
            MongoSaveError::MalformedDocument(e) => {
                MongoSaveError::MalformedDocument(e.in_file(path))
            }
            other => other,
        }
    }
}

/* ========================= Display & Error impls ========================= */

impl fmt::Display for MongoSaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MongoSaveError::Connection(e) => write!(f, "Connection error: {e}"),
            MongoSaveError::InvalidSnapshot(e) => write!(f, "Invalid snapshot: {e}"),
            MongoSaveError::MalformedDocument(e) => write!(f, "Malformed document: {e}"),
            MongoSaveError::UnsupportedValue(msg) => write!(f, "Unsupported value: {msg}"),
            MongoSaveError::Config(e) => write!(f, "Configuration error: {e}"),
            MongoSaveError::Io(e) => write!(f, "I/O error: {e}"),
            MongoSaveError::MongoDb(e) => format_mongodb_error(f, e),
        }
    }
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionError::ConnectionFailed(msg) => write!(f, "Failed to connect: {msg}"),
            ConnectionError::Timeout => write!(f, "Connection timeout"),
            ConnectionError::InvalidUri(uri) => write!(f, "Invalid connection URI: {uri}"),
            ConnectionError::PingFailed(msg) => write!(f, "Ping failed: {msg}"),
        }
    }
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotError::MissingDataDir(path) => {
                write!(f, "no data directory in {}", path.display())
            }
            SnapshotError::MissingCollection(name) => {
                write!(f, "collection '{name}' not found in snapshot")
            }
            SnapshotError::InvalidManifest(msg) => write!(f, "unreadable manifest: {msg}"),
        }
    }
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(path) => write!(f, "{} ({})", self.reason, path.display()),
            None => write!(f, "{}", self.reason),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {path}"),
            ConfigError::InvalidFormat(msg) => write!(f, "Invalid config format: {msg}"),
            ConfigError::MissingField(field) => write!(f, "Missing required field: {field}"),
            ConfigError::InvalidValue { field, value } => {
                write!(f, "Invalid value '{value}' for field '{field}'")
            }
        }
    }
}

impl std::error::Error for MongoSaveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MongoSaveError::Io(e) => Some(e),
            MongoSaveError::MongoDb(e) => Some(e),
            _ => None,
        }
    }
}
impl std::error::Error for ConnectionError {}
impl std::error::Error for SnapshotError {}
impl std::error::Error for DocumentError {}
impl std::error::Error for ConfigError {}

/* ========================= Conversions to MongoSaveError ========================= */

impl From<io::Error> for MongoSaveError {
    fn from(err: io::Error) -> Self {
        MongoSaveError::Io(err)
    }
}

impl From<mongodb::error::Error> for MongoSaveError {
    fn from(err: mongodb::error::Error) -> Self {
        MongoSaveError::MongoDb(err)
    }
}

impl From<ConnectionError> for MongoSaveError {
    fn from(err: ConnectionError) -> Self {
        MongoSaveError::Connection(err)
    }
}

impl From<SnapshotError> for MongoSaveError {
    fn from(err: SnapshotError) -> Self {
        MongoSaveError::InvalidSnapshot(err)
    }
}

impl From<DocumentError> for MongoSaveError {
    fn from(err: DocumentError) -> Self {
        MongoSaveError::MalformedDocument(err)
    }
}

impl From<ConfigError> for MongoSaveError {
    fn from(err: ConfigError) -> Self {
        MongoSaveError::Config(err)
    }
}

impl From<toml::de::Error> for MongoSaveError {
    fn from(err: toml::de::Error) -> Self {
        MongoSaveError::Config(ConfigError::InvalidFormat(err.to_string()))
    }
}
