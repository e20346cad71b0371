//! Backup and restore pipelines
//!
//! Both entry points take a fully resolved options record, connect once,
//! process collections one after another and always close the connection
//! before returning.

mod backup;
mod progress;
mod restore;

use std::path::PathBuf;

use tracing::warn;

use crate::client::DocumentStore;
use crate::config::ConnectionConfig;
use crate::error::Result;

pub use backup::{backup, run_backup};
pub use progress::ProgressTracker;
pub use restore::{RestoreReport, restore, run_restore};

/// Documents per `insert_many` call on restore
pub const INSERT_BATCH_SIZE: usize = 1000;

/// Resolved settings for one backup run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupOptions {
    /// Source connection URI
    pub uri: String,

    /// Source database (falls back to the URI path, then `test`)
    pub database: Option<String>,

    /// Snapshot root (falls back to `./<database>`)
    pub output: Option<PathBuf>,

    /// Collections to export; empty means all
    pub collections: Vec<String>,

    /// Pretty-print schema, manifest and data files
    pub pretty: bool,

    /// Suppress progress spinners and completion messages
    pub quiet: bool,

    /// Connection settings
    pub connection: ConnectionConfig,
}

/// Resolved settings for one restore run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreOptions {
    /// Destination connection URI
    pub uri: String,

    /// Destination database (falls back to the manifest, the URI path, then `test`)
    pub database: Option<String>,

    /// Snapshot root to read
    pub input: PathBuf,

    /// Collections to restore; empty means every directory under `data`
    pub collections: Vec<String>,

    /// Clear each destination collection before inserting
    pub drop: bool,

    /// Suppress progress spinners and completion messages
    pub quiet: bool,

    /// Connection settings
    pub connection: ConnectionConfig,
}

impl BackupOptions {
    /// Options with the defaults for everything but the URI
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            database: None,
            output: None,
            collections: Vec::new(),
            pretty: true,
            quiet: false,
            connection: ConnectionConfig::default(),
        }
    }

    /// Snapshot root for a backup of `database`
    pub fn output_root(&self, database: &str) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| PathBuf::from(".").join(database))
    }
}

impl RestoreOptions {
    /// Options with the defaults for everything but the URI and input root
    pub fn new(uri: impl Into<String>, input: impl Into<PathBuf>) -> Self {
        Self {
            uri: uri.into(),
            database: None,
            input: input.into(),
            collections: Vec::new(),
            drop: false,
            quiet: false,
            connection: ConnectionConfig::default(),
        }
    }
}

/// Close `store` once a run is over
///
/// A failed close is only logged; the run's own result is returned as is.
async fn close_after<T>(store: &dyn DocumentStore, result: Result<T>) -> Result<T> {
    if let Err(e) = store.close().await {
        warn!("Failed to close connection: {}", e);
    }
    result
}
