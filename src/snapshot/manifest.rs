//! Snapshot manifest
//!
//! Written once, after every collection has been exported; its presence marks
//! a complete backup.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// Tool identifier recorded in every manifest
pub const TOOL_NAME: &str = "mongo-save";

/// Snapshot format version understood by this build
pub const FORMAT_VERSION: u32 = 1;

/// Top-level description of a snapshot (`manifest.json`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Source database name
    pub db: String,

    /// When the backup finished
    pub created_at: DateTime<Utc>,

    /// Collections included, in export order
    pub collections: Vec<String>,

    /// Tool that wrote the snapshot
    pub tool: String,

    /// Snapshot format version
    pub version: u32,
}

impl Manifest {
    /// Manifest for a backup of `db` completed now
    pub fn new(db: impl Into<String>, collections: Vec<String>) -> Self {
        Self {
            db: db.into(),
            created_at: Utc::now().trunc_subsecs(3),
            collections,
            tool: TOOL_NAME.to_string(),
            version: FORMAT_VERSION,
        }
    }

    /// Whether this build knows how to read the snapshot format
    pub fn is_supported_version(&self) -> bool {
        self.version <= FORMAT_VERSION
    }
}
