//! Error types for backup and restore runs.
//!
//! - `kinds`: the crate-wide [`MongoSaveError`] and its per-concern sub-errors
//! - `mongo`: structured rendering of MongoDB driver errors
//!
//! Drop-before-insert failures are not an error variant: restore logs them
//! and moves on to the next collection.

pub mod kinds;
pub mod mongo;

pub use kinds::{
    ConfigError, ConnectionError, DocumentError, MongoSaveError, Result, SnapshotError,
};
pub use mongo::{ErrorInfo, extract_error_info};
