//! mongo-save library
//!
//! Backs up a MongoDB database into a directory of plain files and restores
//! it again. A snapshot holds one Canonical Extended JSON file per document,
//! an inferred schema per collection and a manifest.
//!
//! # Modules
//!
//! - `cli`: Command-line interface and argument parsing
//! - `client`: Database access behind the `DocumentStore` trait
//! - `codec`: Type-preserving document encoding
//! - `config`: Configuration management
//! - `connection`: MongoDB connection management
//! - `error`: Error types and handling
//! - `pipeline`: Backup and restore
//! - `schema`: Schema inference over sampled documents
//! - `snapshot`: On-disk snapshot layout
//!
//! # Example
//!
//! ```no_run
//! use mongo_save::pipeline::{self, BackupOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let options = BackupOptions::new("mongodb://localhost:27017/shop");
//!     let manifest = pipeline::backup(&options).await?;
//!     println!("Saved {} collections", manifest.collections.len());
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod client;
pub mod codec;
pub mod config;
pub mod connection;
pub mod error;
pub mod pipeline;
pub mod schema;
pub mod snapshot;

// Re-export commonly used types
pub use config::Config;
pub use connection::ConnectionManager;
pub use error::{MongoSaveError, Result};
pub use pipeline::{BackupOptions, RestoreOptions};
pub use snapshot::{Manifest, SnapshotLayout};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library version string
pub fn version() -> &'static str {
    VERSION
}
