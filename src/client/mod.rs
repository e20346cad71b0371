//! Database access used by the pipelines
//!
//! The pipelines talk to the database only through [`DocumentStore`] and
//! [`DocumentCursor`], so they can run against MongoDB ([`MongoStore`]) or an
//! in-memory store in tests.

use async_trait::async_trait;
use mongodb::bson::Document;

use crate::error::Result;

mod cursor;
#[cfg(test)]
pub(crate) mod memory;
mod mongo;

pub use cursor::MongoCursor;
pub use mongo::MongoStore;

/// Server-side batch size used when streaming documents
pub const DEFAULT_BATCH_SIZE: u32 = 1000;

/// Options for opening a cursor over a whole collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorOptions {
    /// Maximum number of documents to return (`None` for all)
    pub limit: Option<i64>,

    /// Number of documents fetched per round trip
    pub batch_size: u32,
}

impl CursorOptions {
    /// Stream every document of a collection.
    pub fn full_scan(batch_size: u32) -> Self {
        Self {
            limit: None,
            batch_size,
        }
    }

    /// Take at most `limit` documents in cursor order.
    pub fn sample(limit: i64) -> Self {
        Self {
            limit: Some(limit),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl Default for CursorOptions {
    fn default() -> Self {
        Self::full_scan(DEFAULT_BATCH_SIZE)
    }
}

/// Pull-based cursor over the documents of one collection
///
/// A cursor is not seekable; reading a collection again needs a fresh cursor.
#[async_trait]
pub trait DocumentCursor: Send {
    /// Fetch the next batch of documents
    ///
    /// # Returns
    /// * `Result<Option<Vec<Document>>>` - Next batch, or None once exhausted
    async fn next_batch(&mut self) -> Result<Option<Vec<Document>>>;

    /// Close the cursor and release server resources
    async fn close(&mut self) -> Result<()>;
}

/// Operations the backup and restore pipelines need from a database
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Name of the database this store reads from and writes to
    fn database_name(&self) -> &str;

    /// Names of all collections in the database
    async fn list_collection_names(&self) -> Result<Vec<String>>;

    /// Open a cursor over a collection in natural order
    async fn open_cursor(
        &self,
        collection: &str,
        options: CursorOptions,
    ) -> Result<Box<dyn DocumentCursor>>;

    /// Insert a batch without stopping at the first failing document
    ///
    /// # Returns
    /// * `Result<usize>` - Number of documents inserted
    async fn insert_many_unordered(&self, collection: &str, docs: Vec<Document>) -> Result<usize>;

    /// Delete every document of a collection
    ///
    /// # Returns
    /// * `Result<u64>` - Number of documents deleted
    async fn delete_all(&self, collection: &str) -> Result<u64>;

    /// Release the underlying connection
    async fn close(&self) -> Result<()>;
}
