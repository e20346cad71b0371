//! Batched cursor over a MongoDB find

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::Cursor;
use mongodb::bson::Document;
use tracing::debug;

use crate::error::Result;

use super::DocumentCursor;

/// [`DocumentCursor`] backed by a driver cursor
///
/// Documents are pulled one at a time from the driver, which itself fetches
/// from the server `batch_size` documents per round trip; `next_batch`
/// groups them so callers hold at most one batch in memory.
pub struct MongoCursor {
    cursor: Option<Cursor<Document>>,
    batch_size: u32,
    total_fetched: u64,
    collection: String,
}

impl MongoCursor {
    /// Wrap a driver cursor
    ///
    /// # Arguments
    /// * `cursor` - Cursor returned by `find`
    /// * `batch_size` - Maximum documents per `next_batch`
    /// * `collection` - Collection name for logging
    pub fn new(cursor: Cursor<Document>, batch_size: u32, collection: impl Into<String>) -> Self {
        Self {
            cursor: Some(cursor),
            batch_size: batch_size.max(1),
            total_fetched: 0,
            collection: collection.into(),
        }
    }
}

#[async_trait]
impl DocumentCursor for MongoCursor {
    async fn next_batch(&mut self) -> Result<Option<Vec<Document>>> {
        let Some(cursor) = self.cursor.as_mut() else {
            return Ok(None);
        };

        let mut batch = Vec::with_capacity(self.batch_size as usize);
        while batch.len() < self.batch_size as usize {
            match cursor.try_next().await {
                Ok(Some(doc)) => batch.push(doc),
                Ok(None) => break,
                Err(e) => {
                    self.cursor = None;
                    return Err(e.into());
                }
            }
        }

        if batch.is_empty() {
            debug!(
                "Cursor on '{}' exhausted after {} documents",
                self.collection, self.total_fetched
            );
            self.cursor = None;
            return Ok(None);
        }

        self.total_fetched += batch.len() as u64;
        debug!(
            "Fetched {} documents from '{}' (total: {})",
            batch.len(),
            self.collection,
            self.total_fetched
        );
        Ok(Some(batch))
    }

    async fn close(&mut self) -> Result<()> {
        if self.cursor.take().is_some() {
            debug!(
                "Closed cursor on '{}' after {} documents",
                self.collection, self.total_fetched
            );
        }
        Ok(())
    }
}

impl Drop for MongoCursor {
    fn drop(&mut self) {
        if self.cursor.is_some() {
            debug!("Cursor on '{}' dropped without explicit close", self.collection);
        }
    }
}
