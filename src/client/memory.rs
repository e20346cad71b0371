//! In-memory document store for pipeline tests

use std::sync::Arc;

use async_trait::async_trait;
use mongodb::bson::Document;
use tokio::sync::Mutex;

use crate::error::{ConnectionError, MongoSaveError, Result};

use super::{CursorOptions, DocumentCursor, DocumentStore};

/// Collections kept in insertion order, with a log of calls made against them
#[derive(Clone)]
pub(crate) struct MemoryStore {
    name: String,
    state: Arc<Mutex<State>>,
    fail_delete: bool,
    fail_read: bool,
    fail_close: bool,
}

#[derive(Default)]
struct State {
    collections: Vec<(String, Vec<Document>)>,
    insert_calls: Vec<(String, usize)>,
    cursor_batches: Vec<usize>,
    cursors_closed: usize,
    closed: bool,
}

fn simulated(operation: &str) -> MongoSaveError {
    ConnectionError::ConnectionFailed(format!("simulated {operation} failure")).into()
}

impl State {
    fn collection_mut(&mut self, name: &str) -> &mut Vec<Document> {
        let index = match self.collections.iter().position(|(n, _)| n == name) {
            Some(index) => index,
            None => {
                self.collections.push((name.to_string(), Vec::new()));
                self.collections.len() - 1
            }
        };
        &mut self.collections[index].1
    }
}

impl MemoryStore {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            state: Arc::new(Mutex::new(State::default())),
            fail_delete: false,
            fail_read: false,
            fail_close: false,
        }
    }

    /// Make every `delete_all` fail.
    pub(crate) fn failing_deletes(mut self) -> Self {
        self.fail_delete = true;
        self
    }

    /// Make every cursor fail on its first `next_batch`.
    pub(crate) fn failing_reads(mut self) -> Self {
        self.fail_read = true;
        self
    }

    /// Make `close` fail (after recording the call).
    pub(crate) fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    pub(crate) async fn seed(&self, collection: &str, docs: Vec<Document>) {
        self.state.lock().await.collection_mut(collection).extend(docs);
    }

    pub(crate) async fn documents(&self, collection: &str) -> Vec<Document> {
        self.state
            .lock()
            .await
            .collections
            .iter()
            .find(|(name, _)| name == collection)
            .map(|(_, docs)| docs.clone())
            .unwrap_or_default()
    }

    /// Collection and batch size of every `insert_many_unordered` call.
    pub(crate) async fn insert_calls(&self) -> Vec<(String, usize)> {
        self.state.lock().await.insert_calls.clone()
    }

    /// Sizes of every batch handed out by cursors.
    pub(crate) async fn cursor_batches(&self) -> Vec<usize> {
        self.state.lock().await.cursor_batches.clone()
    }

    pub(crate) async fn cursors_closed(&self) -> usize {
        self.state.lock().await.cursors_closed
    }

    pub(crate) async fn is_closed(&self) -> bool {
        self.state.lock().await.closed
    }
}

struct MemoryCursor {
    state: Arc<Mutex<State>>,
    remaining: std::vec::IntoIter<Document>,
    batch_size: usize,
    fail_read: bool,
}

#[async_trait]
impl DocumentCursor for MemoryCursor {
    async fn next_batch(&mut self) -> Result<Option<Vec<Document>>> {
        if self.fail_read {
            return Err(simulated("read"));
        }
        let batch: Vec<Document> = self.remaining.by_ref().take(self.batch_size).collect();
        if batch.is_empty() {
            return Ok(None);
        }
        self.state.lock().await.cursor_batches.push(batch.len());
        Ok(Some(batch))
    }

    async fn close(&mut self) -> Result<()> {
        self.state.lock().await.cursors_closed += 1;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn database_name(&self) -> &str {
        &self.name
    }

    async fn list_collection_names(&self) -> Result<Vec<String>> {
        Ok(self
            .state
            .lock()
            .await
            .collections
            .iter()
            .map(|(name, _)| name.clone())
            .collect())
    }

    async fn open_cursor(
        &self,
        collection: &str,
        options: CursorOptions,
    ) -> Result<Box<dyn DocumentCursor>> {
        let mut docs = self.documents(collection).await;
        if let Some(limit) = options.limit {
            docs.truncate(limit.max(0) as usize);
        }
        Ok(Box::new(MemoryCursor {
            state: Arc::clone(&self.state),
            remaining: docs.into_iter(),
            batch_size: options.batch_size.max(1) as usize,
            fail_read: self.fail_read,
        }))
    }

    async fn insert_many_unordered(&self, collection: &str, docs: Vec<Document>) -> Result<usize> {
        let count = docs.len();
        let mut state = self.state.lock().await;
        state.insert_calls.push((collection.to_string(), count));
        state.collection_mut(collection).extend(docs);
        Ok(count)
    }

    async fn delete_all(&self, collection: &str) -> Result<u64> {
        if self.fail_delete {
            return Err(simulated("delete"));
        }
        let mut state = self.state.lock().await;
        let deleted = std::mem::take(state.collection_mut(collection)).len();
        Ok(deleted as u64)
    }

    async fn close(&self) -> Result<()> {
        self.state.lock().await.closed = true;
        if self.fail_close {
            return Err(simulated("close"));
        }
        Ok(())
    }
}
