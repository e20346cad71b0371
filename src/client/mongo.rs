//! [`DocumentStore`] over the MongoDB driver

use async_trait::async_trait;
use mongodb::bson::{Document, doc};
use mongodb::{Client, Database};
use tracing::{debug, info};

use crate::error::Result;

use super::{CursorOptions, DocumentCursor, DocumentStore, MongoCursor};

/// Collections whose names start with this prefix belong to the server.
const SYSTEM_PREFIX: &str = "system.";

/// MongoDB-backed document store bound to one database
pub struct MongoStore {
    client: Client,
    database: Database,
}

impl MongoStore {
    /// Create a store for `database_name` on a connected client
    pub fn new(client: Client, database_name: &str) -> Self {
        let database = client.database(database_name);
        Self { client, database }
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    fn database_name(&self) -> &str {
        self.database.name()
    }

    async fn list_collection_names(&self) -> Result<Vec<String>> {
        let names = self.database.list_collection_names().await?;
        Ok(names
            .into_iter()
            .filter(|name| !name.starts_with(SYSTEM_PREFIX))
            .collect())
    }

    async fn open_cursor(
        &self,
        collection: &str,
        options: CursorOptions,
    ) -> Result<Box<dyn DocumentCursor>> {
        let coll = self.database.collection::<Document>(collection);
        let mut find = coll.find(doc! {}).batch_size(options.batch_size);
        if let Some(limit) = options.limit {
            find = find.limit(limit);
        }
        let cursor = find.await?;

        let batch_size = match options.limit {
            Some(limit) => options.batch_size.min(limit.clamp(1, u32::MAX as i64) as u32),
            None => options.batch_size,
        };
        Ok(Box::new(MongoCursor::new(cursor, batch_size, collection)))
    }

    async fn insert_many_unordered(&self, collection: &str, docs: Vec<Document>) -> Result<usize> {
        if docs.is_empty() {
            return Ok(0);
        }
        let coll = self.database.collection::<Document>(collection);
        let result = coll.insert_many(docs).ordered(false).await?;
        debug!(
            "Inserted {} documents into '{}'",
            result.inserted_ids.len(),
            collection
        );
        Ok(result.inserted_ids.len())
    }

    async fn delete_all(&self, collection: &str) -> Result<u64> {
        let coll = self.database.collection::<Document>(collection);
        let result = coll.delete_many(doc! {}).await?;
        Ok(result.deleted_count)
    }

    async fn close(&self) -> Result<()> {
        self.client.clone().shutdown().await;
        info!("Closed connection to '{}'", self.database.name());
        Ok(())
    }
}
