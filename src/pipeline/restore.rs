//! Restore pipeline
//!
//! Reads a snapshot directory back into a database. Every collection named
//! by the filter is checked before anything is written; documents are then
//! decoded file by file and inserted in unordered batches.

use tracing::{debug, info, warn};

use crate::client::DocumentStore;
use crate::connection::{ConnectionManager, resolve_database_name};
use crate::error::{MongoSaveError, Result, SnapshotError};
use crate::snapshot::{Manifest, SnapshotLayout};

use super::progress::ProgressTracker;
use super::{INSERT_BATCH_SIZE, RestoreOptions, close_after};

/// What a restore run loaded
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreReport {
    /// Destination database
    pub database: String,

    /// Restored collections with the number of documents read for each
    pub collections: Vec<(String, usize)>,
}

/// Restore a snapshot directory into a database
///
/// # Arguments
/// * `options` - Resolved restore settings
pub async fn restore(options: &RestoreOptions) -> Result<()> {
    let layout = SnapshotLayout::new(options.input.as_path());
    layout.ensure_restorable().await?;

    let manifest = layout.read_manifest().await?;
    let database = target_database(options, manifest.as_ref());

    let manager = ConnectionManager::new(options.uri.as_str(), options.connection.clone());
    let store = manager.connect(&database).await?;

    let result = run_restore(
        &store,
        &layout,
        &options.collections,
        options.drop,
        !options.quiet,
    )
    .await;

    let report = close_after(&store, result).await?;
    if !options.quiet {
        for (collection, count) in &report.collections {
            println!("Restored: {} ({} documents)", collection, count);
        }
        println!("Restore completed: {}", report.database);
    }
    Ok(())
}

/// Destination database: the option, else the manifest's `db`, else the URI
/// path, else `test`
fn target_database(options: &RestoreOptions, manifest: Option<&Manifest>) -> String {
    let preferred = options
        .database
        .as_deref()
        .filter(|name| !name.is_empty())
        .or_else(|| manifest.map(|m| m.db.as_str()));
    resolve_database_name(preferred, &options.uri)
}

/// Load a snapshot into `store`
///
/// # Arguments
/// * `store` - Destination database
/// * `layout` - Snapshot root
/// * `filter` - Collections to restore; empty means every `data` subdirectory
/// * `drop` - Clear each collection before inserting
/// * `show_progress` - Draw a spinner per collection
pub async fn run_restore(
    store: &dyn DocumentStore,
    layout: &SnapshotLayout,
    filter: &[String],
    drop: bool,
    show_progress: bool,
) -> Result<RestoreReport> {
    layout.ensure_restorable().await?;
    let collections = plan_collections(layout, filter).await?;
    info!(
        "Restoring {} collection(s) into '{}'",
        collections.len(),
        store.database_name()
    );

    let mut report = RestoreReport {
        database: store.database_name().to_string(),
        collections: Vec::with_capacity(collections.len()),
    };

    for collection in collections {
        if drop {
            clear_collection(store, &collection).await;
        }
        let count = load_collection(store, layout, &collection, show_progress).await?;
        info!("Restored {} documents into '{}'", count, collection);
        report.collections.push((collection, count));
    }

    Ok(report)
}

/// Collections to restore; a filtered name without a data directory fails
/// the whole run before anything is written
async fn plan_collections(layout: &SnapshotLayout, filter: &[String]) -> Result<Vec<String>> {
    if filter.is_empty() {
        return layout.list_collections().await;
    }

    for name in filter {
        if !layout.has_collection(name).await {
            return Err(SnapshotError::MissingCollection(name.clone()).into());
        }
    }
    Ok(filter.to_vec())
}

/// Drop-before-insert; failures are logged and the restore carries on
async fn clear_collection(store: &dyn DocumentStore, collection: &str) {
    match store.delete_all(collection).await {
        Ok(deleted) => debug!("Cleared {} documents from '{}'", deleted, collection),
        Err(e) => warn!("Failed to clear '{}' before restore, continuing: {}", collection, e),
    }
}

async fn load_collection(
    store: &dyn DocumentStore,
    layout: &SnapshotLayout,
    collection: &str,
    show_progress: bool,
) -> Result<usize> {
    let files = layout.list_document_files(collection).await?;
    let tracker = ProgressTracker::new(collection, show_progress);
    let mut batch = Vec::with_capacity(INSERT_BATCH_SIZE.min(files.len()));
    let mut read = 0usize;

    let result = async {
        for file in &files {
            let doc = layout
                .open_document_reader(collection, file)
                .read_document()
                .await?;
            batch.push(doc);
            read += 1;

            if batch.len() >= INSERT_BATCH_SIZE {
                let full = std::mem::replace(&mut batch, Vec::with_capacity(INSERT_BATCH_SIZE));
                let inserted = store.insert_many_unordered(collection, full).await?;
                tracker.advance(inserted as u64);
            }
        }

        if !batch.is_empty() {
            let rest = std::mem::take(&mut batch);
            let inserted = store.insert_many_unordered(collection, rest).await?;
            tracker.advance(inserted as u64);
        }
        Ok::<(), MongoSaveError>(())
    }
    .await;

    tracker.finish();
    result.map(|()| read)
}
