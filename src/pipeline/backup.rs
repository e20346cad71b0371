//! Backup pipeline
//!
//! Collections are exported one at a time: a bounded sample feeds schema
//! inference, then a full scan writes every document to its own file. The
//! manifest is written last, so its presence marks a finished snapshot.

use mongodb::bson::Bson;
use tracing::{debug, info, warn};

use crate::client::{CursorOptions, DEFAULT_BATCH_SIZE, DocumentStore};
use crate::connection::{ConnectionManager, resolve_database_name};
use crate::error::{MongoSaveError, Result};
use crate::schema::{InferredSchema, SAMPLE_SIZE};
use crate::snapshot::{DocumentNamer, Manifest, SnapshotLayout};

use super::progress::ProgressTracker;
use super::{BackupOptions, close_after};

/// Back up a database into a snapshot directory
///
/// # Arguments
/// * `options` - Resolved backup settings
///
/// # Returns
/// * `Result<Manifest>` - The manifest written at the snapshot root
pub async fn backup(options: &BackupOptions) -> Result<Manifest> {
    let database = resolve_database_name(options.database.as_deref(), &options.uri);
    let layout = SnapshotLayout::new(options.output_root(&database));
    layout.create_root().await?;

    let manager = ConnectionManager::new(options.uri.as_str(), options.connection.clone());
    let store = manager.connect(&database).await?;

    let result = run_backup(
        &store,
        &layout,
        &options.collections,
        options.pretty,
        !options.quiet,
    )
    .await;

    let manifest = close_after(&store, result).await?;
    if !options.quiet {
        println!("Backup created: {}", layout.root().display());
    }
    Ok(manifest)
}

/// Export the selected collections of `store` into an existing snapshot root
///
/// # Arguments
/// * `store` - Source database
/// * `layout` - Snapshot root, already created
/// * `filter` - Collection names to export; empty means all
/// * `pretty` - Pretty-print output files
/// * `show_progress` - Draw a spinner per collection
pub async fn run_backup(
    store: &dyn DocumentStore,
    layout: &SnapshotLayout,
    filter: &[String],
    pretty: bool,
    show_progress: bool,
) -> Result<Manifest> {
    let available = store.list_collection_names().await?;
    let selected = select_collections(available, filter);
    info!(
        "Backing up {} collection(s) from '{}'",
        selected.len(),
        store.database_name()
    );

    for collection in &selected {
        let schema = sample_schema(store, collection).await?;
        layout.write_schema(collection, &schema, pretty).await?;

        let exported = export_documents(store, layout, collection, pretty, show_progress).await?;
        info!("Exported {} documents from '{}'", exported, collection);
    }

    let manifest = Manifest::new(store.database_name(), selected);
    layout.write_manifest(&manifest, pretty).await?;
    Ok(manifest)
}

/// Keep source order; warn about filter names the source does not have
fn select_collections(available: Vec<String>, filter: &[String]) -> Vec<String> {
    if filter.is_empty() {
        return available;
    }

    for name in filter {
        if !available.contains(name) {
            warn!("Collection '{}' not found in source, skipping", name);
        }
    }
    available
        .into_iter()
        .filter(|name| filter.contains(name))
        .collect()
}

async fn sample_schema(store: &dyn DocumentStore, collection: &str) -> Result<InferredSchema> {
    let mut cursor = store
        .open_cursor(collection, CursorOptions::sample(SAMPLE_SIZE))
        .await?;

    let mut schema = InferredSchema::new();
    let mut sampled = 0usize;
    let result = async {
        while let Some(batch) = cursor.next_batch().await? {
            for doc in &batch {
                schema.observe(doc);
            }
            sampled += batch.len();
        }
        Ok::<(), MongoSaveError>(())
    }
    .await;

    let closed = cursor.close().await;
    result?;
    closed?;

    debug!(
        "Inferred {} field(s) for '{}' from {} sampled documents",
        schema.len(),
        collection,
        sampled
    );
    Ok(schema)
}

async fn export_documents(
    store: &dyn DocumentStore,
    layout: &SnapshotLayout,
    collection: &str,
    pretty: bool,
    show_progress: bool,
) -> Result<u64> {
    let mut cursor = store
        .open_cursor(collection, CursorOptions::full_scan(DEFAULT_BATCH_SIZE))
        .await?;
    let tracker = ProgressTracker::new(collection, show_progress);
    let mut namer = DocumentNamer::new();

    let result = async {
        while let Some(batch) = cursor.next_batch().await? {
            for doc in &batch {
                let id = doc.get("_id").unwrap_or(&Bson::Null);
                let stem = namer.file_stem(id);
                let writer = layout.open_document_writer(collection, &stem).await?;
                writer.write_document(doc, pretty).await?;
            }
            tracker.advance(batch.len() as u64);
        }
        Ok::<(), MongoSaveError>(())
    }
    .await;

    tracker.finish();
    let closed = cursor.close().await;
    result?;
    closed?;
    Ok(tracker.processed())
}
