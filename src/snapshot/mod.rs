//! Snapshot directory layout
//!
//! A snapshot is a plain directory tree:
//!
//! ```text
//! <root>/manifest.json
//! <root>/schema/<collection>.json
//! <root>/data/<collection>/<id>.json
//! ```
//!
//! Every write replaces a file of the same name. Nothing is cleaned up if a
//! run is interrupted; a snapshot without `manifest.json` is incomplete.

mod manifest;
mod naming;
mod writer;

use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::fs;
use tracing::{debug, warn};

use crate::error::{MongoSaveError, Result, SnapshotError};
use crate::schema::InferredSchema;

pub use manifest::{FORMAT_VERSION, Manifest, TOOL_NAME};
pub use naming::{DocumentNamer, document_id_string, sanitize_file_name};
pub use writer::{DocumentReader, DocumentWriter};

const MANIFEST_FILE: &str = "manifest.json";
const SCHEMA_DIR: &str = "schema";
const DATA_DIR: &str = "data";
const JSON_EXTENSION: &str = "json";

/// Paths and file operations for one snapshot root
#[derive(Debug, Clone)]
pub struct SnapshotLayout {
    root: PathBuf,
}

impl SnapshotLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    pub fn schema_dir(&self) -> PathBuf {
        self.root.join(SCHEMA_DIR)
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root.join(DATA_DIR)
    }

    pub fn schema_path(&self, collection: &str) -> PathBuf {
        self.schema_dir().join(format!("{collection}.{JSON_EXTENSION}"))
    }

    pub fn collection_dir(&self, collection: &str) -> PathBuf {
        self.data_dir().join(collection)
    }

    /// Create the root with its `schema` and `data` directories
    pub async fn create_root(&self) -> Result<()> {
        fs::create_dir_all(self.schema_dir()).await?;
        fs::create_dir_all(self.data_dir()).await?;
        debug!("Prepared snapshot root {}", self.root.display());
        Ok(())
    }

    /// Whether the root holds a `data` directory
    pub async fn has_data_dir(&self) -> bool {
        fs::metadata(self.data_dir())
            .await
            .map(|meta| meta.is_dir())
            .unwrap_or(false)
    }

    /// Fail with `InvalidSnapshot` unless the root holds a `data` directory
    pub async fn ensure_restorable(&self) -> Result<()> {
        if self.has_data_dir().await {
            Ok(())
        } else {
            Err(SnapshotError::MissingDataDir(self.root.clone()).into())
        }
    }

    /// Write `manifest.json`
    pub async fn write_manifest(&self, manifest: &Manifest, pretty: bool) -> Result<()> {
        write_json(&self.manifest_path(), manifest, pretty).await
    }

    /// Read `manifest.json` if it exists
    ///
    /// # Returns
    /// * `Result<Option<Manifest>>` - `None` when absent, `InvalidSnapshot`
    ///   when present but unreadable
    pub async fn read_manifest(&self) -> Result<Option<Manifest>> {
        let path = self.manifest_path();
        let text = match fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let manifest: Manifest = serde_json::from_str(&text)
            .map_err(|e| SnapshotError::InvalidManifest(e.to_string()))?;
        if !manifest.is_supported_version() {
            warn!(
                "Snapshot format version {} is newer than {}; reading it anyway",
                manifest.version, FORMAT_VERSION
            );
        }
        Ok(Some(manifest))
    }

    /// Write the inferred schema of one collection
    pub async fn write_schema(
        &self,
        collection: &str,
        schema: &InferredSchema,
        pretty: bool,
    ) -> Result<()> {
        write_json(&self.schema_path(collection), schema, pretty).await
    }

    /// Open a writer for one document file, creating the collection directory
    ///
    /// # Arguments
    /// * `collection` - Collection name
    /// * `file_stem` - File-system-safe name without extension (see [`DocumentNamer`])
    pub async fn open_document_writer(
        &self,
        collection: &str,
        file_stem: &str,
    ) -> Result<DocumentWriter> {
        let dir = self.collection_dir(collection);
        fs::create_dir_all(&dir).await?;
        DocumentWriter::create(dir.join(format!("{file_stem}.{JSON_EXTENSION}"))).await
    }

    /// Collection names present under `data`, in directory listing order
    pub async fn list_collections(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut entries = fs::read_dir(self.data_dir()).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(raw) => warn!("Skipping non UTF-8 collection directory {:?}", raw),
            }
        }
        Ok(names)
    }

    /// Whether a collection has a data directory
    pub async fn has_collection(&self, collection: &str) -> bool {
        fs::metadata(self.collection_dir(collection))
            .await
            .map(|meta| meta.is_dir())
            .unwrap_or(false)
    }

    /// `*.json` file names of one collection, in directory listing order
    pub async fn list_document_files(&self, collection: &str) -> Result<Vec<String>> {
        let dir = self.collection_dir(collection);
        let mut entries = fs::read_dir(&dir).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                MongoSaveError::from(SnapshotError::MissingCollection(collection.to_string()))
            } else {
                MongoSaveError::from(e)
            }
        })?;

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_json = path
                .extension()
                .is_some_and(|ext| ext == JSON_EXTENSION);
            if !is_json || !entry.file_type().await?.is_file() {
                continue;
            }
            if let Ok(name) = entry.file_name().into_string() {
                files.push(name);
            }
        }
        Ok(files)
    }

    /// Open one document file of a collection for reading
    pub fn open_document_reader(&self, collection: &str, file: &str) -> DocumentReader {
        DocumentReader::new(self.collection_dir(collection).join(file))
    }
}

async fn write_json<T: Serialize>(path: &Path, value: &T, pretty: bool) -> Result<()> {
    let text = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|e| MongoSaveError::UnsupportedValue(e.to_string()))?;

    fs::write(path, text).await?;
    debug!("Wrote {}", path.display());
    Ok(())
}
