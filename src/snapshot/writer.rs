//! Per-document file readers and writers

use std::path::PathBuf;

use mongodb::bson::Document;
use tokio::fs::{self, File};
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::codec;
use crate::error::{DocumentError, Result};

/// Writer for a single document file
pub struct DocumentWriter {
    writer: BufWriter<File>,
}

impl DocumentWriter {
    /// Create (or truncate) the file at `path`
    pub(crate) async fn create(path: PathBuf) -> Result<Self> {
        let file = File::create(&path).await?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    /// Encode the document, write it and flush
    ///
    /// # Returns
    /// * `Result<u64>` - Number of bytes written
    pub async fn write_document(mut self, doc: &Document, pretty: bool) -> Result<u64> {
        let text = codec::encode(doc, pretty)?;
        self.writer.write_all(text.as_bytes()).await?;
        self.writer.flush().await?;
        Ok(text.len() as u64)
    }
}

/// Reader for a single document file
pub struct DocumentReader {
    path: PathBuf,
}

impl DocumentReader {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Read and decode the document; decode errors name the file
    pub async fn read_document(self) -> Result<Document> {
        let bytes = fs::read(&self.path).await?;
        let text = String::from_utf8(bytes).map_err(|e| {
            DocumentError::new(format!("invalid UTF-8: {e}")).in_file(&self.path)
        })?;
        codec::decode(&text).map_err(|e| e.in_file(&self.path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MongoSaveError;
    use mongodb::bson::{DateTime, doc};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_then_read() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("doc.json");
        let original = doc! { "_id": "a", "at": DateTime::from_millis(5) };

        let writer = DocumentWriter::create(path.clone()).await.unwrap();
        let written = writer.write_document(&original, true).await.unwrap();
        assert_eq!(written, fs::metadata(&path).await.unwrap().len());

        let back = DocumentReader::new(path).read_document().await.unwrap();
        assert_eq!(back, original);
    }

    #[tokio::test]
    async fn test_overwrite_replaces_content() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("doc.json");
        let long = doc! { "_id": "a", "padding": "x".repeat(200) };
        let short = doc! { "_id": "a" };

        DocumentWriter::create(path.clone())
            .await
            .unwrap()
            .write_document(&long, false)
            .await
            .unwrap();
        DocumentWriter::create(path.clone())
            .await
            .unwrap()
            .write_document(&short, false)
            .await
            .unwrap();

        let back = DocumentReader::new(path).read_document().await.unwrap();
        assert_eq!(back, short);
    }

    #[tokio::test]
    async fn test_malformed_file_names_path() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.json");
        fs::write(&path, r#"{"_id": {"$oid": "#).await.unwrap();

        let err = DocumentReader::new(path).read_document().await.unwrap_err();
        match err {
            MongoSaveError::MalformedDocument(e) => {
                assert!(e.source.unwrap().ends_with("broken.json"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_malformed() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("latin1.json");
        fs::write(&path, b"{\"x\":\"\xff\"}").await.unwrap();

        let err = DocumentReader::new(path).read_document().await.unwrap_err();
        match err {
            MongoSaveError::MalformedDocument(e) => {
                assert!(e.reason.contains("UTF-8"));
                assert!(e.source.unwrap().ends_with("latin1.json"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
