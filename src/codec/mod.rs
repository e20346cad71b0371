//! Canonical document codec
//!
//! Documents are written as MongoDB Canonical Extended JSON: every value that
//! plain JSON cannot express exactly carries an explicit type wrapper
//! (`$oid`, `$date`, `$numberDecimal`, `$numberLong`, `$numberInt`,
//! `$numberDouble`, ...). Decoding reads the same wrappers back, so
//! `decode(encode(doc))` reproduces the document value for value and in
//! field order.

use mongodb::bson::{Bson, Document};
use serde_json::Value as JsonValue;

use crate::error::{DocumentError, MongoSaveError, Result};

/// Encode a document as canonical extended JSON text.
///
/// # Arguments
/// * `doc` - Document to encode
/// * `pretty` - Two-space indented output instead of a single line
///
/// # Returns
/// * `Result<String>` - Encoded text, or `UnsupportedValue` for values BSON
///   cannot store
pub fn encode(doc: &Document, pretty: bool) -> Result<String> {
    check_document(doc, "")?;

    let value = Bson::Document(doc.clone()).into_canonical_extjson();
    let text = if pretty {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    };

    text.map_err(|e| MongoSaveError::UnsupportedValue(e.to_string()))
}

/// Decode canonical extended JSON text back into a document.
///
/// Relaxed-mode wrappers are accepted as well, since they parse unambiguously.
///
/// # Returns
/// * `Result<Document>` - Decoded document, or `MalformedDocument`
pub fn decode(text: &str) -> Result<Document> {
    let value: JsonValue = serde_json::from_str(text)
        .map_err(|e| DocumentError::new(format!("invalid JSON: {e}")))?;

    if !value.is_object() {
        return Err(DocumentError::new("top-level value is not a document").into());
    }

    match Bson::try_from(value) {
        Ok(Bson::Document(doc)) => Ok(doc),
        Ok(other) => Err(DocumentError::new(format!(
            "top-level value decodes to {:?}, not a document",
            other.element_type()
        ))
        .into()),
        Err(e) => Err(DocumentError::new(format!("invalid extended JSON: {e}")).into()),
    }
}

/// Reject shapes that cannot survive a round trip through BSON.
///
/// BSON stores keys and regex components as NUL-terminated strings, and a
/// sub-document whose `$`-prefixed keys spell a type wrapper would be read
/// back as that type.
fn check_document(doc: &Document, path: &str) -> Result<()> {
    check_wrapper_keys(doc, path)?;
    for (key, value) in doc {
        let field_path = if path.is_empty() {
            key.clone()
        } else {
            format!("{path}.{key}")
        };
        if key.contains('\0') {
            return Err(MongoSaveError::UnsupportedValue(format!(
                "field name '{}' contains a NUL byte",
                field_path.escape_default()
            )));
        }
        check_value(value, &field_path)?;
    }
    Ok(())
}

fn check_wrapper_keys(doc: &Document, path: &str) -> Result<()> {
    if !doc.keys().any(|key| key.starts_with('$')) {
        return Ok(());
    }

    let value = Bson::Document(doc.clone()).into_canonical_extjson();
    match Bson::try_from(value) {
        Ok(Bson::Document(_)) => Ok(()),
        _ => {
            let location = if path.is_empty() { "<root>" } else { path };
            Err(MongoSaveError::UnsupportedValue(format!(
                "document at '{}' has field names that read back as an Extended JSON type",
                location.escape_default()
            )))
        }
    }
}

fn check_value(value: &Bson, path: &str) -> Result<()> {
    match value {
        Bson::Document(doc) => check_document(doc, path),
        Bson::Array(items) => items
            .iter()
            .enumerate()
            .try_for_each(|(i, item)| check_value(item, &format!("{path}.{i}"))),
        Bson::RegularExpression(regex)
            if regex.pattern.contains('\0') || regex.options.contains('\0') =>
        {
            Err(MongoSaveError::UnsupportedValue(format!(
                "regular expression at '{}' contains a NUL byte",
                path.escape_default()
            )))
        }
        Bson::JavaScriptCodeWithScope(code) => check_document(&code.scope, path),
        _ => Ok(()),
    }
}
