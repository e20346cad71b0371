use std::fmt;

use mongodb::bson::Document;
use mongodb::error::{ErrorKind, WriteFailure};
use serde::Serialize;

/// Structured summary of a driver error, rendered as JSON in error output.
#[derive(Debug, Default, Clone, Serialize)]
pub struct ErrorInfo {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub(crate) error_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) message: Option<String>,
    /// Number of documents rejected by an unordered bulk insert.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) failed_documents: Option<usize>,
    /// Offending key for duplicate-key failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) key: Option<Document>,
}

/// Render a driver error as pretty JSON wrapped in an `error` field.
pub fn format_mongodb_error(
    f: &mut fmt::Formatter<'_>,
    error: &mongodb::error::Error,
) -> fmt::Result {
    let info = extract_error_info(error);
    let wrapper = serde_json::json!({ "error": info });
    let json_output = serde_json::to_string_pretty(&wrapper).map_err(|_| fmt::Error)?;
    write!(f, "\n{json_output}")
}

/// Pull code, name and message out of the driver's typed error kinds.
pub fn extract_error_info(error: &mongodb::error::Error) -> ErrorInfo {
    let mut info = ErrorInfo::default();

    match error.kind.as_ref() {
        ErrorKind::InsertMany(insert_error) => {
            info.error_type = Some("mongo.insert_many_error".to_string());

            if let Some(write_errors) = &insert_error.write_errors {
                info.failed_documents = Some(write_errors.len());
                if let Some(first) = write_errors.first() {
                    info.code = Some(first.code);
                    info.message = Some(first.message.clone());
                    info.name = error_name(first.code);
                    info.key = duplicate_key(&first.details);
                }
            } else if let Some(wc_error) = &insert_error.write_concern_error {
                info.code = Some(wc_error.code);
                info.message = Some(wc_error.message.clone());
                info.name = error_name(wc_error.code);
            }
        }
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => {
            info.error_type = Some("mongo.write_error".to_string());
            info.code = Some(write_error.code);
            info.message = Some(write_error.message.clone());
            info.name = error_name(write_error.code);
            info.key = duplicate_key(&write_error.details);
        }
        ErrorKind::Command(command_error) => {
            info.error_type = Some("mongo.command_error".to_string());
            info.code = Some(command_error.code);
            info.message = Some(command_error.message.clone());
            info.name = error_name(command_error.code);
        }
        ErrorKind::Authentication { message, .. } => {
            info.error_type = Some("mongo.authentication_error".to_string());
            info.message = Some(message.clone());
        }
        ErrorKind::ServerSelection { message, .. } => {
            info.error_type = Some("mongo.server_selection_error".to_string());
            info.message = Some(message.clone());
        }
        _ => {
            info.message = Some(error.to_string());
        }
    }

    if matches!(info.code, Some(11000 | 11001)) {
        info.message = Some("Duplicate key error".to_string());
    }

    info
}

/// Whether the error means the server could not be selected or authenticated against.
pub fn is_connection_failure(error: &mongodb::error::Error) -> bool {
    matches!(
        error.kind.as_ref(),
        ErrorKind::ServerSelection { .. }
            | ErrorKind::Authentication { .. }
            | ErrorKind::DnsResolve { .. }
            | ErrorKind::Io(_)
    )
}

fn error_name(code: i32) -> Option<String> {
    let name = match code {
        11000 | 11001 => "DuplicateKey",
        13 => "Unauthorized",
        18 => "AuthenticationFailed",
        26 => "NamespaceNotFound",
        121 => "DocumentValidationFailure",
        _ => return None,
    };

    Some(name.to_string())
}

fn duplicate_key(details: &Option<Document>) -> Option<Document> {
    let doc = details.as_ref()?;
    doc.get_document("keyValue")
        .or_else(|_| doc.get_document("keyPattern"))
        .ok()
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    #[test]
    fn test_error_name_known_codes() {
        assert_eq!(error_name(11000).as_deref(), Some("DuplicateKey"));
        assert_eq!(error_name(18).as_deref(), Some("AuthenticationFailed"));
        assert_eq!(error_name(9999), None);
    }

    #[test]
    fn test_duplicate_key_prefers_key_value() {
        let details = Some(doc! {
            "keyPattern": { "_id": 1 },
            "keyValue": { "_id": "a" },
        });
        assert_eq!(duplicate_key(&details), Some(doc! { "_id": "a" }));
        assert_eq!(duplicate_key(&None), None);
    }

    #[test]
    fn test_error_info_skips_empty_fields() {
        let info = ErrorInfo {
            message: Some("boom".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_string(&info).unwrap();
        assert_eq!(json, r#"{"message":"boom"}"#);
    }
}
