//! Document file naming

use std::collections::HashSet;

use mongodb::bson::Bson;
use tracing::warn;

/// Characters that are reserved on at least one common file system
const RESERVED: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Replace reserved file-name characters with `_`
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| if RESERVED.contains(&c) { '_' } else { c })
        .collect()
}

/// String form of an `_id` value
///
/// ObjectIds render as 24 hex digits, strings as themselves, anything else
/// as its relaxed Extended JSON text.
pub fn document_id_string(id: &Bson) -> String {
    match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::String(s) => s.clone(),
        other => other.clone().into_relaxed_extjson().to_string(),
    }
}

/// Hands out unique file stems within one collection
///
/// Two ids can sanitize to the same stem (`a:b` and `a/b`), and ids of
/// different types can share a string form (`42` and `"42"`). The second one
/// gets `~1`, the third `~2`, and so on, with a warning for each.
///
/// Every stem handed out is remembered for the life of the namer, one short
/// string per exported document.
#[derive(Debug, Default)]
pub struct DocumentNamer {
    used: HashSet<String>,
}

impl DocumentNamer {
    pub fn new() -> Self {
        Self::default()
    }

    /// File stem (no extension) for a document `_id`
    pub fn file_stem(&mut self, id: &Bson) -> String {
        let base = sanitize_file_name(&document_id_string(id));
        if self.used.insert(base.clone()) {
            return base;
        }

        let mut n = 1usize;
        let stem = loop {
            let candidate = format!("{base}~{n}");
            if self.used.insert(candidate.clone()) {
                break candidate;
            }
            n += 1;
        };
        warn!(
            "File name collision for _id {}; writing {}.json instead",
            document_id_string(id),
            stem
        );
        stem
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::oid::ObjectId;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("user:1/alpha"), "user_1_alpha");
        assert_eq!(sanitize_file_name(r#"<a>"b"\c|d?e*"#), "_a__b__c_d_e_");
        assert_eq!(sanitize_file_name("plain-id.42"), "plain-id.42");
    }

    #[test]
    fn test_document_id_string() {
        let oid = ObjectId::parse_str("65f1a2b3c4d5e6f708192a3b").unwrap();
        assert_eq!(document_id_string(&Bson::ObjectId(oid)), "65f1a2b3c4d5e6f708192a3b");
        assert_eq!(document_id_string(&Bson::String("abc".into())), "abc");
        assert_eq!(document_id_string(&Bson::Int32(42)), "42");
        assert_eq!(document_id_string(&Bson::Int64(7)), "7");
    }

    #[test]
    fn test_namer_suffixes_collisions() {
        let mut namer = DocumentNamer::new();
        assert_eq!(namer.file_stem(&Bson::String("a:b".into())), "a_b");
        assert_eq!(namer.file_stem(&Bson::String("a/b".into())), "a_b~1");
        assert_eq!(namer.file_stem(&Bson::String("a|b".into())), "a_b~2");
        assert_eq!(namer.file_stem(&Bson::String("other".into())), "other");
    }

    #[test]
    fn test_namer_skips_taken_suffix() {
        let mut namer = DocumentNamer::new();
        assert_eq!(namer.file_stem(&Bson::String("x~1".into())), "x~1");
        assert_eq!(namer.file_stem(&Bson::String("x".into())), "x");
        // "x~1" is already taken by a real id, so the next "x" goes further.
        assert_eq!(namer.file_stem(&Bson::String("x".into())), "x~2");
    }

    #[test]
    fn test_namer_separates_ids_with_shared_string_form() {
        let oid = ObjectId::parse_str("65f1a2b3c4d5e6f708192a3b").unwrap();
        let mut namer = DocumentNamer::new();
        assert_eq!(namer.file_stem(&Bson::Int32(42)), "42");
        assert_eq!(namer.file_stem(&Bson::String("42".into())), "42~1");
        assert_eq!(namer.file_stem(&Bson::ObjectId(oid)), oid.to_hex());
        assert_eq!(
            namer.file_stem(&Bson::String(oid.to_hex())),
            format!("{}~1", oid.to_hex())
        );
    }
}
