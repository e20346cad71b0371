//! Schema inference over sampled documents
//!
//! Builds an advisory, per-collection summary of field types from a bounded
//! sample. The result is written next to the data for humans and tooling;
//! restore never reads it back to validate or coerce anything.

mod descriptor;

use std::collections::BTreeMap;

use mongodb::bson::{Bson, Document};
use serde::{Deserialize, Serialize};

pub use descriptor::{TypeDescriptor, TypeTag};

/// Maximum number of documents sampled per collection
pub const SAMPLE_SIZE: i64 = 500;

/// Maximum number of elements inspected per array
pub const ARRAY_SAMPLE_SIZE: usize = 20;

/// Inferred schema: one descriptor per top-level field name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InferredSchema {
    fields: BTreeMap<String, TypeDescriptor>,
}

impl InferredSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one document into the schema.
    pub fn observe(&mut self, doc: &Document) {
        for (key, value) in doc {
            self.merge_field(key, describe_value(value));
        }
    }

    /// Merge another partial schema into this one, field by field.
    pub fn merge(&mut self, other: InferredSchema) {
        for (key, descriptor) in other.fields {
            self.merge_field(&key, descriptor);
        }
    }

    /// Descriptor for a field, if it was observed.
    pub fn field(&self, name: &str) -> Option<&TypeDescriptor> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &TypeDescriptor)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn merge_field(&mut self, key: &str, descriptor: TypeDescriptor) {
        let merged = match self.fields.remove(key) {
            Some(existing) => existing.merge(descriptor),
            None => descriptor,
        };
        self.fields.insert(key.to_string(), merged);
    }
}

/// Infer a schema from a sequence of sampled documents.
///
/// The caller bounds the sample (see [`SAMPLE_SIZE`]); this function looks at
/// every document it is given and never fails.
pub fn infer_schema<'a, I>(samples: I) -> InferredSchema
where
    I: IntoIterator<Item = &'a Document>,
{
    let mut schema = InferredSchema::new();
    for doc in samples {
        schema.observe(doc);
    }
    schema
}

/// Describe a single value, recursing into arrays and nested documents.
pub fn describe_value(value: &Bson) -> TypeDescriptor {
    match value {
        Bson::Null => TypeDescriptor::Scalar(TypeTag::Null),
        Bson::String(_) => TypeDescriptor::Scalar(TypeTag::String),
        Bson::Int32(_) | Bson::Int64(_) => TypeDescriptor::Scalar(TypeTag::Int),
        Bson::Double(_) => TypeDescriptor::Scalar(TypeTag::Double),
        Bson::Boolean(_) => TypeDescriptor::Scalar(TypeTag::Bool),
        Bson::ObjectId(_) => TypeDescriptor::Scalar(TypeTag::ObjectId),
        Bson::Decimal128(_) => TypeDescriptor::Scalar(TypeTag::Decimal128),
        Bson::DateTime(_) => TypeDescriptor::Scalar(TypeTag::Date),
        Bson::Array(items) => {
            let items = items
                .iter()
                .take(ARRAY_SAMPLE_SIZE)
                .map(describe_value);
            TypeDescriptor::Array(TypeDescriptor::union_of(items).map(Box::new))
        }
        Bson::Document(doc) => TypeDescriptor::Object(
            doc.iter()
                .map(|(key, value)| (key.clone(), describe_value(value)))
                .collect(),
        ),
        _ => TypeDescriptor::Scalar(TypeTag::Unknown),
    }
}
