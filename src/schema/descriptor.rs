//! Structural type descriptors
//!
//! A descriptor is written to the schema file as a small JSON object:
//! `{"type": "string"}`, `{"type": "array", "items": ...}`,
//! `{"type": "object", "properties": {...}}` or `{"anyOf": [...]}`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Concrete type tag of a sampled value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TypeTag {
    Null,
    String,
    Int,
    Double,
    Bool,
    ObjectId,
    Decimal128,
    Date,
    Array,
    Object,
    Unknown,
}

/// Structural description of the values observed for one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "RawDescriptor", try_from = "RawDescriptor")]
pub enum TypeDescriptor {
    /// A single scalar tag (never `Array` or `Object`)
    Scalar(TypeTag),

    /// Array with the union of its sampled element types; `None` when no
    /// element was sampled
    Array(Option<Box<TypeDescriptor>>),

    /// Nested document with per-property descriptors
    Object(BTreeMap<String, TypeDescriptor>),

    /// Two or more distinct descriptors seen for the same field
    AnyOf(Vec<TypeDescriptor>),
}

impl TypeDescriptor {
    /// Merge two descriptors into their deduplicated union.
    ///
    /// Union members are flattened and kept in first-seen order; when only
    /// one distinct member remains it is returned as is.
    pub fn merge(self, other: TypeDescriptor) -> TypeDescriptor {
        if self == other {
            return self;
        }
        let mut members = self.into_members();
        for candidate in other.into_members() {
            if !members.contains(&candidate) {
                members.push(candidate);
            }
        }
        Self::from_members(members)
    }

    /// Union of an arbitrary number of descriptors, `None` if there are none.
    pub fn union_of<I>(descriptors: I) -> Option<TypeDescriptor>
    where
        I: IntoIterator<Item = TypeDescriptor>,
    {
        descriptors.into_iter().reduce(TypeDescriptor::merge)
    }

    /// Union members of this descriptor (itself, unless it is `AnyOf`).
    pub fn members(&self) -> Vec<&TypeDescriptor> {
        match self {
            TypeDescriptor::AnyOf(members) => members.iter().collect(),
            other => vec![other],
        }
    }

    fn into_members(self) -> Vec<TypeDescriptor> {
        match self {
            TypeDescriptor::AnyOf(members) => members,
            other => vec![other],
        }
    }

    fn from_members(mut members: Vec<TypeDescriptor>) -> TypeDescriptor {
        if members.len() == 1 {
            members.remove(0)
        } else {
            TypeDescriptor::AnyOf(members)
        }
    }
}

impl From<TypeTag> for TypeDescriptor {
    fn from(tag: TypeTag) -> Self {
        match tag {
            TypeTag::Array => TypeDescriptor::Array(None),
            TypeTag::Object => TypeDescriptor::Object(BTreeMap::new()),
            other => TypeDescriptor::Scalar(other),
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TypeTag::Null => "null",
            TypeTag::String => "string",
            TypeTag::Int => "int",
            TypeTag::Double => "double",
            TypeTag::Bool => "bool",
            TypeTag::ObjectId => "objectId",
            TypeTag::Decimal128 => "decimal128",
            TypeTag::Date => "date",
            TypeTag::Array => "array",
            TypeTag::Object => "object",
            TypeTag::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// On-disk shape shared by every descriptor variant
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDescriptor {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    kind: Option<TypeTag>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    items: Option<Box<TypeDescriptor>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    properties: Option<BTreeMap<String, TypeDescriptor>>,

    #[serde(rename = "anyOf", default, skip_serializing_if = "Option::is_none")]
    any_of: Option<Vec<TypeDescriptor>>,
}

impl From<TypeDescriptor> for RawDescriptor {
    fn from(descriptor: TypeDescriptor) -> Self {
        let mut raw = RawDescriptor {
            kind: None,
            items: None,
            properties: None,
            any_of: None,
        };
        match descriptor {
            TypeDescriptor::Scalar(tag) => raw.kind = Some(tag),
            TypeDescriptor::Array(items) => {
                raw.kind = Some(TypeTag::Array);
                raw.items = items;
            }
            TypeDescriptor::Object(properties) => {
                raw.kind = Some(TypeTag::Object);
                raw.properties = Some(properties);
            }
            TypeDescriptor::AnyOf(members) => raw.any_of = Some(members),
        }
        raw
    }
}

impl TryFrom<RawDescriptor> for TypeDescriptor {
    type Error = String;

    fn try_from(raw: RawDescriptor) -> Result<Self, Self::Error> {
        match (raw.kind, raw.items, raw.properties, raw.any_of) {
            (None, None, None, Some(members)) if members.len() >= 2 => {
                Ok(TypeDescriptor::AnyOf(members))
            }
            (None, None, None, Some(_)) => {
                Err("anyOf must list at least two descriptors".to_string())
            }
            (Some(TypeTag::Array), items, None, None) => Ok(TypeDescriptor::Array(items)),
            (Some(TypeTag::Object), None, properties, None) => {
                Ok(TypeDescriptor::Object(properties.unwrap_or_default()))
            }
            (Some(tag), None, None, None) => Ok(TypeDescriptor::Scalar(tag)),
            (Some(tag), ..) => Err(format!("unexpected fields for type '{tag}'")),
            (None, ..) => Err("descriptor needs either 'type' or 'anyOf'".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scalar(tag: TypeTag) -> TypeDescriptor {
        TypeDescriptor::Scalar(tag)
    }

    #[test]
    fn test_merge_equal_is_not_a_union() {
        let merged = scalar(TypeTag::String).merge(scalar(TypeTag::String));
        assert_eq!(merged, scalar(TypeTag::String));
    }

    #[test]
    fn test_merge_flattens_and_deduplicates() {
        let a = scalar(TypeTag::Int).merge(scalar(TypeTag::Null));
        let b = scalar(TypeTag::Null).merge(scalar(TypeTag::String));
        let merged = a.merge(b);
        assert_eq!(
            merged,
            TypeDescriptor::AnyOf(vec![
                scalar(TypeTag::Int),
                scalar(TypeTag::Null),
                scalar(TypeTag::String),
            ])
        );
    }

    #[test]
    fn test_union_of_empty_is_none() {
        assert_eq!(TypeDescriptor::union_of(Vec::new()), None);
    }

    #[test]
    fn test_serialized_shapes() {
        let mut properties = BTreeMap::new();
        properties.insert("city".to_string(), scalar(TypeTag::String));
        let descriptor = TypeDescriptor::AnyOf(vec![
            TypeDescriptor::Array(Some(Box::new(scalar(TypeTag::Decimal128)))),
            TypeDescriptor::Object(properties),
            scalar(TypeTag::ObjectId),
            TypeDescriptor::Array(None),
        ]);

        let value = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(
            value,
            json!({
                "anyOf": [
                    { "type": "array", "items": { "type": "decimal128" } },
                    { "type": "object", "properties": { "city": { "type": "string" } } },
                    { "type": "objectId" },
                    { "type": "array" }
                ]
            })
        );

        let back: TypeDescriptor = serde_json::from_value(value).unwrap();
        assert_eq!(back, descriptor);
    }

    #[test]
    fn test_rejects_inconsistent_descriptor() {
        let bad = json!({ "type": "string", "items": { "type": "int" } });
        assert!(serde_json::from_value::<TypeDescriptor>(bad).is_err());

        let single = json!({ "anyOf": [ { "type": "int" } ] });
        assert!(serde_json::from_value::<TypeDescriptor>(single).is_err());
    }

    #[test]
    fn test_tag_display_matches_serde() {
        for tag in [TypeTag::ObjectId, TypeTag::Decimal128, TypeTag::Bool, TypeTag::Unknown] {
            let json = serde_json::to_value(tag).unwrap();
            assert_eq!(json, json!(tag.to_string()));
        }
    }
}
