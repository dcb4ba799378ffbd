//! Flattened schema nodes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sync_core::path::join_path;

/// Path segment used for the element schema of an array while walking.
///
/// It is stripped from every node path before omit, rename and override
/// matching, so real column paths never contain it.
pub const ARRAY_ITEMS_MARKER: &str = "_items";

/// Declared BSON type; a list means "any of these", and only the first counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BsonType {
    Single(String),
    Multiple(Vec<String>),
}

impl BsonType {
    /// The type tag that decides the column type.
    pub fn primary(&self) -> Option<&str> {
        match self {
            Self::Single(s) => Some(s.as_str()),
            Self::Multiple(types) => types.first().map(String::as_str),
        }
    }

    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::Single(s.clone())),
            Value::Array(items) => Some(Self::Multiple(
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect(),
            )),
            _ => None,
        }
    }
}

impl From<&str> for BsonType {
    fn from(s: &str) -> Self {
        Self::Single(s.to_string())
    }
}

/// Column modifiers that can be attached to a leaf through an override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColumnFlag {
    #[serde(alias = "not_null")]
    NotNull,
    #[serde(alias = "index_off")]
    IndexOff,
    #[serde(alias = "column_store_off")]
    ColumnStoreOff,
}

/// Last segment of a node path, as rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKey {
    Root,
    Field(String),
    /// Element type of the parent array; renders without a column name.
    ArrayItems,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    Leaf,
    Object,
    Array,
}

/// The per-field information that overrides and mappers operate on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeValue {
    pub bson_type: Option<BsonType>,
    /// `additionalProperties` of an object schema. A sub-schema counts as `true`.
    pub additional_properties: Option<bool>,
    pub flags: Option<Vec<ColumnFlag>>,
}

impl NodeValue {
    pub(crate) fn from_schema(schema: &Map<String, Value>) -> Self {
        let additional_properties = match schema.get("additionalProperties") {
            Some(Value::Bool(b)) => Some(*b),
            Some(Value::Object(_)) => Some(true),
            _ => None,
        };
        Self {
            bson_type: schema.get("bsonType").and_then(BsonType::from_json),
            additional_properties,
            flags: None,
        }
    }

    /// True when the primary bsonType equals `tag`.
    pub fn is_type(&self, tag: &str) -> bool {
        self.bson_type.as_ref().and_then(BsonType::primary) == Some(tag)
    }
}

/// One entry of the pre-order schema walk.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    pub path: Vec<String>,
    pub key: NodeKey,
    pub kind: NodeKind,
    pub value: NodeValue,
}

impl SchemaNode {
    pub fn dotted_path(&self) -> String {
        join_path(&self.path)
    }

    pub fn is_array_items(&self) -> bool {
        self.key == NodeKey::ArrayItems
    }

    pub fn is_container(&self) -> bool {
        matches!(self.kind, NodeKind::Object | NodeKind::Array)
    }
}
