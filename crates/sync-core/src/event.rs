//! Change events as delivered by the streaming side of a sync.
//!
//! Documents are JSON objects in source key order; this requires
//! `serde_json`'s `preserve_order` feature, which the workspace enables.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A source document (or record) with its keys in insertion order.
pub type Document = serde_json::Map<String, Value>;

/// Kind of change carried by a [`ChangeEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Insert,
    Update,
    Replace,
    Delete,
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Insert => write!(f, "insert"),
            Self::Update => write!(f, "update"),
            Self::Replace => write!(f, "replace"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// Fields touched by an update.
///
/// `updated_fields` maps dotted paths (which may contain array indexes,
/// e.g. `items.0.qty`) to their new values. `removed_fields` lists dotted
/// paths that no longer exist.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateDescription {
    #[serde(default)]
    pub updated_fields: Document,
    #[serde(default)]
    pub removed_fields: Vec<String>,
}

impl UpdateDescription {
    /// Updated fields merged with removed fields set to `null`.
    ///
    /// Removed fields win when a path appears in both.
    pub fn to_assignments(&self) -> Document {
        let mut merged = self.updated_fields.clone();
        for field in &self.removed_fields {
            merged.insert(field.clone(), Value::Null);
        }
        merged
    }

    pub fn is_empty(&self) -> bool {
        self.updated_fields.is_empty() && self.removed_fields.is_empty()
    }
}

/// A single change to one source document, keyed by its identity.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent {
    Insert {
        id: Value,
        document: Document,
    },
    Update {
        id: Value,
        update: UpdateDescription,
        /// Post-image of the document, when the stream looked it up.
        full_document: Option<Document>,
    },
    Replace {
        id: Value,
        document: Document,
    },
    Delete {
        id: Value,
    },
}

impl ChangeEvent {
    pub fn operation_type(&self) -> OperationType {
        match self {
            Self::Insert { .. } => OperationType::Insert,
            Self::Update { .. } => OperationType::Update,
            Self::Replace { .. } => OperationType::Replace,
            Self::Delete { .. } => OperationType::Delete,
        }
    }

    /// Identity of the changed document.
    pub fn id(&self) -> &Value {
        match self {
            Self::Insert { id, .. }
            | Self::Update { id, .. }
            | Self::Replace { id, .. }
            | Self::Delete { id } => id,
        }
    }

    pub fn is_insert(&self) -> bool {
        matches!(self, Self::Insert { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_operation_type_display() {
        assert_eq!(OperationType::Insert.to_string(), "insert");
        assert_eq!(OperationType::Replace.to_string(), "replace");
    }

    #[test]
    fn test_update_description_assignments() {
        let update = UpdateDescription {
            updated_fields: doc(json!({"name": "Acme", "address.state": "CA"})),
            removed_fields: vec!["legacy".to_string()],
        };
        let merged = update.to_assignments();
        let keys: Vec<&str> = merged.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["name", "address.state", "legacy"]);
        assert_eq!(merged["legacy"], Value::Null);
    }

    #[test]
    fn test_update_description_empty() {
        assert!(UpdateDescription::default().is_empty());
        assert!(UpdateDescription::default().to_assignments().is_empty());
    }

    #[test]
    fn test_change_event_accessors() {
        let event = ChangeEvent::Delete { id: json!("abc") };
        assert_eq!(event.operation_type(), OperationType::Delete);
        assert_eq!(event.id(), &json!("abc"));
        assert!(!event.is_insert());

        let event = ChangeEvent::Insert {
            id: json!(1),
            document: doc(json!({"_id": 1})),
        };
        assert!(event.is_insert());
    }
}
