//! Document mapping applied before anything is written.
//!
//! Every leaf goes through the optional leaf mapper first. Renames follow,
//! using the same rules and the same [`rename_path`] as table creation
//! (including `_id` → `id`), so a mapped document always matches the
//! generated table.
//!
//! Renames apply at any depth. Arrays are transparent: a rule for
//! `addresses.address` renames `address` inside every element of
//! `addresses`. Dotted keys, as found in update descriptions, are matched
//! segment by segment with array indexes skipped, so `addresses.0.address.zip`
//! is renamed by the same rule.

use crate_schema::stages::{compile_renames, identity_path, rename_path, RenameRule};
use crate_schema::ConvertError;
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use sync_core::path::join_path;
use sync_core::{Document, SOURCE_ID_FIELD};

/// Transform applied to every scalar value of a document.
pub type LeafMapper = Arc<dyn Fn(Value) -> Value + Send + Sync>;

#[derive(Clone)]
pub struct DocumentMapper {
    leaf_mapper: Option<LeafMapper>,
    renames: Vec<RenameRule>,
    id_column: String,
}

impl DocumentMapper {
    /// Validate `rename` the way table creation does.
    pub fn new(rename: &IndexMap<String, String>) -> Result<Self, ConvertError> {
        Ok(Self {
            leaf_mapper: None,
            renames: compile_renames(rename)?,
            id_column: join_path(&identity_path(rename)),
        })
    }

    pub fn with_leaf_mapper<F>(mut self, mapper: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.leaf_mapper = Some(Arc::new(mapper));
        self
    }

    /// Column the identity field ends up in.
    pub fn id_column(&self) -> &str {
        &self.id_column
    }

    pub fn map(&self, document: Document) -> Document {
        let document = match &self.leaf_mapper {
            Some(mapper) => map_object_leaves(document, mapper.as_ref()),
            None => document,
        };
        rename_object(document, &[], &self.renames)
    }

    /// Map an identity value the way it is mapped inside a document.
    pub fn map_id(&self, id: &Value) -> Value {
        match &self.leaf_mapper {
            Some(mapper) => map_leaves(id.clone(), mapper.as_ref()),
            None => id.clone(),
        }
    }

    /// The smallest document carrying `id`, for updates without a post-image.
    pub fn id_document(&self, id: &Value) -> Document {
        let mut document = Document::new();
        document.insert(SOURCE_ID_FIELD.to_string(), id.clone());
        self.map(document)
    }
}

impl fmt::Debug for DocumentMapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentMapper")
            .field("leaf_mapper", &self.leaf_mapper.as_ref().map(|_| "<fn>"))
            .field("renames", &self.renames)
            .field("id_column", &self.id_column)
            .finish()
    }
}

fn map_leaves(value: Value, mapper: &(dyn Fn(Value) -> Value + Send + Sync)) -> Value {
    match value {
        Value::Object(map) => Value::Object(map_object_leaves(map, mapper)),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| map_leaves(item, mapper))
                .collect(),
        ),
        leaf => mapper(leaf),
    }
}

fn map_object_leaves(map: Document, mapper: &(dyn Fn(Value) -> Value + Send + Sync)) -> Document {
    map.into_iter()
        .map(|(key, value)| (key, map_leaves(value, mapper)))
        .collect()
}

fn rename_value(value: Value, source: &[String], rules: &[RenameRule]) -> Value {
    match value {
        Value::Object(map) => Value::Object(rename_object(map, source, rules)),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| rename_value(item, source, rules))
                .collect(),
        ),
        leaf => leaf,
    }
}

fn rename_object(map: Document, source: &[String], rules: &[RenameRule]) -> Document {
    map.into_iter()
        .map(|(key, value)| {
            let (key, child_source) = rename_key(&key, source, rules);
            (key, rename_value(value, &child_source, rules))
        })
        .collect()
}

/// Rename the segments of a (possibly dotted) key found under `source`.
///
/// `source` is the field path before renaming, without array indexes. Returns
/// the new key and the source path of its value.
fn rename_key(key: &str, source: &[String], rules: &[RenameRule]) -> (String, Vec<String>) {
    let mut source = source.to_vec();
    let mut segments = Vec::new();
    for (i, segment) in key.split('.').enumerate() {
        if i > 0 && !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
            segments.push(segment.to_string());
            continue;
        }
        source.push(segment.to_string());
        let renamed = rename_path(&source, rules);
        segments.push(renamed.last().cloned().unwrap_or_default());
    }
    (segments.join("."), source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            other => panic!("expected an object, got {other}"),
        }
    }

    fn mapper(pairs: &[(&str, &str)]) -> DocumentMapper {
        let rename = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        DocumentMapper::new(&rename).unwrap()
    }

    #[test]
    fn test_identity_rename() {
        let mapped = mapper(&[]).map(doc(json!({"_id": "abc", "name": "Acme"})));
        assert_eq!(Value::Object(mapped), json!({"id": "abc", "name": "Acme"}));
    }

    #[test]
    fn test_rename_keeps_key_order() {
        let mapped = mapper(&[("numberOfEmployees", "numEmployees")])
            .map(doc(json!({"_id": 1, "numberOfEmployees": "1 - 5", "name": "x"})));
        let keys: Vec<&str> = mapped.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["id", "numEmployees", "name"]);
    }

    #[test]
    fn test_rename_nested_and_inside_arrays() {
        let m = mapper(&[
            ("integrations.stripe.subscriptionStatus", "integrations.stripe.status"),
            ("addresses.address", "addresses.address1"),
        ]);
        let mapped = m.map(doc(json!({
            "_id": 1,
            "addresses": [{"address": {"zip": "1"}}, {"address": {"zip": "2"}, "name": "b"}],
            "integrations": {"stripe": {"subscriptionStatus": "active"}}
        })));
        assert_eq!(
            Value::Object(mapped),
            json!({
                "id": 1,
                "addresses": [{"address1": {"zip": "1"}}, {"address1": {"zip": "2"}, "name": "b"}],
                "integrations": {"stripe": {"status": "active"}}
            })
        );
    }

    #[test]
    fn test_rename_dotted_update_keys() {
        let m = mapper(&[
            ("integrations.stripe.subscriptionStatus", "integrations.stripe.status"),
            ("addresses.address", "addresses.address1"),
        ]);
        let mapped = m.map(doc(json!({
            "integrations.stripe.subscriptionStatus": "canceled",
            "addresses.0.address.zip": "90210",
            "integrations.stripe": {"subscriptionStatus": "past_due"}
        })));
        assert_eq!(
            Value::Object(mapped),
            json!({
                "integrations.stripe.status": "canceled",
                "addresses.0.address1.zip": "90210",
                "integrations.stripe": {"status": "past_due"}
            })
        );
    }

    #[test]
    fn test_child_rename_declared_before_parent_rename() {
        let m = mapper(&[
            ("addresses.address", "addresses.address1"),
            ("addresses", "locations"),
        ]);
        let mapped = m.map(doc(json!({
            "_id": "1",
            "addresses": [{"address": "x", "name": "a"}],
            "addresses.0.address": "y"
        })));
        assert_eq!(
            Value::Object(mapped),
            json!({
                "id": "1",
                "locations": [{"address1": "x", "name": "a"}],
                "locations.0.address1": "y"
            })
        );
    }

    #[test]
    fn test_explicit_identity_rename() {
        let m = mapper(&[("_id", "key")]);
        assert_eq!(m.id_column(), "key");
        let mapped = m.map(doc(json!({"_id": 1})));
        assert_eq!(Value::Object(mapped), json!({"key": 1}));
    }

    #[test]
    fn test_leaf_mapper_runs_before_rename() {
        let m = mapper(&[]).with_leaf_mapper(|value| match value {
            Value::String(s) => Value::String(s.to_uppercase()),
            other => other,
        });
        let mapped = m.map(doc(json!({"_id": "abc", "tags": ["a", 1], "meta": {"k": "v"}})));
        assert_eq!(
            Value::Object(mapped),
            json!({"id": "ABC", "tags": ["A", 1], "meta": {"k": "V"}})
        );
        assert_eq!(m.map_id(&json!("abc")), json!("ABC"));
        assert_eq!(Value::Object(m.id_document(&json!("abc"))), json!({"id": "ABC"}));
    }

    #[test]
    fn test_invalid_rename_rejected() {
        let rename = [("a.b".to_string(), "c.d".to_string())].into_iter().collect();
        assert!(DocumentMapper::new(&rename).is_err());
    }
}
