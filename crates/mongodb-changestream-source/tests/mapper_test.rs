//! Mapped documents only use columns the generated table declares.

use crate_schema::{convert_schema, ConvertOptions};
use indexmap::IndexMap;
use mongo2crate_mongodb_changestream_source::DocumentMapper;
use serde_json::{json, Value};
use std::collections::BTreeSet;

fn schema() -> Value {
    json!({
        "bsonType": "object",
        "additionalProperties": false,
        "properties": {
            "_id": {"bsonType": "string"},
            "addresses": {
                "bsonType": "array",
                "items": {
                    "bsonType": "object",
                    "additionalProperties": false,
                    "properties": {
                        "address": {
                            "bsonType": "object",
                            "additionalProperties": false,
                            "properties": {"zip": {"bsonType": "string"}}
                        },
                        "name": {"bsonType": "string"}
                    }
                }
            }
        }
    })
}

fn rename(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Every double-quoted identifier in a statement.
fn quoted_identifiers(ddl: &str) -> BTreeSet<String> {
    ddl.split('"').skip(1).step_by(2).map(str::to_string).collect()
}

fn field_names(value: &Value, names: &mut BTreeSet<String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                names.insert(key.clone());
                field_names(child, names);
            }
        }
        Value::Array(items) => items.iter().for_each(|item| field_names(item, names)),
        _ => {}
    }
}

fn assert_mapped_matches_table(pairs: &[(&str, &str)]) -> Value {
    let rename = rename(pairs);
    let options = ConvertOptions {
        rename: rename.clone(),
        strict_mode: true,
        ..Default::default()
    };
    let ddl = convert_schema(&schema(), "\"doc\".\"orgs\"", &options).unwrap();
    let mapper = DocumentMapper::new(&rename).unwrap();

    let document = json!({
        "_id": "1",
        "addresses": [{"address": {"zip": "90210"}, "name": "hq"}]
    });
    let mapped = match document {
        Value::Object(map) => Value::Object(mapper.map(map)),
        _ => unreachable!(),
    };

    let mut fields = BTreeSet::new();
    field_names(&mapped, &mut fields);
    let columns = quoted_identifiers(&ddl);
    assert!(
        fields.is_subset(&columns),
        "mapped fields {fields:?} not all declared in:\n{ddl}"
    );
    mapped
}

#[test]
fn test_child_rename_before_parent_rename_matches_table() {
    let mapped = assert_mapped_matches_table(&[
        ("addresses.address", "addresses.address1"),
        ("addresses", "locations"),
    ]);
    assert_eq!(
        mapped,
        json!({"id": "1", "locations": [{"address1": {"zip": "90210"}, "name": "hq"}]})
    );
}

#[test]
fn test_parent_rename_before_child_rename_matches_table() {
    let mapped = assert_mapped_matches_table(&[
        ("addresses", "locations"),
        ("locations.address", "locations.address1"),
    ]);
    assert_eq!(
        mapped,
        json!({"id": "1", "locations": [{"address1": {"zip": "90210"}, "name": "hq"}]})
    );
}

#[test]
fn test_identity_rename_matches_table() {
    let mapped = assert_mapped_matches_table(&[("_id", "key")]);
    assert_eq!(
        mapped,
        json!({"key": "1", "addresses": [{"address": {"zip": "90210"}, "name": "hq"}]})
    );
}
