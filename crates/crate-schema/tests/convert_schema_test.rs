//! End-to-end conversion of an organisation collection schema.

use crate_schema::{
    convert_schema, ColumnFlag, ConvertError, ConvertOptions, NodeValue, Override,
    SchemaConverter,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use sync_core::{SyncEvent, SyncObserver};

const TABLE: &str = "\"doc\".\"foobar\"";

fn schema() -> Value {
    json!({
        "bsonType": "object",
        "additionalProperties": false,
        "required": ["name", "type"],
        "properties": {
            "_id": {"bsonType": "objectId"},
            "name": {"bsonType": ["string", "null"]},
            "description": {"bsonType": "string"},
            "numberOfEmployees": {
                "bsonType": "string",
                "enum": ["1 - 5", "6 - 20", "21 - 50", "51 - 200", "201 - 500", "500+"]
            },
            "notificationPreferences": {
                "bsonType": "array",
                "items": {
                    "bsonType": "string",
                    "enum": [
                        "newMatchingRFQ",
                        "activityOnRFQWhereParticipant",
                        "activityOnRFQBySameOrgUsers"
                    ]
                }
            },
            "addresses": {
                "bsonType": "array",
                "items": {
                    "bsonType": "object",
                    "additionalProperties": false,
                    "properties": {
                        "address": {
                            "bsonType": "object",
                            "additionalProperties": false,
                            "properties": {
                                "street": {"bsonType": "string"},
                                "city": {"bsonType": "string"},
                                "county": {"bsonType": "string"},
                                "state": {"bsonType": "string"},
                                "zip": {"bsonType": "string"},
                                "country": {"bsonType": "string"},
                                "latitude": {"bsonType": "number"},
                                "longitude": {"bsonType": "number"}
                            }
                        },
                        "name": {"bsonType": "string"},
                        "isPrimary": {"bsonType": "bool"}
                    }
                }
            },
            "integrations": {
                "bsonType": "object",
                "additionalProperties": true,
                "properties": {
                    "stripe": {
                        "bsonType": "object",
                        "additionalProperties": true,
                        "properties": {
                            "priceId": {"bsonType": "number"},
                            "subscriptionStatus": {"bsonType": "string"}
                        }
                    }
                }
            },
            "metadata": {"bsonType": "object"}
        }
    })
}

/// The default rendering with a handful of lines substituted.
fn expected(replacements: &[(&str, &str)]) -> String {
    let mut ddl = r#"CREATE TABLE IF NOT EXISTS "doc"."foobar" (
  "id" TEXT PRIMARY KEY,
  "name" TEXT,
  "description" TEXT,
  "numberOfEmployees" TEXT,
  "notificationPreferences" ARRAY (
    TEXT
  ),
  "addresses" ARRAY (
    OBJECT(DYNAMIC) AS (
      "address" OBJECT(DYNAMIC) AS (
        "street" TEXT,
        "city" TEXT,
        "county" TEXT,
        "state" TEXT,
        "zip" TEXT,
        "country" TEXT,
        "latitude" BIGINT,
        "longitude" BIGINT
      ),
      "name" TEXT,
      "isPrimary" BOOLEAN
    )
  ),
  "integrations" OBJECT(DYNAMIC) AS (
    "stripe" OBJECT(DYNAMIC) AS (
      "priceId" BIGINT,
      "subscriptionStatus" TEXT
    )
  ),
  "metadata" OBJECT(IGNORED)
) WITH (column_policy = 'dynamic')"#
        .to_string();
    for (from, to) in replacements {
        assert!(ddl.contains(from), "expected text missing: {from}");
        ddl = ddl.replacen(from, to, 1);
    }
    ddl
}

fn number_to_double() -> Override {
    Override::new("*").with_mapper(|mut value: NodeValue| {
        if value.is_type("number") {
            value.bson_type = Some("double".into());
        }
        value
    })
}

#[test]
fn test_convert_schema() {
    let ddl = convert_schema(&schema(), TABLE, &ConvertOptions::default()).unwrap();
    assert_eq!(ddl, expected(&[]));
}

#[test]
fn test_convert_schema_strict_mode() {
    let options = ConvertOptions {
        strict_mode: true,
        ..Default::default()
    };
    let ddl = convert_schema(&schema(), TABLE, &options).unwrap();
    assert_eq!(
        ddl,
        expected(&[
            ("    OBJECT(DYNAMIC) AS (", "    OBJECT(STRICT) AS ("),
            (
                "\"address\" OBJECT(DYNAMIC) AS (",
                "\"address\" OBJECT(STRICT) AS ("
            ),
            ("column_policy = 'dynamic'", "column_policy = 'strict'"),
        ])
    );
}

#[test]
fn test_omit_fields() {
    let options = ConvertOptions {
        omit: vec![
            "addresses.address.country".to_string(),
            "integrations".to_string(),
        ],
        ..Default::default()
    };
    let ddl = convert_schema(&schema(), TABLE, &options).unwrap();
    let integrations = r#"  "integrations" OBJECT(DYNAMIC) AS (
    "stripe" OBJECT(DYNAMIC) AS (
      "priceId" BIGINT,
      "subscriptionStatus" TEXT
    )
  ),
"#;
    assert_eq!(
        ddl,
        expected(&[
            ("        \"country\" TEXT,\n", ""),
            (integrations, ""),
        ])
    );
}

#[test]
fn test_override_type_and_flags() {
    let options = ConvertOptions {
        overrides: vec![
            Override::new("addresses.address.l*").with_bson_type("double"),
            Override::new("description").with_flags(vec![
                ColumnFlag::NotNull,
                ColumnFlag::IndexOff,
                ColumnFlag::ColumnStoreOff,
            ]),
            Override::new("numberOfEmployees").with_flags(vec![]),
        ],
        ..Default::default()
    };
    let ddl = convert_schema(&schema(), TABLE, &options).unwrap();
    assert_eq!(
        ddl,
        expected(&[
            (
                "\"description\" TEXT,",
                "\"description\" TEXT NOT NULL INDEX OFF STORAGE WITH (columnstore = false),"
            ),
            ("\"latitude\" BIGINT", "\"latitude\" DOUBLE PRECISION"),
            ("\"longitude\" BIGINT", "\"longitude\" DOUBLE PRECISION"),
        ])
    );
}

#[test]
fn test_override_with_mapper() {
    let options = ConvertOptions {
        overrides: vec![number_to_double()],
        ..Default::default()
    };
    let ddl = convert_schema(&schema(), TABLE, &options).unwrap();
    assert_eq!(
        ddl,
        expected(&[
            ("\"latitude\" BIGINT", "\"latitude\" DOUBLE PRECISION"),
            ("\"longitude\" BIGINT", "\"longitude\" DOUBLE PRECISION"),
            ("\"priceId\" BIGINT", "\"priceId\" DOUBLE PRECISION"),
        ])
    );
}

#[test]
fn test_multiple_overrides_apply_in_sequence() {
    let options = ConvertOptions {
        overrides: vec![
            Override::new("*.zip").with_bson_type("number"),
            number_to_double(),
            Override::new("addresses.address.latitude").with_bson_type("number"),
        ],
        ..Default::default()
    };
    let ddl = convert_schema(&schema(), TABLE, &options).unwrap();
    assert_eq!(
        ddl,
        expected(&[
            ("\"zip\" TEXT", "\"zip\" DOUBLE PRECISION"),
            ("\"longitude\" BIGINT", "\"longitude\" DOUBLE PRECISION"),
            ("\"priceId\" BIGINT", "\"priceId\" DOUBLE PRECISION"),
        ])
    );
}

#[test]
fn test_rename_fields() {
    let mut options = ConvertOptions::default();
    options
        .rename
        .insert("numberOfEmployees".to_string(), "numEmployees".to_string());
    options.rename.insert(
        "integrations.stripe.subscriptionStatus".to_string(),
        "integrations.stripe.status".to_string(),
    );
    options
        .rename
        .insert("addresses.address".to_string(), "addresses.address1".to_string());
    let ddl = convert_schema(&schema(), TABLE, &options).unwrap();
    assert_eq!(
        ddl,
        expected(&[
            ("\"numberOfEmployees\" TEXT", "\"numEmployees\" TEXT"),
            (
                "\"address\" OBJECT(DYNAMIC)",
                "\"address1\" OBJECT(DYNAMIC)"
            ),
            ("\"subscriptionStatus\" TEXT", "\"status\" TEXT"),
        ])
    );
}

#[test]
fn test_rename_with_different_prefix_fails() {
    let mut options = ConvertOptions::default();
    options
        .rename
        .insert("integrations.stripe".to_string(), "foo.bar".to_string());
    let err = convert_schema(&schema(), TABLE, &options).unwrap_err();
    assert!(matches!(err, ConvertError::InvalidRenamePrefix(_)));
    assert_eq!(
        err.to_string(),
        "Rename path prefix does not match: integrations.stripe"
    );
}

#[test]
fn test_rename_to_duplicate_path_fails() {
    let mut options = ConvertOptions::default();
    options
        .rename
        .insert("description".to_string(), "name".to_string());
    let err = convert_schema(&schema(), TABLE, &options).unwrap_err();
    assert_eq!(err.to_string(), "Duplicate paths found: name");
}

#[test]
fn test_identity_collision_fails() {
    let schema = json!({
        "properties": {
            "_id": {"bsonType": "objectId"},
            "id": {"bsonType": "string"}
        }
    });
    let err = convert_schema(&schema, TABLE, &ConvertOptions::default()).unwrap_err();
    assert_eq!(err.to_string(), "Duplicate paths found: id");
}

#[test]
fn test_map_schema_replaces_leaf() {
    let target: Vec<String> = [
        "properties",
        "addresses",
        "items",
        "properties",
        "address",
        "properties",
        "zip",
        "bsonType",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    let options = ConvertOptions {
        map_schema: Some(Arc::new(move |path: &[String], value: Value| {
            if path == target.as_slice() {
                json!("number")
            } else {
                value
            }
        })),
        ..Default::default()
    };
    let ddl = convert_schema(&schema(), TABLE, &options).unwrap();
    assert_eq!(ddl, expected(&[("\"zip\" TEXT", "\"zip\" BIGINT")]));
}

#[test]
fn test_unknown_type_fails_without_output() {
    let schema = json!({
        "properties": {"_id": {"bsonType": "objectId"}, "blob": {"bsonType": "binData"}}
    });
    let err = convert_schema(&schema, TABLE, &ConvertOptions::default()).unwrap_err();
    assert!(matches!(err, ConvertError::UnknownType { .. }));
}

#[test]
fn test_every_leaf_renders_one_line() {
    let ddl = convert_schema(&schema(), TABLE, &ConvertOptions::default()).unwrap();
    let leaf_lines = ddl
        .lines()
        .filter(|l| !l.ends_with('(') && !l.trim_start().starts_with(')'))
        .count();
    // 5 top-level leaves, 1 array element, 10 under addresses, 2 under stripe
    assert_eq!(leaf_lines, 18);
    let opened = ddl.matches(" (\n").count();
    let closed = ddl.lines().filter(|l| l.trim_start().starts_with(')')).count();
    assert_eq!(opened, closed);
}

#[derive(Default)]
struct Recorder(Mutex<Vec<SyncEvent>>);

impl SyncObserver for Recorder {
    fn observe(&self, event: &SyncEvent) {
        self.0.lock().unwrap().push(event.clone());
    }
}

#[test]
fn test_converter_notifies_observer() {
    let recorder = Arc::new(Recorder::default());
    let converter =
        SchemaConverter::new(ConvertOptions::default()).with_observer(recorder.clone());
    converter.convert(&schema(), TABLE).unwrap();
    let events = recorder.0.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert!(matches!(
        &events[0],
        SyncEvent::TableDefinitionRendered { table, .. } if table == TABLE
    ));
}

#[test]
fn test_converter_does_not_notify_on_error() {
    let recorder = Arc::new(Recorder::default());
    let mut options = ConvertOptions::default();
    options
        .rename
        .insert("description".to_string(), "name".to_string());
    let converter = SchemaConverter::new(options).with_observer(recorder.clone());
    assert!(converter.convert(&schema(), TABLE).is_err());
    assert!(recorder.0.lock().unwrap().is_empty());
}
