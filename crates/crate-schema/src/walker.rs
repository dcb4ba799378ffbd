//! Pre-order walk of a `$jsonSchema` document into [`SchemaNode`]s.
//!
//! Objects contribute one child per entry of `properties`, in declared order.
//! Arrays contribute a single [`NodeKey::ArrayItems`] child for `items`. A
//! schema with no children (including an object with empty `properties`) is
//! a leaf.

use crate::error::ConvertError;
use crate::node::{NodeKey, NodeKind, NodeValue, SchemaNode, ARRAY_ITEMS_MARKER};
use serde_json::{Map, Value};

/// Transform applied to every raw value of the schema before walking.
///
/// Receives the path of raw JSON keys (e.g. `["properties", "zip", "bsonType"]`)
/// and the value at that path, and returns the replacement.
pub type SchemaMapFn = dyn Fn(&[String], Value) -> Value + Send + Sync;

/// Walk `schema` into a flat node sequence.
///
/// The first node is always the root. Every container is followed directly
/// by all of its descendants.
pub fn walk(schema: &Value) -> Result<Vec<SchemaNode>, ConvertError> {
    let root = schema.as_object().ok_or(ConvertError::InvalidSchema)?;
    let mut nodes = vec![SchemaNode {
        path: Vec::new(),
        key: NodeKey::Root,
        kind: NodeKind::Root,
        value: NodeValue::from_schema(root),
    }];
    let mut path = Vec::new();
    walk_children(root, &mut path, &mut nodes);
    Ok(nodes)
}

fn walk_children(
    schema: &Map<String, Value>,
    path: &mut Vec<String>,
    nodes: &mut Vec<SchemaNode>,
) {
    let Some((_, fields)) = children(schema) else {
        return;
    };
    for (key, child) in fields {
        path.push(match &key {
            NodeKey::Field(name) => name.clone(),
            _ => ARRAY_ITEMS_MARKER.to_string(),
        });
        let kind = children(child).map_or(NodeKind::Leaf, |(kind, _)| kind);
        nodes.push(SchemaNode {
            path: path.clone(),
            key,
            kind,
            value: NodeValue::from_schema(child),
        });
        walk_children(child, path, nodes);
        path.pop();
    }
}

type Children<'a> = Vec<(NodeKey, &'a Map<String, Value>)>;

/// Container kind and children of a schema, or `None` for a leaf.
fn children(schema: &Map<String, Value>) -> Option<(NodeKind, Children<'_>)> {
    if let Some(Value::Object(properties)) = schema.get("properties") {
        let fields: Children<'_> = properties
            .iter()
            .filter_map(|(name, sub)| {
                sub.as_object()
                    .map(|s| (NodeKey::Field(name.clone()), s))
            })
            .collect();
        return (!fields.is_empty()).then_some((NodeKind::Object, fields));
    }
    match schema.get("items") {
        Some(Value::Object(items)) => {
            Some((NodeKind::Array, vec![(NodeKey::ArrayItems, items)]))
        }
        _ => None,
    }
}

/// Apply `f` to every value of `schema`, parents before children.
///
/// Children of the value returned by `f` are visited, so a mapper can
/// replace a whole subtree.
pub fn map_schema(schema: &Value, f: &SchemaMapFn) -> Value {
    let mut path = Vec::new();
    map_value(&mut path, schema.clone(), f)
}

fn map_value(path: &mut Vec<String>, value: Value, f: &SchemaMapFn) -> Value {
    match f(path, value) {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, child)| {
                    path.push(key.clone());
                    let mapped = map_value(path, child, f);
                    path.pop();
                    (key, mapped)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .enumerate()
                .map(|(idx, child)| {
                    path.push(idx.to_string());
                    let mapped = map_value(path, child, f);
                    path.pop();
                    mapped
                })
                .collect(),
        ),
        other => other,
    }
}
