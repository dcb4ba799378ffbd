//! Reading a collection's `$jsonSchema` validator.

use anyhow::{Context, Result};
use bson::{doc, Bson};
use futures::TryStreamExt;
use mongodb::Database;
use serde_json::Value;

/// The `$jsonSchema` validator of `collection`, as relaxed extended JSON.
///
/// Returns `Ok(None)` when the collection does not exist or has no
/// `$jsonSchema` validator.
pub async fn get_collection_schema(db: &Database, collection: &str) -> Result<Option<Value>> {
    tracing::debug!("Listing collection '{}' in '{}'", collection, db.name());
    let mut cursor = db
        .list_collections()
        .filter(doc! { "name": collection })
        .await
        .with_context(|| format!("Failed to list collection '{collection}'"))?;

    while let Some(info) = cursor.try_next().await? {
        if info.name != collection {
            continue;
        }
        let schema = info
            .options
            .validator
            .as_ref()
            .and_then(json_schema_from_validator);
        if schema.is_none() {
            tracing::warn!("Collection '{}' has no $jsonSchema validator", collection);
        }
        return Ok(schema);
    }
    tracing::warn!("Collection '{}' not found in '{}'", collection, db.name());
    Ok(None)
}

/// Extract `$jsonSchema` from a validator document.
pub fn json_schema_from_validator(validator: &bson::Document) -> Option<Value> {
    match validator.get("$jsonSchema") {
        Some(schema @ Bson::Document(_)) => Some(schema.clone().into_relaxed_extjson()),
        _ => None,
    }
}
