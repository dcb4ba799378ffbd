//! Conversion of MongoDB driver change events into [`ChangeEvent`]s.

use anyhow::{anyhow, Context, Result};
use mongodb::change_stream::event::{ChangeStreamEvent, OperationType as MongoOperationType};
use mongodb_types::{document_key_id, document_to_json};
use sync_core::{ChangeEvent, UpdateDescription};

/// Convert one driver event.
///
/// Returns `Ok(None)` for events that do not change documents of the
/// watched collection (drop, rename, invalidate and so on).
pub fn convert_change_event(
    event: ChangeStreamEvent<bson::Document>,
) -> Result<Option<ChangeEvent>> {
    let operation = event.operation_type.clone();
    match operation {
        MongoOperationType::Insert
        | MongoOperationType::Update
        | MongoOperationType::Replace
        | MongoOperationType::Delete => {}
        other => {
            tracing::debug!("Skipping change stream event of type {other:?}");
            return Ok(None);
        }
    }

    let key = event
        .document_key
        .as_ref()
        .ok_or_else(|| anyhow!("No document key in {operation:?} change event"))?;
    let id = document_key_id(key).context("Unsupported document key")?;

    let full_document = event
        .full_document
        .map(document_to_json)
        .transpose()
        .with_context(|| format!("Failed to convert full document of {id}"))?;

    let change = match operation {
        MongoOperationType::Insert => ChangeEvent::Insert {
            document: full_document
                .ok_or_else(|| anyhow!("Insert of {id} has no full document"))?,
            id,
        },
        MongoOperationType::Replace => ChangeEvent::Replace {
            document: full_document
                .ok_or_else(|| anyhow!("Replace of {id} has no full document"))?,
            id,
        },
        MongoOperationType::Update => {
            let description = event
                .update_description
                .ok_or_else(|| anyhow!("Update of {id} has no update description"))?;
            let update = UpdateDescription {
                updated_fields: document_to_json(description.updated_fields)
                    .with_context(|| format!("Failed to convert updated fields of {id}"))?,
                removed_fields: description.removed_fields,
            };
            ChangeEvent::Update {
                id,
                update,
                full_document,
            }
        }
        _ => ChangeEvent::Delete { id },
    };
    Ok(Some(change))
}
