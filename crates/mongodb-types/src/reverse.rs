//! Reverse conversion: BSON value → JSON value.
//!
//! ObjectIds become their hex string, dates become RFC 3339 strings with
//! millisecond precision and binary data becomes standard base64. Document
//! key order is preserved.

use base64::{engine::general_purpose, Engine as _};
use bson::Bson;
use chrono::SecondsFormat;
use serde_json::{json, Number, Value};
use sync_core::{Document, SOURCE_ID_FIELD};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConversionError {
    #[error("Cannot represent non-finite double {0} as JSON")]
    NonFiniteDouble(f64),

    #[error("Cannot convert Decimal128 '{0}' to a number")]
    InvalidDecimal(String),

    #[error("Timestamp {0} is out of range")]
    TimestampOutOfRange(u32),

    #[error("Document is missing the _id field")]
    MissingId,
}

/// Convert a single BSON value to JSON.
pub fn bson_to_json(value: Bson) -> Result<Value, ConversionError> {
    match value {
        Bson::Double(f) => Number::from_f64(f)
            .map(Value::Number)
            .ok_or(ConversionError::NonFiniteDouble(f)),
        Bson::String(s) | Bson::Symbol(s) | Bson::JavaScriptCode(s) => Ok(Value::String(s)),
        Bson::Array(items) => items
            .into_iter()
            .map(bson_to_json)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Bson::Document(doc) => document_to_json(doc).map(Value::Object),
        Bson::Boolean(b) => Ok(Value::Bool(b)),
        Bson::Null | Bson::Undefined => Ok(Value::Null),
        Bson::RegularExpression(regex) => Ok(Value::String(format!(
            "/{}/{}",
            regex.pattern, regex.options
        ))),
        Bson::JavaScriptCodeWithScope(code) => Ok(json!({
            "$code": code.code,
            "$scope": document_to_json(code.scope)?,
        })),
        Bson::Int32(i) => Ok(json!(i)),
        Bson::Int64(i) => Ok(json!(i)),
        Bson::Timestamp(ts) => chrono::DateTime::from_timestamp(i64::from(ts.time), 0)
            .map(|dt| Value::String(dt.to_rfc3339_opts(SecondsFormat::Millis, true)))
            .ok_or(ConversionError::TimestampOutOfRange(ts.time)),
        Bson::Binary(binary) => Ok(Value::String(
            general_purpose::STANDARD.encode(binary.bytes),
        )),
        Bson::ObjectId(oid) => Ok(Value::String(oid.to_hex())),
        Bson::DateTime(dt) => Ok(Value::String(
            dt.to_chrono().to_rfc3339_opts(SecondsFormat::Millis, true),
        )),
        Bson::Decimal128(d) => {
            let text = d.to_string();
            text.parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or(ConversionError::InvalidDecimal(text))
        }
        Bson::MaxKey => Ok(json!({"$maxKey": 1})),
        Bson::MinKey => Ok(json!({"$minKey": 1})),
        // DbPointer fields are private; keep a marker.
        Bson::DbPointer(_) => Ok(Value::String("$dbPointer".to_string())),
    }
}

/// Convert a BSON document to a JSON object, keeping key order.
pub fn document_to_json(doc: bson::Document) -> Result<Document, ConversionError> {
    doc.into_iter()
        .map(|(key, value)| bson_to_json(value).map(|value| (key, value)))
        .collect()
}

/// Identity of a change event's `documentKey`.
pub fn document_key_id(key: &bson::Document) -> Result<Value, ConversionError> {
    key.get(SOURCE_ID_FIELD)
        .cloned()
        .ok_or(ConversionError::MissingId)
        .and_then(bson_to_json)
}
