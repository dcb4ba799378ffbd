//! CrateDB table definitions from MongoDB `$jsonSchema` validators.
//!
//! The conversion is a fixed pipeline over a flat, pre-order list of
//! [`SchemaNode`]s:
//!
//! ```text
//! walk → strip array markers → omit → rename (+ _id → id) → duplicate check
//!      → overrides → render
//! ```
//!
//! # Example
//!
//! ```rust
//! use crate_schema::{convert_schema, ConvertOptions};
//! use serde_json::json;
//!
//! let schema = json!({
//!     "bsonType": "object",
//!     "properties": {
//!         "_id": {"bsonType": "objectId"},
//!         "name": {"bsonType": "string"}
//!     }
//! });
//! let ddl = convert_schema(&schema, "\"doc\".\"users\"", &ConvertOptions::default()).unwrap();
//! assert!(ddl.starts_with("CREATE TABLE IF NOT EXISTS \"doc\".\"users\""));
//! assert!(ddl.contains("\"id\" TEXT PRIMARY KEY"));
//! ```

mod convert;
mod error;
pub mod node;
mod options;
pub mod render;
pub mod stages;
pub mod types;
pub mod walker;

pub use convert::{convert_schema, SchemaConverter};
pub use error::ConvertError;
pub use node::{BsonType, ColumnFlag, NodeKey, NodeKind, NodeValue, SchemaNode};
pub use options::{ConvertOptions, NodeMapper, Override};
pub use walker::{map_schema, walk, SchemaMapFn};
