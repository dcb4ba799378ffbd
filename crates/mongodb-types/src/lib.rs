//! BSON → JSON conversions for mongo2crate.
//!
//! CrateDB receives documents as JSON arguments, so every BSON value read
//! from MongoDB is converted with [`bson_to_json`] before it reaches the
//! change-application engine.
//!
//! # Example
//!
//! ```rust
//! use bson::{doc, oid::ObjectId};
//! use mongodb_types::document_to_json;
//!
//! let oid = ObjectId::new();
//! let json = document_to_json(doc! { "_id": oid, "name": "Acme" }).unwrap();
//! assert_eq!(json["_id"], serde_json::json!(oid.to_hex()));
//! ```

pub mod reverse;

pub use reverse::{bson_to_json, document_key_id, document_to_json, ConversionError};
