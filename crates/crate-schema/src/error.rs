//! Error types for schema conversion.

/// Configuration errors raised while converting a schema.
///
/// All of these are fatal and detected before any table text is produced.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// The schema root is not a JSON object
    #[error("Schema root must be an object")]
    InvalidSchema,

    /// A rename would move a field under a different parent
    #[error("Rename path prefix does not match: {0}")]
    InvalidRenamePrefix(String),

    /// Two or more fields resolve to the same path after renaming
    #[error("Duplicate paths found: {}", .0.join(", "))]
    DuplicatePaths(Vec<String>),

    /// A leaf declares a bsonType with no column type mapping
    #[error("Unsupported bsonType '{bson_type}' at path '{path}'")]
    UnknownType { path: String, bson_type: String },

    /// A leaf declares no bsonType at all
    #[error("Missing bsonType at path '{path}'")]
    MissingType { path: String },

    /// An override path is not a valid glob
    #[error("Invalid override path '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },
}
