//! Identifier quoting and the identity-field convention.

/// Name of the identity field in source documents.
pub const SOURCE_ID_FIELD: &str = "_id";

/// Column the identity field is written to unless a rename says otherwise.
pub const ID_COLUMN: &str = "id";

/// Double-quote an identifier, doubling any embedded quote.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Single-quote a subscript key, doubling any embedded quote.
pub fn quote_subscript(key: &str) -> String {
    format!("['{}']", key.replace('\'', "''"))
}

/// `"schema"."table"`
pub fn qualified_name(schema: &str, table: &str) -> String {
    format!("{}.{}", quote_identifier(schema), quote_identifier(table))
}
