//! BSON type → CrateDB column type, and column flag → SQL modifier.
//!
//! These two tables are the only place column types and modifiers are spelled.

use crate::node::ColumnFlag;

/// Column type for objects whose contents are not declared.
pub const IGNORED_OBJECT: &str = "OBJECT(IGNORED)";

const BSON_TYPE_TO_SQL: &[(&str, &str)] = &[
    ("objectId", "TEXT"),
    ("string", "TEXT"),
    ("date", "TIMESTAMP WITH TIME ZONE"),
    ("timestamp", "TIMESTAMP WITH TIME ZONE"),
    ("number", "BIGINT"),
    ("long", "BIGINT"),
    ("int", "INTEGER"),
    ("double", "DOUBLE PRECISION"),
    ("decimal", "DOUBLE PRECISION"),
    ("bool", "BOOLEAN"),
    ("object", IGNORED_OBJECT),
];

/// CrateDB column type for a BSON type tag.
pub fn sql_type(bson_type: &str) -> Option<&'static str> {
    BSON_TYPE_TO_SQL
        .iter()
        .find(|(tag, _)| *tag == bson_type)
        .map(|(_, sql)| *sql)
}

/// SQL modifier appended after the column type, including its leading space.
pub fn flag_modifier(flag: ColumnFlag) -> &'static str {
    match flag {
        ColumnFlag::NotNull => " NOT NULL",
        ColumnFlag::IndexOff => " INDEX OFF",
        ColumnFlag::ColumnStoreOff => " STORAGE WITH (columnstore = false)",
    }
}
