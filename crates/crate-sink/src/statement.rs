//! Parameterized statements for one CrateDB table.
//!
//! Every statement uses positional `?` placeholders. Column lists and
//! argument rows are always built from the same key sequence so the two
//! cannot drift apart, even when records in a bulk insert have different
//! sets of fields.

use serde_json::Value;
use std::collections::{BTreeSet, HashSet};
use sync_core::ident::{quote_identifier, quote_subscript};
use sync_core::path::has_numeric_segment;
use sync_core::{Document, ID_COLUMN};

/// Positional arguments of a [`Statement`].
#[derive(Debug, Clone, PartialEq)]
pub enum StatementArgs {
    /// One row of arguments.
    Single(Vec<Value>),
    /// One row per bulk member; every row has one value per placeholder.
    Bulk(Vec<Vec<Value>>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub args: StatementArgs,
}

impl Statement {
    /// A statement without placeholders, e.g. DDL.
    pub fn sql(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            args: StatementArgs::Single(Vec::new()),
        }
    }

    pub fn is_bulk(&self) -> bool {
        matches!(self.args, StatementArgs::Bulk(_))
    }

    /// Rows this statement carries arguments for.
    pub fn row_count(&self) -> usize {
        match &self.args {
            StatementArgs::Single(_) => 1,
            StatementArgs::Bulk(rows) => rows.len(),
        }
    }
}

/// Quote a dotted column reference: `foo.bar.baz` → `"foo"['bar']['baz']`.
pub fn quote_column(column: &str) -> String {
    let mut segments = column.split('.');
    let mut quoted = quote_identifier(segments.next().unwrap_or_default());
    for segment in segments {
        quoted.push_str(&quote_subscript(segment));
    }
    quoted
}

/// Sorted union of the top-level keys of `records`.
pub fn unique_keys(records: &[Document]) -> Vec<String> {
    records
        .iter()
        .flat_map(|record| record.keys().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn columns_and_placeholders<'a, I>(keys: I) -> (String, String)
where
    I: IntoIterator<Item = &'a String>,
{
    let (columns, placeholders): (Vec<String>, Vec<&str>) = keys
        .into_iter()
        .map(|key| (quote_identifier(key), "?"))
        .unzip();
    (columns.join(","), placeholders.join(","))
}

/// `SET` assignments for `update` plus the values bound to them.
///
/// A path with an array index (`items.0.qty`) cannot be assigned in place,
/// so the whole top-level field is replaced with its value from `record`
/// (`null` if `record` lacks it). Other paths are assigned through
/// subscripts.
pub fn assignments_and_updates(record: &Document, update: &Document) -> (String, Vec<Value>) {
    let mut assignments = Vec::with_capacity(update.len());
    let mut updates = Vec::with_capacity(update.len());
    let mut replaced_roots = HashSet::new();
    for (column, value) in update {
        if has_numeric_segment(column) {
            let root = column.split('.').next().unwrap_or_default();
            if !replaced_roots.insert(root) {
                continue;
            }
            assignments.push(format!("{} = ?", quote_column(root)));
            updates.push(record.get(root).cloned().unwrap_or(Value::Null));
        } else {
            assignments.push(format!("{} = ?", quote_column(column)));
            updates.push(value.clone());
        }
    }
    (assignments.join(","), updates)
}

/// Builds statements against a single qualified table.
#[derive(Debug, Clone)]
pub struct StatementBuilder {
    qualified_name: String,
    id_column: String,
}

impl StatementBuilder {
    pub fn new(qualified_name: impl Into<String>) -> Self {
        Self {
            qualified_name: qualified_name.into(),
            id_column: ID_COLUMN.to_string(),
        }
    }

    /// Use `id_column` as the conflict target and delete key.
    pub fn with_id_column(mut self, id_column: impl Into<String>) -> Self {
        self.id_column = id_column.into();
        self
    }

    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    pub fn id_column(&self) -> &str {
        &self.id_column
    }

    /// Columns in the record's own key order.
    pub fn insert(&self, record: &Document) -> Statement {
        let (columns, placeholders) = columns_and_placeholders(record.keys());
        Statement {
            sql: format!(
                "INSERT INTO {} ({columns}) VALUES ({placeholders})",
                self.qualified_name
            ),
            args: StatementArgs::Single(record.values().cloned().collect()),
        }
    }

    /// Columns are the sorted union of all record keys; missing values are `null`.
    pub fn bulk_insert(&self, records: &[Document]) -> Statement {
        let keys = unique_keys(records);
        let (columns, placeholders) = columns_and_placeholders(&keys);
        let rows = records
            .iter()
            .map(|record| {
                keys.iter()
                    .map(|key| record.get(key).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .collect();
        Statement {
            sql: format!(
                "INSERT INTO {} ({columns}) VALUES ({placeholders})",
                self.qualified_name
            ),
            args: StatementArgs::Bulk(rows),
        }
    }

    /// Insert `record`, or apply `update` to the existing row with the same id.
    pub fn upsert(&self, record: &Document, update: &Document) -> Statement {
        let (columns, placeholders) = columns_and_placeholders(record.keys());
        let (assignments, updates) = assignments_and_updates(record, update);
        let args = record.values().cloned().chain(updates).collect();
        Statement {
            sql: format!(
                "INSERT INTO {} ({columns}) VALUES ({placeholders}) \
                 ON CONFLICT ({}) DO UPDATE SET {assignments}",
                self.qualified_name,
                quote_identifier(&self.id_column),
            ),
            args: StatementArgs::Single(args),
        }
    }

    pub fn delete_by_id(&self, id: &Value) -> Statement {
        Statement {
            sql: format!(
                "DELETE FROM {} WHERE {} = ?",
                self.qualified_name,
                quote_identifier(&self.id_column)
            ),
            args: StatementArgs::Single(vec![id.clone()]),
        }
    }
}
