//! Per-table options read from a YAML file.
//!
//! ```yaml
//! table_name: organizations
//! omit: [integrations]
//! rename:
//!   numberOfEmployees: numEmployees
//! overrides:
//!   - path: "addresses.*.zip"
//!     bson_type: string
//!     flags: [indexOff]
//! strict_mode: true
//! batch_inserts: true
//! ```

use anyhow::Context;
use crate_schema::ConvertOptions;
use mongo2crate_mongodb_changestream_source::DocumentMapper;
use serde::Deserialize;
use std::path::Path;
use sync_core::ident::qualified_name;

/// Schema a table lands in when none is given.
pub const DEFAULT_CRATE_SCHEMA: &str = "doc";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Target table. Defaults to the collection name, lower-cased.
    #[serde(alias = "tableName")]
    pub table_name: Option<String>,
    #[serde(flatten)]
    pub convert: ConvertOptions,
    /// Merge adjacent inserts of a change stream batch into one bulk insert.
    #[serde(alias = "batchInserts")]
    pub batch_inserts: bool,
}

impl TableConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read table config {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse table config {}", path.display()))
    }

    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        // An empty file is a valid, empty config
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load `path` if given, the defaults otherwise.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn table_name(&self, collection: &str) -> String {
        self.table_name
            .clone()
            .unwrap_or_else(|| collection.to_lowercase())
    }

    /// `"<schema>"."<table>"` for `collection`.
    pub fn qualified_name(&self, crate_schema: &str, collection: &str) -> String {
        qualified_name(crate_schema, &self.table_name(collection))
    }

    /// Mapper applying the same renames as the table definition.
    pub fn document_mapper(&self) -> anyhow::Result<DocumentMapper> {
        Ok(DocumentMapper::new(&self.convert.rename)?)
    }
}
