//! Schema → table definition entry point.

use crate::error::ConvertError;
use crate::options::ConvertOptions;
use crate::render::render_table;
use crate::stages::{
    apply_overrides, check_duplicate_paths, compile_overrides, compile_renames, identity_path,
    omit_paths, rename_paths, strip_array_markers,
};
use crate::walker::{map_schema, walk};
use serde_json::Value;
use std::borrow::Cow;
use std::sync::Arc;
use sync_core::{SyncEvent, SyncObserver, TracingObserver};

/// Converts collection schemas into `CREATE TABLE` statements.
pub struct SchemaConverter {
    options: ConvertOptions,
    observer: Arc<dyn SyncObserver>,
}

impl SchemaConverter {
    pub fn new(options: ConvertOptions) -> Self {
        Self {
            options,
            observer: Arc::new(TracingObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn SyncObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Convert `schema` into a table definition for `qualified_name`.
    ///
    /// Rename and override configuration is validated before the schema is
    /// walked; nothing is returned unless every stage succeeds.
    pub fn convert(&self, schema: &Value, qualified_name: &str) -> Result<String, ConvertError> {
        let renames = compile_renames(&self.options.rename)?;
        let overrides = compile_overrides(&self.options.overrides)?;

        let schema = match &self.options.map_schema {
            Some(mapper) => Cow::Owned(map_schema(schema, mapper.as_ref())),
            None => Cow::Borrowed(schema),
        };

        let nodes = walk(&schema)?;
        tracing::trace!("Walked {} schema nodes for {}", nodes.len(), qualified_name);
        let nodes = strip_array_markers(nodes);
        let nodes = omit_paths(nodes, &self.options.omit);
        let nodes = rename_paths(nodes, &renames);
        check_duplicate_paths(&nodes)?;
        let nodes = apply_overrides(nodes, &overrides);

        let identity = identity_path(&self.options.rename);
        let ddl = render_table(&nodes, qualified_name, self.options.strict_mode, &identity)?;

        self.observer.observe(&SyncEvent::TableDefinitionRendered {
            table: qualified_name.to_string(),
            node_count: nodes.len(),
        });
        Ok(ddl)
    }
}

/// Convert `schema` into a table definition using `options`.
pub fn convert_schema(
    schema: &Value,
    qualified_name: &str,
    options: &ConvertOptions,
) -> Result<String, ConvertError> {
    SchemaConverter::new(options.clone()).convert(schema, qualified_name)
}
