//! Conversion options.
//!
//! The declarative parts (`omit`, `rename`, `overrides[].path/bson_type/flags`,
//! `strict_mode`) deserialize from YAML or JSON. Function-valued parts can
//! only be set from code.

use crate::node::{BsonType, ColumnFlag, NodeValue};
use crate::walker::SchemaMapFn;
use indexmap::IndexMap;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;

/// User transform applied to a matched node before literal override fields.
pub type NodeMapper = Arc<dyn Fn(NodeValue) -> NodeValue + Send + Sync>;

/// Change the type, flags, or anything else of every node whose dotted path
/// matches `path` (a glob, e.g. `addresses.*.l*`).
#[derive(Clone, Default, Deserialize)]
pub struct Override {
    pub path: String,
    #[serde(default, alias = "bsonType")]
    pub bson_type: Option<BsonType>,
    #[serde(default)]
    pub flags: Option<Vec<ColumnFlag>>,
    #[serde(skip)]
    pub mapper: Option<NodeMapper>,
}

impl Override {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn with_bson_type(mut self, bson_type: impl Into<BsonType>) -> Self {
        self.bson_type = Some(bson_type.into());
        self
    }

    pub fn with_flags(mut self, flags: Vec<ColumnFlag>) -> Self {
        self.flags = Some(flags);
        self
    }

    pub fn with_mapper<F>(mut self, mapper: F) -> Self
    where
        F: Fn(NodeValue) -> NodeValue + Send + Sync + 'static,
    {
        self.mapper = Some(Arc::new(mapper));
        self
    }

    /// Thread `value` through the mapper, then lay the literal fields on top.
    pub fn apply(&self, value: NodeValue) -> NodeValue {
        let mut value = match &self.mapper {
            Some(mapper) => mapper(value),
            None => value,
        };
        if let Some(bson_type) = &self.bson_type {
            value.bson_type = Some(bson_type.clone());
        }
        if let Some(flags) = &self.flags {
            value.flags = Some(flags.clone());
        }
        value
    }
}

impl fmt::Debug for Override {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Override")
            .field("path", &self.path)
            .field("bson_type", &self.bson_type)
            .field("flags", &self.flags)
            .field("mapper", &self.mapper.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// Dotted paths whose subtrees are dropped.
    pub omit: Vec<String>,
    /// Old dotted path → new dotted path. Only the last segment may change.
    pub rename: IndexMap<String, String>,
    /// Applied in declared order; several may match one node.
    pub overrides: Vec<Override>,
    /// Render objects with `additionalProperties: false` as `OBJECT(STRICT)`.
    #[serde(alias = "strictMode")]
    pub strict_mode: bool,
    /// Rewrites the raw schema before it is walked.
    #[serde(skip)]
    pub map_schema: Option<Arc<SchemaMapFn>>,
}

impl fmt::Debug for ConvertOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConvertOptions")
            .field("omit", &self.omit)
            .field("rename", &self.rename)
            .field("overrides", &self.overrides)
            .field("strict_mode", &self.strict_mode)
            .field("map_schema", &self.map_schema.as_ref().map(|_| "<fn>"))
            .finish()
    }
}
