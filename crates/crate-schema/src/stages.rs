//! Node-sequence transforms, applied in this order:
//! strip array markers → omit → rename → duplicate check → overrides.
//!
//! Each stage takes the sequence by value and returns a new one.

use crate::error::ConvertError;
use crate::node::{NodeKey, NodeKind, SchemaNode, ARRAY_ITEMS_MARKER};
use crate::options::Override;
use globset::{Glob, GlobMatcher};
use indexmap::IndexMap;
use sync_core::path::{array_starts_with, find_duplicate_paths, join_path, parent_path, parse_path};
use sync_core::{ID_COLUMN, SOURCE_ID_FIELD};

/// Remove array-item marker segments from every path.
pub fn strip_array_markers(nodes: Vec<SchemaNode>) -> Vec<SchemaNode> {
    nodes
        .into_iter()
        .map(|mut node| {
            node.path.retain(|segment| segment != ARRAY_ITEMS_MARKER);
            node
        })
        .collect()
}

/// Drop every node at or below one of the `omit` paths.
pub fn omit_paths(nodes: Vec<SchemaNode>, omit: &[String]) -> Vec<SchemaNode> {
    let omit: Vec<Vec<String>> = omit.iter().map(|p| parse_path(p)).collect();
    nodes
        .into_iter()
        .filter(|node| {
            node.kind == NodeKind::Root
                || !omit.iter().any(|prefix| array_starts_with(&node.path, prefix))
        })
        .collect()
}

/// A validated rename: `from` and `to` share the same parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameRule {
    pub from: Vec<String>,
    pub to: Vec<String>,
}

/// Validate the configured renames and append the identity rename.
///
/// The identity field (`_id`) is renamed to `id` after the configured rules
/// unless `_id` is itself renamed explicitly.
pub fn compile_renames(rename: &IndexMap<String, String>) -> Result<Vec<RenameRule>, ConvertError> {
    let mut rules = rename
        .iter()
        .map(|(from, to)| {
            let rule = RenameRule {
                from: parse_path(from),
                to: parse_path(to),
            };
            let same_parent = rule.from.len() == rule.to.len()
                && !rule.from.is_empty()
                && parent_path(&rule.from) == parent_path(&rule.to);
            if same_parent {
                Ok(rule)
            } else {
                Err(ConvertError::InvalidRenamePrefix(from.clone()))
            }
        })
        .collect::<Result<Vec<_>, _>>()?;
    if !rename.contains_key(SOURCE_ID_FIELD) {
        rules.push(RenameRule {
            from: vec![SOURCE_ID_FIELD.to_string()],
            to: vec![ID_COLUMN.to_string()],
        });
    }
    Ok(rules)
}

/// Target column of the identity field under `rename`.
pub fn identity_path(rename: &IndexMap<String, String>) -> Vec<String> {
    match rename.get(SOURCE_ID_FIELD) {
        Some(target) => parse_path(target),
        None => vec![ID_COLUMN.to_string()],
    }
}

/// Apply `rules` in order to a source field path.
///
/// Each rule whose `from` is a prefix of the path so far has that prefix
/// replaced by its `to`, keeping the suffix.
pub fn rename_path(path: &[String], rules: &[RenameRule]) -> Vec<String> {
    let mut path = path.to_vec();
    for rule in rules {
        if array_starts_with(&path, &rule.from) {
            let suffix = path.split_off(rule.from.len());
            path = rule.to.iter().cloned().chain(suffix).collect();
        }
    }
    path
}

/// Rename every node's path with [`rename_path`].
pub fn rename_paths(nodes: Vec<SchemaNode>, rules: &[RenameRule]) -> Vec<SchemaNode> {
    nodes
        .into_iter()
        .map(|mut node| {
            if node.kind == NodeKind::Root {
                return node;
            }
            node.path = rename_path(&node.path, rules);
            if let NodeKey::Field(_) = node.key {
                if let Some(last) = node.path.last() {
                    node.key = NodeKey::Field(last.clone());
                }
            }
            node
        })
        .collect()
}

/// Fail if two real (non-marker) nodes share a path.
pub fn check_duplicate_paths(nodes: &[SchemaNode]) -> Result<(), ConvertError> {
    let duplicates = find_duplicate_paths(
        nodes
            .iter()
            .filter(|n| n.kind != NodeKind::Root && !n.is_array_items())
            .map(|n| n.path.as_slice()),
    );
    if duplicates.is_empty() {
        Ok(())
    } else {
        Err(ConvertError::DuplicatePaths(duplicates))
    }
}

/// An override with its glob compiled.
#[derive(Debug, Clone)]
pub struct CompiledOverride {
    pub matcher: GlobMatcher,
    pub rule: Override,
}

pub fn compile_overrides(overrides: &[Override]) -> Result<Vec<CompiledOverride>, ConvertError> {
    overrides
        .iter()
        .map(|rule| {
            let glob = Glob::new(&rule.path).map_err(|source| ConvertError::InvalidPattern {
                pattern: rule.path.clone(),
                source,
            })?;
            Ok(CompiledOverride {
                matcher: glob.compile_matcher(),
                rule: rule.clone(),
            })
        })
        .collect()
}

/// Apply every matching override to every non-root node, in declared order.
pub fn apply_overrides(nodes: Vec<SchemaNode>, overrides: &[CompiledOverride]) -> Vec<SchemaNode> {
    if overrides.is_empty() {
        return nodes;
    }
    nodes
        .into_iter()
        .map(|mut node| {
            if node.kind == NodeKind::Root {
                return node;
            }
            let dotted = join_path(&node.path);
            for ov in overrides.iter().filter(|ov| ov.matcher.is_match(&dotted)) {
                node.value = ov.rule.apply(std::mem::take(&mut node.value));
            }
            node
        })
        .collect()
}
