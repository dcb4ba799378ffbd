//! Render a node sequence as `CREATE TABLE` text.

use crate::error::ConvertError;
use crate::node::{NodeKey, NodeKind, SchemaNode};
use crate::types::{flag_modifier, sql_type, IGNORED_OBJECT};
use sync_core::ident::quote_identifier;
use sync_core::path::array_starts_with;

const PADDING: &str = "  ";

struct RenderContext<'a> {
    strict_mode: bool,
    identity: &'a [String],
}

/// Render `nodes` (root first) as a table definition for `qualified_name`.
pub fn render_table(
    nodes: &[SchemaNode],
    qualified_name: &str,
    strict_mode: bool,
    identity: &[String],
) -> Result<String, ConvertError> {
    let (root, fields) = match nodes.split_first() {
        Some((root, fields)) if root.kind == NodeKind::Root => (root, fields),
        _ => return Err(ConvertError::InvalidSchema),
    };
    let ctx = RenderContext {
        strict_mode,
        identity,
    };
    let mut out = format!("CREATE TABLE IF NOT EXISTS {qualified_name} (\n");
    render_nodes(fields, 1, &ctx, &mut out)?;
    let policy = if is_strict(root, &ctx) {
        "strict"
    } else {
        "dynamic"
    };
    out.push_str(&format!(") WITH (column_policy = '{policy}')"));
    Ok(out)
}

fn render_nodes(
    nodes: &[SchemaNode],
    depth: usize,
    ctx: &RenderContext<'_>,
    out: &mut String,
) -> Result<(), ConvertError> {
    let spacing = PADDING.repeat(depth);
    let mut rest = nodes;
    while let Some((node, tail)) = rest.split_first() {
        let field = match &node.key {
            NodeKey::Field(name) => format!("{} ", quote_identifier(name)),
            NodeKey::Root | NodeKey::ArrayItems => String::new(),
        };
        if node.is_container() {
            let run = tail
                .iter()
                .take_while(|n| array_starts_with(&n.path, &node.path))
                .count();
            let (children, after) = tail.split_at(run);
            let comma = if after.is_empty() { "" } else { "," };
            if children.is_empty() {
                out.push_str(&format!("{spacing}{field}{IGNORED_OBJECT}{comma}\n"));
            } else {
                let container = match node.kind {
                    NodeKind::Array => "ARRAY",
                    _ if is_strict(node, ctx) => "OBJECT(STRICT) AS",
                    _ => "OBJECT(DYNAMIC) AS",
                };
                out.push_str(&format!("{spacing}{field}{container} (\n"));
                render_nodes(children, depth + 1, ctx, out)?;
                out.push_str(&format!("{spacing}){comma}\n"));
            }
            rest = after;
        } else {
            let comma = if tail.is_empty() { "" } else { "," };
            let sql_type = column_type(node)?;
            let primary = if node.path == ctx.identity && !node.is_array_items() {
                " PRIMARY KEY"
            } else {
                ""
            };
            let modifiers: String = node
                .value
                .flags
                .iter()
                .flatten()
                .map(|flag| flag_modifier(*flag))
                .collect();
            out.push_str(&format!(
                "{spacing}{field}{sql_type}{primary}{modifiers}{comma}\n"
            ));
            rest = tail;
        }
    }
    Ok(())
}

fn is_strict(node: &SchemaNode, ctx: &RenderContext<'_>) -> bool {
    ctx.strict_mode && node.value.additional_properties == Some(false)
}

fn column_type(node: &SchemaNode) -> Result<&'static str, ConvertError> {
    let bson_type = node
        .value
        .bson_type
        .as_ref()
        .and_then(|t| t.primary())
        .ok_or_else(|| ConvertError::MissingType {
            path: node.dotted_path(),
        })?;
    sql_type(bson_type).ok_or_else(|| ConvertError::UnknownType {
        path: node.dotted_path(),
        bson_type: bson_type.to_string(),
    })
}
