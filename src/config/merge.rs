//! Precedence merging.
//!
//! [`merge`] walks the schema and applies one source on top of a previously
//! resolved tree: values the source provides are coerced and stored, values it
//! is silent about are carried over unchanged. Running it once per tier, lowest
//! priority first, yields the final configuration.

use super::coerce::coerce;
use super::schema::{INTERNAL_SECTION, Schema, SchemaNode};
use super::sources::Source;
use crate::error::{ConfigError, ConfigResult};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Sparse tree of explicitly resolved values, shaped like the schema.
pub type ConfigTree = Map<String, Value>;

/// Apply `source` on top of `previous`.
///
/// Leaves the source provides are coerced against their schema default.
/// Leaves it is silent about keep their previous value. Template members are
/// the union of members already in `previous` and members the source can
/// enumerate. The source is not consulted for the top-level `internal`
/// section unless `include_internal` is set; values already stored there are
/// kept either way.
///
/// Fails with `UndefinedPath` when `previous` holds a key the schema does not
/// define, and with `Coercion` when a value does not fit its leaf.
pub fn merge(
    schema: &Schema,
    previous: &ConfigTree,
    source: &dyn Source,
    include_internal: bool,
) -> ConfigResult<ConfigTree> {
    let mut path = Vec::new();
    let previous = Value::Object(previous.clone());
    let merged = merge_node(
        schema.root(),
        Some(&previous),
        &mut path,
        source,
        include_internal,
    )?;
    Ok(match merged {
        Some(Value::Object(map)) => map,
        _ => ConfigTree::new(),
    })
}

/// Merge `source` into the subtree at `path`, starting from `previous` (the
/// subtree currently stored there). Used for both full passes and targeted
/// updates.
pub(crate) fn merge_node(
    node: &SchemaNode,
    previous: Option<&Value>,
    path: &mut Vec<String>,
    source: &dyn Source,
    include_internal: bool,
) -> ConfigResult<Option<Value>> {
    match node {
        SchemaNode::Leaf(default) => {
            let resolved = match source.get(path) {
                Some(raw) => Some(raw),
                None => previous.cloned(),
            };
            resolved
                .map(|raw| coerce(default, &raw).map_err(|e| ConfigError::coercion(&path[..], e)))
                .transpose()
        }
        SchemaNode::Section(children) => {
            let previous = previous_section(previous, path)?;
            if let Some(map) = previous
                && let Some(unknown) = map.keys().find(|k| !children.contains_key(*k))
            {
                path.push(unknown.clone());
                return Err(ConfigError::undefined(&path[..]));
            }

            let mut out = Map::new();
            for (name, child) in children {
                if path.is_empty() && name == INTERNAL_SECTION && !include_internal {
                    if let Some(kept) = previous.and_then(|m| m.get(name)) {
                        out.insert(name.clone(), kept.clone());
                    }
                    continue;
                }
                path.push(name.clone());
                let value = merge_node(
                    child,
                    previous.and_then(|m| m.get(name)),
                    path,
                    source,
                    include_internal,
                )?;
                path.pop();
                if let Some(value) = value {
                    out.insert(name.clone(), value);
                }
            }
            Ok((!out.is_empty()).then_some(Value::Object(out)))
        }
        SchemaNode::Template(child) => {
            let previous = previous_section(previous, path)?;
            let mut names: BTreeSet<String> = previous
                .map(|m| m.keys().cloned().collect())
                .unwrap_or_default();
            names.extend(source.children(path));

            let mut out = Map::new();
            for name in names {
                path.push(name.clone());
                let value = merge_node(
                    child,
                    previous.and_then(|m| m.get(&name)),
                    path,
                    source,
                    include_internal,
                )?;
                path.pop();
                if let Some(value) = value {
                    out.insert(name, value);
                }
            }
            Ok((!out.is_empty()).then_some(Value::Object(out)))
        }
    }
}

/// The stored mapping at a section position. A scalar stored where the schema
/// expects a section has no schema counterpart.
fn previous_section<'a>(
    previous: Option<&'a Value>,
    path: &[String],
) -> ConfigResult<Option<&'a Map<String, Value>>> {
    match previous {
        None => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(ConfigError::undefined(path)),
    }
}
