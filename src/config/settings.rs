//! Dotted-path access to a resolved configuration.
//!
//! [`Settings`] binds a sparse [`ConfigTree`] to its [`Schema`]. Reads fall
//! back to schema defaults; writes are validated and coerced against the
//! schema. One instance may be installed as the process configuration after
//! the initial resolution; anything needing its own configuration (tests,
//! tools) builds a separate instance.

use super::merge::{ConfigTree, merge, merge_node};
use super::persist;
use super::schema::{Schema, SchemaNode, split_key};
use super::sources::{FileSource, Source};
use crate::error::{CoercionError, ConfigError, ConfigResult};
use crate::format::FileFormat;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::debug;

static PROCESS_SETTINGS: OnceLock<Settings> = OnceLock::new();

/// A configuration tree bound to its schema.
#[derive(Debug, Clone)]
pub struct Settings {
    schema: Schema,
    tree: ConfigTree,
    /// Highest-priority configuration file; target of [`Settings::write`].
    write_target: Option<PathBuf>,
}

impl Settings {
    /// Settings holding nothing but schema defaults.
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            tree: ConfigTree::new(),
            write_target: None,
        }
    }

    /// Bind an existing tree, validating and coercing every stored value.
    pub fn from_tree(schema: Schema, tree: ConfigTree) -> ConfigResult<Self> {
        let empty = FileSource::from_value("validation", Value::Object(Map::new()));
        let tree = merge(&schema, &tree, &empty, true)?;
        Ok(Self {
            schema,
            tree,
            write_target: None,
        })
    }

    pub fn with_write_target(mut self, path: impl Into<PathBuf>) -> Self {
        self.write_target = Some(path.into());
        self
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The explicitly resolved values, without defaults.
    pub fn tree(&self) -> &ConfigTree {
        &self.tree
    }

    pub fn write_target(&self) -> Option<&Path> {
        self.write_target.as_deref()
    }

    /// Run one more merge pass with `source` at the highest priority.
    pub fn apply(&mut self, source: &dyn Source) -> ConfigResult<()> {
        debug!(source = source.label(), "Applying configuration source");
        self.tree = merge(&self.schema, &self.tree, source, true)?;
        Ok(())
    }

    /// Value at `key`, falling back to schema defaults. Sections return the
    /// full effective subtree; templates return their current members.
    pub fn get(&self, key: &str) -> ConfigResult<Value> {
        let path = split_key(key);
        let node = self.schema.resolve(&path)?;
        if path.is_empty() {
            let root = Value::Object(self.tree.clone());
            return Ok(effective(node, Some(&root)));
        }
        Ok(effective(node, lookup(&self.tree, &path)))
    }

    /// Value at `key`, deserialized into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> ConfigResult<T> {
        let value = self.get(key)?;
        serde_json::from_value(value.clone()).map_err(|_| {
            ConfigError::coercion(
                &split_key(key),
                CoercionError::new(&value, std::any::type_name::<T>()),
            )
        })
    }

    /// Store `value` at `key`, coerced to the schema type. Setting a section
    /// updates the members named in `value` and keeps the others. Returns the
    /// effective value now at `key`.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> ConfigResult<Value> {
        let path = owned_path(key)?;
        let node = self.schema.resolve(&path)?;
        let value = value.into();
        check_shape(node, &value, &mut path.clone())?;

        let source = FileSource::from_value(key, nest(&path, value));
        let merged = merge_node(
            node,
            lookup(&self.tree, &path),
            &mut path.clone(),
            &source,
            true,
        )?;
        store(&mut self.tree, &path, merged);
        self.get(key)
    }

    /// Store the schema default explicitly at `key`, e.g. to materialise a
    /// template member.
    pub fn set_default(&mut self, key: &str) -> ConfigResult<Value> {
        let path = split_key(key);
        let default = self.schema.resolve(&path)?.default_value();
        self.set(key, default)
    }

    /// Remove the stored value at `key`. Reads then see the schema default.
    /// Returns whether anything was removed.
    pub fn delete(&mut self, key: &str) -> ConfigResult<bool> {
        let path = owned_path(key)?;
        self.schema.resolve(&path)?;
        Ok(store(&mut self.tree, &path, None))
    }

    /// Whether a value is explicitly stored at `key`.
    pub fn has(&self, key: &str) -> ConfigResult<bool> {
        let path = split_key(key);
        self.schema.resolve(&path)?;
        if path.is_empty() {
            return Ok(!self.tree.is_empty());
        }
        Ok(lookup(&self.tree, &path).is_some())
    }

    /// Immediate member names at a section or template. Sections list their
    /// schema members, templates the members currently stored.
    pub fn enumerate(&self, prefix: &str) -> ConfigResult<Vec<String>> {
        let path = split_key(prefix);
        match self.schema.resolve(&path)? {
            SchemaNode::Leaf(_) => Err(ConfigError::undefined(&path)),
            SchemaNode::Section(children) => Ok(children.keys().cloned().collect()),
            SchemaNode::Template(_) => Ok(lookup(&self.tree, &path)
                .and_then(Value::as_object)
                .map(|m| m.keys().cloned().collect())
                .unwrap_or_default()),
        }
    }

    /// Stored values rendered in the write target's format (TOML by default).
    pub fn to_text(&self, include_internal: bool) -> ConfigResult<String> {
        let format = self
            .write_target
            .as_deref()
            .map(FileFormat::from_path)
            .unwrap_or_default();
        persist::render(&self.tree, format, include_internal)
    }

    /// Effective configuration, defaults included, as pretty JSON.
    pub fn to_json(&self, include_internal: bool) -> ConfigResult<String> {
        let effective = match self.get("")? {
            Value::Object(map) => map,
            _ => ConfigTree::new(),
        };
        persist::render(&effective, FileFormat::Json, include_internal)
    }

    /// Persist stored values to the configuration file this instance was
    /// loaded for.
    pub fn write(&self, include_internal: bool) -> ConfigResult<PathBuf> {
        let target = self.write_target.clone().ok_or(ConfigError::NoWriteTarget)?;
        self.write_to(&target, include_internal)?;
        Ok(target)
    }

    /// Persist stored values to `path`.
    pub fn write_to(&self, path: impl AsRef<Path>, include_internal: bool) -> ConfigResult<()> {
        persist::write_file(path.as_ref(), &self.tree, include_internal)
    }

    /// Install as the process configuration. Succeeds once per process.
    pub fn install(self) -> ConfigResult<&'static Settings> {
        PROCESS_SETTINGS
            .set(self)
            .map_err(|_| ConfigError::AlreadyInstalled)?;
        PROCESS_SETTINGS.get().ok_or(ConfigError::AlreadyInstalled)
    }

    /// The installed process configuration, if any.
    pub fn installed() -> Option<&'static Settings> {
        PROCESS_SETTINGS.get()
    }
}

fn owned_path(key: &str) -> ConfigResult<Vec<String>> {
    let path: Vec<String> = split_key(key).into_iter().map(String::from).collect();
    if path.is_empty() {
        return Err(ConfigError::UndefinedPath {
            path: String::new(),
        });
    }
    Ok(path)
}

fn lookup<'a, S: AsRef<str>>(tree: &'a ConfigTree, path: &[S]) -> Option<&'a Value> {
    let (first, rest) = path.split_first()?;
    rest.iter().try_fold(tree.get(first.as_ref())?, |node, segment| {
        node.as_object()?.get(segment.as_ref())
    })
}

/// Value a reader sees at `node` given what is stored there.
fn effective(node: &SchemaNode, stored: Option<&Value>) -> Value {
    match node {
        SchemaNode::Leaf(default) => stored.cloned().unwrap_or_else(|| default.clone()),
        SchemaNode::Section(children) => {
            let stored = stored.and_then(Value::as_object);
            Value::Object(
                children
                    .iter()
                    .map(|(name, child)| {
                        (name.clone(), effective(child, stored.and_then(|m| m.get(name))))
                    })
                    .collect(),
            )
        }
        SchemaNode::Template(child) => Value::Object(
            stored
                .and_then(Value::as_object)
                .map(|members| {
                    members
                        .iter()
                        .map(|(name, value)| (name.clone(), effective(child, Some(value))))
                        .collect()
                })
                .unwrap_or_default(),
        ),
    }
}

/// Reject mapping keys the schema does not define, and mappings or nulls
/// given for leaves.
fn check_shape(node: &SchemaNode, value: &Value, path: &mut Vec<String>) -> ConfigResult<()> {
    match (node, value) {
        (SchemaNode::Leaf(_), Value::Null) => Err(ConfigError::coercion(
            &path[..],
            CoercionError::new(value, "non-null value"),
        )),
        (SchemaNode::Leaf(_), Value::Object(_)) => Err(ConfigError::coercion(
            &path[..],
            CoercionError::new(value, "scalar leaf"),
        )),
        (SchemaNode::Leaf(_), _) => Ok(()),
        (_, Value::Object(map)) => {
            for (name, member) in map {
                path.push(name.clone());
                let child = node
                    .child(name)
                    .ok_or_else(|| ConfigError::undefined(&path[..]))?;
                check_shape(child, member, path)?;
                path.pop();
            }
            Ok(())
        }
        (_, _) => Err(ConfigError::coercion(
            &path[..],
            CoercionError::new(value, "mapping"),
        )),
    }
}

/// Wrap `value` in nested mappings so it sits at `path`.
fn nest(path: &[String], value: Value) -> Value {
    path.iter().rev().fold(value, |inner, segment| {
        let mut map = Map::new();
        map.insert(segment.clone(), inner);
        Value::Object(map)
    })
}

/// Put `value` at `path`, or remove what is there when `value` is `None`.
/// Mappings left empty by a removal are pruned. Returns whether the tree changed.
fn store(tree: &mut ConfigTree, path: &[String], value: Option<Value>) -> bool {
    let Some((first, rest)) = path.split_first() else {
        return false;
    };
    if rest.is_empty() {
        return match value {
            Some(value) => {
                tree.insert(first.clone(), value);
                true
            }
            None => tree.remove(first).is_some(),
        };
    }

    if value.is_none() && !tree.contains_key(first) {
        return false;
    }
    let slot = tree
        .entry(first.clone())
        .or_insert_with(|| Value::Object(Map::new()));
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    let (changed, now_empty) = match slot.as_object_mut() {
        Some(child) => {
            let changed = store(child, rest, value);
            (changed, child.is_empty())
        }
        None => (false, false),
    };
    if now_empty {
        tree.remove(first);
    }
    changed
}
