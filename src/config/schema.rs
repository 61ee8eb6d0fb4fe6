//! Declarative configuration schema.
//!
//! The schema is the canonical default-value tree. Every valid key appears in it,
//! and each leaf's default value fixes the static type of that key. A
//! [`SchemaNode::Template`] accepts any member name, each member sharing one child
//! schema (account definitions, remote servers, ...).

use crate::error::{ConfigError, ConfigResult};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Name of the top-level section that is excluded from persisted output by default.
pub const INTERNAL_SECTION: &str = "internal";

/// A node of the configuration schema.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    /// Terminal value; the default also determines the key's type.
    Leaf(Value),
    /// Fixed set of named children.
    Section(BTreeMap<String, SchemaNode>),
    /// Open set of names, all sharing the boxed child schema.
    Template(Box<SchemaNode>),
}

impl SchemaNode {
    pub fn leaf(default: impl Into<Value>) -> Self {
        SchemaNode::Leaf(default.into())
    }

    pub fn section<K: Into<String>>(children: impl IntoIterator<Item = (K, SchemaNode)>) -> Self {
        SchemaNode::Section(
            children
                .into_iter()
                .map(|(name, node)| (name.into(), node))
                .collect(),
        )
    }

    pub fn template(child: SchemaNode) -> Self {
        SchemaNode::Template(Box::new(child))
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, SchemaNode::Leaf(_))
    }

    /// Schema node for a member named `name`, if the name is valid here.
    pub fn child(&self, name: &str) -> Option<&SchemaNode> {
        match self {
            SchemaNode::Leaf(_) => None,
            SchemaNode::Section(children) => children.get(name),
            SchemaNode::Template(child) => Some(child),
        }
    }

    /// The value a reader sees when nothing was resolved at this node.
    ///
    /// Sections expand to the defaults of all their children; templates have
    /// no members until a source or the user names one.
    pub fn default_value(&self) -> Value {
        match self {
            SchemaNode::Leaf(default) => default.clone(),
            SchemaNode::Section(children) => Value::Object(
                children
                    .iter()
                    .map(|(name, node)| (name.clone(), node.default_value()))
                    .collect::<Map<_, _>>(),
            ),
            SchemaNode::Template(_) => Value::Object(Map::new()),
        }
    }

    /// Walk `path` from this node. Unknown literal segments, or any segment
    /// below a leaf, raise `UndefinedPath` naming the path up to that segment.
    pub fn resolve<S: AsRef<str>>(&self, path: &[S]) -> ConfigResult<&SchemaNode> {
        let mut node = self;
        for (depth, segment) in path.iter().enumerate() {
            node = node
                .child(segment.as_ref())
                .ok_or_else(|| ConfigError::undefined(&path[..=depth]))?;
        }
        Ok(node)
    }

    /// Merge `fragment` into this node. Sections merge member by member; any
    /// other combination is replaced by the fragment.
    pub fn extend(&mut self, fragment: SchemaNode) {
        match (self, fragment) {
            (SchemaNode::Section(base), SchemaNode::Section(extra)) => {
                for (name, node) in extra {
                    match base.get_mut(&name) {
                        Some(existing) => existing.extend(node),
                        None => {
                            base.insert(name, node);
                        }
                    }
                }
            }
            (this, fragment) => *this = fragment,
        }
    }
}

/// Root of a configuration schema. Always a section.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    root: SchemaNode,
}

impl Schema {
    pub fn new<K: Into<String>>(sections: impl IntoIterator<Item = (K, SchemaNode)>) -> Self {
        Self {
            root: SchemaNode::section(sections),
        }
    }

    pub fn root(&self) -> &SchemaNode {
        &self.root
    }

    pub fn resolve<S: AsRef<str>>(&self, path: &[S]) -> ConfigResult<&SchemaNode> {
        self.root.resolve(path)
    }

    /// Resolve a dotted key such as `application.port`.
    pub fn resolve_key(&self, key: &str) -> ConfigResult<&SchemaNode> {
        self.resolve(&split_key(key))
    }

    /// Merge a schema fragment contributed by an optional command module.
    pub fn extend(&mut self, fragment: Schema) {
        self.root.extend(fragment.root);
    }

    /// Full default tree.
    pub fn defaults(&self) -> Value {
        self.root.default_value()
    }
}

/// Split a dotted key into segments. The empty key addresses the root.
pub fn split_key(key: &str) -> Vec<&str> {
    if key.is_empty() {
        Vec::new()
    } else {
        key.split('.').collect()
    }
}
