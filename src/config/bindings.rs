//! Per-key source bindings.
//!
//! A binding tells the environment, dotenv and CLI adapters which external name
//! feeds a schema leaf. Files need no binding: they mirror the schema layout.

use super::schema::{Schema, SchemaNode};
use heck::ToShoutySnakeCase;
use regex_lite::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;
use tracing::warn;

/// CLI attribute bound to a key, optionally selecting one element of a
/// multi-valued flag (`port[0]`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliBinding {
    pub name: String,
    pub index: Option<usize>,
}

impl CliBinding {
    /// Parse `name` or `name[n]`.
    pub fn parse(spec: &str) -> Option<Self> {
        static PATTERN: OnceLock<Regex> = OnceLock::new();
        let pattern = PATTERN.get_or_init(|| {
            Regex::new(r"^([^\[\]]+)(?:\[([0-9]+)\])?$").expect("static binding pattern")
        });
        let caps = pattern.captures(spec)?;
        let name = caps.get(1)?.as_str().to_string();
        let index = match caps.get(2) {
            Some(m) => Some(m.as_str().parse().ok()?),
            None => None,
        };
        Some(Self { name, index })
    }
}

/// External names feeding one configuration key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceBinding {
    pub cli: Option<CliBinding>,
    pub env: Option<String>,
    pub dotenv: Option<String>,
}

impl SourceBinding {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a CLI attribute, `name` or `name[n]`. Malformed specs are ignored.
    pub fn cli(mut self, spec: &str) -> Self {
        self.cli = CliBinding::parse(spec);
        if self.cli.is_none() {
            warn!(spec, "Ignoring malformed CLI binding");
        }
        self
    }

    pub fn env(mut self, name: impl Into<String>) -> Self {
        self.env = Some(name.into());
        self
    }

    pub fn dotenv(mut self, name: impl Into<String>) -> Self {
        self.dotenv = Some(name.into());
        self
    }

    /// `<SOFTWARE>_<KEY>` for the environment, `<KEY>` for dotenv files.
    pub fn conventional(software: &str, key: &str) -> Self {
        let key = key.to_shouty_snake_case();
        Self::new()
            .env(format!("{}_{}", software.to_uppercase(), key))
            .dotenv(key)
    }

    /// Environment variable name, uppercased.
    pub fn env_name(&self) -> Option<String> {
        self.env.as_deref().map(str::to_uppercase)
    }

    /// Dotenv variable name, uppercased.
    pub fn dotenv_name(&self) -> Option<String> {
        self.dotenv.as_deref().map(str::to_uppercase)
    }
}

/// Binding table keyed by dotted configuration key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings {
    entries: BTreeMap<String, SourceBinding>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, binding: SourceBinding) -> Self {
        self.insert(key, binding);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, binding: SourceBinding) {
        self.entries.insert(key.into(), binding);
    }

    pub fn get(&self, key: &str) -> Option<&SourceBinding> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SourceBinding)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Add entries from a command module. Keys already bound keep their binding.
    pub fn extend(&mut self, other: Bindings) {
        for (key, binding) in other.entries {
            self.entries.entry(key).or_insert(binding);
        }
    }

    /// Conventional environment and dotenv names for every literal leaf of
    /// `schema`. Template members are unknown ahead of time and get none.
    pub fn conventional(schema: &Schema, software: &str) -> Self {
        fn walk(node: &SchemaNode, path: &mut Vec<String>, software: &str, out: &mut Bindings) {
            match node {
                SchemaNode::Leaf(_) => {
                    let key = path.join(".");
                    let binding = SourceBinding::conventional(software, &key);
                    out.insert(key, binding);
                }
                SchemaNode::Section(children) => {
                    for (name, child) in children {
                        path.push(name.clone());
                        walk(child, path, software, out);
                        path.pop();
                    }
                }
                SchemaNode::Template(_) => {}
            }
        }

        let mut out = Bindings::new();
        walk(schema.root(), &mut Vec::new(), software, &mut out);
        out
    }

    /// Names of the members directly below `prefix` that have a bound key
    /// accepted by `present`.
    pub fn children_where(
        &self,
        prefix: &[String],
        present: impl Fn(&SourceBinding) -> bool,
    ) -> Vec<String> {
        let mut names: Vec<String> = self
            .entries
            .iter()
            .filter_map(|(key, binding)| {
                let segments: Vec<&str> = key.split('.').collect();
                if segments.len() <= prefix.len()
                    || !segments.iter().zip(prefix).all(|(a, b)| *a == b.as_str())
                    || !present(binding)
                {
                    return None;
                }
                Some(segments[prefix.len()].to_string())
            })
            .collect();
        names.sort();
        names.dedup();
        names
    }
}
