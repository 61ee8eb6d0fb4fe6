//! Source adapters.
//!
//! Each adapter answers `path -> value | absent` for one origin: process
//! environment, dotenv entries, a structured file, or command-line flags.
//! `None` always means "this source says nothing"; a present empty string is
//! a real value and overrides lower tiers.

use super::bindings::{Bindings, SourceBinding};
use crate::error::{ConfigError, ConfigResult};
use crate::format::FileFormat;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A single configuration origin.
pub trait Source {
    /// Short label used in logs.
    fn label(&self) -> &str;

    /// Raw override for the key at `path`, or `None` when not provided.
    fn get(&self, path: &[String]) -> Option<Value>;

    /// Member names this source knows below `path`. Sources that cannot
    /// enumerate return nothing and are still asked about every member found
    /// elsewhere.
    fn children(&self, _path: &[String]) -> Vec<String> {
        Vec::new()
    }
}

/// Snapshot of the process environment, optionally enriched with dotenv
/// entries. The process environment itself is never modified.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    vars: HashMap<String, String>,
}

impl EnvSnapshot {
    /// Capture the current process environment. Non-UTF-8 entries are skipped.
    pub fn capture() -> Self {
        let vars = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        Self { vars }
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    /// Load a dotenv file into the snapshot. Variables already present keep
    /// their value. Returns the number of entries added.
    pub fn load_dotenv(&mut self, path: &Path) -> ConfigResult<usize> {
        let unavailable = |reason: String| ConfigError::SourceUnavailable {
            path: path.to_path_buf(),
            reason,
        };
        let entries = dotenvy::from_path_iter(path).map_err(|e| unavailable(e.to_string()))?;

        let mut added = 0;
        for entry in entries {
            let (name, value) = entry.map_err(|e| unavailable(e.to_string()))?;
            if !self.vars.contains_key(&name) {
                self.vars.insert(name, value);
                added += 1;
            }
        }
        debug!(path = %path.display(), added, "Loaded dotenv file");
        Ok(added)
    }
}

/// Which name slot of a binding an [`EnvSource`] reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnvSlot {
    Environment,
    Dotenv,
}

/// Environment-backed adapter for either the prefixed environment names or
/// the unprefixed dotenv names.
pub struct EnvSource<'a> {
    bindings: &'a Bindings,
    env: &'a EnvSnapshot,
    slot: EnvSlot,
}

impl<'a> EnvSource<'a> {
    pub fn environment(bindings: &'a Bindings, env: &'a EnvSnapshot) -> Self {
        Self {
            bindings,
            env,
            slot: EnvSlot::Environment,
        }
    }

    pub fn dotenv(bindings: &'a Bindings, env: &'a EnvSnapshot) -> Self {
        Self {
            bindings,
            env,
            slot: EnvSlot::Dotenv,
        }
    }

    fn lookup(&self, binding: &SourceBinding) -> Option<&'a str> {
        let name = match self.slot {
            EnvSlot::Environment => binding.env_name(),
            EnvSlot::Dotenv => binding.dotenv_name(),
        }?;
        self.env.get(&name)
    }
}

impl Source for EnvSource<'_> {
    fn label(&self) -> &str {
        match self.slot {
            EnvSlot::Environment => "environment",
            EnvSlot::Dotenv => "dotenv",
        }
    }

    fn get(&self, path: &[String]) -> Option<Value> {
        let binding = self.bindings.get(&path.join("."))?;
        self.lookup(binding).map(|v| Value::String(v.to_string()))
    }

    fn children(&self, path: &[String]) -> Vec<String> {
        self.bindings
            .children_where(path, |binding| self.lookup(binding).is_some())
    }
}

/// Adapter backed by one parsed structured document.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: Option<PathBuf>,
    label: String,
    tree: Value,
}

impl FileSource {
    /// Parse the file at `path`. Missing, unreadable and malformed files are
    /// reported as `SourceUnavailable`.
    pub fn open(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let unavailable = |reason: String| ConfigError::SourceUnavailable {
            path: path.to_path_buf(),
            reason,
        };
        let content = std::fs::read_to_string(path).map_err(|e| unavailable(e.to_string()))?;
        let tree = FileFormat::from_path(path)
            .parse(&content)
            .map_err(unavailable)?;
        if !tree.is_object() {
            return Err(unavailable("top level is not a mapping".to_string()));
        }
        debug!(path = %path.display(), "Read configuration file");
        Ok(Self {
            path: Some(path.to_path_buf()),
            label: path.display().to_string(),
            tree,
        })
    }

    /// Like [`FileSource::open`], but an unavailable file yields an empty
    /// source so it contributes no overrides.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::open(path) {
            Ok(source) => source,
            Err(err) => {
                if path.exists() {
                    warn!(error = %err, "Ignoring configuration file");
                } else {
                    debug!(path = %path.display(), "No configuration file");
                }
                Self {
                    path: Some(path.to_path_buf()),
                    label: path.display().to_string(),
                    tree: Value::Object(Default::default()),
                }
            }
        }
    }

    /// In-memory document, used for values supplied programmatically.
    pub fn from_value(label: impl Into<String>, tree: Value) -> Self {
        Self {
            path: None,
            label: label.into(),
            tree,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn tree(&self) -> &Value {
        &self.tree
    }

    fn descend(&self, path: &[String]) -> Option<&Value> {
        path.iter()
            .try_fold(&self.tree, |node, segment| node.as_object()?.get(segment))
    }
}

impl Source for FileSource {
    fn label(&self) -> &str {
        &self.label
    }

    fn get(&self, path: &[String]) -> Option<Value> {
        match self.descend(path)? {
            // Null means "not specified", never a value.
            Value::Null => None,
            value => Some(value.clone()),
        }
    }

    fn children(&self, path: &[String]) -> Vec<String> {
        self.descend(path)
            .and_then(Value::as_object)
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default()
    }
}

/// Flags the user actually supplied on the command line, keyed by CLI
/// attribute name. A flag missing from this table was not supplied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOverrides {
    values: BTreeMap<String, Vec<String>>,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, values: &[&str]) -> Self {
        self.insert(name, values.iter().map(|v| v.to_string()).collect());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, values: Vec<String>) {
        self.values.insert(name.into(), values);
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.values.get(name).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Collect every argument whose value came from the command line itself,
    /// ignoring defaults and clap's own environment fallbacks.
    pub fn from_matches(matches: &clap::ArgMatches) -> Self {
        let mut overrides = Self::new();
        for id in matches.ids() {
            let name = id.as_str();
            if matches.value_source(name) != Some(clap::parser::ValueSource::CommandLine) {
                continue;
            }
            let Ok(Some(raw)) = matches.try_get_raw(name) else {
                continue;
            };
            let values = raw
                .map(|v| v.to_string_lossy().into_owned())
                .collect::<Vec<_>>();
            overrides.insert(name, values);
        }
        overrides
    }
}

/// Adapter for command-line overrides.
pub struct CliSource<'a> {
    bindings: &'a Bindings,
    overrides: &'a CliOverrides,
}

impl<'a> CliSource<'a> {
    pub fn new(bindings: &'a Bindings, overrides: &'a CliOverrides) -> Self {
        Self {
            bindings,
            overrides,
        }
    }

    fn lookup(&self, binding: &SourceBinding) -> Option<Value> {
        let cli = binding.cli.as_ref()?;
        let values = self.overrides.get(&cli.name)?;
        match cli.index {
            Some(index) => values.get(index).map(|v| Value::String(v.clone())),
            None => match values {
                [] => None,
                [single] => Some(Value::String(single.clone())),
                many => Some(Value::Array(
                    many.iter().map(|v| Value::String(v.clone())).collect(),
                )),
            },
        }
    }
}

impl Source for CliSource<'_> {
    fn label(&self) -> &str {
        "command line"
    }

    fn get(&self, path: &[String]) -> Option<Value> {
        let binding = self.bindings.get(&path.join("."))?;
        self.lookup(binding)
    }

    fn children(&self, path: &[String]) -> Vec<String> {
        self.bindings
            .children_where(path, |binding| self.lookup(binding).is_some())
    }
}
