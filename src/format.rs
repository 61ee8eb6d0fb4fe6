//! Structured text formats for configuration files and output.

use serde_json::Value;
use std::path::Path;

/// Format of a configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileFormat {
    #[default]
    Toml,
    Yaml,
    Json,
}

impl FileFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "toml" => Some(FileFormat::Toml),
            "yaml" | "yml" => Some(FileFormat::Yaml),
            "json" => Some(FileFormat::Json),
            _ => None,
        }
    }

    /// Pick the format from a file extension. Anything unrecognised is TOML.
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_str)
            .unwrap_or_default()
    }

    pub fn name(self) -> &'static str {
        match self {
            FileFormat::Toml => "toml",
            FileFormat::Yaml => "yaml",
            FileFormat::Json => "json",
        }
    }

    /// Parse a document into a JSON value tree.
    pub fn parse(self, content: &str) -> Result<Value, String> {
        match self {
            FileFormat::Toml => toml::from_str::<Value>(content).map_err(|e| e.to_string()),
            FileFormat::Yaml => {
                // An empty YAML document parses as null; treat it as an empty mapping.
                let value = serde_yaml::from_str::<Value>(content).map_err(|e| e.to_string())?;
                Ok(if value.is_null() {
                    Value::Object(Default::default())
                } else {
                    value
                })
            }
            FileFormat::Json => serde_json::from_str::<Value>(content).map_err(|e| e.to_string()),
        }
    }

    /// Render a value tree. Output is deterministic for identical trees.
    pub fn render(self, value: &Value) -> Result<String, String> {
        match self {
            FileFormat::Toml => toml::to_string(value).map_err(|e| e.to_string()),
            FileFormat::Yaml => serde_yaml::to_string(value).map_err(|e| e.to_string()),
            FileFormat::Json => serde_json::to_string_pretty(value)
                .map(|mut s| {
                    s.push('\n');
                    s
                })
                .map_err(|e| e.to_string()),
        }
    }
}
