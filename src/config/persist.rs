//! Serialization of resolved configuration trees back to files.

use super::merge::ConfigTree;
use super::schema::INTERNAL_SECTION;
use crate::error::{ConfigError, ConfigResult};
use crate::format::FileFormat;
use serde_json::Value;
use std::path::Path;
use tracing::info;

/// Copy of `tree` without the top-level `internal` section.
pub fn filter_internal(tree: &ConfigTree) -> ConfigTree {
    tree.iter()
        .filter(|(name, _)| name.as_str() != INTERNAL_SECTION)
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

/// The tree that would be persisted.
pub fn visible(tree: &ConfigTree, include_internal: bool) -> ConfigTree {
    if include_internal {
        tree.clone()
    } else {
        filter_internal(tree)
    }
}

/// Render `tree` in `format`, dropping the internal section unless requested.
pub fn render(tree: &ConfigTree, format: FileFormat, include_internal: bool) -> ConfigResult<String> {
    let value = Value::Object(visible(tree, include_internal));
    format
        .render(&value)
        .map_err(|reason| ConfigError::Serialize {
            format: format.name(),
            reason,
        })
}

/// Write `tree` to `path`, creating missing parent directories. The format
/// follows the file extension.
pub fn write_file(path: &Path, tree: &ConfigTree, include_internal: bool) -> ConfigResult<()> {
    let text = render(tree, FileFormat::from_path(path), include_internal)?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::Persistence {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, text).map_err(|source| ConfigError::Persistence {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), include_internal, "Wrote configuration file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn sample() -> ConfigTree {
        match json!({
            "application": {"port": 9000, "verbose": true, "internal": "kept"},
            "internal": {"debug": true}
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_filter_drops_only_top_level_internal() {
        let filtered = filter_internal(&sample());
        assert!(!filtered.contains_key("internal"));
        assert_eq!(filtered["application"]["internal"], json!("kept"));
    }

    #[test]
    fn test_render_with_internal() {
        let text = render(&sample(), FileFormat::Toml, true).unwrap();
        assert!(text.contains("[internal]"));
        let text = render(&sample(), FileFormat::Toml, false).unwrap();
        assert!(!text.contains("[internal]"));
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested/dir/config.toml");
        write_file(&path, &sample(), false).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("port = 9000"));
    }

    #[test]
    fn test_write_is_byte_identical() {
        let tmp = TempDir::new().unwrap();
        let first = tmp.path().join("a.yaml");
        let second = tmp.path().join("b.yaml");
        write_file(&first, &sample(), true).unwrap();
        write_file(&second, &sample(), true).unwrap();
        assert_eq!(
            std::fs::read(&first).unwrap(),
            std::fs::read(&second).unwrap()
        );
    }

    #[test]
    fn test_write_into_file_parent_fails() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();
        let err = write_file(&blocker.join("config.toml"), &sample(), false).unwrap_err();
        assert!(matches!(err, ConfigError::Persistence { .. }));
    }
}
