//! Config subcommand for vesselharbor
//!
//! Reads and edits the resolved configuration. Edits are persisted to the
//! configuration file the settings were loaded for.

use crate::config::Settings;
use anyhow::Result;
use clap::{Args, Subcommand};
use serde_json::Value;
use std::io::Write;

/// Arguments for the config subcommand
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the value of a dotted key
    Get {
        #[arg(value_name = "KEY")]
        key: String,
    },
    /// Set a dotted key and save the configuration file
    Set {
        #[arg(value_name = "KEY")]
        key: String,
        /// New value; converted to the key's type
        #[arg(value_name = "VALUE")]
        value: String,
    },
    /// Remove a stored value so the default applies again, and save
    Unset {
        #[arg(value_name = "KEY")]
        key: String,
    },
    /// List the members of a section (top-level sections by default)
    List {
        #[arg(value_name = "PREFIX", default_value = "")]
        prefix: String,
    },
    /// Print the stored configuration
    Show {
        /// Include the internal section
        #[arg(long)]
        internal: bool,
        /// Print the effective configuration, defaults included, as JSON
        #[arg(long)]
        json: bool,
    },
    /// Save the configuration file
    Save {
        /// Include the internal section
        #[arg(long)]
        internal: bool,
    },
}

/// Strings print bare; everything else prints as JSON.
fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Run a config action against `settings`, writing output to `out`.
pub fn run(settings: &mut Settings, args: &ConfigArgs, out: &mut impl Write) -> Result<()> {
    match &args.action {
        ConfigAction::Get { key } => {
            writeln!(out, "{}", display(&settings.get(key)?))?;
        }
        ConfigAction::Set { key, value } => {
            let stored = settings.set(key, value.as_str())?;
            let path = settings.write(false)?;
            tracing::debug!(key, path = %path.display(), "Saved configuration");
            writeln!(out, "{key} = {}", display(&stored))?;
        }
        ConfigAction::Unset { key } => {
            if settings.delete(key)? {
                settings.write(false)?;
            }
            writeln!(out, "{key} = {}", display(&settings.get(key)?))?;
        }
        ConfigAction::List { prefix } => {
            for name in settings.enumerate(prefix)? {
                writeln!(out, "{name}")?;
            }
        }
        ConfigAction::Show { internal, json } => {
            let text = if *json {
                settings.to_json(*internal)?
            } else {
                settings.to_text(*internal)?
            };
            write!(out, "{text}")?;
        }
        ConfigAction::Save { internal } => {
            let path = settings.write(*internal)?;
            writeln!(out, "{}", path.display())?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app;
    use crate::error::ConfigError;
    use tempfile::TempDir;

    fn settings(tmp: &TempDir) -> Settings {
        let (schema, _) = app::build(&app::modules());
        Settings::new(schema).with_write_target(tmp.path().join("config.toml"))
    }

    fn run_to_string(settings: &mut Settings, action: ConfigAction) -> Result<String> {
        let mut out = Vec::new();
        run(settings, &ConfigArgs { action }, &mut out)?;
        Ok(String::from_utf8(out)?)
    }

    #[test]
    fn test_get_prints_default() {
        let tmp = TempDir::new().unwrap();
        let mut settings = settings(&tmp);
        let out = run_to_string(
            &mut settings,
            ConfigAction::Get {
                key: "application.port".into(),
            },
        )
        .unwrap();
        assert_eq!(out, "8010\n");
    }

    #[test]
    fn test_set_saves_file() {
        let tmp = TempDir::new().unwrap();
        let mut settings = settings(&tmp);
        let out = run_to_string(
            &mut settings,
            ConfigAction::Set {
                key: "accounts.jane.token".into(),
                value: "abc".into(),
            },
        )
        .unwrap();
        assert_eq!(out, "accounts.jane.token = abc\n");
        let saved = std::fs::read_to_string(tmp.path().join("config.toml")).unwrap();
        assert!(saved.contains("jane"));
        assert!(saved.contains("token = \"abc\""));
    }

    #[test]
    fn test_unknown_key_is_config_error() {
        let tmp = TempDir::new().unwrap();
        let mut settings = settings(&tmp);
        let err = run_to_string(
            &mut settings,
            ConfigAction::Get {
                key: "application.colour".into(),
            },
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::UndefinedPath { .. })
        ));
    }

    #[test]
    fn test_list_top_level() {
        let tmp = TempDir::new().unwrap();
        let mut settings = settings(&tmp);
        let out = run_to_string(
            &mut settings,
            ConfigAction::List {
                prefix: String::new(),
            },
        )
        .unwrap();
        assert_eq!(out, "accounts\napplication\ninternal\n");
    }

    #[test]
    fn test_unset_restores_default() {
        let tmp = TempDir::new().unwrap();
        let mut settings = settings(&tmp);
        settings.set("application.user", "jane@example.com").unwrap();
        let out = run_to_string(
            &mut settings,
            ConfigAction::Unset {
                key: "application.user".into(),
            },
        )
        .unwrap();
        assert_eq!(out, "application.user = example@example.com\n");
    }
}
