//! Configuration loader with tier-based merging.
//!
//! Runs one merge pass per tier, lowest priority first, and hands the result
//! to [`Settings`].

use super::bindings::Bindings;
use super::merge::{ConfigTree, merge};
use super::schema::Schema;
use super::settings::Settings;
use super::sources::{CliOverrides, CliSource, EnvSnapshot, EnvSource, FileSource, Source};
use crate::error::ConfigResult;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Configuration tier priority (lowest to highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigTier {
    /// Schema defaults (lowest priority)
    Defaults = 0,
    /// Bound process environment variables
    Environment = 1,
    /// Variables read from a dotenv file
    Dotenv = 2,
    /// System-wide configuration file, or the file named with `--conf`
    System = 3,
    /// Per-user configuration file
    User = 4,
    /// Flags supplied on the command line (highest priority)
    CommandLine = 5,
}

impl std::fmt::Display for ConfigTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigTier::Defaults => write!(f, "defaults"),
            ConfigTier::Environment => write!(f, "environment"),
            ConfigTier::Dotenv => write!(f, "dotenv"),
            ConfigTier::System => write!(f, "system"),
            ConfigTier::User => write!(f, "user"),
            ConfigTier::CommandLine => write!(f, "command line"),
        }
    }
}

/// Configuration files for each file tier.
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    /// System-wide configuration file
    pub system_file: Option<PathBuf>,
    /// Per-user configuration file
    pub user_file: Option<PathBuf>,
    /// File named explicitly on the command line; replaces both files above
    pub explicit_file: Option<PathBuf>,
}

impl ConfigPaths {
    /// Create paths with explicit system and user files.
    pub fn with_files(system_file: Option<PathBuf>, user_file: Option<PathBuf>) -> Self {
        Self {
            system_file,
            user_file,
            explicit_file: None,
        }
    }

    /// Read only `file`.
    pub fn explicit(file: impl Into<PathBuf>) -> Self {
        Self {
            system_file: None,
            user_file: None,
            explicit_file: Some(file.into()),
        }
    }

    /// File read at the system tier.
    pub fn effective_system_file(&self) -> Option<&Path> {
        self.explicit_file
            .as_deref()
            .or(self.system_file.as_deref())
    }

    /// File read at the user tier. None when an explicit file was given.
    pub fn effective_user_file(&self) -> Option<&Path> {
        match self.explicit_file {
            Some(_) => None,
            None => self.user_file.as_deref(),
        }
    }

    /// Highest-priority file; where `Settings::write` persists.
    pub fn write_target(&self) -> Option<&Path> {
        self.explicit_file
            .as_deref()
            .or(self.user_file.as_deref())
            .or(self.system_file.as_deref())
    }
}

/// Resolves a [`Settings`] from every configuration tier.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    schema: Schema,
    bindings: Bindings,
    /// Paths for each file tier
    pub paths: ConfigPaths,
    env: EnvSnapshot,
    cli: CliOverrides,
}

impl ConfigLoader {
    /// Loader with no files, an empty environment and no command line.
    pub fn new(schema: Schema, bindings: Bindings) -> Self {
        Self {
            schema,
            bindings,
            paths: ConfigPaths::default(),
            env: EnvSnapshot::default(),
            cli: CliOverrides::new(),
        }
    }

    pub fn with_paths(mut self, paths: ConfigPaths) -> Self {
        self.paths = paths;
        self
    }

    /// Environment (and any dotenv contents already loaded into it).
    pub fn with_environment(mut self, env: EnvSnapshot) -> Self {
        self.env = env;
        self
    }

    pub fn with_cli(mut self, cli: CliOverrides) -> Self {
        self.cli = cli;
        self
    }

    /// Run every tier and return the resolved settings.
    pub fn load(self) -> ConfigResult<Settings> {
        let environment = EnvSource::environment(&self.bindings, &self.env);
        let dotenv = EnvSource::dotenv(&self.bindings, &self.env);
        let system = self.paths.effective_system_file().map(FileSource::load);
        let user = self.paths.effective_user_file().map(FileSource::load);
        let cli = CliSource::new(&self.bindings, &self.cli);

        let mut tiers: Vec<(ConfigTier, &dyn Source)> = vec![
            (ConfigTier::Environment, &environment as &dyn Source),
            (ConfigTier::Dotenv, &dotenv as &dyn Source),
        ];
        if let Some(system) = &system {
            tiers.push((ConfigTier::System, system as &dyn Source));
        }
        if let Some(user) = &user {
            tiers.push((ConfigTier::User, user as &dyn Source));
        }
        tiers.push((ConfigTier::CommandLine, &cli as &dyn Source));

        debug!(tier = %ConfigTier::Defaults, "Seeding configuration from schema");
        let mut tree = ConfigTree::new();
        for (tier, source) in tiers {
            tree = merge(&self.schema, &tree, source, true)?;
            debug!(%tier, source = source.label(), keys = tree.len(), "Merged configuration tier");
        }

        let target = self.paths.write_target().map(Path::to_path_buf);
        let mut settings = Settings::from_tree(self.schema, tree)?;
        if let Some(target) = target {
            settings = settings.with_write_target(target);
        }
        Ok(settings)
    }
}
