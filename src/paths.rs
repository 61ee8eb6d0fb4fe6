//! Execution modes and the directories each one reads configuration from.
//!
//! - **Debug** - development checkout: `./dev/data/conf`, dotenv `./.env`
//! - **Docker** - container (`/.dockerenv` present): `/app/data/conf`, dotenv `/app/.env`
//! - **System** - privileged account: the system configuration directory
//! - **User** - everything else: the per-user configuration directory

use crate::app::{CONFIG_FILE, SOFTWARE};
use crate::config::ConfigPaths;
use std::path::{Path, PathBuf};

/// How the process is being run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    Debug,
    Docker,
    System,
    User,
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionMode::Debug => write!(f, "debug"),
            ExecutionMode::Docker => write!(f, "docker"),
            ExecutionMode::System => write!(f, "system"),
            ExecutionMode::User => write!(f, "user"),
        }
    }
}

impl ExecutionMode {
    /// Detect the mode. `development` forces Debug.
    pub fn detect(development: bool) -> Self {
        if development {
            ExecutionMode::Debug
        } else if Path::new("/.dockerenv").exists() {
            ExecutionMode::Docker
        } else if has_system_rights() {
            ExecutionMode::System
        } else {
            ExecutionMode::User
        }
    }

    /// Whether a dotenv file is read in this mode.
    pub fn loads_dotenv(self) -> bool {
        matches!(self, ExecutionMode::Debug | ExecutionMode::Docker)
    }
}

/// Accounts below uid 1000 are system accounts.
#[cfg(unix)]
fn has_system_rights() -> bool {
    is_system_uid(users::get_effective_uid())
}

#[cfg_attr(not(unix), allow(dead_code))]
fn is_system_uid(uid: u32) -> bool {
    uid < 1000
}

#[cfg(not(unix))]
fn has_system_rights() -> bool {
    false
}

/// Configuration locations for one execution mode.
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub mode: ExecutionMode,
    /// System-wide configuration directory
    pub system_conf_dir: PathBuf,
    /// Configuration directory of this mode; holds the writable file
    pub conf_dir: PathBuf,
    /// Dotenv file, in modes that read one
    pub dotenv_file: Option<PathBuf>,
}

impl AppPaths {
    pub fn for_mode(mode: ExecutionMode) -> Self {
        let system_conf_dir = system_conf_dir();
        let (conf_dir, dotenv_file) = match mode {
            ExecutionMode::Docker => (
                PathBuf::from("/app/data/conf"),
                Some(PathBuf::from("/app/.env")),
            ),
            ExecutionMode::Debug => (
                PathBuf::from("dev").join("data").join("conf"),
                Some(PathBuf::from(".env")),
            ),
            ExecutionMode::System => (system_conf_dir.clone(), None),
            ExecutionMode::User => (user_conf_dir(), None),
        };
        Self {
            mode,
            system_conf_dir,
            conf_dir,
            dotenv_file,
        }
    }

    /// Files the loader reads. An explicit file replaces both defaults.
    pub fn config_paths(&self, explicit: Option<PathBuf>) -> ConfigPaths {
        match explicit {
            Some(file) => ConfigPaths::explicit(file),
            None => ConfigPaths::with_files(
                Some(self.system_conf_dir.join(CONFIG_FILE)),
                Some(self.conf_dir.join(CONFIG_FILE)),
            ),
        }
    }
}

fn directory_name() -> String {
    SOFTWARE.to_lowercase()
}

#[cfg(unix)]
fn system_conf_dir() -> PathBuf {
    PathBuf::from("/etc").join(directory_name())
}

#[cfg(not(unix))]
fn system_conf_dir() -> PathBuf {
    dirs::config_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(directory_name())
}

fn user_conf_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(directory_name())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_uid_boundary() {
        assert!(is_system_uid(0));
        assert!(is_system_uid(999));
        assert!(!is_system_uid(1000));
    }

    #[test]
    fn test_development_forces_debug() {
        assert_eq!(ExecutionMode::detect(true), ExecutionMode::Debug);
    }

    #[test]
    fn test_dotenv_only_in_debug_and_docker() {
        assert!(ExecutionMode::Debug.loads_dotenv());
        assert!(ExecutionMode::Docker.loads_dotenv());
        assert!(!ExecutionMode::System.loads_dotenv());
        assert!(!ExecutionMode::User.loads_dotenv());
    }

    #[test]
    fn test_debug_paths_are_relative() {
        let paths = AppPaths::for_mode(ExecutionMode::Debug);
        assert_eq!(paths.conf_dir, PathBuf::from("dev/data/conf"));
        assert_eq!(paths.dotenv_file, Some(PathBuf::from(".env")));
        let files = paths.config_paths(None);
        assert_eq!(
            files.write_target(),
            Some(Path::new("dev/data/conf/config.toml"))
        );
    }

    #[test]
    fn test_explicit_file_is_write_target() {
        let paths = AppPaths::for_mode(ExecutionMode::User);
        let files = paths.config_paths(Some(PathBuf::from("custom.toml")));
        assert_eq!(files.effective_user_file(), None);
        assert_eq!(files.write_target(), Some(Path::new("custom.toml")));
    }

    #[test]
    fn test_user_dir_named_after_software() {
        let paths = AppPaths::for_mode(ExecutionMode::User);
        assert!(paths.conf_dir.ends_with("vesselharbor"));
        assert!(paths.dotenv_file.is_none());
    }
}
