//! Structured error types for configuration resolution.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors
    UndefinedPath,
    CoercionFailed,

    // Source errors
    SourceUnavailable,

    // Output errors
    PersistenceFailed,
    NoWriteTarget,

    // Internal errors
    InternalError,
}

impl ErrorCode {
    /// Process exit status for this class of error.
    pub fn exit_status(self) -> ExitStatus {
        match self {
            ErrorCode::UndefinedPath | ErrorCode::CoercionFailed | ErrorCode::NoWriteTarget => {
                ExitStatus::Validation
            }
            ErrorCode::SourceUnavailable
            | ErrorCode::PersistenceFailed
            | ErrorCode::InternalError => ExitStatus::Internal,
        }
    }
}

/// Exit codes shared by every command that consumes the configuration engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success = 0,
    /// Recoverable validation or lookup failure.
    Validation = 1,
    /// Authentication failure (raised by the API layers, never by this crate).
    Authentication = 2,
    /// Unexpected or internal failure.
    Internal = 3,
}

impl ExitStatus {
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// A raw value could not be converted to the type of its schema leaf.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("cannot convert {raw} to {expected}")]
pub struct CoercionError {
    /// The offending raw value, rendered as JSON.
    pub raw: String,
    /// Name of the expected type.
    pub expected: &'static str,
}

impl CoercionError {
    pub fn new(raw: &serde_json::Value, expected: &'static str) -> Self {
        Self {
            raw: raw.to_string(),
            expected,
        }
    }
}

/// Errors raised by schema navigation, merging, and persistence.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{path} is not defined in configuration")]
    UndefinedPath { path: String },

    #[error("invalid value for {path}: {source}")]
    Coercion {
        path: String,
        #[source]
        source: CoercionError,
    },

    #[error("configuration source {} is unavailable: {reason}", path.display())]
    SourceUnavailable { path: PathBuf, reason: String },

    #[error("failed to write configuration to {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to render configuration as {format}: {reason}")]
    Serialize {
        format: &'static str,
        reason: String,
    },

    #[error("no configuration file location is available for writing")]
    NoWriteTarget,

    #[error("process configuration is already installed")]
    AlreadyInstalled,
}

impl ConfigError {
    pub fn undefined(segments: &[impl AsRef<str>]) -> Self {
        ConfigError::UndefinedPath {
            path: dotted(segments),
        }
    }

    pub fn coercion(segments: &[impl AsRef<str>], source: CoercionError) -> Self {
        ConfigError::Coercion {
            path: dotted(segments),
            source,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            ConfigError::UndefinedPath { .. } => ErrorCode::UndefinedPath,
            ConfigError::Coercion { .. } => ErrorCode::CoercionFailed,
            ConfigError::SourceUnavailable { .. } => ErrorCode::SourceUnavailable,
            ConfigError::Persistence { .. } => ErrorCode::PersistenceFailed,
            ConfigError::NoWriteTarget => ErrorCode::NoWriteTarget,
            ConfigError::Serialize { .. } | ConfigError::AlreadyInstalled => {
                ErrorCode::InternalError
            }
        }
    }

    pub fn exit_status(&self) -> ExitStatus {
        self.code().exit_status()
    }
}

/// Join path segments with `.`.
pub fn dotted(segments: &[impl AsRef<str>]) -> String {
    segments
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join(".")
}

/// Result type for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
