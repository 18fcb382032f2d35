//! Error types for savewarden-core

use thiserror::Error;

/// Result type alias using savewarden-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for Savewarden
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Invalid configuration
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The archive directory does not exist yet. Distinct from a generic IO
    /// failure so callers can show an actionable message instead of an errno.
    #[error(
        "archive directory {path} doesn't exist yet; start the game server once \
         so the save directory is created, then refresh"
    )]
    ArchiveDirMissing { path: String },

    /// Save metadata could not be decoded from an archive container
    #[error("unreadable save metadata in {path}: {message}")]
    SaveMetadata { path: String, message: String },

    /// Restore index out of range
    #[error("invalid backup index {index} (have {available} backups)")]
    InvalidBackupIndex { index: usize, available: usize },

    /// Restore forward copy failed; the previous live save was rolled back
    #[error("failed to restore backup: {source}")]
    RestoreFailed {
        #[source]
        source: std::io::Error,
    },

    /// Both the restore copy and the rollback copy failed. The pre-restore
    /// save still exists at `snapshot` so an operator can recover manually.
    #[error(
        "failed to restore backup: {restore_error}; additionally failed to roll \
         back the previous save: {rollback_error}. Pre-restore save kept at: {snapshot}"
    )]
    RestoreRollbackFailed {
        restore_error: std::io::Error,
        rollback_error: std::io::Error,
        snapshot: String,
    },
}

impl Error {
    /// Create a config not found error
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an archive dir missing error
    pub fn archive_dir_missing(path: impl Into<String>) -> Self {
        Self::ArchiveDirMissing { path: path.into() }
    }

    /// Create a save metadata error
    pub fn save_metadata(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SaveMetadata {
            path: path.into(),
            message: message.into(),
        }
    }

    /// True for the structural "directory not there yet" case, which callers
    /// typically render as guidance rather than a failure.
    pub fn is_archive_dir_missing(&self) -> bool {
        matches!(self, Self::ArchiveDirMissing { .. })
    }
}
