use std::path::PathBuf;

use thiserror::Error;

/// Unified error type for harbor-release operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error("Invalid semantic version format: '{0}'")]
    InvalidVersionFormat(String),

    #[error("Unknown increment policy: '{0}' (expected major, minor, patch or rc)")]
    UnknownIncrementPolicy(String),

    #[error("Version mismatch: {left_label} ({left}) != {right_label} ({right})")]
    VersionMismatch {
        left_label: String,
        left: String,
        right_label: String,
        right: String,
    },

    #[error("Current version ({current}) doesn't match target ({target})")]
    TargetMismatch { current: String, target: String },

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Field '{field}' not found in {}", .path.display())]
    MissingField { field: String, path: PathBuf },

    #[error("Version control query failed: {0}")]
    VcsQueryFailed(String),

    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Release aborted: {0}")]
    Release(String),
}

/// Convenience type alias for Results in harbor-release
pub type Result<T> = std::result::Result<T, ReleaseError>;

impl ReleaseError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        ReleaseError::Config(msg.into())
    }

    /// Create a version control error with context
    pub fn vcs(msg: impl Into<String>) -> Self {
        ReleaseError::VcsQueryFailed(msg.into())
    }

    /// Create a release workflow error with context
    pub fn release(msg: impl Into<String>) -> Self {
        ReleaseError::Release(msg.into())
    }

    pub fn invalid_version(raw: impl Into<String>) -> Self {
        ReleaseError::InvalidVersionFormat(raw.into())
    }
}
