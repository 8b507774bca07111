use std::path::PathBuf;

use thiserror::Error;

/// Unified error type for relsync operations
#[derive(Error, Debug)]
pub enum RelsyncError {
    #[error("Invalid version '{input}': {reason}")]
    InvalidVersion { input: String, reason: String },

    #[error("Parent chart version is missing or unreadable: {}", .0.display())]
    MissingParentVersion(PathBuf),

    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Manifest error: {0}")]
    Manifest(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("State file error: {0}")]
    State(String),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in relsync
pub type Result<T> = std::result::Result<T, RelsyncError>;

impl RelsyncError {
    /// Create an invalid-version error for the given input
    pub fn invalid_version(input: impl Into<String>, reason: impl Into<String>) -> Self {
        RelsyncError::InvalidVersion {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Create a repository error with context
    pub fn repository(msg: impl Into<String>) -> Self {
        RelsyncError::Repository(msg.into())
    }

    /// Create a manifest error with context
    pub fn manifest(msg: impl Into<String>) -> Self {
        RelsyncError::Manifest(msg.into())
    }

    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        RelsyncError::Config(msg.into())
    }

    /// Create a state error with context
    pub fn state(msg: impl Into<String>) -> Self {
        RelsyncError::State(msg.into())
    }
}
