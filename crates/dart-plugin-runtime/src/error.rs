//! Error types for the extension runtime.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur in the extension runtime.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// No extension is registered under the given name.
    #[error("Extension not found: {0}")]
    NotFound(String),

    /// An extension with the same name is already registered.
    #[error("Extension '{0}' is already registered")]
    RegistrationConflict(String),

    /// Failed to parse or validate an extension manifest.
    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    /// A source unit could not be loaded during discovery.
    #[error("Failed to load extension unit at {path:?}: {reason}")]
    Discovery { path: PathBuf, reason: String },

    /// A manifest referenced an entry point the host does not provide.
    #[error("Unknown entry point: {0}")]
    UnknownEntryPoint(String),

    /// A stage identifier outside of the fixed stage set.
    #[error("Unknown stage: {0}")]
    UnknownStage(String),

    /// A permission identifier outside of the known vocabulary.
    #[error("Invalid permission: {0}")]
    InvalidPermission(String),

    /// An extension body reported a failure.
    #[error("Execution error: {0}")]
    ExecutionError(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl RuntimeError {
    /// Shorthand for an execution failure raised from inside an extension body.
    pub fn execution(message: impl Into<String>) -> Self {
        RuntimeError::ExecutionError(message.into())
    }
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = std::result::Result<T, RuntimeError>;
