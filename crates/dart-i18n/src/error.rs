//! Error types for localization and permissions.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the permission store.
#[derive(Error, Debug)]
pub enum PermissionError {
    #[error("Failed to load permissions: {0}")]
    LoadFailed(String),

    #[error("Failed to save permissions: {0}")]
    SaveFailed(String),
}

/// Errors that can occur in the localization layer.
#[derive(Error, Debug)]
pub enum I18nError {
    /// The language is not in the supported set.
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// A translation resource is missing or malformed.
    #[error("Failed to load translations from {path:?}: {reason}")]
    Resource { path: PathBuf, reason: String },

    /// Supported languages, current language and fallback chain disagree.
    #[error("Invalid language configuration: {0}")]
    InvalidLanguageConfig(String),

    /// A permission identifier outside of the known vocabulary.
    #[error("Invalid permission: {0}")]
    InvalidPermission(String),

    #[error(transparent)]
    Permission(#[from] PermissionError),
}

impl I18nError {
    pub(crate) fn resource(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        I18nError::Resource {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result type for localization operations.
pub type I18nResult<T> = std::result::Result<T, I18nError>;
