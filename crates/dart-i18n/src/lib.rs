//! # dart-i18n
//!
//! Localization for DART and its extensions.
//!
//! This crate provides:
//! - Translation tables per namespace and language, loaded from JSON
//! - Language selection with a deterministic fallback chain
//! - A permission gate with persisted decisions and pluggable consent
//! - The resolver extensions reach through their execution context
//!
//! ## Resource Layout
//!
//! - `<locales>/<lang>/<file>.json` for the host, keys become `<file>.<key>`
//! - `<plugin>/locales/<lang>/*.json` for an extension, keys are used as is

pub mod error;
pub mod language;
pub mod namespace;
pub mod permissions;
pub mod resolver;
pub mod store;

pub use error::{I18nError, I18nResult, PermissionError};
pub use language::{LanguageState, DEFAULT_LANGUAGE};
pub use namespace::TranslationNamespace;
pub use permissions::{
    ConsentPrompt, ConsentRequest, Decision, PermissionGate, PermissionRecord, PermissionStore,
    Records, StaticConsent,
};
pub use resolver::Localization;
pub use store::TranslationStore;
