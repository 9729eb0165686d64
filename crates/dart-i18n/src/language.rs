//! Language selection and fallback order.

use crate::error::{I18nError, I18nResult};
use serde::{Deserialize, Serialize};

/// Languages shipped by default.
pub const DEFAULT_SUPPORTED: [&str; 2] = ["ko", "en"];

/// Language used when nothing else is configured.
pub const DEFAULT_LANGUAGE: &str = "ko";

/// Current language, supported set and fallback chain.
///
/// The current and default languages are always members of the supported
/// set, and the fallback chain always ends with the default language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageState {
    current: String,
    supported: Vec<String>,
    default_language: String,
    fallback_chain: Vec<String>,
}

impl Default for LanguageState {
    fn default() -> Self {
        let supported: Vec<String> = DEFAULT_SUPPORTED.iter().map(|s| s.to_string()).collect();
        Self {
            current: DEFAULT_LANGUAGE.to_string(),
            default_language: DEFAULT_LANGUAGE.to_string(),
            fallback_chain: terminate_chain(supported.clone(), DEFAULT_LANGUAGE),
            supported,
        }
    }
}

impl LanguageState {
    /// Build a language state, checking that every language is supported.
    ///
    /// The default language is moved to the end of `fallback_chain`, or
    /// appended when the chain does not list it.
    pub fn new(
        supported: Vec<String>,
        current: impl Into<String>,
        default_language: impl Into<String>,
        fallback_chain: Vec<String>,
    ) -> I18nResult<Self> {
        let current = current.into();
        let default_language = default_language.into();

        if supported.is_empty() {
            return Err(I18nError::InvalidLanguageConfig(
                "No supported languages".to_string(),
            ));
        }
        for (i, lang) in supported.iter().enumerate() {
            if supported[..i].contains(lang) {
                return Err(I18nError::InvalidLanguageConfig(format!(
                    "Language '{}' listed twice",
                    lang
                )));
            }
        }
        if !supported.contains(&current) {
            return Err(I18nError::InvalidLanguageConfig(format!(
                "Current language '{}' is not supported",
                current
            )));
        }
        if !supported.contains(&default_language) {
            return Err(I18nError::InvalidLanguageConfig(format!(
                "Default language '{}' is not supported",
                default_language
            )));
        }
        if let Some(lang) = fallback_chain.iter().find(|l| !supported.contains(l)) {
            return Err(I18nError::InvalidLanguageConfig(format!(
                "Fallback language '{}' is not supported",
                lang
            )));
        }

        Ok(Self {
            fallback_chain: terminate_chain(fallback_chain, &default_language),
            current,
            supported,
            default_language,
        })
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    pub fn supported(&self) -> &[String] {
        &self.supported
    }

    /// Last language tried before the caller's default text.
    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    pub fn fallback_chain(&self) -> &[String] {
        &self.fallback_chain
    }

    pub fn is_supported(&self, language: &str) -> bool {
        self.supported.iter().any(|l| l == language)
    }

    /// Switch the current language. Unsupported languages leave state untouched.
    pub fn set_current(&mut self, language: &str) -> I18nResult<()> {
        if !self.is_supported(language) {
            return Err(I18nError::UnsupportedLanguage(language.to_string()));
        }
        self.current = language.to_string();
        Ok(())
    }

    /// Languages to try, in order: the current one, then the fallback chain,
    /// each at most once.
    pub fn candidates(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::with_capacity(self.fallback_chain.len() + 1);
        for lang in std::iter::once(&self.current).chain(&self.fallback_chain) {
            if !out.contains(lang) {
                out.push(lang.clone());
            }
        }
        out
    }
}

fn terminate_chain(mut chain: Vec<String>, default_language: &str) -> Vec<String> {
    chain.retain(|l| l != default_language);
    chain.push(default_language.to_string());
    chain
}
