//! Configuration file loading and management
//!
//! This module handles loading and parsing the host configuration from
//! `$XDG_CONFIG_HOME/dart/config.toml`. If the configuration file doesn't
//! exist, a default configuration is created with documented comments.

use anyhow::{Context, Result};
use dart_i18n::{LanguageState, PermissionStore, DEFAULT_LANGUAGE};
use dart_plugin_runtime::{default_plugins_dir, DuplicatePolicy, RunConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Main host configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Extension runtime configuration
    #[serde(default)]
    pub runtime: RuntimeConfig,
    /// Language configuration
    #[serde(default)]
    pub localization: LocalizationConfig,
    /// Permission decision configuration
    #[serde(default)]
    pub permissions: PermissionsConfig,
    /// Extension-specific configurations
    #[serde(default)]
    pub plugins: HashMap<String, PluginConfig>,
}

/// Extension runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RuntimeConfig {
    /// Directory scanned for extension units
    /// If None, uses XDG_DATA_HOME/dart/plugins
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugins_dir: Option<PathBuf>,
    /// Directory holding the host translations
    /// If None, uses XDG_DATA_HOME/dart/locales
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locales_dir: Option<PathBuf>,
    /// Log level (trace, debug, info, warn, error)
    /// Default: "info"
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// What to do when two extensions share a name
    /// Default: "reject"
    #[serde(default)]
    pub on_duplicate: DuplicatePolicy,
}

/// Language configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocalizationConfig {
    /// Languages translations are loaded for
    pub supported_languages: Vec<String>,
    /// Language used at startup
    pub language: String,
    /// Last language tried before giving up on a key
    /// Default: "ko"
    #[serde(default = "default_language")]
    pub default_language: String,
    /// Languages tried, in order, after the current one
    /// The default language is always tried last
    pub fallback_chain: Vec<String>,
}

/// Permission decision configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PermissionsConfig {
    /// Path to the decisions file
    /// If None, uses XDG_DATA_HOME/dart/permissions.json
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_path: Option<PathBuf>,
    /// How undecided permissions are answered
    #[serde(default)]
    pub consent: ConsentMode,
}

/// How undecided permission requests are answered.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ConsentMode {
    /// Ask on the console
    #[default]
    Prompt,
    /// Grant everything without asking
    Grant,
    /// Deny everything without asking
    Deny,
}

/// Per-extension configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PluginConfig {
    /// Overrides the extension's declared `enabled` flag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Extension-specific settings, passed through unchanged
    #[serde(default = "default_settings")]
    pub settings: toml::Value,
}

fn default_settings() -> toml::Value {
    toml::Value::Table(toml::map::Map::new())
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            plugins_dir: None,
            locales_dir: None,
            log_level: default_log_level(),
            on_duplicate: DuplicatePolicy::Reject,
        }
    }
}

impl Default for LocalizationConfig {
    fn default() -> Self {
        let state = LanguageState::default();
        Self {
            supported_languages: state.supported().to_vec(),
            language: state.current().to_string(),
            default_language: state.default_language().to_string(),
            fallback_chain: state.fallback_chain().to_vec(),
        }
    }
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            enabled: None,
            settings: default_settings(),
        }
    }
}

impl Config {
    /// Load configuration from the specified path
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from `path`, writing the documented default file
    /// first if it does not exist.
    pub fn load_or_create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            Self::create_default_file(path)?;
        }
        Self::load(path)
    }

    /// Load configuration from the default XDG config location
    pub fn load_default() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        Self::load_or_create(&config_path)
    }

    /// Get the default configuration file path
    ///
    /// Returns `$XDG_CONFIG_HOME/dart/config.toml`
    pub fn default_config_path() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }

    /// Create a default configuration file with documented comments
    fn create_default_file(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        fs::write(path, Self::default_config_content())
            .with_context(|| format!("Failed to write default config file: {}", path.display()))?;

        tracing::info!("Created default configuration file at: {}", path.display());
        Ok(())
    }

    /// Generate the default configuration file content with comments
    fn default_config_content() -> String {
        r#"# DART Host Configuration
# This file configures how extensions are loaded and run.

[runtime]
# Directory scanned for extension units (one subdirectory per unit,
# each with a manifest.toml)
# If not specified, defaults to $XDG_DATA_HOME/dart/plugins
# plugins_dir = "/path/to/plugins"

# Directory holding the host translations (<lang>/<file>.json)
# If not specified, defaults to $XDG_DATA_HOME/dart/locales
# locales_dir = "/path/to/locales"

# Log level: trace, debug, info, warn, error
# Default: "info"
log_level = "info"

# Two extensions with the same name: "reject" the later one or
# "replace" the earlier one
# Default: "reject"
on_duplicate = "reject"

[localization]
# Languages translations are loaded for
supported_languages = ["ko", "en"]

# Language used at startup (must be supported)
language = "ko"

# Last language tried before giving up on a key (must be supported)
# Default: "ko"
default_language = "ko"

# Languages tried, in order, when a key is missing in the current one
# The default language is always tried last, even if not listed
fallback_chain = ["en", "ko"]

[permissions]
# Path to the saved permission decisions
# If not specified, defaults to $XDG_DATA_HOME/dart/permissions.json
# store_path = "/path/to/permissions.json"

# How undecided permissions are answered: "prompt", "grant" or "deny"
# Default: "prompt"
consent = "prompt"

# Extension-specific configurations
# Each extension can be configured with:
# - enabled: Overrides the flag declared in its manifest
# - settings: Passed to the extension unchanged

# Example: sample pre-main extension
# [plugins.sample_init]
# enabled = true
#
# [plugins.sample_init.settings]
# timeout = 5
"#
        .to_string()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.runtime.log_level.as_str()) {
            anyhow::bail!(
                "Invalid log_level: {}. Must be one of: {}",
                self.runtime.log_level,
                valid_log_levels.join(", ")
            );
        }

        for (name, path) in [
            ("runtime.plugins_dir", &self.runtime.plugins_dir),
            ("runtime.locales_dir", &self.runtime.locales_dir),
            ("permissions.store_path", &self.permissions.store_path),
        ] {
            if path.as_ref().is_some_and(|p| p.as_os_str().is_empty()) {
                anyhow::bail!("{} must not be empty", name);
            }
        }

        self.language_state()?;
        Ok(())
    }

    /// Language state described by the `[localization]` section
    pub fn language_state(&self) -> Result<LanguageState> {
        let l10n = &self.localization;
        LanguageState::new(
            l10n.supported_languages.clone(),
            l10n.language.clone(),
            l10n.default_language.clone(),
            l10n.fallback_chain.clone(),
        )
        .context("Invalid [localization] section")
    }

    /// Get the plugins directory
    pub fn plugins_dir(&self) -> Result<PathBuf> {
        if let Some(ref path) = self.runtime.plugins_dir {
            return Ok(path.clone());
        }
        default_plugins_dir().context("Failed to determine project directories")
    }

    /// Get the host locales directory
    pub fn locales_dir(&self) -> Result<PathBuf> {
        if let Some(ref path) = self.runtime.locales_dir {
            return Ok(path.clone());
        }
        Ok(project_dirs()?.data_dir().join("locales"))
    }

    /// Get the permission decisions file path
    pub fn permission_store_path(&self) -> Result<PathBuf> {
        if let Some(ref path) = self.permissions.store_path {
            return Ok(path.clone());
        }
        PermissionStore::default_path().context("Failed to determine project directories")
    }

    /// Settings of every configured extension, keyed by extension name
    pub fn run_config(&self) -> Result<RunConfig> {
        self.plugins
            .iter()
            .map(|(name, plugin)| {
                let value = serde_json::to_value(&plugin.settings)
                    .with_context(|| format!("Invalid settings for extension '{}'", name))?;
                Ok((name.clone(), value))
            })
            .collect()
    }
}

fn project_dirs() -> Result<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "dart-planner", "dart")
        .context("Failed to determine project directories")
}
