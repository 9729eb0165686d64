//! The host-facing runtime.
//!
//! Owns the extension registry and the shared localization service, and is
//! what the application calls at each lifecycle point.

use crate::config::Config;
use crate::consent;
use crate::plugins::builtin_catalog;
use anyhow::{Context, Result};
use dart_i18n::{ConsentPrompt, I18nResult, Localization, PermissionGate, PermissionStore};
use dart_plugin_runtime::{
    console::{self, ConsoleLevel},
    discover, run_stage, DuplicatePolicy, EntryPointCatalog, ExecutionContext, Extension,
    ExtensionDescriptor, ExtensionRegistry, RunConfig, RuntimeError, RuntimeResult, Stage,
    StageReport,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Console name used for the loader's own lines.
const LOADER: &str = "PluginLoader";

/// Public view of a registered extension.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitInfo {
    pub name: String,
    pub stage: Stage,
    pub priority: i32,
    pub enabled: bool,
    pub description: String,
    pub version: String,
    pub permissions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<PathBuf>,
}

/// Extension runtime with localization wired in.
pub struct Runtime {
    registry: ExtensionRegistry,
    catalog: EntryPointCatalog,
    localization: Arc<Localization>,
    plugins_dir: PathBuf,
}

impl Runtime {
    pub fn new(
        catalog: EntryPointCatalog,
        localization: Arc<Localization>,
        plugins_dir: impl Into<PathBuf>,
        policy: DuplicatePolicy,
    ) -> Self {
        Self {
            registry: ExtensionRegistry::with_policy(policy),
            catalog,
            localization,
            plugins_dir: plugins_dir.into(),
        }
    }

    /// Build the runtime described by `config`, with the built-in catalog.
    ///
    /// Host translations are loaded right away; extensions are not.
    pub fn from_config(config: &Config, prompt: Box<dyn ConsentPrompt>) -> Result<Self> {
        let store_path = config.permission_store_path()?;
        let store = PermissionStore::open(&store_path)
            .with_context(|| format!("Failed to open permission store: {}", store_path.display()))?;
        let localization = Arc::new(Localization::new(
            config.language_state()?,
            PermissionGate::new(store, prompt),
        ));

        let locales_dir = config.locales_dir()?;
        if locales_dir.is_dir() {
            localization.load_main_directory(&locales_dir);
        } else {
            warn!("Locales directory does not exist: {:?}", locales_dir);
        }

        Ok(Self::new(
            builtin_catalog(),
            localization,
            config.plugins_dir()?,
            config.runtime.on_duplicate,
        ))
    }

    /// Like [`from_config`](Self::from_config), using the configured consent mode.
    pub fn from_config_default_consent(config: &Config) -> Result<Self> {
        Self::from_config(config, consent::prompt_for(config.permissions.consent))
    }

    /// Discover and register every extension under the plugins directory.
    ///
    /// For each registered extension its translations are loaded and its
    /// declared permissions are requested, with the description as reason.
    /// Returns the number of extensions registered.
    pub fn load_all_units(&mut self) -> RuntimeResult<usize> {
        info!("Discovering extensions in {:?}", self.plugins_dir);
        let report = discover(&self.plugins_dir, &self.catalog, &mut self.registry)?;

        for failure in &report.failures {
            console::plugin_print(
                LOADER,
                ConsoleLevel::Error,
                &format!("Failed to load extension unit: {}", failure.path.display()),
            );
            console::plugin_print(LOADER, ConsoleLevel::Error, &format!("  {}", failure.error));
        }

        for name in &report.registered {
            self.prepare(name);
        }

        console::plugin_print(
            LOADER,
            ConsoleLevel::Info,
            &format!("{} extensions loaded", report.count()),
        );
        Ok(report.count())
    }

    /// Load translations and settle permissions for a freshly registered unit.
    fn prepare(&self, name: &str) {
        let Some(unit) = self.registry.get(name) else {
            return;
        };

        // A replaced unit of the same name must not leave its tables behind.
        self.localization.remove_plugin_translations(name);
        if let Some(origin) = unit.origin() {
            self.localization.load_plugin_translations(name, origin);
        }

        let descriptor = unit.descriptor();
        if descriptor.permissions.is_empty() {
            return;
        }

        let requested = descriptor.permissions.identifiers();
        match self
            .localization
            .gate()
            .request(name, requested.as_slice(), &descriptor.description)
        {
            Ok(decisions) => {
                for (permission, decision) in decisions {
                    let status = if decision.is_granted() {
                        "granted"
                    } else {
                        "denied"
                    };
                    console::plugin_print(
                        name,
                        ConsoleLevel::Info,
                        &format!("Permission {}: {}", permission, status),
                    );
                }
            }
            Err(e) => warn!("Permission request for {} failed: {}", name, e),
        }
    }

    /// Register an extension declared in-process.
    pub fn register(
        &mut self,
        descriptor: ExtensionDescriptor,
        entry: Box<dyn Extension>,
    ) -> RuntimeResult<()> {
        let name = descriptor.name.clone();
        self.registry.register(descriptor, entry)?;
        self.prepare(&name);
        Ok(())
    }

    /// Register an in-process extension whose translations live in `dir`.
    pub fn register_from(
        &mut self,
        descriptor: ExtensionDescriptor,
        entry: Box<dyn Extension>,
        dir: &Path,
    ) -> RuntimeResult<()> {
        let name = descriptor.name.clone();
        self.registry.register_from(descriptor, entry, dir)?;
        self.prepare(&name);
        Ok(())
    }

    /// Apply `[plugins.<name>].enabled` overrides from the configuration.
    pub fn apply_overrides(&mut self, config: &Config) {
        for (name, plugin) in &config.plugins {
            let Some(enabled) = plugin.enabled else {
                continue;
            };
            if let Err(e) = self.registry.set_enabled(name, enabled) {
                warn!("Ignoring configuration for {}: {}", name, e);
            }
        }
    }

    /// A fresh execution context wired to the localization service.
    pub fn new_context(&self) -> ExecutionContext {
        ExecutionContext::with_host(self.localization.clone())
    }

    /// Run every enabled extension of `stage`.
    pub fn run_stage(
        &self,
        stage: Stage,
        ctx: &mut ExecutionContext,
        config: &RunConfig,
    ) -> StageReport {
        debug!("Running stage {}", stage);
        run_stage(&self.registry, stage, ctx, config)
    }

    /// Run all stages in lifecycle order with one shared context.
    pub fn run_lifecycle(&self, ctx: &mut ExecutionContext, config: &RunConfig) -> Vec<StageReport> {
        Stage::ALL
            .iter()
            .map(|stage| self.run_stage(*stage, ctx, config))
            .collect()
    }

    /// Information about one extension, or all of them in discovery order.
    pub fn unit_info(&self, name: Option<&str>) -> RuntimeResult<Vec<UnitInfo>> {
        match name {
            Some(name) => {
                let unit = self
                    .registry
                    .get(name)
                    .ok_or_else(|| RuntimeError::NotFound(name.to_string()))?;
                Ok(vec![describe(unit.descriptor(), unit.origin())])
            }
            None => Ok(self
                .registry
                .all()
                .map(|d| describe(d, self.registry.get(&d.name).and_then(|u| u.origin())))
                .collect()),
        }
    }

    pub fn set_unit_enabled(&mut self, name: &str, enabled: bool) -> RuntimeResult<()> {
        self.registry.set_enabled(name, enabled)
    }

    /// Resolve display text. `caller` is an extension name, `None` for the host.
    pub fn get_text(&self, key: &str, caller: Option<&str>, default: Option<&str>) -> String {
        self.localization.get_text(key, caller, default)
    }

    pub fn set_language(&self, language: &str) -> I18nResult<()> {
        self.localization.set_language(language)
    }

    pub fn supported_languages(&self) -> Vec<String> {
        self.localization.supported_languages()
    }

    pub fn localization(&self) -> &Arc<Localization> {
        &self.localization
    }

    pub fn registry(&self) -> &ExtensionRegistry {
        &self.registry
    }

    pub fn plugins_dir(&self) -> &Path {
        &self.plugins_dir
    }
}

fn describe(descriptor: &ExtensionDescriptor, origin: Option<&Path>) -> UnitInfo {
    UnitInfo {
        name: descriptor.name.clone(),
        stage: descriptor.stage,
        priority: descriptor.priority,
        enabled: descriptor.enabled,
        description: descriptor.description.clone(),
        version: descriptor.version.clone(),
        permissions: descriptor
            .permissions
            .identifiers()
            .into_iter()
            .map(str::to_string)
            .collect(),
        origin: origin.map(Path::to_path_buf),
    }
}
