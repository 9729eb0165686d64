//! Extension discovery.
//!
//! The plugins directory holds one subdirectory per source unit, each with a
//! `manifest.toml`. Manifests name their implementation through an entry
//! point key that is resolved against an [`EntryPointCatalog`] of factories
//! linked into the host.
//!
//! Source units are visited in file-name order so that discovery order, and
//! with it the tie-break order within a stage, is the same on every run. A
//! unit that fails to load is skipped as a whole and discovery continues.

use crate::context::Extension;
use crate::descriptor::ExtensionDescriptor;
use crate::error::{RuntimeError, RuntimeResult};
use crate::manifest::{ExtensionManifest, MANIFEST_FILE};
use crate::registry::ExtensionRegistry;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

type Factory = Box<dyn Fn() -> Box<dyn Extension> + Send + Sync>;

/// Implementations the host can instantiate by entry point key.
#[derive(Default)]
pub struct EntryPointCatalog {
    factories: HashMap<String, Factory>,
}

impl EntryPointCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a factory under `entry_point`, replacing any previous one.
    pub fn register<F>(&mut self, entry_point: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn Extension> + Send + Sync + 'static,
    {
        self.factories.insert(entry_point.into(), Box::new(factory));
    }

    pub fn with<F>(mut self, entry_point: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Box<dyn Extension> + Send + Sync + 'static,
    {
        self.register(entry_point, factory);
        self
    }

    pub fn contains(&self, entry_point: &str) -> bool {
        self.factories.contains_key(entry_point)
    }

    /// Create a fresh instance of the implementation behind `entry_point`.
    pub fn instantiate(&self, entry_point: &str) -> RuntimeResult<Box<dyn Extension>> {
        self.factories
            .get(entry_point)
            .map(|factory| factory())
            .ok_or_else(|| RuntimeError::UnknownEntryPoint(entry_point.to_string()))
    }

    /// Known entry point keys, sorted.
    pub fn entry_points(&self) -> Vec<&str> {
        let mut keys: Vec<_> = self.factories.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl fmt::Debug for EntryPointCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryPointCatalog")
            .field("entry_points", &self.entry_points())
            .finish()
    }
}

/// A source unit that failed to load.
#[derive(Debug)]
pub struct DiscoveryFailure {
    pub path: PathBuf,
    pub error: RuntimeError,
}

/// Result of a discovery pass.
#[derive(Debug, Default)]
pub struct DiscoveryReport {
    /// Names of the registered extensions, in discovery order.
    pub registered: Vec<String>,

    /// Source units that were skipped.
    pub failures: Vec<DiscoveryFailure>,
}

impl DiscoveryReport {
    pub fn count(&self) -> usize {
        self.registered.len()
    }
}

/// Get the user plugins directory.
pub fn default_plugins_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "dart-planner", "dart")
        .map(|dirs| dirs.data_dir().join("plugins"))
}

/// Source unit directories under `dir`, sorted by file name.
pub fn source_units(dir: &Path) -> RuntimeResult<Vec<PathBuf>> {
    let mut units: Vec<PathBuf> = std::fs::read_dir(dir)?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    units.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(units)
}

/// A declared extension ready to be registered.
pub struct LoadedExtension {
    pub descriptor: ExtensionDescriptor,
    pub entry: Box<dyn Extension>,
}

/// Load every extension declared by the source unit at `path`.
///
/// All or nothing: if any declaration is invalid or names an unknown entry
/// point, nothing from this unit is returned.
pub fn load_source_unit(
    path: &Path,
    catalog: &EntryPointCatalog,
) -> RuntimeResult<Vec<LoadedExtension>> {
    let manifest_path = path.join(MANIFEST_FILE);
    if !manifest_path.exists() {
        return Err(RuntimeError::Discovery {
            path: path.to_path_buf(),
            reason: format!("no {}", MANIFEST_FILE),
        });
    }

    let manifest = ExtensionManifest::from_file(&manifest_path)?;
    manifest
        .extensions
        .iter()
        .map(|declaration| {
            Ok(LoadedExtension {
                descriptor: declaration.descriptor()?,
                entry: catalog.instantiate(declaration.entry_point())?,
            })
        })
        .collect()
}

/// Discover source units under `dir` and register their extensions.
///
/// A missing directory yields an empty report. Failures are logged and
/// recorded per source unit.
pub fn discover(
    dir: &Path,
    catalog: &EntryPointCatalog,
    registry: &mut ExtensionRegistry,
) -> RuntimeResult<DiscoveryReport> {
    let mut report = DiscoveryReport::default();

    if !dir.exists() {
        warn!("Plugins directory does not exist: {:?}", dir);
        return Ok(report);
    }

    debug!("Scanning plugins directory: {:?}", dir);
    for path in source_units(dir)? {
        match register_source_unit(&path, catalog, registry) {
            Ok(names) => report.registered.extend(names),
            Err(error) => {
                warn!("Failed to load extension unit {:?}: {}", path, error);
                report.failures.push(DiscoveryFailure { path, error });
            }
        }
    }

    info!(
        "Discovered {} extensions ({} units skipped)",
        report.count(),
        report.failures.len()
    );
    Ok(report)
}

fn register_source_unit(
    path: &Path,
    catalog: &EntryPointCatalog,
    registry: &mut ExtensionRegistry,
) -> RuntimeResult<Vec<String>> {
    let loaded = load_source_unit(path, catalog)?;

    if let Some(taken) = loaded.iter().find(|l| !registry.accepts(&l.descriptor.name)) {
        return Err(RuntimeError::RegistrationConflict(
            taken.descriptor.name.clone(),
        ));
    }

    let mut names = Vec::with_capacity(loaded.len());
    for extension in loaded {
        names.push(extension.descriptor.name.clone());
        registry.register_from(extension.descriptor, extension.entry, path)?;
    }
    Ok(names)
}
