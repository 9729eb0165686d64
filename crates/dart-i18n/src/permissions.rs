//! Permission decisions for extensions.
//!
//! This module provides:
//! - `PermissionStore` - Persistent storage for decisions
//! - `ConsentPrompt` - How undecided permissions get answered
//! - `PermissionGate` - Request, check and revoke permissions
//!
//! Decisions are stored in a JSON file shaped
//! `{ extension: { permission: { granted, decided_at } } }`.

use crate::error::{I18nError, I18nResult, PermissionError};
use chrono::{DateTime, Utc};
use dart_plugin_runtime::Permission;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{error, info, warn};

/// Outcome of a permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Granted,
    Denied,
}

impl Decision {
    pub fn from_granted(granted: bool) -> Self {
        if granted {
            Decision::Granted
        } else {
            Decision::Denied
        }
    }

    pub fn is_granted(&self) -> bool {
        matches!(self, Decision::Granted)
    }
}

/// A stored decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionRecord {
    pub granted: bool,
    pub decided_at: DateTime<Utc>,
}

impl PermissionRecord {
    pub fn decision(&self) -> Decision {
        Decision::from_granted(self.granted)
    }
}

pub type Records = BTreeMap<String, BTreeMap<String, PermissionRecord>>;

/// Persistent storage for permission decisions.
#[derive(Debug, Default)]
pub struct PermissionStore {
    /// Path to the decisions file. `None` keeps everything in memory.
    path: Option<PathBuf>,

    /// Decisions by extension, then permission identifier.
    records: Records,

    /// Whether the records have unsaved changes.
    dirty: bool,
}

impl PermissionStore {
    /// Open the store at `path`, loading it if the file exists.
    ///
    /// A file that cannot be parsed is logged and treated as empty.
    pub fn open(path: impl Into<PathBuf>) -> I18nResult<Self> {
        let path = path.into();
        let records = if path.exists() {
            let contents = fs::read_to_string(&path)
                .map_err(|e| PermissionError::LoadFailed(format!("{}: {}", path.display(), e)))?;
            match serde_json::from_str(&contents) {
                Ok(records) => {
                    info!("Loaded saved permissions from {:?}", path);
                    records
                }
                Err(e) => {
                    error!("Ignoring unreadable permissions file {:?}: {}", path, e);
                    Records::new()
                }
            }
        } else {
            Records::new()
        };

        Ok(Self {
            path: Some(path),
            records,
            dirty: false,
        })
    }

    /// A store that is never written to disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Get the default path for the decisions file.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "dart-planner", "dart")
            .map(|dirs| dirs.data_dir().join("permissions.json"))
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get(&self, extension: &str, permission: Permission) -> Option<&PermissionRecord> {
        self.records
            .get(extension)
            .and_then(|perms| perms.get(permission.as_str()))
    }

    pub fn set(&mut self, extension: &str, permission: Permission, granted: bool) {
        self.records.entry(extension.to_string()).or_default().insert(
            permission.as_str().to_string(),
            PermissionRecord {
                granted,
                decided_at: Utc::now(),
            },
        );
        self.dirty = true;
    }

    /// Forget one decision. Returns whether there was one.
    pub fn remove(&mut self, extension: &str, permission: Permission) -> bool {
        let Some(perms) = self.records.get_mut(extension) else {
            return false;
        };
        let removed = perms.remove(permission.as_str()).is_some();
        if perms.is_empty() {
            self.records.remove(extension);
        }
        self.dirty |= removed;
        removed
    }

    /// Forget every decision for an extension.
    pub fn remove_extension(&mut self, extension: &str) -> bool {
        let removed = self.records.remove(extension).is_some();
        self.dirty |= removed;
        removed
    }

    pub fn clear(&mut self) {
        if !self.records.is_empty() {
            self.records.clear();
            self.dirty = true;
        }
    }

    pub fn records(&self) -> &BTreeMap<String, BTreeMap<String, PermissionRecord>> {
        &self.records
    }

    /// Save decisions to disk.
    pub fn save(&mut self) -> Result<(), PermissionError> {
        if !self.dirty {
            return Ok(());
        }
        let Some(path) = &self.path else {
            self.dirty = false;
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                PermissionError::SaveFailed(format!("Failed to create directory: {}", e))
            })?;
        }

        let contents = serde_json::to_string_pretty(&self.records)
            .map_err(|e| PermissionError::SaveFailed(format!("Serialization failed: {}", e)))?;

        fs::write(path, contents)
            .map_err(|e| PermissionError::SaveFailed(format!("Write failed: {}", e)))?;

        self.dirty = false;
        Ok(())
    }
}

/// What the user is asked to decide.
#[derive(Debug, Clone, Copy)]
pub struct ConsentRequest<'a> {
    pub extension: &'a str,
    pub permission: Permission,
    pub reason: &'a str,
}

impl ConsentRequest<'_> {
    pub fn description(&self) -> &'static str {
        self.permission.description()
    }
}

/// Answers permission requests that have no stored decision.
pub trait ConsentPrompt: Send + Sync {
    /// `Some(true)` grants, `Some(false)` denies. `None` means no answer was
    /// given; the request is declined for now and nothing is stored.
    fn ask(&self, request: &ConsentRequest<'_>) -> Option<bool>;
}

impl<F> ConsentPrompt for F
where
    F: Fn(&ConsentRequest<'_>) -> Option<bool> + Send + Sync,
{
    fn ask(&self, request: &ConsentRequest<'_>) -> Option<bool> {
        self(request)
    }
}

/// Headless consent that always gives the same answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaticConsent {
    Grant,
    Deny,
}

impl ConsentPrompt for StaticConsent {
    fn ask(&self, _request: &ConsentRequest<'_>) -> Option<bool> {
        Some(matches!(self, StaticConsent::Grant))
    }
}

/// Mediates every permission decision.
pub struct PermissionGate {
    store: Mutex<PermissionStore>,
    prompt: Box<dyn ConsentPrompt>,
}

impl std::fmt::Debug for PermissionGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionGate")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl PermissionGate {
    pub fn new(store: PermissionStore, prompt: Box<dyn ConsentPrompt>) -> Self {
        Self {
            store: Mutex::new(store),
            prompt,
        }
    }

    fn store(&self) -> MutexGuard<'_, PermissionStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Request permissions by identifier.
    ///
    /// Unknown identifiers fail the whole request before anything is asked.
    /// Stored decisions are reused; the rest are asked and persisted.
    pub fn request<S: AsRef<str>>(
        &self,
        extension: &str,
        permissions: &[S],
        reason: &str,
    ) -> I18nResult<BTreeMap<Permission, Decision>> {
        let parsed = permissions
            .iter()
            .map(|id| {
                Permission::parse(id.as_ref())
                    .map_err(|_| I18nError::InvalidPermission(id.as_ref().to_string()))
            })
            .collect::<I18nResult<Vec<_>>>()?;

        Ok(parsed
            .into_iter()
            .map(|permission| (permission, self.request_one(extension, permission, reason)))
            .collect())
    }

    /// Request a single permission, asking only when undecided.
    pub fn request_one(&self, extension: &str, permission: Permission, reason: &str) -> Decision {
        if let Some(decision) = self.check(extension, permission) {
            return decision;
        }

        // Lock released while the prompt runs.
        let answer = self.prompt.ask(&ConsentRequest {
            extension,
            permission,
            reason,
        });
        match answer {
            Some(granted) => {
                self.record(extension, permission, granted);
                Decision::from_granted(granted)
            }
            None => {
                warn!(
                    "No answer for {} on behalf of {}, declined for now",
                    permission, extension
                );
                Decision::Denied
            }
        }
    }

    /// Stored decision, without asking.
    pub fn check(&self, extension: &str, permission: Permission) -> Option<Decision> {
        self.store()
            .get(extension, permission)
            .map(PermissionRecord::decision)
    }

    pub fn is_granted(&self, extension: &str, permission: Permission) -> bool {
        self.check(extension, permission)
            .is_some_and(|d| d.is_granted())
    }

    /// Granted permissions of an extension.
    pub fn granted(&self, extension: &str) -> Vec<Permission> {
        Permission::ALL
            .into_iter()
            .filter(|p| self.is_granted(extension, *p))
            .collect()
    }

    pub fn grant(&self, extension: &str, permission: Permission) {
        self.record(extension, permission, true);
    }

    pub fn deny(&self, extension: &str, permission: Permission) {
        self.record(extension, permission, false);
    }

    /// Forget one decision so the next request asks again.
    pub fn revoke(&self, extension: &str, permission: Permission) -> bool {
        let mut store = self.store();
        let removed = store.remove(extension, permission);
        persist(&mut store);
        removed
    }

    /// Forget every decision of one extension.
    pub fn revoke_all(&self, extension: &str) -> bool {
        let mut store = self.store();
        let removed = store.remove_extension(extension);
        persist(&mut store);
        removed
    }

    /// Forget every decision.
    pub fn reset(&self) {
        let mut store = self.store();
        store.clear();
        persist(&mut store);
        info!("All permission decisions reset");
    }

    /// Copy of every stored decision.
    pub fn snapshot(&self) -> Records {
        self.store().records().clone()
    }

    /// Location of the decisions file, if persisted.
    pub fn store_path(&self) -> Option<PathBuf> {
        self.store().path().map(Path::to_path_buf)
    }

    fn record(&self, extension: &str, permission: Permission, granted: bool) {
        let mut store = self.store();
        store.set(extension, permission, granted);
        persist(&mut store);
        info!(
            "{} {} for {}",
            if granted { "Granted" } else { "Denied" },
            permission,
            extension
        );
    }
}

fn persist(store: &mut PermissionStore) {
    if let Err(e) = store.save() {
        warn!("Permission decisions not saved: {}", e);
    }
}
