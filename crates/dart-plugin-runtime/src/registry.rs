//! Registry of extension units.
//!
//! The registry keeps units in the order they were registered. That order is
//! the tie-breaker when two units of a stage share a priority, so it must
//! reflect discovery order.

use crate::context::Extension;
use crate::descriptor::ExtensionDescriptor;
use crate::error::{RuntimeError, RuntimeResult};
use crate::stage::Stage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// What to do when a unit is registered under a name that is already taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Fail with [`RuntimeError::RegistrationConflict`].
    #[default]
    Reject,

    /// Drop the earlier unit; the new one takes the newest position.
    Replace,
}

/// A registered extension unit.
pub struct RegisteredExtension {
    descriptor: ExtensionDescriptor,
    entry: Box<dyn Extension>,
    origin: Option<PathBuf>,
}

impl RegisteredExtension {
    pub fn descriptor(&self) -> &ExtensionDescriptor {
        &self.descriptor
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn entry(&self) -> &dyn Extension {
        self.entry.as_ref()
    }

    /// Directory the unit was discovered in, if it came from disk.
    pub fn origin(&self) -> Option<&Path> {
        self.origin.as_deref()
    }
}

impl fmt::Debug for RegisteredExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredExtension")
            .field("descriptor", &self.descriptor)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

/// Registry for extension units.
#[derive(Debug, Default)]
pub struct ExtensionRegistry {
    units: Vec<RegisteredExtension>,
    policy: DuplicatePolicy,
}

impl ExtensionRegistry {
    /// Create a new empty registry that rejects duplicate names.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new empty registry with the given duplicate policy.
    pub fn with_policy(policy: DuplicatePolicy) -> Self {
        Self {
            units: Vec::new(),
            policy,
        }
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// Register a unit declared in-process.
    pub fn register(
        &mut self,
        descriptor: ExtensionDescriptor,
        entry: Box<dyn Extension>,
    ) -> RuntimeResult<()> {
        self.insert(descriptor, entry, None)
    }

    /// Register a unit that was discovered at `origin`.
    pub fn register_from(
        &mut self,
        descriptor: ExtensionDescriptor,
        entry: Box<dyn Extension>,
        origin: &Path,
    ) -> RuntimeResult<()> {
        self.insert(descriptor, entry, Some(origin.to_path_buf()))
    }

    fn insert(
        &mut self,
        descriptor: ExtensionDescriptor,
        entry: Box<dyn Extension>,
        origin: Option<PathBuf>,
    ) -> RuntimeResult<()> {
        if let Some(index) = self.position(&descriptor.name) {
            match self.policy {
                DuplicatePolicy::Reject => {
                    return Err(RuntimeError::RegistrationConflict(descriptor.name));
                }
                DuplicatePolicy::Replace => {
                    warn!("Replacing previously registered extension: {}", descriptor.name);
                    self.units.remove(index);
                }
            }
        }

        info!(
            "Registered extension: {} v{} (stage: {}, priority: {}, {})",
            descriptor.name,
            descriptor.version,
            descriptor.stage,
            descriptor.priority,
            if descriptor.enabled { "enabled" } else { "disabled" }
        );

        self.units.push(RegisteredExtension {
            descriptor,
            entry,
            origin,
        });
        Ok(())
    }

    /// Whether a name can be registered without conflict under the current policy.
    pub fn accepts(&self, name: &str) -> bool {
        self.policy == DuplicatePolicy::Replace || !self.contains(name)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.units.iter().position(|u| u.descriptor.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// All descriptors, in registration order.
    pub fn all(&self) -> impl Iterator<Item = &ExtensionDescriptor> {
        self.units.iter().map(|u| &u.descriptor)
    }

    pub fn by_name(&self, name: &str) -> Option<&ExtensionDescriptor> {
        self.get(name).map(|u| &u.descriptor)
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredExtension> {
        self.units.iter().find(|u| u.descriptor.name == name)
    }

    /// Toggle a unit's `enabled` flag.
    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> RuntimeResult<()> {
        let unit = self
            .units
            .iter_mut()
            .find(|u| u.descriptor.name == name)
            .ok_or_else(|| RuntimeError::NotFound(name.to_string()))?;

        unit.descriptor.enabled = enabled;
        info!(
            "{} extension: {}",
            if enabled { "Enabled" } else { "Disabled" },
            name
        );
        Ok(())
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.by_name(name).map(|d| d.enabled).unwrap_or(false)
    }

    /// Enabled units of `stage` in execution order: priority descending,
    /// then registration order.
    pub fn scheduled(&self, stage: Stage) -> Vec<&RegisteredExtension> {
        let mut units: Vec<_> = self
            .units
            .iter()
            .filter(|u| u.descriptor.stage == stage && u.descriptor.enabled)
            .collect();
        // Stable sort keeps registration order for equal priorities.
        units.sort_by(|a, b| b.descriptor.priority.cmp(&a.descriptor.priority));
        units
    }

    /// Units of `stage` that are registered but disabled.
    pub fn disabled_in(&self, stage: Stage) -> impl Iterator<Item = &ExtensionDescriptor> {
        self.units
            .iter()
            .map(|u| &u.descriptor)
            .filter(move |d| d.stage == stage && !d.enabled)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}
