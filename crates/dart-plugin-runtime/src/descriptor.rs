//! Extension descriptors and the builder used to declare them.

use crate::error::{RuntimeError, RuntimeResult};
use crate::permission::{Permission, PermissionSet};
use crate::stage::Stage;
use serde::{Deserialize, Serialize};

/// Default version string for extensions that do not declare one.
pub const DEFAULT_VERSION: &str = "1.0.0";

/// Identity and scheduling metadata for one extension unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionDescriptor {
    /// Globally unique name. Also the extension's translation namespace.
    pub name: String,

    /// Lifecycle stage the extension runs in.
    pub stage: Stage,

    /// Higher priorities run earlier within a stage.
    pub priority: i32,

    /// Disabled extensions are skipped but stay registered.
    pub enabled: bool,

    /// Display description. Also shown as the reason in consent prompts.
    pub description: String,

    /// Display version.
    pub version: String,

    /// Permissions the extension declares it needs.
    pub permissions: PermissionSet,
}

impl ExtensionDescriptor {
    /// Start declaring an extension.
    pub fn builder(name: impl Into<String>) -> DescriptorBuilder {
        DescriptorBuilder::new(name)
    }
}

/// Declarative builder for [`ExtensionDescriptor`].
///
/// ```
/// use dart_plugin_runtime::{ExtensionDescriptor, Permission, Stage};
///
/// let descriptor = ExtensionDescriptor::builder("weather_overlay")
///     .stage(Stage::Splash)
///     .priority(2)
///     .description("Preloads weather tiles")
///     .permission(Permission::ReadMainLocales)
///     .build()
///     .unwrap();
///
/// assert_eq!(descriptor.stage, Stage::Splash);
/// assert!(descriptor.enabled);
/// ```
#[derive(Debug, Clone)]
pub struct DescriptorBuilder {
    descriptor: ExtensionDescriptor,
}

impl DescriptorBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            descriptor: ExtensionDescriptor {
                name: name.into(),
                stage: Stage::default(),
                priority: 0,
                enabled: true,
                description: String::new(),
                version: DEFAULT_VERSION.to_string(),
                permissions: PermissionSet::new(),
            },
        }
    }

    pub fn stage(mut self, stage: Stage) -> Self {
        self.descriptor.stage = stage;
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.descriptor.priority = priority;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.descriptor.enabled = enabled;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.descriptor.description = description.into();
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.descriptor.version = version.into();
        self
    }

    pub fn permission(mut self, permission: Permission) -> Self {
        self.descriptor.permissions.add(permission);
        self
    }

    pub fn permissions(mut self, permissions: PermissionSet) -> Self {
        self.descriptor.permissions = permissions;
        self
    }

    /// Finish the declaration.
    pub fn build(self) -> RuntimeResult<ExtensionDescriptor> {
        let name = self.descriptor.name.trim();
        if name.is_empty() {
            return Err(RuntimeError::InvalidManifest(
                "Extension name cannot be empty".to_string(),
            ));
        }
        if name == "main" {
            return Err(RuntimeError::InvalidManifest(
                "Extension name 'main' is reserved for the host".to_string(),
            ));
        }
        Ok(self.descriptor)
    }
}
