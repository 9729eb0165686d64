//! Extension manifest parsing.
//!
//! Each source unit directory has a `manifest.toml` declaring one or more
//! extensions:
//!
//! ```toml
//! [[extension]]
//! name = "sample_splash"
//! stage = "splash"
//! priority = 2
//! description = "Shows progress on the splash screen"
//! entry_point = "sample_splash"
//! permissions = ["read_main_locales"]
//! ```

use crate::descriptor::{ExtensionDescriptor, DEFAULT_VERSION};
use crate::error::{RuntimeError, RuntimeResult};
use crate::permission::PermissionSet;
use crate::stage::Stage;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Name of the manifest file inside a source unit directory.
pub const MANIFEST_FILE: &str = "manifest.toml";

/// Manifest of one source unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtensionManifest {
    /// Extensions declared by this unit, in declaration order.
    #[serde(rename = "extension", default)]
    pub extensions: Vec<ExtensionDeclaration>,
}

/// One `[[extension]]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtensionDeclaration {
    /// Unique extension name.
    pub name: String,

    #[serde(default)]
    pub stage: Stage,

    #[serde(default)]
    pub priority: i32,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default)]
    pub description: String,

    #[serde(default = "default_version")]
    pub version: String,

    /// Catalog key of the implementation (defaults to `name`).
    #[serde(default)]
    pub entry_point: Option<String>,

    /// Requested permission identifiers.
    #[serde(default)]
    pub permissions: Vec<String>,
}

fn default_enabled() -> bool {
    true
}

fn default_version() -> String {
    DEFAULT_VERSION.to_string()
}

impl ExtensionDeclaration {
    /// Catalog key of the implementation.
    pub fn entry_point(&self) -> &str {
        self.entry_point.as_deref().unwrap_or(&self.name)
    }

    /// Build the descriptor for this declaration.
    pub fn descriptor(&self) -> RuntimeResult<ExtensionDescriptor> {
        let permissions = PermissionSet::from_strings(&self.permissions)?;

        ExtensionDescriptor::builder(&self.name)
            .stage(self.stage)
            .priority(self.priority)
            .enabled(self.enabled)
            .description(&self.description)
            .version(&self.version)
            .permissions(permissions)
            .build()
    }
}

impl ExtensionManifest {
    /// Load a manifest from a TOML file.
    pub fn from_file(path: &Path) -> RuntimeResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse a manifest from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> RuntimeResult<Self> {
        let manifest: ExtensionManifest = toml::from_str(content)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Validate the manifest.
    fn validate(&self) -> RuntimeResult<()> {
        if self.extensions.is_empty() {
            return Err(RuntimeError::InvalidManifest(
                "Manifest declares no extensions".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for declaration in &self.extensions {
            // Checks the name and permission vocabulary.
            declaration.descriptor()?;

            if !seen.insert(declaration.name.as_str()) {
                return Err(RuntimeError::InvalidManifest(format!(
                    "Extension '{}' is declared twice",
                    declaration.name
                )));
            }
        }

        Ok(())
    }
}
