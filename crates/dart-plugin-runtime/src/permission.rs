//! Permission vocabulary for extensions.
//!
//! Extensions declare the permissions they need in their manifest. Nothing is
//! granted by declaring it: the host asks the user (or a configured policy)
//! and remembers the answer.

use crate::error::{RuntimeError, RuntimeResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A permission an extension can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Read translations from the host's "main" namespace.
    ReadMainLocales,

    /// Write translation files. Reserved, not enforced yet.
    WriteLocales,
}

impl Permission {
    /// Every permission the runtime knows about.
    pub const ALL: [Permission; 2] = [Permission::ReadMainLocales, Permission::WriteLocales];

    /// Parse a permission identifier. Unknown identifiers are rejected.
    pub fn parse(s: &str) -> RuntimeResult<Self> {
        match s {
            "read_main_locales" => Ok(Permission::ReadMainLocales),
            "write_locales" => Ok(Permission::WriteLocales),
            other => Err(RuntimeError::InvalidPermission(other.to_string())),
        }
    }

    /// Convert permission to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ReadMainLocales => "read_main_locales",
            Permission::WriteLocales => "write_locales",
        }
    }

    /// Human-readable description shown in consent prompts.
    pub fn description(&self) -> &'static str {
        match self {
            Permission::ReadMainLocales => "Read the main application's translations",
            Permission::WriteLocales => "Write translation files",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An ordered set of permissions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet {
    permissions: BTreeSet<Permission>,
}

impl PermissionSet {
    /// Create an empty permission set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a permission set from identifiers, failing on the first unknown one.
    pub fn from_strings<I, S>(strings: I) -> RuntimeResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let permissions = strings
            .into_iter()
            .map(|s| Permission::parse(s.as_ref()))
            .collect::<RuntimeResult<BTreeSet<_>>>()?;
        Ok(Self { permissions })
    }

    /// Add a permission to the set.
    pub fn add(&mut self, permission: Permission) {
        self.permissions.insert(permission);
    }

    /// Check if the set contains a permission.
    pub fn has(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }

    /// Iterate in a stable order.
    pub fn iter(&self) -> impl Iterator<Item = Permission> + '_ {
        self.permissions.iter().copied()
    }

    /// Get the number of permissions.
    pub fn len(&self) -> usize {
        self.permissions.len()
    }

    /// Check if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }

    /// Identifiers of all permissions, in order.
    pub fn identifiers(&self) -> Vec<&'static str> {
        self.iter().map(|p| p.as_str()).collect()
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<T: IntoIterator<Item = Permission>>(iter: T) -> Self {
        Self {
            permissions: iter.into_iter().collect(),
        }
    }
}
