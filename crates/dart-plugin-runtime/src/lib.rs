//! # dart-plugin-runtime
//!
//! Extension runtime for DART.
//!
//! This crate provides:
//! - Extension descriptors and a declarative builder
//! - Discovery of extension units from a plugins directory
//! - A registry that keeps discovery order
//! - Staged execution with per-extension fault isolation
//!
//! ## Extension Units
//!
//! Extension units are directories containing a `manifest.toml` with one or
//! more `[[extension]]` tables. Each table names an entry point that the host
//! links in through an [`EntryPointCatalog`].
//!
//! ## Stages
//!
//! Extensions run at one of three lifecycle points: `pre-main`, `splash` or
//! `post-main`. Within a stage higher priorities run first and equal
//! priorities keep discovery order.

pub mod console;
pub mod context;
pub mod descriptor;
pub mod discovery;
pub mod error;
pub mod manifest;
pub mod permission;
pub mod registry;
pub mod scheduler;
pub mod stage;

pub use console::{plugin_print, ConsoleLevel};
pub use context::{ExecutionContext, Extension, HostServices, RunConfig};
pub use descriptor::{DescriptorBuilder, ExtensionDescriptor};
pub use discovery::{
    default_plugins_dir, discover, DiscoveryFailure, DiscoveryReport, EntryPointCatalog,
};
pub use error::{RuntimeError, RuntimeResult};
pub use manifest::{ExtensionDeclaration, ExtensionManifest};
pub use permission::{Permission, PermissionSet};
pub use registry::{DuplicatePolicy, ExtensionRegistry, RegisteredExtension};
pub use scheduler::{run_stage, Outcome, StageReport};
pub use stage::Stage;
