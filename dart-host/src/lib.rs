//! DART host library
//!
//! Configuration, consent prompting, the built-in extensions and the runtime
//! facade the `dart-host` binary drives. Exported for integration tests.

pub mod cli;
pub mod config;
pub mod consent;
pub mod logging;
pub mod plugins;
pub mod runtime;

pub use config::Config;
pub use runtime::{Runtime, UnitInfo};
