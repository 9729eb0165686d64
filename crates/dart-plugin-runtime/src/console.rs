//! Console output for extensions.
//!
//! Every line an extension prints is tagged with the extension's name and a
//! severity, and carries a literal `[Plugin]` prefix so it can be told apart
//! from host output. Lines are emitted as `tracing` events under the
//! [`TARGET`] target.

use serde::{Deserialize, Serialize};

/// Tracing target for extension console output.
pub const TARGET: &str = "dart::plugin";

/// Severity of a console line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleLevel {
    #[default]
    Info,
    Warning,
    Error,
}

impl ConsoleLevel {
    /// Literal prefix for this level.
    pub fn prefix(&self) -> &'static str {
        match self {
            ConsoleLevel::Info => "[Plugin]",
            ConsoleLevel::Warning => "[Plugin][Warning]",
            ConsoleLevel::Error => "[Plugin][Error]",
        }
    }
}

/// Render a console line: `<prefix>:<plugin> <message>`.
pub fn format_line(plugin: &str, level: ConsoleLevel, message: &str) -> String {
    format!("{}:{} {}", level.prefix(), plugin, message)
}

/// Print a line on behalf of an extension (or the loader itself).
pub fn plugin_print(plugin: &str, level: ConsoleLevel, message: &str) {
    let line = format_line(plugin, level, message);
    match level {
        ConsoleLevel::Info => tracing::info!(target: TARGET, "{}", line),
        ConsoleLevel::Warning => tracing::warn!(target: TARGET, "{}", line),
        ConsoleLevel::Error => tracing::error!(target: TARGET, "{}", line),
    }
}
