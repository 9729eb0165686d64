//! # dart-host
//!
//! The DART host process.
//!
//! Responsible for:
//! - Discovering extension units and registering them
//! - Asking for the permissions extensions declare
//! - Running extensions at pre-main, splash and post-main
//! - Resolving translations for the host and its extensions
//!
//! ## Configuration
//!
//! Reads `$XDG_CONFIG_HOME/dart/config.toml`, written with documented
//! defaults on first run. Command line flags override the file.
//!
//! ## Running
//!
//! ```bash
//! # Run every stage with the bundled sample extensions
//! cargo run --bin dart-host -- --plugins-dir dart-host/plugins --locales-dir dart-host/locales
//!
//! # With debug logging
//! RUST_LOG=debug cargo run --bin dart-host
//! ```

use anyhow::Result;
use clap::Parser;

use dart_host::cli::{self, Cli};
use dart_host::config::Config;
use dart_host::logging;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_or_create(path)?,
        None => Config::load_default()?,
    };
    cli.apply(&mut config);
    config.validate()?;

    logging::init(&config.runtime.log_level);

    tracing::info!("Starting dart-host v{}", env!("CARGO_PKG_VERSION"));

    cli::execute(cli.command, &config)
}
