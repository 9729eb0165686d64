//! Command line interface for the DART host.

use crate::config::{Config, ConsentMode};
use crate::runtime::{Runtime, UnitInfo};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dart_i18n::{PermissionStore, Records};
use dart_plugin_runtime::{Permission, Stage};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "dart-host")]
#[command(about = "DART host: runs extensions at each lifecycle stage", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file (created with defaults if missing)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory scanned for extension units
    #[arg(long, global = true, value_name = "DIR")]
    pub plugins_dir: Option<PathBuf>,

    /// Directory holding the host's translations
    #[arg(long, global = true, value_name = "DIR")]
    pub locales_dir: Option<PathBuf>,

    /// Display language (e.g., 'en')
    #[arg(long, global = true, value_name = "LANG")]
    pub lang: Option<String>,

    /// How undecided permission requests are answered
    #[arg(long, global = true, value_enum)]
    pub consent: Option<ConsentMode>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Load extensions and run every lifecycle stage (default)
    Run,

    /// List discovered extensions
    Units {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Inspect or reset stored permission decisions
    Permissions {
        #[command(subcommand)]
        action: PermissionCommands,
    },

    /// Resolve a translation key
    Text {
        /// Translation key (e.g., 'common.title')
        key: String,

        /// Resolve on behalf of this extension
        #[arg(long)]
        plugin: Option<String>,

        /// Returned when nothing matches
        #[arg(long)]
        default: Option<String>,
    },
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum PermissionCommands {
    /// Show every stored decision
    Show,

    /// Forget every stored decision
    Reset {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Forget every decision of one extension
    ResetPlugin { plugin: String },

    /// Forget one decision of one extension
    ResetPermission { plugin: String, permission: String },
}

impl Cli {
    /// Fold command line overrides into the loaded configuration.
    pub fn apply(&self, config: &mut Config) {
        if let Some(dir) = &self.plugins_dir {
            config.runtime.plugins_dir = Some(dir.clone());
        }
        if let Some(dir) = &self.locales_dir {
            config.runtime.locales_dir = Some(dir.clone());
        }
        if let Some(lang) = &self.lang {
            config.localization.language = lang.clone();
        }
        if let Some(consent) = self.consent {
            config.permissions.consent = consent;
        }
    }
}

/// Dispatch a parsed command.
pub fn execute(command: Option<Commands>, config: &Config) -> Result<()> {
    match command.unwrap_or(Commands::Run) {
        Commands::Run => run(config),
        Commands::Units { json } => units(config, json),
        Commands::Permissions { action } => permissions(config, action),
        Commands::Text {
            key,
            plugin,
            default,
        } => text(config, &key, plugin.as_deref(), default.as_deref()),
    }
}

fn load_runtime(config: &Config) -> Result<Runtime> {
    let mut runtime = Runtime::from_config_default_consent(config)?;
    runtime
        .load_all_units()
        .context("Failed to discover extensions")?;
    runtime.apply_overrides(config);
    Ok(runtime)
}

fn run(config: &Config) -> Result<()> {
    let runtime = load_runtime(config)?;
    let run_config = config.run_config()?;
    let mut ctx = runtime.new_context();

    for stage in Stage::ALL {
        match stage {
            Stage::Splash => println!(
                "{}",
                runtime.get_text("splash.loading", None, Some("Loading..."))
            ),
            Stage::PostMain => println!(
                "{}",
                runtime.get_text("common.welcome", None, Some("Welcome"))
            ),
            Stage::PreMain => {}
        }

        let report = runtime.run_stage(stage, &mut ctx, &run_config);
        if report.fault_count() > 0 {
            warn!(
                "{} of {} extension(s) failed in stage {}",
                report.fault_count(),
                report.len(),
                stage
            );
        } else {
            info!("Stage {} finished: {} extension(s)", stage, report.len());
        }
    }

    Ok(())
}

fn units(config: &Config, json: bool) -> Result<()> {
    let runtime = load_runtime(config)?;
    let units = runtime.unit_info(None)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&units)?);
    } else {
        print!("{}", format_units(&units));
    }
    Ok(())
}

fn format_units(units: &[UnitInfo]) -> String {
    if units.is_empty() {
        return "No extensions found.\n".to_string();
    }

    let mut out = String::new();
    for unit in units {
        out.push_str(&format!(
            "{:<28} {:<10} {:>4}  {:<8} {}\n",
            unit.name,
            unit.stage,
            unit.priority,
            if unit.enabled { "enabled" } else { "disabled" },
            unit.description
        ));
        if !unit.permissions.is_empty() {
            out.push_str(&format!("    permissions: {}\n", unit.permissions.join(", ")));
        }
    }
    out
}

fn text(config: &Config, key: &str, plugin: Option<&str>, default: Option<&str>) -> Result<()> {
    let runtime = load_runtime(config)?;
    if let Some(plugin) = plugin {
        if !runtime.registry().contains(plugin) {
            warn!("Extension {} is not registered", plugin);
        }
    }
    println!("{}", runtime.get_text(key, plugin, default));
    Ok(())
}

fn permissions(config: &Config, action: PermissionCommands) -> Result<()> {
    let path = config.permission_store_path()?;
    let mut store = PermissionStore::open(&path)
        .with_context(|| format!("Failed to open permission store: {}", path.display()))?;

    match action {
        PermissionCommands::Show => {
            print!("{}", format_records(store.records()));
            println!("File: {}", path.display());
            return Ok(());
        }
        PermissionCommands::Reset { yes } => {
            if store.records().is_empty() {
                println!("No stored permissions to reset.");
                return Ok(());
            }
            let confirmed = yes || {
                let stdin = io::stdin();
                confirm(
                    &mut stdin.lock(),
                    &mut io::stdout(),
                    "Delete every stored permission?",
                )?
            };
            if !confirmed {
                println!("Reset cancelled.");
                return Ok(());
            }
            store.clear();
            println!("All permissions reset. They will be asked again on next run.");
        }
        PermissionCommands::ResetPlugin { plugin } => {
            if !store.remove_extension(&plugin) {
                println!("No stored permissions for '{}'.", plugin);
                return Ok(());
            }
            println!("All permissions of '{}' reset.", plugin);
        }
        PermissionCommands::ResetPermission { plugin, permission } => {
            let parsed = Permission::parse(&permission)?;
            if !store.remove(&plugin, parsed) {
                println!("'{}' has no stored '{}' permission.", plugin, permission);
                return Ok(());
            }
            println!("Permission '{}' of '{}' reset.", permission, plugin);
        }
    }

    store.save()?;
    Ok(())
}

fn format_records(records: &Records) -> String {
    if records.is_empty() {
        return "No stored permissions.\n".to_string();
    }

    let mut out = String::new();
    for (extension, permissions) in records {
        out.push_str(&format!("[{}]\n", extension));
        for (permission, record) in permissions {
            out.push_str(&format!(
                "  - {}: {} ({})\n",
                permission,
                if record.granted { "granted" } else { "denied" },
                record.decided_at.format("%Y-%m-%d %H:%M:%S UTC")
            ));
        }
    }
    out
}

/// Ask a yes/no question until answered. End of input counts as no.
fn confirm<R: BufRead, W: Write>(reader: &mut R, writer: &mut W, question: &str) -> Result<bool> {
    loop {
        write!(writer, "{} (y/n): ", question)?;
        writer.flush()?;

        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            return Ok(false);
        }
        match line.trim().to_lowercase().as_str() {
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            "" => continue,
            _ => writeln!(writer, "Please answer y or n.")?,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    #[test]
    fn test_no_subcommand_means_run() {
        let cli = Cli::parse_from(["dart-host"]);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_parse_permission_commands() {
        let cli = Cli::parse_from([
            "dart-host",
            "permissions",
            "reset-permission",
            "sample_permission_request",
            "read_main_locales",
        ]);
        assert_eq!(
            cli.command,
            Some(Commands::Permissions {
                action: PermissionCommands::ResetPermission {
                    plugin: "sample_permission_request".to_string(),
                    permission: "read_main_locales".to_string(),
                }
            })
        );
    }

    #[test]
    fn test_overrides_apply_to_config() {
        let cli = Cli::parse_from([
            "dart-host",
            "units",
            "--lang",
            "en",
            "--consent",
            "deny",
            "--plugins-dir",
            "/tmp/plugins",
        ]);
        let mut config = Config::default();
        cli.apply(&mut config);

        assert_eq!(config.localization.language, "en");
        assert_eq!(config.permissions.consent, ConsentMode::Deny);
        assert_eq!(config.runtime.plugins_dir, Some(PathBuf::from("/tmp/plugins")));
        assert!(config.validate().is_ok());

        let cli = Cli::parse_from(["dart-host", "--lang", "fr"]);
        cli.apply(&mut config);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_confirm_reasks_on_garbage() {
        let mut output = Vec::new();
        let answer = confirm(&mut Cursor::new("what\ny\n"), &mut output, "Sure?").unwrap();
        assert!(answer);
        let output = String::from_utf8(output).unwrap();
        assert_eq!(output.matches("Sure? (y/n): ").count(), 2);
        assert!(output.contains("Please answer y or n."));

        assert!(!confirm(&mut Cursor::new(""), &mut Vec::new(), "Sure?").unwrap());
    }

    #[test]
    fn test_reset_plugin_removes_only_that_plugin() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("permissions.json");
        let mut store = PermissionStore::open(&path).unwrap();
        store.set("a", Permission::ReadMainLocales, true);
        store.set("b", Permission::ReadMainLocales, false);
        store.save().unwrap();

        let mut config = Config::default();
        config.permissions.store_path = Some(path.clone());
        permissions(
            &config,
            PermissionCommands::ResetPlugin {
                plugin: "a".to_string(),
            },
        )
        .unwrap();

        let store = PermissionStore::open(&path).unwrap();
        assert!(store.get("a", Permission::ReadMainLocales).is_none());
        assert!(store.get("b", Permission::ReadMainLocales).is_some());
    }

    #[test]
    fn test_reset_unknown_permission_is_an_error() {
        let temp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.permissions.store_path = Some(temp.path().join("permissions.json"));

        let result = permissions(
            &config,
            PermissionCommands::ResetPermission {
                plugin: "a".to_string(),
                permission: "launch_missiles".to_string(),
            },
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_format_records_marks_decisions() {
        let mut store = PermissionStore::in_memory();
        store.set("sample", Permission::ReadMainLocales, false);
        let out = format_records(store.records());
        assert!(out.contains("[sample]"));
        assert!(out.contains("read_main_locales: denied"));
        assert_eq!(format_records(&Records::new()), "No stored permissions.\n");
    }
}
