//! Integration tests for the dart-plugin-runtime extension system.
//!
//! These tests cover:
//! - Discovery from a plugins directory
//! - Stage ordering across repeated runs
//! - Disabled extensions
//! - Fault isolation within a stage
//! - Context sharing between stages

use dart_plugin_runtime::{
    discover, run_stage, EntryPointCatalog, ExecutionContext, Extension, ExtensionDescriptor,
    ExtensionRegistry, Permission, RunConfig, RuntimeError, RuntimeResult, Stage,
};
use serde_json::{json, Value};
use std::path::Path;
use tempfile::TempDir;

// ==============================================================================
// Test Fixture Helpers
// ==============================================================================

/// Records the running extension's name in the `trace` array.
fn tracer() -> Box<dyn Extension> {
    Box::new(|ctx: &mut ExecutionContext, _: &Value| -> RuntimeResult<Value> {
        let name = ctx.current_extension().unwrap_or_default().to_string();
        let mut trace = ctx
            .get("trace")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        trace.push(json!(name));
        ctx.insert("trace", trace);
        Ok(json!({"status": "ok"}))
    })
}

fn failing() -> Box<dyn Extension> {
    Box::new(|_: &mut ExecutionContext, _: &Value| -> RuntimeResult<Value> {
        Err(RuntimeError::execution("resource missing"))
    })
}

fn test_catalog() -> EntryPointCatalog {
    EntryPointCatalog::new()
        .with("tracer", tracer)
        .with("failing", failing)
        .with("init", || -> Box<dyn Extension> {
            Box::new(|ctx: &mut ExecutionContext, _: &Value| -> RuntimeResult<Value> {
                ctx.insert("pre_main_initialized", true);
                Ok(json!({"status": "initialized"}))
            })
        })
        .with("reader", || -> Box<dyn Extension> {
            Box::new(|ctx: &mut ExecutionContext, _: &Value| -> RuntimeResult<Value> {
                Ok(json!({"saw_init": ctx.get("pre_main_initialized").is_some()}))
            })
        })
}

/// Write a unit directory whose manifest holds `tables` verbatim.
fn create_unit(dir: &Path, unit: &str, tables: &str) {
    let unit_dir = dir.join(unit);
    std::fs::create_dir_all(&unit_dir).unwrap();
    std::fs::write(unit_dir.join("manifest.toml"), tables).unwrap();
}

fn declaration(name: &str, stage: &str, priority: i32, entry: &str) -> String {
    format!(
        "[[extension]]\nname = \"{name}\"\nstage = \"{stage}\"\npriority = {priority}\nentry_point = \"{entry}\"\n\n"
    )
}

fn splash(name: &str, priority: i32) -> ExtensionDescriptor {
    ExtensionDescriptor::builder(name)
        .stage(Stage::Splash)
        .priority(priority)
        .build()
        .unwrap()
}

// ==============================================================================
// Discovery Tests
// ==============================================================================

#[test]
fn test_discover_registers_units() {
    let temp_dir = TempDir::new().unwrap();
    create_unit(
        temp_dir.path(),
        "sample",
        &(declaration("sample_init", "pre-main", 1, "init")
            + &declaration("sample_splash", "splash", 2, "tracer")),
    );
    create_unit(
        temp_dir.path(),
        "broken",
        "[[extension]]\nname = \"broken\"\nstage = \"shutdown\"\n",
    );

    let mut registry = ExtensionRegistry::new();
    let report = discover(temp_dir.path(), &test_catalog(), &mut registry).unwrap();

    assert_eq!(report.count(), 2);
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].path.ends_with("broken"));
    assert_eq!(
        registry.by_name("sample_splash").unwrap().stage,
        Stage::Splash
    );
}

#[test]
fn test_discovered_permissions_are_declared_not_granted() {
    let temp_dir = TempDir::new().unwrap();
    create_unit(
        temp_dir.path(),
        "reader",
        "[[extension]]\nname = \"reader\"\nentry_point = \"reader\"\npermissions = [\"read_main_locales\"]\n",
    );

    let mut registry = ExtensionRegistry::new();
    discover(temp_dir.path(), &test_catalog(), &mut registry).unwrap();

    let descriptor = registry.by_name("reader").unwrap();
    assert!(descriptor.permissions.has(Permission::ReadMainLocales));
    assert!(!descriptor.permissions.has(Permission::WriteLocales));
}

#[test]
fn test_reserved_main_name_rejected() {
    let temp_dir = TempDir::new().unwrap();
    create_unit(temp_dir.path(), "main", &declaration("main", "splash", 0, "tracer"));

    let mut registry = ExtensionRegistry::new();
    let report = discover(temp_dir.path(), &test_catalog(), &mut registry).unwrap();

    assert_eq!(report.count(), 0);
    assert!(matches!(
        report.failures[0].error,
        RuntimeError::InvalidManifest(_)
    ));
}

// ==============================================================================
// Stage Execution Tests
// ==============================================================================

#[test]
fn test_higher_priority_runs_first() {
    let mut registry = ExtensionRegistry::new();
    registry.register(splash("b", 1), tracer()).unwrap();
    registry.register(splash("a", 2), tracer()).unwrap();

    let mut ctx = ExecutionContext::new();
    let report = run_stage(&registry, Stage::Splash, &mut ctx, &RunConfig::new());

    assert_eq!(report.order(), vec!["a", "b"]);
}

#[test]
fn test_order_is_deterministic_across_runs() {
    let temp_dir = TempDir::new().unwrap();
    create_unit(temp_dir.path(), "c", &declaration("gamma", "splash", 0, "tracer"));
    create_unit(temp_dir.path(), "a", &declaration("alpha", "splash", 0, "tracer"));
    create_unit(temp_dir.path(), "b", &declaration("beta", "splash", 5, "tracer"));

    let mut orders = Vec::new();
    for _ in 0..3 {
        let mut registry = ExtensionRegistry::new();
        discover(temp_dir.path(), &test_catalog(), &mut registry).unwrap();
        let mut ctx = ExecutionContext::new();
        let report = run_stage(&registry, Stage::Splash, &mut ctx, &RunConfig::new());
        orders.push(
            report
                .order()
                .into_iter()
                .map(String::from)
                .collect::<Vec<_>>(),
        );
    }

    assert_eq!(orders[0], vec!["beta", "alpha", "gamma"]);
    assert!(orders.iter().all(|o| o == &orders[0]));
}

#[test]
fn test_disabled_units_never_run() {
    let mut registry = ExtensionRegistry::new();
    let disabled = ExtensionDescriptor::builder("off")
        .stage(Stage::Splash)
        .enabled(false)
        .build()
        .unwrap();
    registry.register(disabled, tracer()).unwrap();
    registry.register(splash("on", 0), tracer()).unwrap();

    let mut ctx = ExecutionContext::new();
    let report = run_stage(&registry, Stage::Splash, &mut ctx, &RunConfig::new());

    assert_eq!(report.order(), vec!["on"]);
    assert!(report.get("off").is_none());
    assert!(registry.by_name("off").is_some());

    registry.set_enabled("off", true).unwrap();
    let report = run_stage(&registry, Stage::Splash, &mut ctx, &RunConfig::new());
    assert_eq!(report.order(), vec!["off", "on"]);
}

#[test]
fn test_fault_does_not_stop_stage() {
    let mut registry = ExtensionRegistry::new();
    registry.register(splash("first", 3), tracer()).unwrap();
    registry.register(splash("broken", 2), failing()).unwrap();
    registry.register(splash("last", 1), tracer()).unwrap();

    let mut ctx = ExecutionContext::new();
    let report = run_stage(&registry, Stage::Splash, &mut ctx, &RunConfig::new());

    assert_eq!(report.len(), 3);
    assert_eq!(report.fault_count(), 1);
    assert!(report.get("broken").unwrap().is_faulted());
    assert_eq!(ctx.get("trace"), Some(&json!(["first", "last"])));
}

#[test]
fn test_context_carries_across_stages() {
    let mut registry = ExtensionRegistry::new();
    let catalog = test_catalog();
    registry
        .register(
            ExtensionDescriptor::builder("init").build().unwrap(),
            catalog.instantiate("init").unwrap(),
        )
        .unwrap();
    registry
        .register(
            ExtensionDescriptor::builder("reader")
                .stage(Stage::PostMain)
                .build()
                .unwrap(),
            catalog.instantiate("reader").unwrap(),
        )
        .unwrap();

    let mut ctx = ExecutionContext::new();
    let config = RunConfig::new();
    run_stage(&registry, Stage::PreMain, &mut ctx, &config);
    let report = run_stage(&registry, Stage::PostMain, &mut ctx, &config);

    assert_eq!(
        report.get("reader").unwrap().value(),
        Some(&json!({"saw_init": true}))
    );
}
