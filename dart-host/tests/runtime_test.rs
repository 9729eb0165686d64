//! End-to-end tests against the bundled sample extensions.

use dart_host::config::Config;
use dart_host::Runtime;
use dart_i18n::{Decision, StaticConsent};
use dart_plugin_runtime::{Permission, Stage};
use serde_json::json;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ==============================================================================
// Helpers
// ==============================================================================

fn bundled(dir: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join(dir)
}

fn config_in(temp: &TempDir, toml_src: &str) -> Config {
    let mut config: Config = toml::from_str(toml_src).unwrap();
    config.runtime.plugins_dir = Some(bundled("plugins"));
    config.runtime.locales_dir = Some(bundled("locales"));
    config.permissions.store_path = Some(temp.path().join("permissions.json"));
    config.validate().unwrap();
    config
}

fn loaded(config: &Config, consent: StaticConsent) -> Runtime {
    let mut runtime = Runtime::from_config(config, Box::new(consent)).unwrap();
    runtime.load_all_units().unwrap();
    runtime.apply_overrides(config);
    runtime
}

// ==============================================================================
// Discovery
// ==============================================================================

#[test]
fn test_loads_every_bundled_extension() {
    let temp = TempDir::new().unwrap();
    let config = config_in(&temp, "");
    let runtime = loaded(&config, StaticConsent::Deny);

    let units = runtime.unit_info(None).unwrap();
    assert_eq!(units.len(), 8);

    let disabled = runtime.unit_info(Some("sample_disabled")).unwrap();
    assert!(!disabled[0].enabled);
    assert_eq!(disabled[0].origin.as_deref(), Some(bundled("plugins/sample").as_path()));

    let reader = runtime.unit_info(Some("sample_permission_request")).unwrap();
    assert_eq!(reader[0].permissions, vec!["read_main_locales"]);
}

#[test]
fn test_stage_order_follows_priority_then_discovery() {
    let temp = TempDir::new().unwrap();
    let config = config_in(&temp, "");
    let runtime = loaded(&config, StaticConsent::Deny);

    let mut ctx = runtime.new_context();
    let reports = runtime.run_lifecycle(&mut ctx, &config.run_config().unwrap());

    assert_eq!(reports[0].stage, Stage::PreMain);
    assert_eq!(reports[0].order(), vec!["sample_init", "sample_pre_main"]);
    assert_eq!(
        reports[1].order(),
        vec!["sample_progress", "sample_permission_request", "sample_splash"]
    );
    assert_eq!(reports[2].order(), vec!["sample_main", "sample_post_main"]);
    assert!(reports.iter().all(|r| r.fault_count() == 0));
}

#[test]
fn test_config_enables_declared_disabled_extension() {
    let temp = TempDir::new().unwrap();
    let config = config_in(
        &temp,
        r#"
[plugins.sample_disabled]
enabled = true
"#,
    );
    let runtime = loaded(&config, StaticConsent::Deny);

    let mut ctx = runtime.new_context();
    let report = runtime.run_stage(Stage::Splash, &mut ctx, &config.run_config().unwrap());
    assert!(report.get("sample_disabled").is_some());
}

// ==============================================================================
// Execution
// ==============================================================================

#[test]
fn test_context_and_settings_reach_extensions() {
    let temp = TempDir::new().unwrap();
    let config = config_in(
        &temp,
        r#"
[plugins.sample_init.settings]
timeout = 9

[plugins.sample_splash.settings]
resources = 2
"#,
    );
    let runtime = loaded(&config, StaticConsent::Deny);
    let run_config = config.run_config().unwrap();

    let mut ctx = runtime.new_context();
    let reports = runtime.run_lifecycle(&mut ctx, &run_config);

    let init = reports[0].get("sample_init").and_then(|o| o.value()).unwrap();
    assert_eq!(init["timeout"], json!(9));

    let post = reports[2].get("sample_post_main").and_then(|o| o.value()).unwrap();
    assert_eq!(post["saw_pre_main"], json!(true));

    assert_eq!(ctx.get("resources_loaded"), Some(&json!(2)));
    assert_eq!(ctx.get("sample_plugin_completed"), Some(&json!(true)));
}

// ==============================================================================
// Permissions
// ==============================================================================

#[test]
fn test_granted_extension_reads_main_translations() {
    let temp = TempDir::new().unwrap();
    let config = config_in(&temp, "");
    let runtime = loaded(&config, StaticConsent::Grant);

    let mut ctx = runtime.new_context();
    let report = runtime.run_stage(Stage::Splash, &mut ctx, &config.run_config().unwrap());
    let value = report
        .get("sample_permission_request")
        .and_then(|o| o.value())
        .unwrap();
    assert_eq!(value["has_main_access"], json!(true));
    assert_eq!(value["resolved"], json!(3));
}

#[test]
fn test_denied_extension_sees_only_its_own_translations() {
    let temp = TempDir::new().unwrap();
    let config = config_in(&temp, "");
    let runtime = loaded(&config, StaticConsent::Deny);

    let mut ctx = runtime.new_context();
    let report = runtime.run_stage(Stage::Splash, &mut ctx, &config.run_config().unwrap());
    let value = report
        .get("sample_permission_request")
        .and_then(|o| o.value())
        .unwrap();
    assert_eq!(value["has_main_access"], json!(false));

    assert_eq!(
        runtime.get_text("common.title", Some("sample_permission_request"), None),
        "common.title"
    );
    assert_eq!(
        runtime.get_text("greeting", Some("sample_permission_request"), None),
        "권한 요청 플러그인 시작"
    );
}

#[test]
fn test_decision_survives_restart() {
    let temp = TempDir::new().unwrap();
    let config = config_in(&temp, "");
    drop(loaded(&config, StaticConsent::Grant));

    // A refusing prompt is never consulted for a stored decision.
    let runtime = loaded(&config, StaticConsent::Deny);
    assert_eq!(
        runtime
            .localization()
            .permission("sample_permission_request", Permission::ReadMainLocales),
        Some(Decision::Granted)
    );
    assert_eq!(
        runtime.get_text("common.title", Some("sample_permission_request"), None),
        "DART"
    );
}

// ==============================================================================
// Localization
// ==============================================================================

#[test]
fn test_language_switch_and_fallback() {
    let temp = TempDir::new().unwrap();
    let config = config_in(&temp, "");
    let runtime = loaded(&config, StaticConsent::Deny);

    assert_eq!(runtime.get_text("common.welcome", None, None), "DART에 오신 것을 환영합니다");

    runtime.set_language("en").unwrap();
    assert_eq!(runtime.get_text("common.welcome", None, None), "Welcome to DART");
    // Only Korean carries this key.
    assert_eq!(runtime.get_text("splash.loading", None, None), "로딩 중");
    assert_eq!(
        runtime.get_text("greeting", Some("sample_pre_main"), None),
        "Hello! This is the pre-main plugin."
    );
    assert_eq!(runtime.get_text("missing.key", None, Some("fallback")), "fallback");

    assert!(runtime.set_language("fr").is_err());
    assert_eq!(runtime.localization().current_language(), "en");
    assert_eq!(runtime.supported_languages(), vec!["ko", "en"]);
}

#[test]
fn test_units_of_one_manifest_share_translations() {
    let temp = TempDir::new().unwrap();
    let config = config_in(
        &temp,
        r#"
[localization]
supported_languages = ["ko", "en"]
language = "en"
fallback_chain = ["ko", "en"]
"#,
    );
    let runtime = loaded(&config, StaticConsent::Deny);

    for name in ["sample_init", "sample_progress", "sample_main"] {
        assert_eq!(
            runtime.get_text("welcome", Some(name), None),
            "The sample plugin has been loaded!"
        );
    }
}
