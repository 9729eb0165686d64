//! A unit declaring one extension per stage, plus a disabled one.

use dart_plugin_runtime::{ExecutionContext, Extension, RuntimeResult};
use serde_json::{json, Value};

const DATA_KEY: &str = "sample_plugin_data";

/// Shares data with the later stages.
pub struct ShowcaseInit;

impl Extension for ShowcaseInit {
    fn execute(&self, ctx: &mut ExecutionContext, config: &Value) -> RuntimeResult<Value> {
        ctx.print(ctx.text_or("init_start", "Sample plugin initialising"));

        ctx.insert(
            DATA_KEY,
            json!({
                "initialized": true,
                "message": "Hello from the sample plugin!",
                "features": ["splash_progress", "main_window_greeting"],
            }),
        );

        let timeout = config.get("timeout").and_then(Value::as_u64).unwrap_or(5);
        ctx.print(format!("timeout: {}s", timeout));

        Ok(json!({"status": "initialized", "timeout": timeout}))
    }
}

/// Reports splash progress steps into the context.
pub struct ShowcaseProgress;

impl Extension for ShowcaseProgress {
    fn execute(&self, ctx: &mut ExecutionContext, _config: &Value) -> RuntimeResult<Value> {
        if let Some(message) = ctx
            .get(DATA_KEY)
            .and_then(|data| data.get("message"))
            .and_then(Value::as_str)
        {
            ctx.print(format!("Received: {}", message));
        }

        let steps = [
            (0.88, "Loading resources"),
            (0.90, "Reading settings"),
            (0.92, "Validating data"),
        ];
        let mut progress = ctx
            .get("splash_progress")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        for (value, message) in steps {
            ctx.print(message);
            progress.push(json!({"progress": value, "message": message}));
        }
        ctx.insert("splash_progress", progress);

        Ok(json!({"status": "splash_complete"}))
    }
}

/// Greets once the main window is shown.
pub struct ShowcaseMain;

impl Extension for ShowcaseMain {
    fn execute(&self, ctx: &mut ExecutionContext, _config: &Value) -> RuntimeResult<Value> {
        let features: Vec<String> = ctx
            .get(DATA_KEY)
            .and_then(|data| data.get("features"))
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        if !features.is_empty() {
            ctx.print(format!("Features: {}", features.join(", ")));
        }
        ctx.print(ctx.text_or("welcome", "Sample plugin loaded"));
        ctx.insert("sample_plugin_completed", true);

        Ok(json!({"status": "complete", "features_loaded": features}))
    }
}

/// Declared disabled; should never run.
pub struct DisabledSample;

impl Extension for DisabledSample {
    fn execute(&self, ctx: &mut ExecutionContext, _config: &Value) -> RuntimeResult<Value> {
        ctx.warn("This extension is disabled and should not have run");
        Ok(json!({"status": "should_not_run"}))
    }
}
