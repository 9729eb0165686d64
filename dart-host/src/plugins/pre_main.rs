use dart_plugin_runtime::{ExecutionContext, Extension, RuntimeResult};
use serde_json::{json, Value};

/// Marks the context as initialised before the main window exists.
pub struct PreMainSetup;

impl Extension for PreMainSetup {
    fn execute(&self, ctx: &mut ExecutionContext, config: &Value) -> RuntimeResult<Value> {
        ctx.print(ctx.text("greeting"));
        ctx.print(ctx.text("initializing"));

        if config.as_object().is_some_and(|settings| !settings.is_empty()) {
            ctx.print(format!("Settings: {}", config));
        }

        ctx.insert("pre_main_initialized", true);
        ctx.print(ctx.text("context_initialized"));

        Ok(json!({"status": "initialized"}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sets_context_flag() {
        let mut ctx = ExecutionContext::new();
        let result = PreMainSetup.execute(&mut ctx, &json!({})).unwrap();
        assert_eq!(result, json!({"status": "initialized"}));
        assert_eq!(ctx.get("pre_main_initialized"), Some(&json!(true)));
    }
}
