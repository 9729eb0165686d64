use dart_plugin_runtime::{ExecutionContext, Extension, RuntimeResult};
use serde_json::{json, Value};

const DEFAULT_RESOURCES: u64 = 5;

/// Loads splash resources one by one and reports progress.
///
/// Settings: `resources` (number of resources, default 5).
pub struct ResourceLoader;

impl Extension for ResourceLoader {
    fn execute(&self, ctx: &mut ExecutionContext, config: &Value) -> RuntimeResult<Value> {
        let total = config
            .get("resources")
            .and_then(Value::as_u64)
            .unwrap_or(DEFAULT_RESOURCES);

        ctx.print(ctx.text("resource_loading"));
        for i in 1..=total {
            ctx.print(format!("{} {}/{}", ctx.text("resource_step"), i, total));
        }
        ctx.print(format!("{} {}", total, ctx.text("resources_loaded")));

        ctx.insert("resources_loaded", total);
        Ok(json!({"resources_loaded": total}))
    }
}
