use dart_plugin_runtime::{ExecutionContext, Extension, RuntimeResult};
use serde_json::{json, Value};

/// Follow-up work once the main window is up.
pub struct PostMainFollowUp;

impl Extension for PostMainFollowUp {
    fn execute(&self, ctx: &mut ExecutionContext, _config: &Value) -> RuntimeResult<Value> {
        ctx.print(ctx.text("post_processing"));

        let saw_pre_main = ctx.contains_key("pre_main_initialized");
        if saw_pre_main {
            ctx.print(ctx.text("pre_main_detected"));
        }

        ctx.print(ctx.text("post_processing_complete"));
        ctx.insert("post_main_completed", true);

        Ok(json!({"post_main_completed": true, "saw_pre_main": saw_pre_main}))
    }
}
