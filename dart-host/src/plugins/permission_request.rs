use dart_plugin_runtime::{ExecutionContext, Extension, RuntimeResult};
use serde_json::{json, Value};

/// Main-namespace keys this extension displays.
const MAIN_KEYS: [&str; 3] = ["common.title", "common.welcome", "splash.loading_splash"];

/// Reads the host's own translations, which needs `read_main_locales`.
pub struct MainLocalesReader;

impl Extension for MainLocalesReader {
    fn execute(&self, ctx: &mut ExecutionContext, _config: &Value) -> RuntimeResult<Value> {
        ctx.print(ctx.text("greeting"));

        // An unresolved key comes back unchanged.
        let mut resolved = 0;
        for key in MAIN_KEYS {
            let text = ctx.text(key);
            if text != key {
                resolved += 1;
                ctx.print(format!("{}: {}", key, text));
            }
        }

        let has_main_access = resolved > 0;
        if has_main_access {
            ctx.print(ctx.text("main_access_ok"));
        } else {
            ctx.warn(ctx.text("main_access_denied"));
        }

        Ok(json!({
            "status": "completed",
            "has_main_access": has_main_access,
            "resolved": resolved,
        }))
    }
}
