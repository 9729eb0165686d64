//! Verifies the installed DART host and starts it, forwarding arguments.
//!
//! Exit status: 0 started, 1 launcher directory unknown, 2 host missing,
//! 3 host mismatch, 5 auxiliary missing, 6 auxiliary mismatch, 7 start failed.

use dart_launcher::LaunchPlan;
use std::env;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let plan = match LaunchPlan::beside_current_exe() {
        Ok(plan) => plan,
        Err(e) => {
            error!("Cannot locate the launcher directory: {}", e);
            return ExitCode::from(1);
        }
    };

    match plan.launch(env::args_os().skip(1)) {
        Ok(_child) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::from(e.exit_code())
        }
    }
}
