//! Log routing.
//!
//! Extension console lines (target `dart::plugin`) are printed bare on
//! stdout whatever the log level. Everything else goes to stderr through the
//! level filter.

use dart_plugin_runtime::console::TARGET;
use tracing::Subscriber;
use tracing_subscriber::{
    filter::filter_fn,
    fmt::{self, MakeWriter},
    prelude::*,
    EnvFilter,
};

/// Install the process-wide subscriber. `RUST_LOG` overrides `log_level`.
pub fn init(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    subscriber(filter, std::io::stdout, std::io::stderr).init();
}

/// Subscriber writing extension output to `out` and logs to `err`.
pub fn subscriber<O, E>(filter: EnvFilter, out: O, err: E) -> impl Subscriber + Send + Sync
where
    O: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    E: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(out)
                .with_ansi(false)
                .without_time()
                .with_level(false)
                .with_target(false)
                .with_filter(filter_fn(|meta| meta.target() == TARGET)),
        )
        .with(
            fmt::layer()
                .with_target(true)
                .with_writer(err)
                .with_filter(filter_fn(|meta| meta.target() != TARGET))
                .with_filter(filter),
        )
}
