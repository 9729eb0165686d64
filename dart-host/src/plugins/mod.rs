//! Extension implementations linked into the host.
//!
//! Manifests in the plugins directory refer to these by entry point key.

mod permission_request;
mod post_main;
mod pre_main;
mod showcase;
mod splash;

use dart_plugin_runtime::{EntryPointCatalog, Extension};

pub use permission_request::MainLocalesReader;
pub use post_main::PostMainFollowUp;
pub use pre_main::PreMainSetup;
pub use showcase::{DisabledSample, ShowcaseInit, ShowcaseMain, ShowcaseProgress};
pub use splash::ResourceLoader;

/// Every implementation the host ships, keyed by entry point.
pub fn builtin_catalog() -> EntryPointCatalog {
    EntryPointCatalog::new()
        .with("sample_pre_main", || -> Box<dyn Extension> { Box::new(PreMainSetup) })
        .with("sample_splash", || -> Box<dyn Extension> { Box::new(ResourceLoader) })
        .with("sample_post_main", || -> Box<dyn Extension> {
            Box::new(PostMainFollowUp)
        })
        .with("sample_permission_request", || -> Box<dyn Extension> {
            Box::new(MainLocalesReader)
        })
        .with("sample_init", || -> Box<dyn Extension> { Box::new(ShowcaseInit) })
        .with("sample_progress", || -> Box<dyn Extension> {
            Box::new(ShowcaseProgress)
        })
        .with("sample_main", || -> Box<dyn Extension> { Box::new(ShowcaseMain) })
        .with("sample_disabled", || -> Box<dyn Extension> {
            Box::new(DisabledSample)
        })
}
