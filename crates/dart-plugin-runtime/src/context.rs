//! The extension interface and the state shared with extension bodies.

use crate::console::{self, ConsoleLevel};
use crate::error::RuntimeResult;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// An extension body.
///
/// `config` is the extension's slice of the [`RunConfig`], or an empty JSON
/// object when the host supplied nothing for it.
pub trait Extension: Send + Sync {
    fn execute(&self, ctx: &mut ExecutionContext, config: &Value) -> RuntimeResult<Value>;
}

impl<F> Extension for F
where
    F: Fn(&mut ExecutionContext, &Value) -> RuntimeResult<Value> + Send + Sync,
{
    fn execute(&self, ctx: &mut ExecutionContext, config: &Value) -> RuntimeResult<Value> {
        self(ctx, config)
    }
}

/// Services the host exposes to running extensions.
pub trait HostServices: Send + Sync {
    /// Resolve display text for `key` on behalf of `caller`.
    ///
    /// `None` as caller means the host's own namespace. Must never fail: the
    /// fallback is `default`, then the key itself.
    fn text(&self, caller: Option<&str>, key: &str, default: Option<&str>) -> String;
}

/// Key/value state shared by every extension run within a stage.
///
/// A missing key means "not yet provided", never an error.
#[derive(Default)]
pub struct ExecutionContext {
    values: Map<String, Value>,
    host: Option<Arc<dyn HostServices>>,
    current: Option<String>,
}

impl ExecutionContext {
    /// Create an empty context without host services.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty context wired to host services.
    pub fn with_host(host: Arc<dyn HostServices>) -> Self {
        Self {
            values: Map::new(),
            host: Some(host),
            current: None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Store a value, returning the one it replaced.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// All values currently in the context.
    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Name of the extension being executed, if any.
    pub fn current_extension(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub(crate) fn set_current_extension(&mut self, name: Option<&str>) {
        self.current = name.map(str::to_string);
    }

    /// Host services, when the host wired them in.
    pub fn host(&self) -> Option<&Arc<dyn HostServices>> {
        self.host.as_ref()
    }

    /// Display text for `key` in the running extension's namespace.
    pub fn text(&self, key: &str) -> String {
        self.resolve(key, None)
    }

    /// Like [`text`](Self::text) with an explicit fallback.
    pub fn text_or(&self, key: &str, default: &str) -> String {
        self.resolve(key, Some(default))
    }

    fn resolve(&self, key: &str, default: Option<&str>) -> String {
        match &self.host {
            Some(host) => host.text(self.current.as_deref(), key, default),
            None => default.unwrap_or(key).to_string(),
        }
    }

    /// Print an info line tagged with the running extension's name.
    pub fn print(&self, message: impl AsRef<str>) {
        self.emit(ConsoleLevel::Info, message.as_ref());
    }

    pub fn warn(&self, message: impl AsRef<str>) {
        self.emit(ConsoleLevel::Warning, message.as_ref());
    }

    pub fn error(&self, message: impl AsRef<str>) {
        self.emit(ConsoleLevel::Error, message.as_ref());
    }

    fn emit(&self, level: ConsoleLevel, message: &str) {
        let name = self.current.as_deref().unwrap_or("host");
        console::plugin_print(name, level, message);
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("values", &self.values)
            .field("has_host", &self.host.is_some())
            .field("current", &self.current)
            .finish()
    }
}

/// Per-extension configuration passed through to extension bodies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunConfig {
    entries: HashMap<String, Value>,
}

impl RunConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, extension: impl Into<String>, value: Value) -> Option<Value> {
        self.entries.insert(extension.into(), value)
    }

    pub fn with(mut self, extension: impl Into<String>, value: Value) -> Self {
        self.insert(extension, value);
        self
    }

    pub fn get(&self, extension: &str) -> Option<&Value> {
        self.entries.get(extension)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, Value)> for RunConfig {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
