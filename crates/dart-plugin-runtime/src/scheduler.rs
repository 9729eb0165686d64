//! Stage execution.
//!
//! Runs every enabled extension of a stage, one after the other, against a
//! shared [`ExecutionContext`]. A failing or panicking extension is recorded
//! and the stage moves on to the next one.

use crate::console::{self, ConsoleLevel};
use crate::context::{ExecutionContext, RunConfig};
use crate::registry::{ExtensionRegistry, RegisteredExtension};
use crate::stage::Stage;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::debug;

/// Result of running one extension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// The extension returned a value.
    Completed { value: Value },

    /// The extension failed or panicked.
    Faulted { fault: String },
}

impl Outcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Outcome::Completed { .. })
    }

    pub fn is_faulted(&self) -> bool {
        matches!(self, Outcome::Faulted { .. })
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            Outcome::Completed { value } => Some(value),
            Outcome::Faulted { .. } => None,
        }
    }

    pub fn fault(&self) -> Option<&str> {
        match self {
            Outcome::Completed { .. } => None,
            Outcome::Faulted { fault } => Some(fault),
        }
    }
}

/// Outcomes of one stage run, in invocation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageReport {
    pub stage: Stage,
    outcomes: Vec<(String, Outcome)>,
}

impl StageReport {
    fn new(stage: Stage) -> Self {
        Self {
            stage,
            outcomes: Vec::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Outcome> {
        self.outcomes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, outcome)| outcome)
    }

    /// Extension names in the order they ran.
    pub fn order(&self) -> Vec<&str> {
        self.outcomes.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Outcome)> {
        self.outcomes.iter().map(|(n, o)| (n.as_str(), o))
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn fault_count(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| o.is_faulted()).count()
    }
}

/// Run every enabled extension registered for `stage`.
///
/// Extensions run in priority order (highest first), ties broken by
/// registration order. Each receives its own slice of `config`, or an empty
/// JSON object when there is none.
pub fn run_stage(
    registry: &ExtensionRegistry,
    stage: Stage,
    ctx: &mut ExecutionContext,
    config: &RunConfig,
) -> StageReport {
    for skipped in registry.disabled_in(stage) {
        debug!("Skipping disabled extension: {}", skipped.name);
    }

    let empty = Value::Object(Map::new());
    let mut report = StageReport::new(stage);

    for unit in registry.scheduled(stage) {
        let unit_config = config.get(unit.name()).unwrap_or(&empty);
        let outcome = invoke(unit, ctx, unit_config);
        report.outcomes.push((unit.name().to_string(), outcome));
    }

    debug!(
        "Stage {} finished: {} ran, {} faulted",
        stage,
        report.len(),
        report.fault_count()
    );
    report
}

fn invoke(unit: &RegisteredExtension, ctx: &mut ExecutionContext, config: &Value) -> Outcome {
    let name = unit.name();
    console::plugin_print(name, ConsoleLevel::Info, "running...");

    ctx.set_current_extension(Some(name));
    let result = panic::catch_unwind(AssertUnwindSafe(|| unit.entry().execute(ctx, config)));
    ctx.set_current_extension(None);

    match result {
        Ok(Ok(value)) => {
            console::plugin_print(name, ConsoleLevel::Info, "done");
            Outcome::Completed { value }
        }
        Ok(Err(e)) => {
            let fault = e.to_string();
            report_fault(name, &fault);
            Outcome::Faulted { fault }
        }
        Err(payload) => {
            let fault = format!("panicked: {}", panic_message(payload.as_ref()));
            report_fault(name, &fault);
            Outcome::Faulted { fault }
        }
    }
}

fn report_fault(name: &str, fault: &str) {
    console::plugin_print(name, ConsoleLevel::Error, "failed while running");
    for line in fault.lines().filter(|l| !l.trim().is_empty()) {
        console::plugin_print(name, ConsoleLevel::Error, &format!("  {}", line));
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
