//! Application lifecycle stages at which extensions run.

use crate::error::{RuntimeError, RuntimeResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A fixed lifecycle point of the host application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    /// Right after process start, before any window exists.
    #[default]
    PreMain,

    /// While the splash screen is shown.
    Splash,

    /// After the main window is up.
    PostMain,
}

impl Stage {
    /// All stages in the order the host runs them.
    pub const ALL: [Stage; 3] = [Stage::PreMain, Stage::Splash, Stage::PostMain];

    /// Parse a stage identifier.
    pub fn parse(s: &str) -> RuntimeResult<Self> {
        match s {
            "pre-main" => Ok(Stage::PreMain),
            "splash" => Ok(Stage::Splash),
            "post-main" => Ok(Stage::PostMain),
            other => Err(RuntimeError::UnknownStage(other.to_string())),
        }
    }

    /// Convert the stage to its identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::PreMain => "pre-main",
            Stage::Splash => "splash",
            Stage::PostMain => "post-main",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = RuntimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stage::parse(s)
    }
}
