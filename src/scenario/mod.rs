//! Scripted scenarios
//!
//! A scenario is a TOML file of timed actions (press send, pause the
//! response, make the next load fail, ...) with optional assertions checked
//! right after each action. Scenarios run inside the desktop app or headless.

mod headless;
mod runner;

pub use headless::{run_headless, DEFAULT_FRAME};
pub use runner::{AssertionResult, ScenarioCommand, ScenarioOutcome, ScenarioRunner};

use crate::{AvatarError, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// A scenario loaded from a TOML file
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    /// Scenario metadata
    pub scenario: ScenarioMetadata,
    /// Timed actions, ordered by time
    pub actions: Vec<ScenarioAction>,
}

/// Metadata about the scenario
#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioMetadata {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// A single action with its timing
#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioAction {
    /// Milliseconds after scenario start
    pub time_ms: u64,
    pub action: ActionType,
    /// Checked right after the action runs
    #[serde(default)]
    pub assert: Option<Assertion>,
}

/// Things a scenario can do to the avatar
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionType {
    /// Press the send button
    Send,
    /// Pause the response surface, as if paused externally
    PauseResponse,
    /// Resume the response surface
    ResumeResponse,
    /// Evict the response and make its next load fail
    FailNextLoad,
    /// Cancel the running cycle
    Abort,
    /// Log a message
    Log { message: String },
    /// Stop the scenario
    Exit {
        #[serde(default)]
        code: i32,
    },
}

/// Conditions checked against the controller
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Assertion {
    IsProcessing,
    IsIdle,
    SendEnabled,
    SendDisabled,
    /// Controller is in the named phase, e.g. "playing_response"
    Phase { phase: String },
    IdleActive,
    NoFadingIn,
    IdleCrossfadeTriggered,
    CyclesCompleted { min: u64 },
}

impl Scenario {
    /// Load a scenario from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            AvatarError::IOError(format!("Failed to read '{}': {}", path.display(), e))
        })?;
        Self::from_toml(&content).map_err(|e| match e {
            AvatarError::ScenarioError(message) => {
                AvatarError::ScenarioError(format!("{}: {}", path.display(), message))
            }
            other => other,
        })
    }

    /// Parse and validate a scenario from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let scenario: Scenario = toml::from_str(content)
            .map_err(|e| AvatarError::ScenarioError(format!("Failed to parse scenario: {}", e)))?;
        scenario.validate()?;
        Ok(scenario)
    }

    fn validate(&self) -> Result<()> {
        if self.actions.is_empty() {
            return Err(AvatarError::ScenarioError(
                "Scenario must have at least one action".to_string(),
            ));
        }

        let mut last_time = 0;
        for action in &self.actions {
            if action.time_ms < last_time {
                return Err(AvatarError::ScenarioError(format!(
                    "Actions must be ordered by time. Found action at {}ms after action at {}ms",
                    action.time_ms, last_time
                )));
            }
            last_time = action.time_ms;

            if let Some(Assertion::Phase { phase }) = &action.assert {
                phase
                    .parse::<crate::controller::CyclePhase>()
                    .map_err(AvatarError::ScenarioError)?;
            }
        }

        let has_exit = self
            .actions
            .iter()
            .any(|a| matches!(a.action, ActionType::Exit { .. }));
        if !has_exit {
            return Err(AvatarError::ScenarioError(
                "Scenario must have an Exit action".to_string(),
            ));
        }

        Ok(())
    }
}

impl ScenarioAction {
    /// Offset from scenario start
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.time_ms)
    }
}
