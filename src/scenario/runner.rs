//! Scenario runner
//!
//! Executes scenario actions against a controller once their time has come
//! and checks the attached assertions.

use super::{ActionType, Assertion, Scenario};
use crate::controller::{ControllerSnapshot, CrossfadeController, CyclePhase};
use crate::media::{MediaSurface, SimulatedSurface};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Commands a scenario issues to the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScenarioCommand {
    Send,
    PauseResponse,
    ResumeResponse,
    FailNextLoad,
    Abort,
    Log(String),
    Exit { code: i32 },
}

/// Result of an assertion check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssertionResult {
    Passed,
    Failed(String),
}

/// Summary of a finished scenario
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioOutcome {
    pub name: String,
    pub passed: bool,
    pub exit_code: i32,
    pub actions_executed: usize,
    pub assertions_failed: usize,
    pub elapsed: Duration,
}

/// Schedules and executes scenario actions
pub struct ScenarioRunner {
    scenario: Scenario,
    current_action_index: usize,
    completed: bool,
    assertions_failed: usize,
    exit_code: Option<i32>,
    elapsed: Duration,
}

impl ScenarioRunner {
    pub fn new(scenario: Scenario) -> Self {
        info!("[SCENARIO] Loaded: {}", scenario.scenario.name);
        if !scenario.scenario.description.is_empty() {
            info!("[SCENARIO] Description: {}", scenario.scenario.description);
        }
        info!("[SCENARIO] Total actions: {}", scenario.actions.len());

        Self {
            scenario,
            current_action_index: 0,
            completed: false,
            assertions_failed: 0,
            exit_code: None,
            elapsed: Duration::ZERO,
        }
    }

    pub fn name(&self) -> &str {
        &self.scenario.scenario.name
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// All assertions so far have passed
    pub fn passed(&self) -> bool {
        self.assertions_failed == 0
    }

    /// Next action due at `elapsed`, if any
    pub fn poll(&mut self, elapsed: Duration) -> Option<(ScenarioCommand, Option<Assertion>)> {
        if self.completed {
            return None;
        }
        self.elapsed = elapsed;

        let Some(action) = self.scenario.actions.get(self.current_action_index) else {
            self.completed = true;
            return None;
        };
        if elapsed < action.delay() {
            return None;
        }

        debug!(
            "[SCENARIO] Executing action at {}ms: {:?}",
            action.time_ms, action.action
        );
        let command = to_command(&action.action);
        let assertion = action.assert.clone();

        self.current_action_index += 1;
        if self.current_action_index >= self.scenario.actions.len() {
            self.completed = true;
        }

        Some((command, assertion))
    }

    /// Run every action due at `now` against `controller`
    ///
    /// Returns the exit code once the scenario asks to stop.
    pub fn step(
        &mut self,
        controller: &mut CrossfadeController<SimulatedSurface>,
        now: Duration,
    ) -> Option<i32> {
        while let Some((command, assertion)) = self.poll(now) {
            self.apply(&command, controller);
            if let Some(assertion) = assertion {
                self.check_assertion(&assertion, &controller.snapshot());
            }
            if let ScenarioCommand::Exit { code } = command {
                self.exit_code = Some(code);
                self.completed = true;
                return Some(code);
            }
        }
        None
    }

    fn apply(
        &mut self,
        command: &ScenarioCommand,
        controller: &mut CrossfadeController<SimulatedSurface>,
    ) {
        match command {
            ScenarioCommand::Send => {
                if !controller.send(self.elapsed) {
                    info!("[SCENARIO] Send dropped while processing");
                }
            }
            ScenarioCommand::PauseResponse => controller.response_mut().pause(),
            ScenarioCommand::ResumeResponse => {
                if let Err(e) = controller.response_mut().play() {
                    warn!("[SCENARIO] Resume failed: {}", e);
                }
            }
            ScenarioCommand::FailNextLoad => controller.response_mut().inject_load_failure(),
            ScenarioCommand::Abort => {
                controller.abort_cycle();
            }
            ScenarioCommand::Log(message) => info!("[SCENARIO] Log: {}", message),
            ScenarioCommand::Exit { .. } => {}
        }
    }

    /// Check an assertion against a controller snapshot
    pub fn check_assertion(
        &mut self,
        assertion: &Assertion,
        snapshot: &ControllerSnapshot,
    ) -> AssertionResult {
        let result = evaluate(assertion, snapshot);

        match &result {
            AssertionResult::Passed => info!("[SCENARIO] PASS: {:?}", assertion),
            AssertionResult::Failed(reason) => {
                error!("[SCENARIO] FAIL: {:?} - {}", assertion, reason);
                self.assertions_failed += 1;
            }
        }

        result
    }

    pub fn outcome(&self) -> ScenarioOutcome {
        ScenarioOutcome {
            name: self.scenario.scenario.name.clone(),
            passed: self.passed(),
            exit_code: self.exit_code.unwrap_or(0),
            actions_executed: self.current_action_index,
            assertions_failed: self.assertions_failed,
            elapsed: self.elapsed,
        }
    }

    pub fn summary(&self) -> String {
        let status = if self.passed() { "PASSED" } else { "FAILED" };
        format!(
            "[SCENARIO] '{}' {}: Executed {} actions in {:?}",
            self.scenario.scenario.name, status, self.current_action_index, self.elapsed
        )
    }
}

fn to_command(action: &ActionType) -> ScenarioCommand {
    match action {
        ActionType::Send => ScenarioCommand::Send,
        ActionType::PauseResponse => ScenarioCommand::PauseResponse,
        ActionType::ResumeResponse => ScenarioCommand::ResumeResponse,
        ActionType::FailNextLoad => ScenarioCommand::FailNextLoad,
        ActionType::Abort => ScenarioCommand::Abort,
        ActionType::Log { message } => ScenarioCommand::Log(message.clone()),
        ActionType::Exit { code } => ScenarioCommand::Exit { code: *code },
    }
}

fn check(condition: bool, reason: impl FnOnce() -> String) -> AssertionResult {
    if condition {
        AssertionResult::Passed
    } else {
        AssertionResult::Failed(reason())
    }
}

fn evaluate(assertion: &Assertion, snapshot: &ControllerSnapshot) -> AssertionResult {
    match assertion {
        Assertion::IsProcessing => check(snapshot.is_processing, || {
            format!("Expected a running cycle, phase is {}", snapshot.phase)
        }),
        Assertion::IsIdle => check(snapshot.phase.is_idle() && !snapshot.is_processing, || {
            format!("Expected Idle, phase is {}", snapshot.phase)
        }),
        Assertion::SendEnabled => check(snapshot.send_enabled, || {
            "Expected send to be enabled".to_string()
        }),
        Assertion::SendDisabled => check(!snapshot.send_enabled, || {
            "Expected send to be disabled".to_string()
        }),
        Assertion::Phase { phase } => match phase.parse::<CyclePhase>() {
            Ok(expected) => check(snapshot.phase == expected, || {
                format!("Expected phase {}, got {}", expected, snapshot.phase)
            }),
            Err(e) => AssertionResult::Failed(e),
        },
        Assertion::IdleActive => check(snapshot.idle.active, || {
            format!("Expected idle to be active, it is {}", snapshot.idle.state())
        }),
        Assertion::NoFadingIn => check(snapshot.no_fading_in(), || {
            format!(
                "Expected no fading-in layer, idle is {} and response is {}",
                snapshot.idle.state(),
                snapshot.response.state()
            )
        }),
        Assertion::IdleCrossfadeTriggered => check(snapshot.has_triggered_idle_crossfade, || {
            "Expected the return crossfade to have triggered".to_string()
        }),
        Assertion::CyclesCompleted { min } => check(snapshot.cycles_completed >= *min, || {
            format!(
                "Expected at least {} completed cycles, got {}",
                min, snapshot.cycles_completed
            )
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AvatarConfig;

    fn scenario(toml: &str) -> Scenario {
        Scenario::from_toml(toml).unwrap()
    }

    #[test]
    fn test_poll_waits_for_action_time() {
        let mut runner = ScenarioRunner::new(scenario(
            r#"
            [scenario]
            name = "timing"

            [[actions]]
            time_ms = 100
            action = { type = "send" }

            [[actions]]
            time_ms = 200
            action = { type = "exit", code = 3 }
            "#,
        ));

        assert!(runner.poll(Duration::from_millis(50)).is_none());
        let (command, _) = runner.poll(Duration::from_millis(100)).unwrap();
        assert_eq!(command, ScenarioCommand::Send);
        assert!(!runner.is_completed());
    }

    #[test]
    fn test_step_applies_send_and_checks_assertion() {
        let mut controller = CrossfadeController::simulated(&AvatarConfig::default());
        controller.start();
        let mut runner = ScenarioRunner::new(scenario(
            r#"
            [scenario]
            name = "send"

            [[actions]]
            time_ms = 0
            action = { type = "send" }
            assert = { type = "send_disabled" }

            [[actions]]
            time_ms = 0
            action = { type = "send" }
            assert = { type = "phase", phase = "awaiting_synthesis" }

            [[actions]]
            time_ms = 10
            action = { type = "exit", code = 0 }
            "#,
        ));

        assert_eq!(runner.step(&mut controller, Duration::ZERO), None);
        assert!(controller.is_processing());
        assert_eq!(runner.step(&mut controller, Duration::from_millis(10)), Some(0));

        let outcome = runner.outcome();
        assert!(outcome.passed);
        assert_eq!(outcome.actions_executed, 3);
    }

    #[test]
    fn test_failed_assertion_marks_scenario_failed() {
        let mut controller = CrossfadeController::simulated(&AvatarConfig::default());
        controller.start();
        let mut runner = ScenarioRunner::new(scenario(
            r#"
            [scenario]
            name = "wrong expectation"

            [[actions]]
            time_ms = 0
            action = { type = "exit", code = 0 }
            assert = { type = "is_processing" }
            "#,
        ));

        runner.step(&mut controller, Duration::ZERO);
        assert!(!runner.passed());
        assert_eq!(runner.outcome().assertions_failed, 1);
        assert!(runner.summary().contains("FAILED"));
    }
}
