//! Headless scenario driver
//!
//! Pumps a simulated controller from a tokio interval on the current task,
//! standing in for the GUI frame loop.

use super::{Scenario, ScenarioOutcome, ScenarioRunner};
use crate::config::AvatarConfig;
use crate::controller::CrossfadeController;
use crate::Result;
use std::time::Duration;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

/// Pump interval, roughly one display frame
pub const DEFAULT_FRAME: Duration = Duration::from_millis(10);

/// Run `scenario` against simulated surfaces until it exits
pub async fn run_headless(
    config: &AvatarConfig,
    scenario: Scenario,
    frame: Duration,
) -> Result<ScenarioOutcome> {
    config.validate()?;

    let mut controller = CrossfadeController::simulated(config);
    let events = controller.subscribe();
    controller.start();

    let mut runner = ScenarioRunner::new(scenario);
    let mut ticker = time::interval(frame);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let start = Instant::now();
    info!("[SCENARIO] Started: {}", runner.name());

    loop {
        ticker.tick().await;
        let now = start.elapsed();

        controller.update(now);
        let exit = runner.step(&mut controller, now);

        for event in events.try_iter() {
            debug!(at_ms = now.as_millis() as u64, ?event, "Controller event");
        }

        if exit.is_some() || runner.is_completed() {
            break;
        }
    }

    info!("{}", runner.summary());
    Ok(runner.outcome())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_exit_stops_the_loop() {
        let scenario = Scenario::from_toml(
            r#"
            [scenario]
            name = "exit only"

            [[actions]]
            time_ms = 250
            action = { type = "exit", code = 4 }
            assert = { type = "is_idle" }
            "#,
        )
        .unwrap();

        let outcome = run_headless(&AvatarConfig::default(), scenario, DEFAULT_FRAME)
            .await
            .unwrap();

        assert!(outcome.passed);
        assert_eq!(outcome.exit_code, 4);
        assert_eq!(outcome.elapsed, Duration::from_millis(250));
    }
}
