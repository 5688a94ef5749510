//! Scenario files played through the headless driver
//!
//! Tokio time is paused, so each run advances the clock frame by frame
//! without sleeping.

use avatar::config::AvatarConfig;
use avatar::scenario::{run_headless, Scenario, ScenarioOutcome, DEFAULT_FRAME};
use std::path::PathBuf;
use std::time::Duration;

fn scenario_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("scenarios")
        .join(name)
}

async fn play(name: &str, config: &AvatarConfig) -> ScenarioOutcome {
    let scenario = Scenario::load(scenario_path(name)).unwrap();
    run_headless(config, scenario, DEFAULT_FRAME).await.unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_single_cycle_scenario() {
    let outcome = play("single_cycle.toml", &AvatarConfig::default()).await;

    assert!(outcome.passed, "{:?}", outcome);
    assert_eq!(outcome.exit_code, 0);
    assert_eq!(outcome.elapsed, Duration::from_millis(6200));
}

#[tokio::test(start_paused = true)]
async fn test_load_failure_scenario() {
    let outcome = play("load_failure.toml", &AvatarConfig::default()).await;

    assert!(outcome.passed, "{:?}", outcome);
    assert_eq!(outcome.assertions_failed, 0);
}

#[tokio::test(start_paused = true)]
async fn test_abort_scenario() {
    let outcome = play("abort.toml", &AvatarConfig::default()).await;

    assert!(outcome.passed, "{:?}", outcome);
}

#[tokio::test(start_paused = true)]
async fn test_load_failure_scenario_fails_without_recovery() {
    // The stalled cycle never re-enables send, so the scenario's checks fail
    let config = AvatarConfig::default().without_load_recovery();
    let outcome = play("load_failure.toml", &config).await;

    assert!(!outcome.passed);
    assert!(outcome.assertions_failed > 0);
}

#[test]
fn test_every_bundled_scenario_validates() {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios");
    let mut count = 0;
    for entry in std::fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.extension().and_then(|ext| ext.to_str()) == Some("toml") {
            Scenario::load(&path).unwrap();
            count += 1;
        }
    }
    assert!(count >= 3);
}
