//! Avatar - conversational avatar demo
//!
//! Opens the desktop window by default; `--headless` plays a scenario
//! without a window.

use anyhow::{bail, Context, Result};
use avatar::config::AvatarConfig;
use avatar::scenario::{self, Scenario};
use avatar::ui::AvatarApp;
use clap::Parser;
use eframe::egui;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "avatar", version, about = "Idle/response video crossfade avatar")]
struct Cli {
    /// TOML file overriding the timing and media defaults
    #[arg(long, env = "AVATAR_CONFIG")]
    config: Option<PathBuf>,

    /// Scenario file to play back
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Run the scenario without opening a window
    #[arg(long, requires = "scenario")]
    headless: bool,

    /// Log filter (same syntax as RUST_LOG)
    #[arg(long, env = "RUST_LOG")]
    log_filter: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            cli.log_filter
                .as_deref()
                .and_then(|filter| tracing_subscriber::EnvFilter::try_new(filter).ok())
                .unwrap_or_else(|| "avatar=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Avatar");

    let config = match &cli.config {
        Some(path) => AvatarConfig::load(path)?,
        None => AvatarConfig::default(),
    };

    let scenario = cli
        .scenario
        .as_ref()
        .map(Scenario::load)
        .transpose()?;

    if cli.headless {
        let Some(scenario) = scenario else {
            bail!("--headless requires --scenario");
        };
        return run_headless(&config, scenario);
    }

    run_window(config, scenario)
}

fn run_headless(config: &AvatarConfig, scenario: Scenario) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("Failed to build tokio runtime")?;

    let outcome = runtime.block_on(scenario::run_headless(config, scenario, scenario::DEFAULT_FRAME))?;

    if !outcome.passed {
        bail!(
            "Scenario '{}' failed {} assertion(s)",
            outcome.name,
            outcome.assertions_failed
        );
    }
    if outcome.exit_code != 0 {
        std::process::exit(outcome.exit_code);
    }
    Ok(())
}

fn run_window(config: AvatarConfig, scenario: Option<Scenario>) -> Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([960.0, 640.0])
            .with_min_inner_size([480.0, 360.0])
            .with_title("Avatar"),
        ..Default::default()
    };

    eframe::run_native(
        "Avatar",
        options,
        Box::new(move |cc| Ok(Box::new(AvatarApp::new(cc, &config, scenario)))),
    )
    .map_err(|e| avatar::AvatarError::UiError(e.to_string()))?;

    Ok(())
}
