//! Main application struct and eframe integration
//!
//! This module contains the AvatarApp that implements eframe::App.

use crate::config::AvatarConfig;
use crate::scenario::{Scenario, ScenarioRunner};
use crate::ui::components::{DebugPanel, SendButton, Stage};
use crate::ui::state::AppState;
use crate::ui::theme::Theme;
use egui::{self, CentralPanel, RichText, SidePanel, TopBottomPanel};
use std::time::{Duration, Instant};
use tracing::info;

/// Main avatar application
pub struct AvatarApp {
    state: AppState,
    theme: Theme,
    /// Scenario being played back, if any
    scenario: Option<ScenarioRunner>,
    /// Frame clock value when the scenario started
    scenario_start: Option<Duration>,
    last_frame_time: Instant,
    initialized: bool,
}

impl AvatarApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        config: &AvatarConfig,
        scenario: Option<Scenario>,
    ) -> Self {
        let theme = Theme::dark();
        theme.apply(&cc.egui_ctx);

        Self {
            state: AppState::new(config),
            theme,
            scenario: scenario.map(ScenarioRunner::new),
            scenario_start: None,
            last_frame_time: Instant::now(),
            initialized: false,
        }
    }

    /// Initialize on the first frame
    fn initialize(&mut self, now: Duration) {
        if self.initialized {
            return;
        }
        self.initialized = true;

        if self.scenario.is_some() {
            self.scenario_start = Some(now);
        }
        self.state.debug_info.add_log("Avatar UI initialized".to_string());
        info!("Avatar UI initialized");
    }

    /// Advance a running scenario; exits the process when it asks to stop
    fn run_scenario(&mut self, ctx: &egui::Context, now: Duration) {
        let (Some(runner), Some(start)) = (self.scenario.as_mut(), self.scenario_start) else {
            return;
        };

        let elapsed = now.saturating_sub(start);
        if let Some(code) = runner.step(&mut self.state.controller, elapsed) {
            let final_code = if runner.passed() { code } else { 1 };
            info!("{}", runner.summary());
            info!("[SCENARIO] Exiting with code {}", final_code);
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            std::process::exit(final_code);
        }
    }

    fn show_header(&mut self, ctx: &egui::Context) {
        TopBottomPanel::top("header")
            .frame(egui::Frame::none().fill(self.theme.bg_secondary).inner_margin(12.0))
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(
                        RichText::new("Avatar")
                            .size(20.0)
                            .strong()
                            .color(self.theme.text_primary),
                    );

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("🔍").on_hover_text("Toggle Debug Panel").clicked() {
                            self.state.show_debug_panel = !self.state.show_debug_panel;
                        }

                        if self.state.controller.is_processing()
                            && ui.button("⏹").on_hover_text("Abort response").clicked()
                        {
                            self.state.controller.abort_cycle();
                        }

                        if let Some(runner) = &self.scenario {
                            ui.label(
                                RichText::new(format!("Scenario: {}", runner.name()))
                                    .size(12.0)
                                    .color(self.theme.warning),
                            );
                        }
                    });
                });
            });
    }

    fn show_controls(&mut self, ctx: &egui::Context, now: Duration) {
        TopBottomPanel::bottom("controls")
            .frame(egui::Frame::none().fill(self.theme.bg_primary).inner_margin(self.theme.spacing))
            .show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    SendButton::new(&mut self.state, &self.theme).show(ui, now);
                });
            });
    }

    fn show_debug_panel(&mut self, ctx: &egui::Context) {
        if !self.state.show_debug_panel {
            return;
        }

        SidePanel::right("debug_panel")
            .resizable(true)
            .default_width(300.0)
            .min_width(250.0)
            .frame(egui::Frame::none().fill(self.theme.bg_primary).inner_margin(self.theme.spacing))
            .show(ctx, |ui| {
                DebugPanel::new(&self.state, &self.theme).show(ui);
            });
    }

    fn show_stage(&mut self, ctx: &egui::Context) {
        CentralPanel::default()
            .frame(egui::Frame::none().fill(self.theme.bg_primary).inner_margin(self.theme.spacing))
            .show(ctx, |ui| {
                Stage::new(&self.state, &self.theme).show(ui);
            });
    }
}

impl eframe::App for AvatarApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let frame_now = Instant::now();
        let delta = frame_now.duration_since(self.last_frame_time).as_secs_f64();
        self.last_frame_time = frame_now;
        self.state.update_fps(delta);

        let now = Duration::from_secs_f64(ctx.input(|i| i.time).max(0.0));
        self.initialize(now);

        self.state.poll_events(now);
        self.run_scenario(ctx, now);

        self.show_header(ctx);
        self.show_debug_panel(ctx);
        self.show_controls(ctx, now);
        self.show_stage(ctx);

        // Video keeps moving even when nothing is clicked
        ctx.request_repaint();
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        info!(cycles = self.state.controller.cycles_completed(), "Avatar shutting down");
    }
}
