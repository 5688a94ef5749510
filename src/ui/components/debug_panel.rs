//! Debug panel component
//!
//! Displays controller state and recent events.

use crate::media::MediaSurface;
use crate::ui::state::AppState;
use crate::ui::theme::Theme;
use egui::{self, RichText, ScrollArea};

/// Debug panel component
pub struct DebugPanel<'a> {
    state: &'a AppState,
    theme: &'a Theme,
}

impl<'a> DebugPanel<'a> {
    pub fn new(state: &'a AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(self, ui: &mut egui::Ui) {
        let snapshot = self.state.controller.snapshot();

        egui::Frame::none()
            .fill(self.theme.bg_secondary)
            .rounding(self.theme.card_rounding)
            .inner_margin(self.theme.spacing)
            .show(ui, |ui| {
                ui.vertical(|ui| {
                    ui.horizontal(|ui| {
                        ui.label(
                            RichText::new("Debug Panel")
                                .strong()
                                .color(self.theme.text_primary),
                        );

                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            ui.label(
                                RichText::new(format!("{:.1} FPS", self.state.debug_info.fps))
                                    .size(12.0)
                                    .family(egui::FontFamily::Monospace)
                                    .color(self.theme.text_muted),
                            );
                        });
                    });

                    ui.separator();

                    egui::Grid::new("debug_stats")
                        .num_columns(2)
                        .spacing([20.0, 4.0])
                        .show(ui, |ui| {
                            self.stat_row(ui, "Phase", &snapshot.phase.to_string());
                            self.stat_row(ui, "Processing", &snapshot.is_processing.to_string());
                            self.stat_row(
                                ui,
                                "Return triggered",
                                &snapshot.has_triggered_idle_crossfade.to_string(),
                            );
                            self.stat_row(ui, "Idle layer", &snapshot.idle.state().to_string());
                            self.stat_row(
                                ui,
                                "Response layer",
                                &snapshot.response.state().to_string(),
                            );
                            self.stat_row(
                                ui,
                                "Response ready",
                                &format!("{:?}", self.state.controller.response().ready_state()),
                            );
                            self.stat_row(
                                ui,
                                "Remaining",
                                &format!(
                                    "{} ms",
                                    snapshot
                                        .response_duration
                                        .saturating_sub(snapshot.response_position)
                                        .as_millis()
                                ),
                            );
                            self.stat_row(ui, "Pending timers", &snapshot.pending_timers.to_string());
                            self.stat_row(ui, "Cycles", &snapshot.cycles_completed.to_string());
                        });

                    if let Some(error) = &self.state.last_error {
                        ui.add_space(self.theme.spacing_sm);
                        ui.horizontal(|ui| {
                            ui.label(RichText::new("⚠").color(self.theme.error));
                            ui.label(RichText::new(error).size(12.0).color(self.theme.error));
                        });
                    }

                    ui.add_space(self.theme.spacing_sm);
                    ui.separator();

                    ui.label(
                        RichText::new("Recent Events")
                            .size(12.0)
                            .strong()
                            .color(self.theme.text_secondary),
                    );

                    ScrollArea::vertical()
                        .max_height(160.0)
                        .auto_shrink([false, false])
                        .stick_to_bottom(true)
                        .show(ui, |ui| {
                            for msg in &self.state.debug_info.log_messages {
                                ui.label(
                                    RichText::new(msg)
                                        .size(11.0)
                                        .family(egui::FontFamily::Monospace)
                                        .color(self.theme.text_muted),
                                );
                            }

                            if self.state.debug_info.log_messages.is_empty() {
                                ui.label(
                                    RichText::new("No events yet")
                                        .size(11.0)
                                        .color(self.theme.text_muted)
                                        .italics(),
                                );
                            }
                        });
                });
            });
    }

    fn stat_row(&self, ui: &mut egui::Ui, label: &str, value: &str) {
        ui.label(RichText::new(label).color(self.theme.text_muted));
        ui.label(
            RichText::new(value)
                .family(egui::FontFamily::Monospace)
                .color(self.theme.text_primary),
        );
        ui.end_row();
    }
}
