//! Send button component
//!
//! The only user trigger. Enabled exactly when no cycle is running.

use crate::ui::state::AppState;
use crate::ui::theme::Theme;
use egui::{self, RichText, Vec2};
use std::time::Duration;

/// Accessibility label of the send button
pub const SEND_BUTTON_LABEL: &str = "Send message";

/// Button that starts a response cycle
pub struct SendButton<'a> {
    state: &'a mut AppState,
    theme: &'a Theme,
}

impl<'a> SendButton<'a> {
    pub fn new(state: &'a mut AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(self, ui: &mut egui::Ui, now: Duration) -> egui::Response {
        let enabled = self.state.controller.send_enabled();

        let (text, fill) = if enabled {
            ("➤  Send", self.theme.primary)
        } else {
            ("⏳  Responding…", self.theme.bg_tertiary)
        };

        let button = egui::Button::new(RichText::new(text).size(16.0).color(egui::Color32::WHITE))
            .min_size(Vec2::new(160.0, 44.0))
            .rounding(self.theme.button_rounding)
            .fill(fill);

        let response = ui.add_enabled(enabled, button);
        response.widget_info(|| {
            egui::WidgetInfo::labeled(egui::WidgetType::Button, enabled, SEND_BUTTON_LABEL)
        });

        if response.clicked() {
            self.state.send_message(now);
        }

        let phase = self.state.controller.phase();
        response.on_hover_text(format!("{}", phase))
    }
}
