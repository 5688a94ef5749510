//! Video stage component
//!
//! Draws the idle and response layers stacked in one rect. Each layer eases
//! towards the opacity implied by its visual flags over its transition time;
//! the fading-in layer is drawn on top.

use crate::media::{MediaSurface, VisualLayer};
use crate::ui::state::AppState;
use crate::ui::theme::Theme;
use egui::{self, Align2, Color32, FontId, Rect, Sense, Stroke, Vec2};
use std::time::Duration;

/// One layer ready to paint
struct LayerView {
    id: &'static str,
    label: &'static str,
    tint: Color32,
    visual: VisualLayer,
    position: Duration,
    duration: Duration,
}

/// Stage showing both video layers
pub struct Stage<'a> {
    state: &'a AppState,
    theme: &'a Theme,
    aspect: f32,
}

impl<'a> Stage<'a> {
    pub fn new(state: &'a AppState, theme: &'a Theme) -> Self {
        Self {
            state,
            theme,
            aspect: 16.0 / 9.0,
        }
    }

    pub fn show(self, ui: &mut egui::Ui) -> egui::Response {
        let width = ui.available_width();
        let height = (width / self.aspect).min(ui.available_height().max(120.0));
        let (rect, response) = ui.allocate_exact_size(Vec2::new(width, height), Sense::hover());

        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, self.theme.card_rounding, Color32::BLACK);

        let controller = &self.state.controller;
        let mut layers = [
            LayerView {
                id: "idle_layer",
                label: "Idle loop",
                tint: self.theme.idle_layer,
                visual: *controller.idle().visual(),
                position: controller.idle().position(),
                duration: controller.idle().duration(),
            },
            LayerView {
                id: "response_layer",
                label: "Response",
                tint: self.theme.response_layer,
                visual: *controller.response().visual(),
                position: controller.response().position(),
                duration: controller.response().duration(),
            },
        ];
        layers.sort_by_key(|layer| layer.visual.z_order());

        for layer in &layers {
            self.paint_layer(ui, rect, layer);
        }

        let phase = controller.phase();
        response.widget_info(|| {
            egui::WidgetInfo::labeled(egui::WidgetType::Label, true, format!("Stage: {}", phase))
        });
        response
    }

    fn paint_layer(&self, ui: &egui::Ui, rect: Rect, layer: &LayerView) {
        let opacity = ui.ctx().animate_value_with_time(
            egui::Id::new(layer.id),
            layer.visual.target_opacity(),
            layer.visual.transition.as_secs_f32(),
        );
        if opacity <= 0.0 {
            return;
        }

        let painter = ui.painter_at(rect);
        painter.rect_filled(
            rect.shrink(2.0),
            self.theme.card_rounding,
            layer.tint.gamma_multiply(opacity),
        );

        let text_color = self.theme.text_primary.gamma_multiply(opacity);
        painter.text(
            rect.center(),
            Align2::CENTER_CENTER,
            layer.label,
            FontId::proportional(28.0),
            text_color,
        );
        painter.text(
            rect.left_bottom() + Vec2::new(self.theme.spacing, -self.theme.spacing * 1.5),
            Align2::LEFT_BOTTOM,
            format!(
                "{:.1}s / {:.1}s  [{}]",
                layer.position.as_secs_f32(),
                layer.duration.as_secs_f32(),
                layer.visual.state()
            ),
            FontId::monospace(12.0),
            text_color,
        );

        // Playback progress along the bottom edge
        if !layer.duration.is_zero() {
            let progress = layer.position.as_secs_f32() / layer.duration.as_secs_f32();
            let y = rect.bottom() - 6.0;
            let x_end = rect.left() + rect.width() * progress.clamp(0.0, 1.0);
            painter.line_segment(
                [egui::pos2(rect.left(), y), egui::pos2(x_end, y)],
                Stroke::new(3.0, text_color),
            );
        }
    }
}
