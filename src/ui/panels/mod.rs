//! Main content panels

pub mod dashboard;
pub mod history;
pub mod settings;

use egui::Ui;

use crate::ui::theme::Theme;

/// Section header helper
fn section_header(ui: &mut Ui, icon: &str, title: &str) {
    ui.horizontal(|ui| {
        ui.label(
            egui::RichText::new(icon)
                .size(18.0)
                .color(Theme::PRIMARY_LIGHT),
        );
        ui.add_space(10.0);
        ui.label(
            egui::RichText::new(title)
                .size(17.0)
                .strong()
                .color(Theme::TEXT_PRIMARY),
        );
    });
    ui.add_space(12.0);
}

/// Rounded card used by every panel
fn card<R>(ui: &mut Ui, add_contents: impl FnOnce(&mut Ui) -> R) -> R {
    egui::Frame::none()
        .fill(Theme::BG_SECONDARY)
        .rounding(egui::Rounding::same(12.0))
        .stroke(egui::Stroke::new(1.0, Theme::BORDER_LIGHT))
        .inner_margin(egui::Margin::same(20.0))
        .show(ui, add_contents)
        .inner
}
