//! History panel - Past alerts and how they ended

use egui::Ui;

use super::card;
use crate::core::{AlertEntry, AlertOutcome};
use crate::ui::theme::Theme;

fn outcome_color(outcome: Option<AlertOutcome>) -> egui::Color32 {
    match outcome {
        None => Theme::WARNING,
        Some(AlertOutcome::Continued) => Theme::SUCCESS,
        Some(AlertOutcome::PromptUnavailable) => Theme::INFO,
        Some(AlertOutcome::Terminated) | Some(AlertOutcome::ForcedShutdown) => Theme::ERROR,
    }
}

/// Returns true when the user asks for a refresh
pub fn render(ui: &mut Ui, alerts: &[AlertEntry]) -> bool {
    let mut refresh = false;

    ui.horizontal(|ui| {
        ui.heading("Alert History");
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.button("Refresh").clicked() {
                refresh = true;
            }
        });
    });
    ui.add_space(8.0);

    card(ui, |ui| {
        ui.set_width(ui.available_width() - 40.0);

        if alerts.is_empty() {
            ui.vertical_centered(|ui| {
                ui.label(egui::RichText::new("No alerts yet").color(Theme::TEXT_MUTED));
                ui.label(
                    egui::RichText::new("Overloads that raised a prompt will appear here")
                        .small()
                        .color(Theme::TEXT_MUTED),
                );
            });
            return;
        }

        egui::ScrollArea::vertical()
            .max_height(480.0)
            .show(ui, |ui| {
                for alert in alerts {
                    egui::Frame::none()
                        .fill(Theme::BG_TERTIARY)
                        .rounding(egui::Rounding::same(4.0))
                        .inner_margin(egui::Margin::same(8.0))
                        .show(ui, |ui| {
                            ui.horizontal(|ui| {
                                let color = outcome_color(alert.outcome);
                                let (rect, _) = ui.allocate_exact_size(
                                    egui::vec2(8.0, 8.0),
                                    egui::Sense::hover(),
                                );
                                ui.painter().circle_filled(rect.center(), 4.0, color);
                                ui.add_space(8.0);

                                ui.label(
                                    egui::RichText::new(
                                        alert.raised_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                                    )
                                    .strong(),
                                );
                                ui.add_space(8.0);
                                ui.label(
                                    egui::RichText::new(format!(
                                        "CPU {} | RAM {}",
                                        alert.cpu.with_unit(),
                                        alert.mem.with_unit()
                                    ))
                                    .color(Theme::TEXT_SECONDARY),
                                );

                                ui.with_layout(
                                    egui::Layout::right_to_left(egui::Align::Center),
                                    |ui| {
                                        let label =
                                            alert.outcome.map(|o| o.label()).unwrap_or("Open");
                                        ui.label(egui::RichText::new(label).small().color(color));
                                    },
                                );
                            });
                        });
                    ui.add_space(4.0);
                }
            });
    });

    refresh
}
