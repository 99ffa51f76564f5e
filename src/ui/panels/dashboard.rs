//! Dashboard panel - Live CPU/RAM readings and alert state

use std::collections::VecDeque;
use std::path::Path;

use egui::Ui;

use super::{card, section_header};
use crate::core::{LatchState, SampleUpdate, Thresholds, UsageSummary, UNAVAILABLE};
use crate::ui::components::{LatchBadge, ResourceBar, Timeline};
use crate::ui::theme::{Icons, Theme};

/// Things the dashboard asks the app to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardAction {
    Rearm,
    OpenLog,
}

/// Everything the dashboard draws
pub struct DashboardView<'a> {
    pub recent: &'a VecDeque<SampleUpdate>,
    /// Samples the window can hold
    pub capacity: usize,
    pub thresholds: Thresholds,
    pub latch: LatchState,
    pub log_file: &'a Path,
    pub running: bool,
}

pub fn render(ui: &mut Ui, view: &DashboardView<'_>) -> Option<DashboardAction> {
    let mut action = None;

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui| {
            ui.add_space(8.0);

            section_header(ui, "📊", "Browser Resources");
            let latest = view.recent.back();
            ui.horizontal(|ui| {
                gauge_card(
                    ui,
                    Icons::CPU,
                    "CPU",
                    latest.and_then(|s| s.cpu),
                    latest.map(|s| s.cpu_formatted.as_str()),
                    view.thresholds.cpu_percent,
                );
                ui.add_space(16.0);
                gauge_card(
                    ui,
                    Icons::MEMORY,
                    "RAM",
                    latest.and_then(|s| s.mem),
                    latest.map(|s| s.mem_formatted.as_str()),
                    view.thresholds.mem_percent,
                );
            });

            ui.add_space(24.0);
            section_header(ui, "📈", "Usage Over Time");
            render_summary(ui, &UsageSummary::over(view.recent));
            ui.add_space(12.0);
            card(ui, |ui| {
                ui.set_width(ui.available_width() - 40.0);
                ui.horizontal(|ui| {
                    legend(ui, Timeline::CPU_COLOR, "CPU");
                    ui.add_space(12.0);
                    legend(ui, Timeline::MEM_COLOR, "RAM");
                });
                ui.add_space(8.0);
                Timeline::show(ui, view.recent, view.thresholds, view.capacity, 140.0);
            });

            ui.add_space(24.0);
            section_header(ui, Icons::ALERTS, "Alerts");
            if let Some(a) = render_alert_card(ui, view) {
                action = Some(a);
            }

            ui.add_space(24.0);
            section_header(ui, "◷", "Recent Samples");
            render_recent(ui, view);

            ui.add_space(20.0);
        });

    action
}

fn gauge_card(
    ui: &mut Ui,
    icon: &str,
    title: &str,
    percent: Option<f64>,
    formatted: Option<&str>,
    threshold: f64,
) {
    card(ui, |ui| {
        ui.set_width(260.0);
        ui.horizontal(|ui| {
            ResourceBar::gauge(ui, percent, threshold, 80.0);
            ui.add_space(16.0);
            ui.vertical(|ui| {
                ui.label(
                    egui::RichText::new(format!("{} {}", icon, title))
                        .size(16.0)
                        .strong()
                        .color(Theme::TEXT_PRIMARY),
                );
                ui.add_space(4.0);
                let text = match formatted {
                    Some(value) if percent.is_some() => format!("{}%", value),
                    Some(value) => value.to_string(),
                    None => "Waiting for first sample".to_string(),
                };
                ui.label(
                    egui::RichText::new(text)
                        .size(13.0)
                        .color(Theme::TEXT_SECONDARY),
                );
                ui.add_space(4.0);
                ui.label(
                    egui::RichText::new(format!("Alert above {:.0}%", threshold))
                        .size(11.0)
                        .color(Theme::TEXT_MUTED),
                );
            });
        });
    });
}

fn render_summary(ui: &mut Ui, summary: &UsageSummary) {
    let show = |value: Option<f64>| match value {
        Some(v) => format!("{:.2}%", v),
        None => UNAVAILABLE.to_string(),
    };

    ui.horizontal(|ui| {
        for (title, value) in [
            ("Peak CPU", show(summary.max_cpu)),
            ("Mean CPU", show(summary.mean_cpu)),
            ("Peak RAM", show(summary.max_mem)),
        ] {
            card(ui, |ui| {
                ui.set_width(150.0);
                ui.label(egui::RichText::new(title).size(12.0).color(Theme::TEXT_MUTED));
                ui.add_space(4.0);
                ui.label(
                    egui::RichText::new(value)
                        .size(20.0)
                        .strong()
                        .color(Theme::TEXT_PRIMARY),
                );
            });
            ui.add_space(12.0);
        }
    });
}

fn legend(ui: &mut Ui, color: egui::Color32, label: &str) {
    let (rect, _) = ui.allocate_exact_size(egui::vec2(12.0, 12.0), egui::Sense::hover());
    ui.painter().circle_filled(rect.center(), 5.0, color);
    ui.label(egui::RichText::new(label).size(12.0).color(Theme::TEXT_SECONDARY));
}

fn render_alert_card(ui: &mut Ui, view: &DashboardView<'_>) -> Option<DashboardAction> {
    card(ui, |ui| {
        let mut action = None;
        ui.set_width(ui.available_width() - 40.0);
        ui.horizontal(|ui| {
            LatchBadge::show(ui, view.latch);
            ui.add_space(12.0);

            let description = match (view.running, view.latch) {
                (false, _) => "Monitoring is not running",
                (true, LatchState::Armed) => "Watching for overloads",
                (true, LatchState::Prompting) => "Waiting for your decision",
                (true, LatchState::Suspended) => {
                    "The alert prompt could not be shown. Alerts are paused until re-armed."
                }
                (true, LatchState::Terminated) => "The browser has been closed",
            };
            ui.label(egui::RichText::new(description).color(Theme::TEXT_SECONDARY));

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let log_btn = egui::Button::new(format!("{} Open log", Icons::FOLDER))
                    .fill(Theme::BG_TERTIARY)
                    .rounding(egui::Rounding::same(8.0))
                    .min_size(egui::vec2(110.0, 32.0));
                if ui
                    .add(log_btn)
                    .on_hover_text(view.log_file.display().to_string())
                    .clicked()
                {
                    action = Some(DashboardAction::OpenLog);
                }

                if view.latch == LatchState::Suspended {
                    ui.add_space(8.0);
                    let rearm_btn = egui::Button::new(
                        egui::RichText::new(format!("{} Re-arm alerts", Icons::RESTART))
                            .color(egui::Color32::WHITE),
                    )
                    .fill(Theme::PRIMARY)
                    .rounding(egui::Rounding::same(8.0))
                    .min_size(egui::vec2(130.0, 32.0));
                    if ui.add(rearm_btn).clicked() {
                        action = Some(DashboardAction::Rearm);
                    }
                }
            });
        });
        action
    })
}

fn render_recent(ui: &mut Ui, view: &DashboardView<'_>) {
    card(ui, |ui| {
        ui.set_width(ui.available_width() - 40.0);

        if view.recent.is_empty() {
            ui.vertical_centered(|ui| {
                ui.label(egui::RichText::new("No samples yet").color(Theme::TEXT_MUTED));
            });
            return;
        }

        egui::Grid::new("recent_samples")
            .num_columns(3)
            .spacing([24.0, 6.0])
            .striped(true)
            .show(ui, |ui| {
                ui.label(egui::RichText::new("Time").small().color(Theme::TEXT_MUTED));
                ui.label(egui::RichText::new("CPU").small().color(Theme::TEXT_MUTED));
                ui.label(egui::RichText::new("RAM").small().color(Theme::TEXT_MUTED));
                ui.end_row();

                for update in view.recent.iter().rev().take(12) {
                    ui.label(update.timestamp.format("%H:%M:%S").to_string());
                    ui.horizontal(|ui| {
                        ResourceBar::mini(ui, update.cpu, view.thresholds.cpu_percent);
                        ui.label(&update.cpu_formatted);
                    });
                    ui.horizontal(|ui| {
                        ResourceBar::mini(ui, update.mem, view.thresholds.mem_percent);
                        ui.label(&update.mem_formatted);
                    });
                    ui.end_row();
                }
            });
    });
}
