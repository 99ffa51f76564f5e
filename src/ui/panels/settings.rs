//! Settings panel

use egui::{Color32, Context, Ui, Vec2};

use super::section_header;
use crate::core::settings::{PromptStyle, Theme as SettingsTheme};
use crate::core::{MetricBackend, Settings};
use crate::ui::theme::Theme;

/// What the settings page asks the app to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsAction {
    Save,
    Reset,
}

/// Custom toggle switch widget
fn toggle_switch(ui: &mut Ui, on: &mut bool) -> egui::Response {
    let (rect, mut response) = ui.allocate_exact_size(Vec2::new(44.0, 24.0), egui::Sense::click());

    if response.clicked() {
        *on = !*on;
        response.mark_changed();
    }

    if ui.is_rect_visible(rect) {
        let how_on = ui.ctx().animate_bool_responsive(response.id, *on);
        let track_color = if *on { Theme::SUCCESS } else { Theme::BG_TERTIARY };

        ui.painter().rect(
            rect,
            egui::Rounding::same(12.0),
            track_color,
            egui::Stroke::new(1.0, if *on { Theme::SUCCESS } else { Theme::BORDER }),
        );

        let circle_x = egui::lerp((rect.left() + 12.0)..=(rect.right() - 12.0), how_on);
        ui.painter().circle(
            egui::pos2(circle_x, rect.center().y),
            9.0,
            Color32::WHITE,
            egui::Stroke::NONE,
        );
    }

    response
}

/// Label, description and a right-aligned widget
fn setting_row(ui: &mut Ui, label: &str, description: &str, add_widget: impl FnOnce(&mut Ui)) {
    ui.horizontal(|ui| {
        ui.vertical(|ui| {
            ui.add_space(2.0);
            ui.label(egui::RichText::new(label).size(14.0).color(Theme::TEXT_PRIMARY));
            ui.label(
                egui::RichText::new(description)
                    .size(12.0)
                    .color(Theme::TEXT_SECONDARY),
            );
        });
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            add_widget(ui);
        });
    });
    ui.add_space(14.0);
}

fn section_frame(ui: &mut Ui, add_contents: impl FnOnce(&mut Ui)) {
    egui::Frame::none()
        .fill(Theme::BG_SECONDARY)
        .rounding(egui::Rounding::same(12.0))
        .stroke(egui::Stroke::new(1.0, Theme::BORDER_LIGHT))
        .inner_margin(egui::Margin::same(20.0))
        .outer_margin(egui::Margin::symmetric(0.0, 4.0))
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            add_contents(ui);
        });
}

fn percent_drag(ui: &mut Ui, value: &mut f64) {
    ui.add(
        egui::DragValue::new(value)
            .range(0.0..=100.0)
            .speed(0.5)
            .max_decimals(1)
            .suffix(" %"),
    );
}

pub fn render(ui: &mut Ui, settings: &mut Settings, ctx: &Context) -> Option<SettingsAction> {
    let mut action = None;

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui| {
            ui.vertical_centered(|ui| {
                ui.set_max_width(680.0);

                ui.add_space(12.0);
                ui.label(
                    egui::RichText::new("Settings")
                        .size(26.0)
                        .strong()
                        .color(Theme::TEXT_PRIMARY),
                );
                ui.add_space(6.0);
                ui.label(
                    egui::RichText::new("Saved changes take effect the next time ShellGuard starts")
                        .size(14.0)
                        .color(Theme::TEXT_SECONDARY),
                );
                ui.add_space(24.0);

                section_header(ui, "\u{1F3A8}", "Appearance");
                section_frame(ui, |ui| {
                    setting_row(ui, "Theme", "Choose your preferred color scheme", |ui| {
                        egui::ComboBox::from_id_salt("theme_select")
                            .width(130.0)
                            .selected_text(settings.theme.label())
                            .show_ui(ui, |ui| {
                                for theme in SettingsTheme::all() {
                                    let selected = settings.theme == *theme;
                                    if ui.selectable_label(selected, theme.label()).clicked() {
                                        settings.theme = *theme;
                                        Theme::apply(ctx, *theme);
                                    }
                                }
                            });
                    });
                });

                ui.add_space(20.0);

                section_header(ui, "\u{26A1}", "Monitoring");
                section_frame(ui, |ui| {
                    setting_row(
                        ui,
                        "Sample interval",
                        "Time between CPU and memory readings",
                        |ui| {
                            ui.add(
                                egui::DragValue::new(&mut settings.sample_interval_ms)
                                    .range(100..=60_000)
                                    .speed(50.0)
                                    .suffix(" ms"),
                            );
                        },
                    );

                    setting_row(
                        ui,
                        "CPU threshold",
                        "Alert when CPU usage rises above this value",
                        |ui| percent_drag(ui, &mut settings.cpu_threshold),
                    );

                    setting_row(
                        ui,
                        "Memory threshold",
                        "Alert when memory usage rises above this value",
                        |ui| percent_drag(ui, &mut settings.memory_threshold),
                    );

                    setting_row(ui, "Metric source", "How readings are collected", |ui| {
                        egui::ComboBox::from_id_salt("backend_select")
                            .width(150.0)
                            .selected_text(settings.metric_backend.label())
                            .show_ui(ui, |ui| {
                                for backend in MetricBackend::all() {
                                    let selected = settings.metric_backend == *backend;
                                    if ui.selectable_label(selected, backend.label()).clicked() {
                                        settings.metric_backend = *backend;
                                    }
                                }
                            });
                    });

                    if settings.metric_backend == MetricBackend::Command {
                        setting_row(
                            ui,
                            "Command timeout",
                            "Give up on a reading that takes longer than this",
                            |ui| {
                                ui.add(
                                    egui::DragValue::new(&mut settings.command_timeout_ms)
                                        .range(100..=10_000)
                                        .speed(50.0)
                                        .suffix(" ms"),
                                );
                            },
                        );
                    }
                });

                ui.add_space(20.0);

                section_header(ui, "\u{26A0}", "Alerts");
                section_frame(ui, |ui| {
                    setting_row(ui, "Prompt style", "Where the overload question appears", |ui| {
                        egui::ComboBox::from_id_salt("prompt_select")
                            .width(150.0)
                            .selected_text(settings.prompt_style.label())
                            .show_ui(ui, |ui| {
                                for style in PromptStyle::all() {
                                    let selected = settings.prompt_style == *style;
                                    if ui.selectable_label(selected, style.label()).clicked() {
                                        settings.prompt_style = *style;
                                    }
                                }
                            });
                    });

                    let retention_desc = if settings.history_retention_days == 0 {
                        "Keep alert history forever".to_string()
                    } else {
                        format!("Keep {} days of alert history", settings.history_retention_days)
                    };
                    setting_row(ui, "History retention", &retention_desc, |ui| {
                        ui.add(
                            egui::DragValue::new(&mut settings.history_retention_days)
                                .range(0..=365)
                                .suffix(" days")
                                .speed(1.0),
                        );
                    });
                });

                ui.add_space(20.0);

                section_header(ui, "\u{1F4C1}", "Data");
                section_frame(ui, |ui| {
                    let data_dir = settings.get_data_directory();
                    setting_row(ui, "Data directory", &data_dir.to_string_lossy(), |ui| {
                        if ui.button("Open Folder").clicked() {
                            crate::platform::open_path(&data_dir);
                        }
                    });

                    let log_file = settings.get_log_file();
                    setting_row(ui, "Monitoring log", &log_file.to_string_lossy(), |_| {});

                    ui.horizontal(|ui| {
                        ui.vertical(|ui| {
                            ui.label(
                                egui::RichText::new("Debug logging")
                                    .size(14.0)
                                    .color(Theme::TEXT_PRIMARY),
                            );
                            ui.label(
                                egui::RichText::new("Enable verbose logging for troubleshooting")
                                    .size(12.0)
                                    .color(Theme::TEXT_SECONDARY),
                            );
                        });
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            toggle_switch(ui, &mut settings.debug_logging);
                        });
                    });
                });

                ui.add_space(32.0);

                ui.horizontal(|ui| {
                    let save_btn = egui::Button::new(
                        egui::RichText::new("Save Settings").color(Color32::WHITE),
                    )
                    .fill(Theme::PRIMARY)
                    .rounding(egui::Rounding::same(8.0))
                    .min_size(egui::vec2(140.0, 40.0));
                    if ui.add(save_btn).clicked() {
                        action = Some(SettingsAction::Save);
                    }

                    ui.add_space(12.0);

                    let reset_btn = egui::Button::new("Reset to Defaults")
                        .fill(Theme::BG_TERTIARY)
                        .rounding(egui::Rounding::same(8.0))
                        .min_size(egui::vec2(140.0, 40.0));
                    if ui.add(reset_btn).clicked() {
                        action = Some(SettingsAction::Reset);
                    }
                });

                ui.add_space(32.0);

                egui::Frame::none()
                    .fill(Theme::BG_TERTIARY.linear_multiply(0.4))
                    .rounding(egui::Rounding::same(12.0))
                    .inner_margin(egui::Margin::same(20.0))
                    .show(ui, |ui| {
                        ui.vertical_centered(|ui| {
                            ui.label(
                                egui::RichText::new(format!("{} v{}", crate::APP_NAME, crate::APP_VERSION))
                                    .size(15.0)
                                    .strong()
                                    .color(Theme::TEXT_PRIMARY),
                            );
                            ui.add_space(6.0);
                            ui.label(
                                egui::RichText::new(
                                    "Closes the browser shell before an overload freezes the machine",
                                )
                                .size(13.0)
                                .color(Theme::TEXT_SECONDARY),
                            );
                        });
                    });

                ui.add_space(24.0);
            });
        });

    action
}
