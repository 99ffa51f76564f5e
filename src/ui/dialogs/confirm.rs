//! Alert confirmation dialog

use egui::{Context, Key};

use crate::core::{Choice, PromptRequest};
use crate::ui::theme::{Icons, Theme};

/// Draw the alert prompt. Returns the choice once the user makes one.
pub fn render(ctx: &Context, request: &PromptRequest) -> Option<Choice> {
    let mut open = true;
    let mut choice = None;

    egui::Window::new(format!("{} {}", Icons::ALERTS, request.title))
        .open(&mut open)
        .collapsible(false)
        .resizable(false)
        .default_width(380.0)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .order(egui::Order::Foreground)
        .show(ctx, |ui| {
            ui.label(
                egui::RichText::new(&request.message)
                    .size(16.0)
                    .strong()
                    .color(Theme::TEXT_PRIMARY),
            );
            ui.add_space(4.0);
            ui.label(
                egui::RichText::new(&request.detail)
                    .monospace()
                    .color(Theme::WARNING),
            );

            ui.add_space(16.0);

            ui.horizontal(|ui| {
                for option in request.choices {
                    let text = egui::RichText::new(option.label());
                    let button = if option == request.default_choice {
                        egui::Button::new(text.color(egui::Color32::WHITE)).fill(Theme::ERROR)
                    } else {
                        egui::Button::new(text)
                    };
                    if ui.add(button.min_size(egui::vec2(120.0, 32.0))).clicked() {
                        choice = Some(option);
                    }
                }
            });
        });

    if choice.is_none() {
        ctx.input(|i| {
            if i.key_pressed(Key::Escape) {
                choice = Some(request.cancel_choice);
            } else if i.key_pressed(Key::Enter) {
                choice = Some(request.default_choice);
            }
        });
    }

    if !open {
        choice = Some(request.cancel_choice);
    }

    choice
}
