//! Theme and styling for the UI

use egui::{Color32, FontFamily, FontId, Rounding, Stroke, Style, TextStyle, Visuals};

use crate::core::settings::Theme as SettingsTheme;
use crate::core::LatchState;

/// Application color palette
pub struct Theme;

impl Theme {
    pub const PRIMARY: Color32 = Color32::from_rgb(99, 102, 241);
    pub const PRIMARY_LIGHT: Color32 = Color32::from_rgb(165, 180, 252);
    pub const PRIMARY_DARK: Color32 = Color32::from_rgb(67, 56, 202);

    pub const SUCCESS: Color32 = Color32::from_rgb(16, 185, 129);
    pub const WARNING: Color32 = Color32::from_rgb(245, 158, 11);
    pub const ERROR: Color32 = Color32::from_rgb(244, 63, 94);
    pub const INFO: Color32 = Color32::from_rgb(6, 182, 212);

    // Dark palette
    pub const BG_PRIMARY: Color32 = Color32::from_rgb(17, 17, 27);
    pub const BG_SECONDARY: Color32 = Color32::from_rgb(24, 24, 37);
    pub const BG_TERTIARY: Color32 = Color32::from_rgb(35, 35, 52);
    pub const BG_HOVER: Color32 = Color32::from_rgb(45, 45, 65);
    pub const BG_ELEVATED: Color32 = Color32::from_rgb(30, 30, 45);

    pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(250, 250, 255);
    pub const TEXT_SECONDARY: Color32 = Color32::from_rgb(161, 161, 180);
    pub const TEXT_MUTED: Color32 = Color32::from_rgb(113, 113, 132);

    pub const BORDER: Color32 = Color32::from_rgb(50, 50, 70);
    pub const BORDER_LIGHT: Color32 = Color32::from_rgb(38, 38, 55);

    /// Apply dark theme to egui
    pub fn apply_dark(ctx: &egui::Context) {
        let mut style = (*ctx.style()).clone();
        let mut visuals = Visuals::dark();

        visuals.panel_fill = Self::BG_PRIMARY;
        visuals.window_fill = Self::BG_ELEVATED;
        visuals.extreme_bg_color = Self::BG_PRIMARY;
        visuals.faint_bg_color = Self::BG_TERTIARY;

        visuals.widgets.noninteractive.bg_fill = Self::BG_SECONDARY;
        visuals.widgets.noninteractive.fg_stroke = Stroke::new(1.0, Self::TEXT_PRIMARY);
        visuals.widgets.noninteractive.bg_stroke = Stroke::new(0.5, Self::BORDER_LIGHT);
        visuals.widgets.inactive.bg_fill = Self::BG_TERTIARY;
        visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, Self::TEXT_SECONDARY);
        visuals.widgets.inactive.bg_stroke = Stroke::new(0.5, Self::BORDER);
        visuals.widgets.hovered.bg_fill = Self::BG_HOVER;
        visuals.widgets.hovered.fg_stroke = Stroke::new(1.0, Self::TEXT_PRIMARY);
        visuals.widgets.open.bg_fill = Self::BG_ELEVATED;
        visuals.widgets.open.fg_stroke = Stroke::new(1.0, Self::TEXT_PRIMARY);

        visuals.window_stroke = Stroke::new(0.5, Self::BORDER);
        visuals.window_shadow = egui::Shadow {
            offset: egui::vec2(0.0, 10.0),
            blur: 30.0,
            spread: 8.0,
            color: Color32::from_black_alpha(120),
        };
        visuals.selection.bg_fill = Self::PRIMARY.linear_multiply(0.25);

        Self::finish(&mut style, visuals);
        ctx.set_style(style);
    }

    /// Apply light theme to egui
    pub fn apply_light(ctx: &egui::Context) {
        let mut style = (*ctx.style()).clone();
        let mut visuals = Visuals::light();

        let bg_secondary = Color32::from_rgb(243, 244, 246);
        let text_primary = Color32::from_rgb(17, 24, 39);
        let border = Color32::from_rgb(209, 213, 219);

        visuals.panel_fill = Color32::from_rgb(249, 250, 251);
        visuals.window_fill = Color32::WHITE;
        visuals.extreme_bg_color = Color32::WHITE;
        visuals.faint_bg_color = bg_secondary;

        visuals.widgets.noninteractive.bg_fill = bg_secondary;
        visuals.widgets.noninteractive.fg_stroke = Stroke::new(1.0, text_primary);
        visuals.widgets.noninteractive.bg_stroke = Stroke::new(0.5, border);
        visuals.widgets.inactive.bg_fill = Color32::from_rgb(229, 231, 235);
        visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, Color32::from_rgb(75, 85, 99));
        visuals.widgets.inactive.bg_stroke = Stroke::new(0.5, border);
        visuals.widgets.hovered.bg_fill = border;
        visuals.widgets.hovered.fg_stroke = Stroke::new(1.0, text_primary);
        visuals.widgets.open.bg_fill = Color32::WHITE;
        visuals.widgets.open.fg_stroke = Stroke::new(1.0, text_primary);

        visuals.window_stroke = Stroke::new(0.5, border);
        visuals.window_shadow = egui::Shadow {
            offset: egui::vec2(0.0, 8.0),
            blur: 24.0,
            spread: 4.0,
            color: Color32::from_black_alpha(20),
        };
        visuals.selection.bg_fill = Self::PRIMARY.linear_multiply(0.15);

        Self::finish(&mut style, visuals);
        ctx.set_style(style);
    }

    /// Apply the palette picked in settings
    pub fn apply(ctx: &egui::Context, theme: SettingsTheme) {
        match theme {
            SettingsTheme::Light => Self::apply_light(ctx),
            // no OS theme detection yet; dark is the closest match
            SettingsTheme::Dark | SettingsTheme::System => Self::apply_dark(ctx),
        }
    }

    /// Settings shared by both palettes
    fn finish(style: &mut Style, mut visuals: Visuals) {
        for widget in [
            &mut visuals.widgets.noninteractive,
            &mut visuals.widgets.inactive,
            &mut visuals.widgets.hovered,
            &mut visuals.widgets.active,
            &mut visuals.widgets.open,
        ] {
            widget.rounding = Rounding::same(6.0);
        }
        visuals.widgets.hovered.expansion = 1.0;
        visuals.widgets.hovered.bg_stroke = Stroke::new(1.0, Self::PRIMARY.linear_multiply(0.6));
        visuals.widgets.active.bg_fill = Self::PRIMARY;
        visuals.widgets.active.fg_stroke = Stroke::new(1.0, Color32::WHITE);
        visuals.widgets.active.bg_stroke = Stroke::new(1.0, Self::PRIMARY_DARK);
        visuals.widgets.open.bg_stroke = Stroke::new(1.0, Self::PRIMARY.linear_multiply(0.5));
        visuals.selection.stroke = Stroke::new(1.0, Self::PRIMARY);
        visuals.window_rounding = Rounding::same(10.0);
        visuals.menu_rounding = Rounding::same(8.0);
        visuals.striped = true;
        style.visuals = visuals;

        style.text_styles = [
            (TextStyle::Small, FontId::new(12.0, FontFamily::Proportional)),
            (TextStyle::Body, FontId::new(14.0, FontFamily::Proportional)),
            (TextStyle::Button, FontId::new(14.0, FontFamily::Proportional)),
            (TextStyle::Heading, FontId::new(20.0, FontFamily::Proportional)),
            (TextStyle::Monospace, FontId::new(13.0, FontFamily::Monospace)),
        ]
        .into();

        style.spacing.item_spacing = egui::vec2(8.0, 8.0);
        style.spacing.window_margin = egui::Margin::same(16.0);
        style.spacing.button_padding = egui::vec2(14.0, 8.0);
        style.spacing.combo_width = 140.0;
        style.interaction.tooltip_delay = 0.3;
    }

    /// Color for the alert latch badge
    pub fn latch_color(state: LatchState) -> Color32 {
        match state {
            LatchState::Armed => Self::SUCCESS,
            LatchState::Prompting => Self::WARNING,
            LatchState::Suspended => Self::INFO,
            LatchState::Terminated => Self::ERROR,
        }
    }
}

/// Icon characters (using Unicode symbols)
pub struct Icons;

impl Icons {
    pub const DASHBOARD: &'static str = "◉";
    pub const ALERTS: &'static str = "⚠";
    pub const SETTINGS: &'static str = "⚙";
    pub const CPU: &'static str = "⚡";
    pub const MEMORY: &'static str = "💾";
    pub const FOLDER: &'static str = "📁";
    pub const RESTART: &'static str = "↻";
}
