//! Utilization gauges

use egui::{Color32, Rect, Response, Rounding, Ui, Vec2};

use crate::core::UNAVAILABLE;
use crate::ui::theme::Theme;

pub struct ResourceBar;

impl ResourceBar {
    /// Circular gauge for a percentage, with a tick at the alert threshold
    pub fn gauge(ui: &mut Ui, percent: Option<f64>, threshold: f64, size: f32) -> Response {
        let (rect, response) = ui.allocate_exact_size(Vec2::splat(size), egui::Sense::hover());

        if ui.is_rect_visible(rect) {
            let painter = ui.painter();
            let center = rect.center();
            let radius = size * 0.4;
            let stroke_width = size * 0.12;
            let start_angle = -std::f32::consts::FRAC_PI_2;
            let point_at = |fraction: f32, r: f32| {
                let angle = start_angle + std::f32::consts::TAU * fraction;
                center + Vec2::new(angle.cos(), angle.sin()) * r
            };

            painter.circle_stroke(
                center,
                radius,
                egui::Stroke::new(stroke_width, Theme::BG_TERTIARY),
            );

            if let Some(value) = percent {
                let fraction = (value / 100.0).clamp(0.0, 1.0) as f32;
                if fraction > 0.0 {
                    let n_points = (48.0 * fraction).max(2.0) as usize;
                    let points: Vec<egui::Pos2> = (0..=n_points)
                        .map(|i| point_at(fraction * i as f32 / n_points as f32, radius))
                        .collect();
                    painter.add(egui::Shape::line(
                        points,
                        egui::Stroke::new(stroke_width, Self::color_for_value(value, threshold)),
                    ));
                }
            }

            // threshold marker across the ring
            let mark = (threshold / 100.0).clamp(0.0, 1.0) as f32;
            painter.line_segment(
                [
                    point_at(mark, radius - stroke_width * 0.7),
                    point_at(mark, radius + stroke_width * 0.7),
                ],
                egui::Stroke::new(2.0, Theme::TEXT_SECONDARY),
            );

            let (text, color) = match percent {
                Some(value) => (format!("{:.0}", value), Theme::TEXT_PRIMARY),
                None => (UNAVAILABLE.to_string(), Theme::TEXT_MUTED),
            };
            painter.text(
                center,
                egui::Align2::CENTER_CENTER,
                text,
                egui::FontId::proportional(size * 0.22),
                color,
            );
        }

        let hover = match percent {
            Some(value) => format!("{:.2}% (alert above {:.0}%)", value, threshold),
            None => "Reading unavailable".to_string(),
        };
        response.on_hover_text(hover)
    }

    /// Render a mini inline bar
    pub fn mini(ui: &mut Ui, percent: Option<f64>, threshold: f64) -> Response {
        let (rect, response) = ui.allocate_exact_size(Vec2::new(64.0, 10.0), egui::Sense::hover());

        if ui.is_rect_visible(rect) {
            let painter = ui.painter();
            painter.rect_filled(rect, Rounding::same(3.0), Theme::BG_TERTIARY);

            if let Some(value) = percent {
                let fill_width = rect.width() * (value / 100.0).clamp(0.0, 1.0) as f32;
                if fill_width > 0.0 {
                    let fill_rect =
                        Rect::from_min_size(rect.min, Vec2::new(fill_width, rect.height()));
                    painter.rect_filled(
                        fill_rect,
                        Rounding::same(3.0),
                        Self::color_for_value(value, threshold),
                    );
                }
            }
        }

        response
    }

    /// Green well under the threshold, amber approaching it, red past it
    pub fn color_for_value(value: f64, threshold: f64) -> Color32 {
        if threshold <= 0.0 || value > threshold {
            return Theme::ERROR;
        }
        let ratio = (value / threshold) as f32;
        if ratio < 0.6 {
            Theme::SUCCESS
        } else if ratio < 0.85 {
            Self::lerp_color(Theme::SUCCESS, Theme::WARNING, (ratio - 0.6) / 0.25)
        } else {
            Theme::WARNING
        }
    }

    /// Linear interpolation between two colors
    fn lerp_color(a: Color32, b: Color32, t: f32) -> Color32 {
        let t = t.clamp(0.0, 1.0);
        let mix = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * t) as u8;
        Color32::from_rgba_unmultiplied(
            mix(a.r(), b.r()),
            mix(a.g(), b.g()),
            mix(a.b(), b.b()),
            mix(a.a(), b.a()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_tracks_threshold() {
        assert_eq!(ResourceBar::color_for_value(10.0, 90.0), Theme::SUCCESS);
        assert_eq!(ResourceBar::color_for_value(88.0, 90.0), Theme::WARNING);
        assert_eq!(ResourceBar::color_for_value(90.5, 90.0), Theme::ERROR);
        assert_eq!(ResourceBar::color_for_value(1.0, 0.0), Theme::ERROR);
    }
}
