//! CPU/RAM time series

use std::collections::VecDeque;

use egui::{Color32, Pos2, Rect, Response, Rounding, Stroke, Ui, Vec2};

use crate::core::{SampleUpdate, Thresholds};
use crate::ui::theme::Theme;

pub struct Timeline;

impl Timeline {
    pub const CPU_COLOR: Color32 = Theme::PRIMARY_LIGHT;
    pub const MEM_COLOR: Color32 = Theme::INFO;

    /// Both series over the recent window, with dashed threshold lines
    pub fn show(
        ui: &mut Ui,
        recent: &VecDeque<SampleUpdate>,
        thresholds: Thresholds,
        capacity: usize,
        height: f32,
    ) -> Response {
        let width = ui.available_width().max(120.0);
        let (rect, response) = ui.allocate_exact_size(Vec2::new(width, height), egui::Sense::hover());

        if ui.is_rect_visible(rect) {
            let painter = ui.painter();
            painter.rect_filled(rect, Rounding::same(6.0), Theme::BG_TERTIARY);

            for (limit, color) in [
                (thresholds.cpu_percent, Self::CPU_COLOR),
                (thresholds.mem_percent, Self::MEM_COLOR),
            ] {
                let y = y_for(rect, limit);
                painter.extend(egui::Shape::dashed_line(
                    &[Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)],
                    Stroke::new(1.0, color.linear_multiply(0.4)),
                    6.0,
                    4.0,
                ));
            }

            let cpu: Vec<Option<f64>> = recent.iter().map(|u| u.cpu).collect();
            let mem: Vec<Option<f64>> = recent.iter().map(|u| u.mem).collect();
            for (values, color) in [(cpu, Self::CPU_COLOR), (mem, Self::MEM_COLOR)] {
                for points in segments(&values, capacity, rect) {
                    if points.len() == 1 {
                        painter.circle_filled(points[0], 2.0, color);
                    } else {
                        painter.add(egui::Shape::line(points, Stroke::new(2.0, color)));
                    }
                }
            }
        }

        response
    }
}

fn y_for(rect: Rect, percent: f64) -> f32 {
    let fraction = (percent / 100.0).clamp(0.0, 1.0) as f32;
    rect.bottom() - rect.height() * fraction
}

/// Screen points for a series, split wherever a reading is missing.
///
/// The newest value sits at the right edge; `capacity` values span the width.
fn segments(values: &[Option<f64>], capacity: usize, rect: Rect) -> Vec<Vec<Pos2>> {
    let slots = capacity.max(values.len()).max(2);
    let step = rect.width() / (slots - 1) as f32;
    let offset = slots - values.len();

    let mut out = Vec::new();
    let mut current = Vec::new();
    for (i, value) in values.iter().enumerate() {
        match value {
            Some(v) => {
                let x = rect.left() + step * (offset + i) as f32;
                current.push(Pos2::new(x, y_for(rect, *v)));
            }
            None if !current.is_empty() => out.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}
