//! Plotters-powered projection chart widget for Ratatui.
//!
//! Rendered into the Ratatui buffer through `plotters-ratatui-backend`, which
//! gives proper axes and tick labels with little manual layout work.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

/// Render-only description of a projection line.
///
/// Points are `(index, value)`; `labels[index]` names each x position. Bounds
/// are computed outside the render call.
pub struct ProjectionChart<'a> {
    pub points: &'a [(f64, f64)],
    pub labels: &'a [String],
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
    pub y_label: &'a str,
    /// Draw in the muted placeholder palette.
    pub placeholder: bool,
}

impl Widget for ProjectionChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let [x0, x1] = self.x_bounds;
        let [y0, y1] = self.y_bounds;
        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) || x1 <= x0 || y1 <= y0 {
            return;
        }

        let labels = self.labels;
        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                .set_label_area_size(LabelAreaPosition::Left, 6)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            // Mesh lines are clutter at terminal resolution.
            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .y_desc(self.y_label)
                .x_labels(labels.len().max(2))
                .y_labels(5)
                .x_label_formatter(&|v| label_at(labels, *v))
                .y_label_formatter(&|v| format!("{v:.0}"))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            let line_color = if self.placeholder {
                RGBColor(160, 160, 160)
            } else {
                RGBColor(125, 217, 86) // lime
            };

            chart.draw_series(LineSeries::new(self.points.iter().copied(), &line_color))?;
            // `Circle` radii are mis-scaled by the ratatui backend; pixels read as dots.
            chart.draw_series(
                self.points
                    .iter()
                    .map(|&(x, y)| Pixel::new((x, y), WHITE)),
            )?;

            Ok(())
        });

        widget.render(area, buf);
    }
}

/// Tick label for x position `v`: the series label when `v` sits on an index.
pub fn label_at(labels: &[String], v: f64) -> String {
    let idx = v.round();
    if (v - idx).abs() > 0.05 || idx < 0.0 {
        return String::new();
    }
    labels.get(idx as usize).cloned().unwrap_or_default()
}

/// Bounds for a series plotted against its index, with 5% vertical padding.
pub fn series_bounds(values: &[f64]) -> ([f64; 2], [f64; 2]) {
    let x_max = values.len().saturating_sub(1).max(1) as f64;
    let x_bounds = [-0.25, x_max + 0.25];

    let (mut y_min, mut y_max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if !y_min.is_finite() || !y_max.is_finite() {
        y_min = 0.0;
        y_max = 1.0;
    }
    if y_max <= y_min {
        y_min -= 1.0;
        y_max += 1.0;
    }
    let pad = (y_max - y_min) * 0.05;
    (x_bounds, [y_min - pad, y_max + pad])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_only_on_integer_positions() {
        let labels: Vec<String> = ["Jan", "Feb"].iter().map(|s| s.to_string()).collect();
        assert_eq!(label_at(&labels, 1.0), "Feb");
        assert_eq!(label_at(&labels, 0.02), "Jan");
        assert_eq!(label_at(&labels, 0.5), "");
        assert_eq!(label_at(&labels, 5.0), "");
        assert_eq!(label_at(&labels, -1.0), "");
    }

    #[test]
    fn bounds_pad_and_handle_flat_series() {
        let (x, y) = series_bounds(&[300.0, 350.0]);
        assert_eq!(x, [-0.25, 1.25]);
        assert!((y[0] - 297.5).abs() < 1e-9);
        assert!((y[1] - 352.5).abs() < 1e-9);

        let (_, y) = series_bounds(&[100.0]);
        assert!(y[0] < 100.0 && y[1] > 100.0);
    }
}
