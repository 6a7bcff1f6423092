//! Plotters-powered chart widget for Ratatui.
//!
//! We render Plotters output into the Ratatui buffer using `plotters-ratatui-backend`.
//! The widget draws a prepared `ChartSpec`; bounds are computed from the spec
//! before the render call.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

use crate::chart::{Axis, ChartSpec, Geometry, Rgb, Scale, Series};

/// Render-only view of a `ChartSpec`.
pub struct EpiPlottersChart<'a> {
    pub spec: &'a ChartSpec,
}

impl<'a> Widget for EpiPlottersChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // When the available area is too small, Plotters may fail to build a chart.
        // In that case, we render a small hint rather than panicking.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let spec = self.spec;
        let Some((x0, x1)) = spec.x_range() else {
            buf.set_string(area.x, area.y, "No data to plot.", Style::default().fg(Color::Yellow));
            return;
        };
        let (y0, y1) = spec.y_range(Axis::Primary);
        let (s0, s1) = spec.y_range(Axis::Secondary);
        let y_scale = spec.y_scale;
        let s_scale = spec.secondary_scale;

        let widget = widget_fn(move |root| {
            // Terminal cells are low-res, so keep label areas compact.
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                .set_label_area_size(LabelAreaPosition::Left, 6)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .set_label_area_size(LabelAreaPosition::Right, if spec.has_secondary() { 6 } else { 0 })
                .build_cartesian_2d(x0..x1, y0..y1)?
                .set_secondary_coord(x0..x1, s0..s1);

            // Mesh lines are disabled to reduce clutter at terminal resolution.
            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_desc(spec.x_label.as_str())
                .y_desc(spec.y_label.as_str())
                .x_labels(5)
                .y_labels(5)
                .x_label_formatter(&|v| format!("{v:.0}"))
                .y_label_formatter(&|v| fmt_tick(y_scale, *v))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            if spec.has_secondary() {
                chart
                    .configure_secondary_axes()
                    .y_desc(spec.secondary_label.as_deref().unwrap_or(""))
                    .y_labels(5)
                    .y_label_formatter(&|v| fmt_tick(s_scale, *v))
                    .label_style(("sans-serif", 10).into_font().color(&WHITE))
                    .axis_style(&WHITE)
                    .draw()?;
            }

            for series in &spec.series {
                let parts = series_parts(series, spec.scale_of(series.axis));
                let color = rgb(series.color);
                let dot_color = rgb(parts.dot_color.unwrap_or(series.color));
                let paths = parts.paths.into_iter().map(|p| PathElement::new(p, color));
                let dots = parts.dots.into_iter().map(|p| Pixel::new(p, dot_color));
                match series.axis {
                    Axis::Primary => {
                        chart.draw_series(paths)?;
                        chart.draw_series(dots)?;
                    }
                    Axis::Secondary => {
                        chart.draw_secondary_series(paths)?;
                        chart.draw_secondary_series(dots)?;
                    }
                }
            }

            Ok(())
        });

        widget.render(area, buf);
    }
}

/// A series broken into path segments and dots, already in axis space.
#[derive(Debug, Default, PartialEq)]
struct SeriesParts {
    paths: Vec<Vec<(f64, f64)>>,
    dots: Vec<(f64, f64)>,
    /// Dots use the series color unless set.
    dot_color: Option<Rgb>,
}

/// Bands are drawn as their upper outline: solid fills would hide everything
/// underneath in a terminal. Dashes are every other segment.
///
/// We avoid `Circle` markers because `plotters-ratatui-backend` maps circle
/// radii incorrectly; a colored `Pixel` gives a clean dot.
fn series_parts(series: &Series, scale: Scale) -> SeriesParts {
    let project = |points: &[(f64, f64)]| -> Vec<(f64, f64)> {
        points
            .iter()
            .filter_map(|&(x, y)| scale.apply(y).map(|v| (x, v)))
            .collect()
    };

    let mut parts = SeriesParts::default();
    match &series.geometry {
        Geometry::Line {
            points,
            dashed,
            markers,
        } => {
            let pts = project(points);
            if *dashed {
                parts.paths.extend(pts.windows(2).step_by(2).map(|pair| pair.to_vec()));
            } else if pts.len() > 1 {
                parts.paths.push(pts.clone());
            }
            if *markers {
                parts.dots = pts;
                parts.dot_color = Some(Rgb(255, 255, 255));
            }
        }
        Geometry::Markers { points } => parts.dots = project(points),
        Geometry::Band { upper, .. } => parts.paths.push(project(upper)),
        Geometry::Bars { bars } => {
            for b in bars {
                if let (Some(from), Some(to)) = (scale.apply(b.from), scale.apply(b.to)) {
                    parts.paths.push(vec![(b.x, from), (b.x, to)]);
                }
            }
        }
    }
    parts
}

fn rgb(c: Rgb) -> RGBColor {
    RGBColor(c.0, c.1, c.2)
}

fn fmt_tick(scale: Scale, v: f64) -> String {
    let value = scale.invert(v);
    if value.abs() >= 100.0 || scale == Scale::Log {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}
