//! ASCII/Unicode plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Every series is drawn with its own glyph:
//! - lines and band outlines: Bresenham lines (dashed lines skip every other cell)
//! - bars: vertical runs
//! - markers: drawn last so they overlay everything else
//!
//! Primary and secondary axes get independent y ranges; log axes are mapped in
//! log10 space.

use crate::chart::{Axis, ChartSpec, Geometry, Scale, Series};

/// Render a chart spec into a `width` x `height` character grid plus a small
/// header (ranges) and a legend line.
pub fn render_ascii_chart(spec: &ChartSpec, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let (x_min, x_max) = spec.x_range().unwrap_or((0.0, 1.0));
    let primary = AxisFrame::for_axis(spec, Axis::Primary);
    let secondary = AxisFrame::for_axis(spec, Axis::Secondary);

    let mut grid = vec![vec![' '; width]; height];
    let canvas = Canvas {
        x_min,
        x_max,
        width,
        height,
    };

    // Bars first, then outlines, then markers on top.
    for s in &spec.series {
        let frame = if s.axis == Axis::Primary { &primary } else { &secondary };
        if let Geometry::Bars { bars } = &s.geometry {
            for b in bars {
                let x = canvas.col(b.x);
                let (Some(r0), Some(r1)) = (frame.row(b.from, height), frame.row(b.to, height)) else {
                    continue;
                };
                for row in r0.min(r1)..=r0.max(r1) {
                    grid[row][x] = s.glyph;
                }
            }
        }
    }
    for s in &spec.series {
        let frame = if s.axis == Axis::Primary { &primary } else { &secondary };
        match &s.geometry {
            Geometry::Line { points, dashed, .. } => {
                draw_curve(&mut grid, points, &canvas, frame, s.glyph, *dashed);
            }
            Geometry::Band { upper, .. } => {
                draw_curve(&mut grid, upper, &canvas, frame, s.glyph, false);
            }
            Geometry::Markers { .. } | Geometry::Bars { .. } => {}
        }
    }
    for s in &spec.series {
        let frame = if s.axis == Axis::Primary { &primary } else { &secondary };
        let points = match &s.geometry {
            Geometry::Markers { points } => points,
            Geometry::Line {
                points, markers: true, ..
            } => points,
            _ => continue,
        };
        for &(t, y) in points {
            if let Some(row) = frame.row(y, height) {
                grid[row][canvas.col(t)] = s.glyph;
            }
        }
    }

    // Build final string. We include a small header with ranges.
    let mut out = String::new();
    out.push_str(&format!("{}\n", spec.title));
    out.push_str(&format!("x=[{x_min:.1}, {x_max:.1}] | y={}", primary.describe()));
    if spec.has_secondary() {
        out.push_str(&format!(" | y2={}", secondary.describe()));
    }
    out.push('\n');

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    let legend: Vec<String> = spec.series.iter().map(legend_entry).collect();
    out.push_str(&legend.join("  "));
    out.push('\n');

    out
}

fn legend_entry(s: &Series) -> String {
    match s.axis {
        Axis::Primary => format!("{} {}", s.glyph, s.name),
        Axis::Secondary => format!("{} {} (right)", s.glyph, s.name),
    }
}

struct Canvas {
    x_min: f64,
    x_max: f64,
    width: usize,
    height: usize,
}

impl Canvas {
    fn col(&self, t: f64) -> usize {
        map_x(t, self.x_min, self.x_max, self.width)
    }
}

/// Vertical mapping for one axis, in transformed (linear or log10) space.
struct AxisFrame {
    scale: Scale,
    min: f64,
    max: f64,
}

impl AxisFrame {
    fn for_axis(spec: &ChartSpec, axis: Axis) -> Self {
        let (min, max) = spec.y_range(axis);
        Self {
            scale: spec.scale_of(axis),
            min,
            max,
        }
    }

    fn row(&self, y: f64, height: usize) -> Option<usize> {
        self.scale.apply(y).map(|v| map_y(v, self.min, self.max, height))
    }

    fn describe(&self) -> String {
        match self.scale {
            Scale::Linear => format!("[{:.2}, {:.2}]", self.min, self.max),
            Scale::Log => format!(
                "[{:.2}, {:.2}] log",
                self.scale.invert(self.min),
                self.scale.invert(self.max)
            ),
        }
    }
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(
    grid: &mut [Vec<char>],
    curve: &[(f64, f64)],
    canvas: &Canvas,
    frame: &AxisFrame,
    ch: char,
    dashed: bool,
) {
    let mut prev = None;
    for &(t, y) in curve {
        let Some(row) = frame.row(y, canvas.height) else {
            continue;
        };
        let col = canvas.col(t);
        match prev {
            Some((c0, r0)) => draw_line(grid, c0, r0, col, row, ch, dashed),
            None if curve.len() == 1 => grid[row][col] = ch,
            None => {}
        }
        prev = Some((col, row));
    }
}

/// Integer line drawing (Bresenham-ish). Only blank cells are written.
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char, dashed: bool) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    let mut step = 0usize;

    loop {
        let visible = !dashed || step % 2 == 0;
        if visible
            && y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        step += 1;
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
