//! Declarative chart descriptions.
//!
//! Builders here turn a table (or derived data) into a `ChartSpec`. A spec is
//! plain data: it knows nothing about terminals or pixels, so both renderers
//! (`plot::ascii` and `tui::plotters_chart`) draw from the same description.
//!
//! On a log-scaled axis, points with a non-positive value are dropped.

use crate::domain::{DashConfig, DeltaSeries, FitResult, TimeSeriesTable};

pub const HEALTHY_COLOR: Rgb = Rgb(0x2e, 0xcc, 0x71);
pub const INFECTED_COLOR: Rgb = Rgb(0xe7, 0x4c, 0x3c);
pub const RECOVERED_COLOR: Rgb = Rgb(0x34, 0x98, 0xdb);
pub const ACCENT_COLOR: Rgb = Rgb(0xf3, 0x9c, 0x12);

const TIME_LABEL: &str = "Time (days)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scale {
    Linear,
    Log,
}

impl Scale {
    /// Map a data value into axis space; `None` when it has no place on a log axis.
    pub fn apply(self, y: f64) -> Option<f64> {
        match self {
            Scale::Linear => Some(y),
            Scale::Log if y > 0.0 => Some(y.log10()),
            Scale::Log => None,
        }
    }

    /// Back from axis space to data units (for tick labels).
    pub fn invert(self, v: f64) -> f64 {
        match self {
            Scale::Linear => v,
            Scale::Log => 10f64.powf(v),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Primary,
    Secondary,
}

/// One bar segment, drawn from `from` to `to` at `x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    pub x: f64,
    pub from: f64,
    pub to: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Line {
        points: Vec<(f64, f64)>,
        dashed: bool,
        markers: bool,
    },
    Markers {
        points: Vec<(f64, f64)>,
    },
    /// Filled region between two curves sampled at the same x values.
    Band {
        upper: Vec<(f64, f64)>,
        lower: Vec<(f64, f64)>,
    },
    Bars {
        bars: Vec<Bar>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub color: Rgb,
    /// Character used by text renderers.
    pub glyph: char,
    pub axis: Axis,
    pub geometry: Geometry,
}

impl Series {
    /// Every (x, y) coordinate the series touches, used for axis ranges.
    pub fn coords(&self) -> Vec<(f64, f64)> {
        match &self.geometry {
            Geometry::Line { points, .. } | Geometry::Markers { points } => points.clone(),
            Geometry::Band { upper, lower } => upper.iter().chain(lower.iter()).copied().collect(),
            Geometry::Bars { bars } => bars
                .iter()
                .flat_map(|b| [(b.x, b.from), (b.x, b.to)])
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    /// Present only when some series uses the secondary axis.
    pub secondary_label: Option<String>,
    pub y_scale: Scale,
    pub secondary_scale: Scale,
    pub series: Vec<Series>,
}

impl ChartSpec {
    fn new(title: impl Into<String>, y_label: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            x_label: TIME_LABEL.to_string(),
            y_label: y_label.into(),
            secondary_label: None,
            y_scale: Scale::Linear,
            secondary_scale: Scale::Linear,
            series: Vec::new(),
        }
    }

    pub fn has_secondary(&self) -> bool {
        self.series.iter().any(|s| s.axis == Axis::Secondary)
    }

    pub fn scale_of(&self, axis: Axis) -> Scale {
        match axis {
            Axis::Primary => self.y_scale,
            Axis::Secondary => self.secondary_scale,
        }
    }

    pub fn series_on(&self, axis: Axis) -> impl Iterator<Item = &Series> {
        self.series.iter().filter(move |s| s.axis == axis)
    }

    /// Data range along x, if any series has points.
    pub fn x_range(&self) -> Option<(f64, f64)> {
        value_range(self.series.iter().flat_map(|s| s.coords()).map(|(x, _)| x))
    }

    /// Padded range of one y axis, in axis space (log10 on log axes).
    pub fn y_range(&self, axis: Axis) -> (f64, f64) {
        let scale = self.scale_of(axis);
        let values = self
            .series_on(axis)
            .flat_map(|s| s.coords())
            .filter_map(|(_, y)| scale.apply(y));
        let (min, max) = value_range(values).unwrap_or((0.0, 1.0));
        pad_range(min, max, 0.05)
    }
}

/// Min/max of finite values; a single distinct value is widened by one unit.
fn value_range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let mut min_v = f64::INFINITY;
    let mut max_v = f64::NEG_INFINITY;
    for v in values.filter(|v| v.is_finite()) {
        min_v = min_v.min(v);
        max_v = max_v.max(v);
    }
    if !(min_v.is_finite() && max_v.is_finite()) {
        None
    } else if max_v > min_v {
        Some((min_v, max_v))
    } else {
        Some((min_v - 1.0, max_v + 1.0))
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

/// Healthy and recovered on the primary axis, infected on the secondary axis.
///
/// With `config.log_scale` the infected axis is logarithmic and infected is
/// drawn as a line, since a band down to zero has no log representation.
pub fn timeseries_chart(table: &TimeSeriesTable, config: &DashConfig) -> ChartSpec {
    let mut spec = ChartSpec::new("Disease Spread Over Time", "Healthy / Recovered");
    spec.secondary_label = Some("Infected".to_string());
    if config.log_scale {
        spec.secondary_scale = Scale::Log;
    }

    let t = table.times();
    spec.series.push(band_to_zero("Healthy", HEALTHY_COLOR, 'h', &t, &table.healthy()));

    let infected = zip_points(&t, &table.infected());
    let geometry = if config.log_scale {
        Geometry::Line {
            points: positive_only(infected),
            dashed: false,
            markers: false,
        }
    } else {
        let lower = infected.iter().map(|&(x, _)| (x, 0.0)).collect();
        Geometry::Band { upper: infected, lower }
    };
    spec.series.push(Series {
        name: "Infected".to_string(),
        color: INFECTED_COLOR,
        glyph: 'i',
        axis: Axis::Secondary,
        geometry,
    });

    spec.series.push(band_to_zero("Recovered", RECOVERED_COLOR, 'r', &t, &table.recovered()));

    if config.show_vaccination && table.has_vaccinated() {
        let points = table
            .records()
            .iter()
            .filter_map(|r| r.vaccinated.map(|v| (r.t, v)))
            .collect();
        spec.series.push(Series {
            name: "Vaccinated".to_string(),
            color: ACCENT_COLOR,
            glyph: 'v',
            axis: Axis::Primary,
            geometry: Geometry::Line {
                points,
                dashed: true,
                markers: false,
            },
        });
    }

    spec
}

/// Cumulative bands: healthy, healthy+infected, healthy+infected+recovered.
pub fn stacked_area_chart(table: &TimeSeriesTable) -> ChartSpec {
    let mut spec = ChartSpec::new("Population Distribution Over Time", "Population");

    let t = table.times();
    let mut base = vec![0.0; t.len()];
    let layers = [
        ("Healthy", HEALTHY_COLOR, 'h', table.healthy()),
        ("Infected", INFECTED_COLOR, 'i', table.infected()),
        ("Recovered", RECOVERED_COLOR, 'r', table.recovered()),
    ];
    for (name, color, glyph, values) in layers {
        let top: Vec<f64> = base.iter().zip(&values).map(|(b, v)| b + v).collect();
        spec.series.push(Series {
            name: name.to_string(),
            color,
            glyph,
            axis: Axis::Primary,
            geometry: Geometry::Band {
                upper: zip_points(&t, &top),
                lower: zip_points(&t, &base),
            },
        });
        base = top;
    }

    spec
}

/// Stacked bars of per-step new infections and recoveries.
///
/// Positive changes stack upward from zero, negative ones downward. Rows with a
/// missing delta contribute no bar.
pub fn delta_chart(deltas: &DeltaSeries) -> ChartSpec {
    let mut spec = ChartSpec::new("Daily Changes", "Change");

    let mut infections = Vec::new();
    let mut recoveries = Vec::new();
    for row in &deltas.rows {
        let mut up = 0.0;
        let mut down = 0.0;
        for (value, bars) in [
            (row.infected_delta, &mut infections),
            (row.recovered_delta, &mut recoveries),
        ] {
            let Some(v) = value else { continue };
            let base = if v >= 0.0 { &mut up } else { &mut down };
            bars.push(Bar {
                x: row.t,
                from: *base,
                to: *base + v,
            });
            *base += v;
        }
    }

    spec.series.push(Series {
        name: "Daily New Infections".to_string(),
        color: INFECTED_COLOR,
        glyph: 'i',
        axis: Axis::Primary,
        geometry: Geometry::Bars { bars: infections },
    });
    spec.series.push(Series {
        name: "Daily Recoveries".to_string(),
        color: RECOVERED_COLOR,
        glyph: 'r',
        axis: Axis::Primary,
        geometry: Geometry::Bars { bars: recoveries },
    });

    spec
}

/// Observed infected against the fitted sigmoid over every table `t`.
pub fn fit_overlay_chart(table: &TimeSeriesTable, fit: &FitResult) -> ChartSpec {
    let mut spec = ChartSpec::new(
        format!("Logistic Curve Fit (R² = {:.4})", fit.r_squared),
        "Infected",
    );

    let t = table.times();
    spec.series.push(Series {
        name: "Actual Data".to_string(),
        color: INFECTED_COLOR,
        glyph: 'o',
        axis: Axis::Primary,
        geometry: Geometry::Line {
            points: zip_points(&t, &table.infected()),
            dashed: false,
            markers: true,
        },
    });
    spec.series.push(Series {
        name: "Sigmoid Fit".to_string(),
        color: ACCENT_COLOR,
        glyph: '-',
        axis: Axis::Primary,
        geometry: Geometry::Line {
            points: zip_points(&t, &fit.predicted),
            dashed: true,
            markers: false,
        },
    });

    spec
}

fn band_to_zero(name: &str, color: Rgb, glyph: char, t: &[f64], y: &[f64]) -> Series {
    Series {
        name: name.to_string(),
        color,
        glyph,
        axis: Axis::Primary,
        geometry: Geometry::Band {
            upper: zip_points(t, y),
            lower: t.iter().map(|&x| (x, 0.0)).collect(),
        },
    }
}

fn zip_points(x: &[f64], y: &[f64]) -> Vec<(f64, f64)> {
    x.iter().copied().zip(y.iter().copied()).collect()
}

fn positive_only(points: Vec<(f64, f64)>) -> Vec<(f64, f64)> {
    points.into_iter().filter(|&(_, y)| y > 0.0).collect()
}
