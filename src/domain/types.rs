//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - parsed from CSV/JSON uploads
//! - passed through the analysis pipeline by value
//! - exported back to CSV/JSON

use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::LoadFailure;

/// One observation of the simulated population at time `t`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub t: f64,
    pub healthy: f64,
    pub infected: f64,
    pub recovered: f64,
    /// Optional column; missing cells deserialize to `None`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vaccinated: Option<f64>,
}

/// An ordered, non-empty epidemic time series.
///
/// Row order is the order of the source file and is the order used for
/// differencing and plotting. The table cannot be mutated after construction;
/// derived columns live in separate values (`DeltaSeries`, `FitResult`).
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesTable {
    records: Vec<Record>,
}

impl TimeSeriesTable {
    /// Build a table, rejecting empty input and non-finite values.
    pub fn new(records: Vec<Record>) -> Result<Self, LoadFailure> {
        if records.is_empty() {
            return Err(LoadFailure::Empty);
        }
        for (row, r) in records.iter().enumerate() {
            let columns = [
                ("t", r.t),
                ("healthy", r.healthy),
                ("infected", r.infected),
                ("recovered", r.recovered),
            ];
            for (column, v) in columns {
                if !v.is_finite() {
                    return Err(LoadFailure::NonFinite { row, column });
                }
            }
            if r.vaccinated.is_some_and(|v| !v.is_finite()) {
                return Err(LoadFailure::NonFinite {
                    row,
                    column: "vaccinated",
                });
            }
        }
        Ok(Self { records })
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// True when at least one row carries a vaccinated value.
    pub fn has_vaccinated(&self) -> bool {
        self.records.iter().any(|r| r.vaccinated.is_some())
    }

    pub fn times(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.t).collect()
    }

    pub fn healthy(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.healthy).collect()
    }

    pub fn infected(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.infected).collect()
    }

    pub fn recovered(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.recovered).collect()
    }
}

/// Scalar summary of a table (see `metrics::compute_summary`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SummaryMetrics {
    pub peak_infected: f64,
    /// `t` of the first row reaching `peak_infected`.
    pub peak_time: f64,
    /// Plain sum over rows, not a time integral (unit time step assumed).
    pub total_infected: f64,
    /// Percentage in `[0, 100]` for non-negative inputs.
    pub attack_rate: f64,
    pub duration: f64,
    pub max_healthy: f64,
    pub max_recovered: f64,
    pub rows: usize,
}

/// Per-row change of infected/recovered counts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DeltaRow {
    pub t: f64,
    /// `None` for the first row (no predecessor).
    pub infected_delta: Option<f64>,
    pub recovered_delta: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeltaSeries {
    pub rows: Vec<DeltaRow>,
}

/// A successful logistic fit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitResult {
    /// Plateau (upper asymptote).
    pub a: f64,
    /// Growth rate.
    pub b: f64,
    /// Midpoint time.
    pub c: f64,
    pub r_squared: f64,
    /// `ln(2) / b`.
    pub doubling_time: f64,
    /// Sigmoid evaluated at every table `t`, in row order.
    pub predicted: Vec<f64>,
    /// Number of early-phase rows used for estimation.
    pub fit_points: usize,
    /// Residual evaluations spent by the solver.
    pub evaluations: usize,
}

/// Input encodings understood by the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    Csv,
    Json,
}

/// Which export file(s) to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportKind {
    Csv,
    Json,
    Summary,
    All,
}

/// Presentation toggles.
///
/// These only affect chart construction, never the computed metrics or fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashConfig {
    /// Logarithmic y-axis for the infected series.
    pub log_scale: bool,
    /// Include the vaccinated series in the time-series chart.
    pub show_vaccination: bool,
}

impl Default for DashConfig {
    fn default() -> Self {
        Self {
            log_scale: false,
            show_vaccination: true,
        }
    }
}

/// Options for the synthetic demo dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoOptions {
    pub points: usize,
    pub seed: u64,
}

impl Default for DemoOptions {
    fn default() -> Self {
        Self { points: 100, seed: 42 }
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags plus environment defaults.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Data file; `None` means "use demo data".
    pub input: Option<PathBuf>,
    /// Exit instead of falling back to demo data when the input fails to load.
    pub strict: bool,
    pub demo: DemoOptions,
    pub dash: DashConfig,

    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,

    /// Directory for export files.
    pub export_dir: PathBuf,
}
