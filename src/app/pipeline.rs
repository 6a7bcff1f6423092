//! Shared "analysis pipeline" logic used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! load (or demo) -> summary -> deltas -> logistic fit
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).

use std::path::PathBuf;

use crate::data::generate_demo;
use crate::domain::{DeltaSeries, FitResult, RunConfig, SummaryMetrics, TimeSeriesTable};
use crate::error::{AppError, FitFailure};
use crate::fit::fit_logistic;
use crate::io::ingest::load_path;
use crate::metrics::{compute_deltas, compute_summary};

/// Where the current table came from.
#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    File(PathBuf),
    Demo { seed: u64 },
    /// The input failed to load and demo data was substituted.
    Fallback { path: PathBuf, reason: String, seed: u64 },
}

impl DataSource {
    pub fn is_demo(&self) -> bool {
        !matches!(self, DataSource::File(_))
    }

    pub fn describe(&self) -> String {
        match self {
            DataSource::File(path) => path.display().to_string(),
            DataSource::Demo { seed } => format!("demo data (seed {seed})"),
            DataSource::Fallback { path, seed, .. } => {
                format!("demo data (seed {seed}; '{}' failed to load)", path.display())
            }
        }
    }
}

/// All computed outputs for one table.
///
/// A reload replaces the whole value; nothing is updated in place.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub source: DataSource,
    pub table: TimeSeriesTable,
    pub summary: SummaryMetrics,
    pub deltas: DeltaSeries,
    pub fit: Result<FitResult, FitFailure>,
}

impl Analysis {
    pub fn fit_ok(&self) -> Option<&FitResult> {
        self.fit.as_ref().ok()
    }
}

/// Run metrics and the curve fit over a table.
pub fn analyze(table: TimeSeriesTable, source: DataSource) -> Analysis {
    let summary = compute_summary(&table);
    let deltas = compute_deltas(&table);
    let fit = fit_logistic(&table);
    if let Err(failure) = &fit {
        log::info!("curve fit unavailable: {failure}");
    }

    Analysis {
        source,
        table,
        summary,
        deltas,
        fit,
    }
}

/// Load the configured input, or generate the demo table.
///
/// A failed load falls back to demo data unless `config.strict` is set.
pub fn load_or_demo(config: &RunConfig) -> Result<(TimeSeriesTable, DataSource), AppError> {
    let seed = config.demo.seed;
    let Some(path) = &config.input else {
        return Ok((generate_demo(&config.demo)?, DataSource::Demo { seed }));
    };

    match load_path(path) {
        Ok(table) => Ok((table, DataSource::File(path.clone()))),
        Err(failure) if config.strict => Err(failure.into()),
        Err(failure) => {
            log::warn!("falling back to demo data: {failure}");
            let table = generate_demo(&config.demo)?;
            Ok((
                table,
                DataSource::Fallback {
                    path: path.clone(),
                    reason: failure.to_string(),
                    seed,
                },
            ))
        }
    }
}

/// Load (or generate) and analyze in one step.
pub fn run_analysis(config: &RunConfig) -> Result<Analysis, AppError> {
    let (table, source) = load_or_demo(config)?;
    Ok(analyze(table, source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DashConfig, DemoOptions};

    fn config(input: Option<PathBuf>, strict: bool) -> RunConfig {
        RunConfig {
            input,
            strict,
            demo: DemoOptions::default(),
            dash: DashConfig::default(),
            plot: false,
            plot_width: 80,
            plot_height: 20,
            export_dir: PathBuf::from("."),
        }
    }

    #[test]
    fn no_input_uses_demo() {
        let analysis = run_analysis(&config(None, false)).unwrap();
        assert_eq!(analysis.source, DataSource::Demo { seed: 42 });
        assert_eq!(analysis.table.len(), 100);
        assert_eq!(analysis.deltas.rows.len(), 100);
        assert_eq!(analysis.summary.rows, 100);
    }

    #[test]
    fn failed_load_falls_back_to_demo() {
        let cfg = config(Some(PathBuf::from("missing/file.csv")), false);
        let analysis = run_analysis(&cfg).unwrap();
        assert!(analysis.source.is_demo());
        assert!(matches!(analysis.source, DataSource::Fallback { .. }));
        assert_eq!(analysis.table.len(), 100);
    }

    #[test]
    fn strict_load_failure_is_an_input_error() {
        let cfg = config(Some(PathBuf::from("missing/file.csv")), true);
        let err = run_analysis(&cfg).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
