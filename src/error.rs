//! Error types.
//!
//! `AppError` is what the binary reports (message + process exit code).
//! `LoadFailure` and `FitFailure` are the recoverable, section-local failures of
//! the analysis pipeline: a load failure falls back to demo data, a fit failure
//! omits the fit section. Neither is fatal on its own.

use thiserror::Error;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

impl From<LoadFailure> for AppError {
    fn from(value: LoadFailure) -> Self {
        AppError::new(2, format!("Failed to load data: {value}"))
    }
}

/// Input file could not be turned into a time-series table.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadFailure {
    #[error("cannot read '{path}': {message}")]
    Io { path: String, message: String },

    #[error("unsupported file extension '{0}' (expected .csv or .json)")]
    UnsupportedFormat(String),

    #[error("CSV error{}: {message}", line_suffix(.line))]
    Csv { line: Option<u64>, message: String },

    #[error("JSON error: {0}")]
    Json(String),

    #[error("row {row}: column `{column}` is not a finite number")]
    NonFinite { row: usize, column: &'static str },

    #[error("file contains no data rows")]
    Empty,
}

/// The logistic fit could not be produced.
///
/// `reason()` yields the stable reason code shown to users and written to logs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitFailure {
    #[error("only {points} early-phase points (need at least {required})")]
    InsufficientData { points: usize, required: usize },

    #[error("solver did not converge within {evaluations} evaluations")]
    DidNotConverge { evaluations: usize },

    #[error("fitted growth rate b={b:.6} is not positive; doubling time undefined")]
    NonPositiveGrowthRate { b: f64 },

    #[error("solver failed: {0}")]
    Solver(String),
}

fn line_suffix(line: &Option<u64>) -> String {
    line.map(|l| format!(" on line {l}")).unwrap_or_default()
}

impl FitFailure {
    pub fn reason(&self) -> &'static str {
        match self {
            FitFailure::InsufficientData { .. } => "insufficient_data",
            FitFailure::DidNotConverge { .. } => "did_not_converge",
            FitFailure::NonPositiveGrowthRate { .. } => "non_positive_growth_rate",
            FitFailure::Solver(_) => "solver_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_failure_reason_codes_are_stable() {
        assert_eq!(
            FitFailure::InsufficientData { points: 2, required: 4 }.reason(),
            "insufficient_data"
        );
        assert_eq!(FitFailure::DidNotConverge { evaluations: 10 }.reason(), "did_not_converge");
        assert_eq!(
            FitFailure::NonPositiveGrowthRate { b: -0.1 }.reason(),
            "non_positive_growth_rate"
        );
        assert_eq!(FitFailure::Solver("x".into()).reason(), "solver_error");
    }

    #[test]
    fn csv_failure_mentions_line_when_known() {
        let e = LoadFailure::Csv {
            line: Some(3),
            message: "bad".to_string(),
        };
        assert_eq!(e.to_string(), "CSV error on line 3: bad");
        let e = LoadFailure::Csv {
            line: None,
            message: "bad".to_string(),
        };
        assert_eq!(e.to_string(), "CSV error: bad");
    }

    #[test]
    fn load_failure_maps_to_input_exit_code() {
        let err: AppError = LoadFailure::Empty.into();
        assert_eq!(err.exit_code(), 2);
    }
}
