//! Logistic fit of the early epidemic phase.
//!
//! Given a table we:
//! - keep the rows with `infected < 0.5 · max(infected)` (ascending phase)
//! - minimize squared residuals of the sigmoid over those rows only
//! - evaluate the fitted curve over the whole table and score it with R²
//! - derive the doubling time `ln(2) / b`
//!
//! Every solver problem is converted into a `FitFailure`; nothing here panics
//! on user data.

use nalgebra::{DMatrix, DVector};

use crate::domain::{FitResult, TimeSeriesTable};
use crate::error::FitFailure;
use crate::math::{LmError, LmOptions, Residuals, levenberg_marquardt};
use crate::models::{PARAM_COUNT, fill_jacobian_row, predict};

/// Fraction of the peak below which rows count as early-phase.
pub const EARLY_PHASE_FRACTION: f64 = 0.5;
/// Minimum number of early-phase rows needed to fit three parameters.
pub const MIN_FIT_POINTS: usize = 4;
/// Initial growth rate guess.
pub const INITIAL_GROWTH_RATE: f64 = 0.1;
/// Initial midpoint guess.
pub const INITIAL_MIDPOINT: f64 = 20.0;

/// Sigmoid least-squares problem over a fixed set of observations.
struct SigmoidProblem {
    t: Vec<f64>,
    y: Vec<f64>,
}

impl Residuals for SigmoidProblem {
    fn residuals(&self, params: &DVector<f64>) -> DVector<f64> {
        let p = params.as_slice();
        DVector::from_iterator(
            self.t.len(),
            self.t.iter().zip(&self.y).map(|(&t, &y)| predict(t, p) - y),
        )
    }

    fn jacobian(&self, params: &DVector<f64>) -> DMatrix<f64> {
        let p = params.as_slice();
        let mut jac = DMatrix::<f64>::zeros(self.t.len(), PARAM_COUNT);
        let mut row = [0.0; PARAM_COUNT];
        for (i, &t) in self.t.iter().enumerate() {
            fill_jacobian_row(t, p, &mut row);
            for (j, v) in row.iter().enumerate() {
                jac[(i, j)] = *v;
            }
        }
        jac
    }

    fn observation_norm(&self) -> f64 {
        self.y.iter().map(|v| v * v).sum::<f64>().sqrt()
    }
}

/// Fit the logistic model with the default solver settings.
pub fn fit_logistic(table: &TimeSeriesTable) -> Result<FitResult, FitFailure> {
    fit_logistic_with(table, &LmOptions::default())
}

/// Fit the logistic model with explicit solver settings.
pub fn fit_logistic_with(table: &TimeSeriesTable, opts: &LmOptions) -> Result<FitResult, FitFailure> {
    let times = table.times();
    let infected = table.infected();
    let max_infected = infected.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let threshold = EARLY_PHASE_FRACTION * max_infected;
    let (fit_t, fit_y): (Vec<f64>, Vec<f64>) = times
        .iter()
        .zip(&infected)
        .filter(|&(_, &y)| y < threshold)
        .map(|(&t, &y)| (t, y))
        .unzip();

    if fit_t.len() < MIN_FIT_POINTS {
        log::debug!(
            "logistic fit skipped: {} early-phase rows below {threshold}",
            fit_t.len()
        );
        return Err(FitFailure::InsufficientData {
            points: fit_t.len(),
            required: MIN_FIT_POINTS,
        });
    }

    let fit_points = fit_t.len();
    let problem = SigmoidProblem { t: fit_t, y: fit_y };
    let initial = DVector::from_row_slice(&[max_infected, INITIAL_GROWTH_RATE, INITIAL_MIDPOINT]);

    let report = levenberg_marquardt(&problem, initial, opts).map_err(|e| match e {
        LmError::MaxEvaluations { evaluations } => FitFailure::DidNotConverge { evaluations },
        other => FitFailure::Solver(other.to_string()),
    })?;

    let params = report.params.as_slice();
    if params.iter().any(|v| !v.is_finite()) {
        return Err(FitFailure::Solver("non-finite parameters".to_string()));
    }
    let (a, b, c) = (params[0], params[1], params[2]);
    log::debug!(
        "logistic fit: a={a:.4} b={b:.6} c={c:.4} cost={:.3e} after {} iterations, {} evaluations ({:?})",
        report.cost,
        report.iterations,
        report.evaluations,
        report.termination
    );

    if b <= 0.0 {
        return Err(FitFailure::NonPositiveGrowthRate { b });
    }

    let predicted: Vec<f64> = times.iter().map(|&t| predict(t, params)).collect();
    let r_squared = r_squared(&infected, &predicted);

    Ok(FitResult {
        a,
        b,
        c,
        r_squared,
        doubling_time: std::f64::consts::LN_2 / b,
        predicted,
        fit_points,
        evaluations: report.evaluations,
    })
}

/// Coefficient of determination `1 - SS_res / SS_tot`.
///
/// Returns exactly `0.0` for a flat series (`SS_tot == 0`).
pub fn r_squared(observed: &[f64], predicted: &[f64]) -> f64 {
    if observed.is_empty() {
        return 0.0;
    }
    let mean = observed.iter().sum::<f64>() / observed.len() as f64;
    let ss_tot: f64 = observed.iter().map(|y| (y - mean).powi(2)).sum();
    if ss_tot == 0.0 {
        return 0.0;
    }
    let ss_res: f64 = observed
        .iter()
        .zip(predicted)
        .map(|(y, p)| (y - p).powi(2))
        .sum();
    1.0 - ss_res / ss_tot
}
