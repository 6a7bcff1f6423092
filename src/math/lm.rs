//! Levenberg–Marquardt nonlinear least squares.
//!
//! Minimizes `‖r(p)‖²` for a residual vector `r` with a known Jacobian. Each
//! iteration solves the damped Gauss–Newton step
//!
//! ```text
//! minimize ‖ J δ + r ‖² + λ ‖ D δ ‖²
//! ```
//!
//! where `D` holds the Jacobian column norms (Marquardt scaling). The damping
//! `λ` follows Nielsen's update: shrink by a factor driven by the gain ratio on
//! success, grow geometrically on failure.
//!
//! Termination (first one wins):
//! - residual norm `≤ rtol · ‖y‖` (fit already at data precision)
//! - actual and predicted relative cost reductions both `≤ ftol`
//! - relative step length `≤ xtol`
//!
//! Exhausting the residual evaluation budget is an error, never a silent result.

use nalgebra::{DMatrix, DVector};
use thiserror::Error;

use crate::math::solve_least_squares;

/// A least-squares problem with an analytic Jacobian.
pub trait Residuals {
    /// Residual vector `model(p) - y` (one entry per observation).
    fn residuals(&self, params: &DVector<f64>) -> DVector<f64>;

    /// Jacobian of `residuals` with respect to `params` (observations × params).
    fn jacobian(&self, params: &DVector<f64>) -> DMatrix<f64>;

    /// `‖y‖`, the scale used by the residual tolerance.
    fn observation_norm(&self) -> f64;
}

#[derive(Debug, Clone, Copy)]
pub struct LmOptions {
    /// Residual evaluations allowed before giving up.
    pub max_evaluations: usize,
    /// Relative cost reduction (actual and predicted) treated as converged.
    pub ftol: f64,
    /// Step length relative to `‖p‖` treated as converged.
    pub xtol: f64,
    /// Residual norm relative to `‖y‖` treated as an exact fit.
    pub rtol: f64,
    /// Starting `λ`.
    pub initial_damping: f64,
}

impl Default for LmOptions {
    fn default() -> Self {
        Self {
            max_evaluations: 10_000,
            ftol: 1.49012e-8,
            xtol: 1.49012e-8,
            rtol: 1e-5,
            initial_damping: 1e-3,
        }
    }
}

/// Which criterion stopped the iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    ResidualTolerance,
    CostTolerance,
    StepTolerance,
}

#[derive(Debug, Clone)]
pub struct LmReport {
    pub params: DVector<f64>,
    /// Final `‖r‖²`.
    pub cost: f64,
    pub evaluations: usize,
    pub iterations: usize,
    pub termination: Termination,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LmError {
    #[error("evaluation budget exhausted after {evaluations} evaluations")]
    MaxEvaluations { evaluations: usize },
    #[error("damped step system is singular")]
    Singular,
    #[error("residuals are not finite at the initial guess")]
    NonFiniteStart,
    #[error("damping parameter overflowed without finding a descent step")]
    DampingOverflow,
}

const MIN_DAMPING: f64 = 1e-15;
const MIN_SCALE: f64 = 1e-12;

/// Run Levenberg–Marquardt from `initial`.
pub fn levenberg_marquardt<P: Residuals>(
    problem: &P,
    initial: DVector<f64>,
    opts: &LmOptions,
) -> Result<LmReport, LmError> {
    let mut params = initial;
    let mut r = problem.residuals(&params);
    let mut evaluations = 1usize;
    let mut cost = r.norm_squared();
    if !cost.is_finite() {
        return Err(LmError::NonFiniteStart);
    }

    let target = opts.rtol * problem.observation_norm();
    let finish = |params: DVector<f64>, cost: f64, evaluations, iterations, termination| LmReport {
        params,
        cost,
        evaluations,
        iterations,
        termination,
    };

    if cost.sqrt() <= target {
        return Ok(finish(params, cost, evaluations, 0, Termination::ResidualTolerance));
    }

    let mut lambda = opts.initial_damping;
    let mut nu = 2.0;
    let mut iterations = 0usize;

    loop {
        iterations += 1;
        let jac = problem.jacobian(&params);
        let grad = jac.transpose() * &r;
        let scale = DVector::from_iterator(
            jac.ncols(),
            jac.column_iter().map(|col| col.norm().max(MIN_SCALE)),
        );

        loop {
            let step = damped_step(&jac, &r, &scale, lambda).ok_or(LmError::Singular)?;
            let candidate = &params + &step;
            let r_new = problem.residuals(&candidate);
            evaluations += 1;
            let cost_new = r_new.norm_squared();
            let small_step = step.norm() <= opts.xtol * (params.norm() + opts.xtol);

            if cost_new.is_finite() && cost_new < cost {
                // Predicted reduction of the linear model: -(2 δ·g + ‖Jδ‖²).
                let predicted = -(2.0 * step.dot(&grad) + (&jac * &step).norm_squared());
                let rho = if predicted > 0.0 {
                    (cost - cost_new) / predicted
                } else {
                    1.0
                };
                let previous = cost;
                params = candidate;
                r = r_new;
                cost = cost_new;
                lambda = (lambda * (1.0 - (2.0 * rho - 1.0).powi(3)).max(1.0 / 3.0)).max(MIN_DAMPING);
                nu = 2.0;

                if cost.sqrt() <= target {
                    return Ok(finish(params, cost, evaluations, iterations, Termination::ResidualTolerance));
                }
                if previous - cost <= opts.ftol * previous && predicted <= opts.ftol * previous {
                    return Ok(finish(params, cost, evaluations, iterations, Termination::CostTolerance));
                }
                if small_step {
                    return Ok(finish(params, cost, evaluations, iterations, Termination::StepTolerance));
                }
                break;
            }

            if evaluations >= opts.max_evaluations {
                return Err(LmError::MaxEvaluations { evaluations });
            }
            lambda *= nu;
            nu *= 2.0;
            if !lambda.is_finite() {
                return Err(LmError::DampingOverflow);
            }
            if small_step {
                // No descent step exists at this resolution: we are at a minimum.
                return Ok(finish(params, cost, evaluations, iterations, Termination::StepTolerance));
            }
        }

        if evaluations >= opts.max_evaluations {
            return Err(LmError::MaxEvaluations { evaluations });
        }
    }
}

/// Solve `[J; √λ·D] δ = [-r; 0]` in the least-squares sense.
fn damped_step(
    jac: &DMatrix<f64>,
    r: &DVector<f64>,
    scale: &DVector<f64>,
    lambda: f64,
) -> Option<DVector<f64>> {
    let m = jac.nrows();
    let n = jac.ncols();
    let sqrt_lambda = lambda.sqrt();

    let mut a = DMatrix::<f64>::zeros(m + n, n);
    a.view_mut((0, 0), (m, n)).copy_from(jac);
    for j in 0..n {
        a[(m + j, j)] = sqrt_lambda * scale[j];
    }

    let mut rhs = DVector::<f64>::zeros(m + n);
    for i in 0..m {
        rhs[i] = -r[i];
    }

    solve_least_squares(&a, &rhs)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Exponential decay `y = p0 · exp(-p1 · x)`.
    struct ExpDecay {
        x: Vec<f64>,
        y: Vec<f64>,
    }

    impl Residuals for ExpDecay {
        fn residuals(&self, p: &DVector<f64>) -> DVector<f64> {
            DVector::from_iterator(
                self.x.len(),
                self.x
                    .iter()
                    .zip(&self.y)
                    .map(|(&x, &y)| p[0] * (-p[1] * x).exp() - y),
            )
        }

        fn jacobian(&self, p: &DVector<f64>) -> DMatrix<f64> {
            let mut j = DMatrix::zeros(self.x.len(), 2);
            for (i, &x) in self.x.iter().enumerate() {
                let e = (-p[1] * x).exp();
                j[(i, 0)] = e;
                j[(i, 1)] = -p[0] * x * e;
            }
            j
        }

        fn observation_norm(&self) -> f64 {
            self.y.iter().map(|v| v * v).sum::<f64>().sqrt()
        }
    }

    fn decay_problem() -> ExpDecay {
        let x: Vec<f64> = (0..12).map(|i| i as f64 * 0.5).collect();
        let y = x.iter().map(|&x| 3.0 * (-0.7 * x).exp()).collect();
        ExpDecay { x, y }
    }

    #[test]
    fn recovers_exact_parameters() {
        let problem = decay_problem();
        let report = levenberg_marquardt(
            &problem,
            DVector::from_row_slice(&[1.0, 0.1]),
            &LmOptions::default(),
        )
        .unwrap();

        assert!((report.params[0] - 3.0).abs() < 1e-3, "p0={}", report.params[0]);
        assert!((report.params[1] - 0.7).abs() < 1e-3, "p1={}", report.params[1]);
        assert!(report.evaluations <= LmOptions::default().max_evaluations);
        assert!(report.iterations >= 1 && report.iterations < report.evaluations);
        assert!(report.cost < 1e-8, "cost={}", report.cost);
    }

    #[test]
    fn exact_start_terminates_immediately() {
        let problem = decay_problem();
        let report = levenberg_marquardt(
            &problem,
            DVector::from_row_slice(&[3.0, 0.7]),
            &LmOptions::default(),
        )
        .unwrap();
        assert_eq!(report.evaluations, 1);
        assert_eq!(report.iterations, 0);
        assert_eq!(report.cost, 0.0);
        assert_eq!(report.termination, Termination::ResidualTolerance);
    }

    #[test]
    fn budget_exhaustion_is_an_error() {
        let problem = decay_problem();
        let opts = LmOptions {
            max_evaluations: 2,
            ..LmOptions::default()
        };
        let err = levenberg_marquardt(&problem, DVector::from_row_slice(&[1.0, 0.1]), &opts).unwrap_err();
        assert!(matches!(err, LmError::MaxEvaluations { .. }));
    }

    #[test]
    fn non_finite_start_is_rejected() {
        let problem = decay_problem();
        let err = levenberg_marquardt(
            &problem,
            DVector::from_row_slice(&[f64::NAN, 0.1]),
            &LmOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err, LmError::NonFiniteStart);
    }
}
