//! Logistic (sigmoid) growth model.
//!
//! The fitter relies on two primitive operations:
//! - predict `y(t)` given `(a, b, c)` (for residuals/plots)
//! - fill a Jacobian row `∂y/∂(a, b, c)` at `t` (for the solver)

/// Number of model parameters `(a, b, c)`.
pub const PARAM_COUNT: usize = 3;

/// `a / (1 + exp(-b (t - c)))`.
pub fn sigmoid(t: f64, a: f64, b: f64, c: f64) -> f64 {
    a * logistic_unit(-b * (t - c))
}

/// Predict `y(t)` from a parameter slice `[a, b, c]`.
pub fn predict(t: f64, params: &[f64]) -> f64 {
    sigmoid(t, params[0], params[1], params[2])
}

/// Fill the Jacobian row of the sigmoid at `t`.
///
/// With `s = 1 / (1 + exp(-b (t - c)))`:
///
/// ```text
/// ∂y/∂a = s
/// ∂y/∂b = a s (1 - s) (t - c)
/// ∂y/∂c = -a s (1 - s) b
/// ```
///
/// # Panics
/// Panics if `params` or `out` is shorter than `PARAM_COUNT`.
pub fn fill_jacobian_row(t: f64, params: &[f64], out: &mut [f64]) {
    let (a, b, c) = (params[0], params[1], params[2]);
    let s = logistic_unit(-b * (t - c));
    let ds = s * (1.0 - s);
    out[0] = s;
    out[1] = a * ds * (t - c);
    out[2] = -a * ds * b;
}

/// `1 / (1 + exp(z))`, saturating to 0 instead of producing NaN for huge `z`.
fn logistic_unit(z: f64) -> f64 {
    let e = z.exp();
    if e.is_infinite() { 0.0 } else { 1.0 / (1.0 + e) }
}
