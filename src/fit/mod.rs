//! Curve fitting.
//!
//! Responsibilities:
//!
//! - select the early-phase fit subset
//! - run the Levenberg–Marquardt solver on the sigmoid model
//! - score the fit (R²) and derive the doubling time

pub mod fitter;

pub use fitter::*;
