//! Growth model implementations.
//!
//! Models are implemented as small, pure functions so that the solver can stay
//! generic.

pub mod model;

pub use model::*;
