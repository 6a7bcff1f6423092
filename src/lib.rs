//! `epi-dash` library crate.
//!
//! The binary (`epi`) is a thin wrapper around this library so that:
//!
//! - core logic (metrics, curve fitting, codecs) is testable without spawning processes
//! - the CLI and the TUI share one analysis pipeline
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod chart;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod metrics;
pub mod models;
pub mod plot;
pub mod report;
pub mod tui;
