//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the input table (`Record`, `TimeSeriesTable`)
//! - derived outputs (`SummaryMetrics`, `DeltaSeries`, `FitResult`)
//! - configuration (`DashConfig`, `DemoOptions`, `RunConfig`)

pub mod types;

pub use types::*;
