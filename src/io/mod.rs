//! Input/output helpers.
//!
//! - CSV/JSON ingest + validation (`ingest`)
//! - table and summary exports (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
