//! Built-in data sources.

pub mod demo;

pub use demo::*;
