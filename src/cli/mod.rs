//! Command-line parsing for the epidemic dashboard.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the metrics/fitting code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::ExportKind;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "epi", version, about = "Epidemic time-series dashboard")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print summary statistics, the logistic fit and ASCII charts.
    Summary(SummaryArgs),
    /// Write the table and/or summary to export files.
    Export(ExportArgs),
    /// Launch the interactive TUI.
    ///
    /// This uses the same analysis pipeline as `epi summary`, but renders results
    /// in a terminal UI using Ratatui.
    Tui(DataArgs),
}

/// Where the data comes from and how it is displayed.
#[derive(Debug, Args, Clone)]
pub struct DataArgs {
    /// CSV or JSON file with columns t, healthy, infected, recovered[, vaccinated].
    ///
    /// Without a file, a synthetic demo epidemic is used.
    #[arg(short = 'i', long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Exit with an error instead of falling back to demo data when the input fails to load.
    #[arg(long)]
    pub strict: bool,

    /// Random seed for the demo data [env: EPI_DEMO_SEED, default 42].
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of demo rows.
    #[arg(long, default_value_t = 100)]
    pub points: usize,

    /// Logarithmic axis for infected [env: EPI_LOG_SCALE].
    #[arg(long)]
    pub log_scale: bool,

    /// Hide the vaccinated series [env: EPI_SHOW_VACCINATION].
    #[arg(long)]
    pub hide_vaccination: bool,

    /// Directory for export files [env: EPI_EXPORT_DIR, default "."].
    #[arg(long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,
}

/// Options for `epi summary`.
#[derive(Debug, Args, Clone)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Disable the terminal charts.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}

/// Options for `epi export`.
#[derive(Debug, Args, Clone)]
pub struct ExportArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Which file(s) to write.
    #[arg(long, value_enum, default_value_t = ExportKind::All)]
    pub format: ExportKind,
}
