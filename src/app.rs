//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and merges environment defaults
//! - loads the table (or demo data)
//! - runs metrics + curve fitting
//! - prints reports/plots or writes exports

use std::path::PathBuf;

use clap::Parser;

use crate::cli::{Command, DataArgs, ExportArgs, SummaryArgs};
use crate::domain::{DashConfig, DemoOptions, RunConfig};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `epi` binary.
pub fn run() -> Result<(), AppError> {
    // We want `epi` and `epi --input data.csv` to behave like `epi tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);
    let env = EnvDefaults::from_env();

    match cli.command {
        Command::Summary(args) => handle_summary(args, &env),
        Command::Export(args) => handle_export(args, &env),
        Command::Tui(args) => crate::tui::run(run_config_from_args(&args, &env)),
    }
}

fn handle_summary(args: SummaryArgs, env: &EnvDefaults) -> Result<(), AppError> {
    let mut config = run_config_from_args(&args.data, env);
    config.plot = !args.no_plot;
    config.plot_width = args.width;
    config.plot_height = args.height;

    let analysis = pipeline::run_analysis(&config)?;
    println!("{}", crate::report::format_run_summary(&analysis));

    if config.plot {
        let mut charts = vec![
            crate::chart::timeseries_chart(&analysis.table, &config.dash),
            crate::chart::stacked_area_chart(&analysis.table),
        ];
        if let Some(fit) = analysis.fit_ok() {
            charts.push(crate::chart::fit_overlay_chart(&analysis.table, fit));
        }
        charts.push(crate::chart::delta_chart(&analysis.deltas));

        for chart in &charts {
            println!(
                "{}",
                crate::plot::render_ascii_chart(chart, config.plot_width, config.plot_height)
            );
        }
    }

    Ok(())
}

fn handle_export(args: ExportArgs, env: &EnvDefaults) -> Result<(), AppError> {
    let config = run_config_from_args(&args.data, env);
    let analysis = pipeline::run_analysis(&config)?;

    let written = crate::io::export::write_exports(
        &config.export_dir,
        args.format,
        &analysis.table,
        &analysis.summary,
        analysis.fit_ok(),
    )?;
    for path in written {
        println!("{}", path.display());
    }
    Ok(())
}

/// Defaults read from the environment (and `.env`, loaded in `main`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvDefaults {
    pub log_scale: Option<bool>,
    pub show_vaccination: Option<bool>,
    pub demo_seed: Option<u64>,
    pub export_dir: Option<PathBuf>,
}

impl EnvDefaults {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unparseable values are logged and ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let flag = |key: &str| {
            let raw = lookup(key)?;
            let parsed = parse_bool(&raw);
            if parsed.is_none() {
                log::warn!("ignoring {key}={raw:?}: expected a boolean");
            }
            parsed
        };

        let demo_seed = lookup("EPI_DEMO_SEED").and_then(|raw| match raw.trim().parse() {
            Ok(seed) => Some(seed),
            Err(_) => {
                log::warn!("ignoring EPI_DEMO_SEED={raw:?}: expected an unsigned integer");
                None
            }
        });

        Self {
            log_scale: flag("EPI_LOG_SCALE"),
            show_vaccination: flag("EPI_SHOW_VACCINATION"),
            demo_seed,
            export_dir: lookup("EPI_EXPORT_DIR")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Merge CLI flags over environment defaults.
///
/// Boolean flags can only switch a setting on (`--log-scale`) or off
/// (`--hide-vaccination`); otherwise the environment decides.
pub fn run_config_from_args(args: &DataArgs, env: &EnvDefaults) -> RunConfig {
    let defaults = DashConfig::default();
    let dash = DashConfig {
        log_scale: args.log_scale || env.log_scale.unwrap_or(defaults.log_scale),
        show_vaccination: !args.hide_vaccination
            && env.show_vaccination.unwrap_or(defaults.show_vaccination),
    };

    RunConfig {
        input: args.input.clone(),
        strict: args.strict,
        demo: DemoOptions {
            points: args.points,
            seed: args
                .seed
                .or(env.demo_seed)
                .unwrap_or(DemoOptions::default().seed),
        },
        dash,
        plot: true,
        plot_width: 100,
        plot_height: 25,
        export_dir: args
            .out_dir
            .clone()
            .or_else(|| env.export_dir.clone())
            .unwrap_or_else(|| PathBuf::from(".")),
    }
}

/// Rewrite argv so `epi` defaults to `epi tui`.
///
/// Rules:
/// - `epi`                       -> `epi tui`
/// - `epi --input data.csv ...`  -> `epi tui --input data.csv ...`
/// - `epi --help/--version/-h`   -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "summary" | "export" | "tui");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}
