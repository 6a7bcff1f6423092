//! End-to-end checks through the public library API: load, analyze, export,
//! re-load.

use std::path::PathBuf;

use epi_dash::app::pipeline::{DataSource, analyze, run_analysis};
use epi_dash::chart::{stacked_area_chart, timeseries_chart};
use epi_dash::domain::{DashConfig, DemoOptions, ExportKind, InputFormat, Record, RunConfig, TimeSeriesTable};
use epi_dash::io::{load_path, load_table, table_to_csv, write_exports};
use epi_dash::plot::render_ascii_chart;

fn config(input: Option<PathBuf>, export_dir: PathBuf) -> RunConfig {
    RunConfig {
        input,
        strict: true,
        demo: DemoOptions::default(),
        dash: DashConfig::default(),
        plot: false,
        plot_width: 60,
        plot_height: 15,
        export_dir,
    }
}

/// Logistic epidemic `1000 / (1 + exp(-0.3 (t - 25)))` over `t = 0..39`.
fn logistic_table() -> TimeSeriesTable {
    let records = (0..40)
        .map(|i| {
            let t = i as f64;
            let infected = 1000.0 / (1.0 + (-0.3 * (t - 25.0)).exp());
            Record {
                t,
                healthy: 5000.0 - infected,
                infected,
                recovered: t * 10.0,
                vaccinated: None,
            }
        })
        .collect();
    TimeSeriesTable::new(records).unwrap()
}

#[test]
fn exported_files_reload_to_the_same_analysis() {
    let scratch = tempfile::tempdir().unwrap();
    let dir = scratch.path().join("exports");
    let original = analyze(logistic_table(), DataSource::Demo { seed: 0 });

    let written = write_exports(
        &dir,
        ExportKind::All,
        &original.table,
        &original.summary,
        original.fit_ok(),
    )
    .unwrap();
    assert_eq!(written.len(), 3);

    for name in ["disease_data.csv", "disease_data.json"] {
        let path = dir.join(name);
        let cfg = config(Some(path.clone()), dir.clone());
        let reloaded = run_analysis(&cfg).unwrap();
        assert_eq!(reloaded.source, DataSource::File(path));
        assert_eq!(reloaded.table.len(), 40);
        for (a, b) in original.table.records().iter().zip(reloaded.table.records()) {
            assert!((a.infected - b.infected).abs() < 1e-9);
            assert!((a.t - b.t).abs() < 1e-9);
        }
        assert!((reloaded.summary.peak_infected - original.summary.peak_infected).abs() < 1e-9);
    }

    let summary = std::fs::read_to_string(dir.join("summary.csv")).unwrap();
    assert!(summary.starts_with("Metric,Value\n"));
    assert!(summary.contains("Doubling Time (days),2.3"));
}

#[test]
fn logistic_epidemic_is_recovered_by_the_fit() {
    let analysis = analyze(logistic_table(), DataSource::Demo { seed: 0 });
    let fit = analysis.fit.as_ref().unwrap();
    assert!((fit.a - 1000.0).abs() < 5.0, "a={}", fit.a);
    assert!((fit.b - 0.3).abs() < 2e-3, "b={}", fit.b);
    assert!((fit.c - 25.0).abs() < 0.05, "c={}", fit.c);
    assert!(fit.r_squared > 0.9999);
    assert_eq!(fit.predicted.len(), 40);
}

#[test]
fn early_peak_reports_insufficient_data() {
    let csv = "t,healthy,infected,recovered\n0,95,5,0\n1,90,10,0\n2,80,20,0\n3,65,35,0\n4,60,30,10\n5,60,20,20\n";
    let table = load_table(csv.as_bytes(), InputFormat::Csv).unwrap();
    let analysis = analyze(table, DataSource::Demo { seed: 0 });
    assert_eq!(analysis.fit.unwrap_err().reason(), "insufficient_data");
    assert_eq!(analysis.summary.peak_infected, 35.0);
    assert_eq!(analysis.summary.peak_time, 3.0);
}

#[test]
fn demo_pipeline_renders_every_chart() {
    let cfg = config(None, PathBuf::from("."));
    let analysis = run_analysis(&cfg).unwrap();
    assert_eq!(analysis.table.len(), 100);
    if let Ok(fit) = &analysis.fit {
        assert_eq!(fit.predicted.len(), 100);
        assert!(fit.fit_points >= 4 && fit.fit_points < 100);
    }

    for spec in [
        timeseries_chart(&analysis.table, &DashConfig { log_scale: true, show_vaccination: true }),
        stacked_area_chart(&analysis.table),
    ] {
        let txt = render_ascii_chart(&spec, 60, 15);
        assert_eq!(txt.lines().count(), 15 + 3);
        assert!(txt.starts_with(&spec.title));
    }
}

#[test]
fn csv_export_reparses_in_file_order() {
    let csv = "t,healthy,infected,recovered,vaccinated\n3,1,2,3,\n1,4,5,6,7.25\n";
    let table = load_table(csv.as_bytes(), InputFormat::Csv).unwrap();
    let out = table_to_csv(&table).unwrap();
    let back = load_table(out.as_bytes(), InputFormat::Csv).unwrap();
    assert_eq!(back, table);
}

#[test]
fn unsupported_extension_is_rejected_in_strict_mode() {
    let scratch = tempfile::tempdir().unwrap();
    let dir = scratch.path().to_path_buf();
    let path = dir.join("data.txt");
    std::fs::write(&path, "t,healthy,infected,recovered\n0,1,1,1\n").unwrap();

    assert!(load_path(&path).is_err());
    let err = run_analysis(&config(Some(path), dir.clone())).unwrap_err();
    assert_eq!(err.exit_code(), 2);
}
