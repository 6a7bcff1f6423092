//! Export the table and summary statistics.
//!
//! The exports are meant to be easy to consume in spreadsheets or downstream
//! scripts, and the table exports re-load through `io::ingest` unchanged.

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::{ExportKind, FitResult, SummaryMetrics, TimeSeriesTable};
use crate::error::AppError;

pub const TABLE_CSV_FILE: &str = "disease_data.csv";
pub const TABLE_JSON_FILE: &str = "disease_data.json";
pub const SUMMARY_CSV_FILE: &str = "summary.csv";

/// Serialize the table as CSV.
///
/// The `vaccinated` column is written only when the table has vaccinated values.
/// Floats use Rust's shortest round-trip representation.
pub fn table_to_csv(table: &TimeSeriesTable) -> Result<String, AppError> {
    let with_vaccinated = table.has_vaccinated();
    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header = vec!["t", "healthy", "infected", "recovered"];
    if with_vaccinated {
        header.push("vaccinated");
    }
    writer
        .write_record(&header)
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    for r in table.records() {
        let mut row = vec![
            r.t.to_string(),
            r.healthy.to_string(),
            r.infected.to_string(),
            r.recovered.to_string(),
        ];
        if with_vaccinated {
            row.push(r.vaccinated.map(|v| v.to_string()).unwrap_or_default());
        }
        writer
            .write_record(&row)
            .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }

    finish_csv(writer)
}

/// Serialize the table as a JSON array of records.
pub fn table_to_json(table: &TimeSeriesTable) -> Result<String, AppError> {
    serde_json::to_string(table.records())
        .map_err(|e| AppError::new(2, format!("Failed to write export JSON: {e}")))
}

/// Human-readable `Metric,Value` rows.
///
/// Fit rows are appended only when a fit is available.
pub fn summary_rows(summary: &SummaryMetrics, fit: Option<&FitResult>) -> Vec<(String, String)> {
    let mut rows = vec![
        ("Peak Infected".to_string(), format!("{:.0}", summary.peak_infected)),
        ("Peak Time".to_string(), format!("{:.0}", summary.peak_time)),
        ("Total Infected (sum)".to_string(), format!("{:.0}", summary.total_infected)),
        ("Attack Rate (%)".to_string(), format!("{:.2}%", summary.attack_rate)),
        ("Duration (days)".to_string(), format!("{:.0}", summary.duration)),
        ("Max Healthy".to_string(), format!("{:.0}", summary.max_healthy)),
        ("Max Recovered".to_string(), format!("{:.0}", summary.max_recovered)),
    ];
    if let Some(fit) = fit {
        rows.push(("R² Score".to_string(), format!("{:.4}", fit.r_squared)));
        rows.push(("Peak (fitted)".to_string(), format!("{:.0}", fit.a)));
        rows.push(("Doubling Time (days)".to_string(), format!("{:.1}", fit.doubling_time)));
    }
    rows
}

/// Serialize the summary table as CSV (`Metric,Value`).
pub fn summary_to_csv(summary: &SummaryMetrics, fit: Option<&FitResult>) -> Result<String, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(["Metric", "Value"])
        .map_err(|e| AppError::new(2, format!("Failed to write summary CSV header: {e}")))?;
    for (metric, value) in summary_rows(summary, fit) {
        writer
            .write_record([metric.as_str(), value.as_str()])
            .map_err(|e| AppError::new(2, format!("Failed to write summary CSV row: {e}")))?;
    }
    finish_csv(writer)
}

/// Write the requested export file(s) into `dir`, returning the paths written.
pub fn write_exports(
    dir: &Path,
    kind: ExportKind,
    table: &TimeSeriesTable,
    summary: &SummaryMetrics,
    fit: Option<&FitResult>,
) -> Result<Vec<PathBuf>, AppError> {
    fs::create_dir_all(dir)
        .map_err(|e| AppError::new(2, format!("Failed to create export dir '{}': {e}", dir.display())))?;

    let mut written = Vec::new();
    if matches!(kind, ExportKind::Csv | ExportKind::All) {
        written.push(write_file(dir, TABLE_CSV_FILE, &table_to_csv(table)?)?);
    }
    if matches!(kind, ExportKind::Json | ExportKind::All) {
        written.push(write_file(dir, TABLE_JSON_FILE, &table_to_json(table)?)?);
    }
    if matches!(kind, ExportKind::Summary | ExportKind::All) {
        written.push(write_file(dir, SUMMARY_CSV_FILE, &summary_to_csv(summary, fit)?)?);
    }
    Ok(written)
}

fn write_file(dir: &Path, name: &str, contents: &str) -> Result<PathBuf, AppError> {
    let path = dir.join(name);
    fs::write(&path, contents)
        .map_err(|e| AppError::new(2, format!("Failed to write '{}': {e}", path.display())))?;
    log::info!("wrote {}", path.display());
    Ok(path)
}

fn finish_csv(writer: csv::Writer<Vec<u8>>) -> Result<String, AppError> {
    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::new(2, format!("Failed to flush CSV: {e}")))?;
    String::from_utf8(bytes).map_err(|e| AppError::new(2, format!("CSV output is not UTF-8: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{InputFormat, Record};
    use crate::io::ingest::load_table;
    use crate::metrics::compute_summary;

    fn sample_table(vaccinated: bool) -> TimeSeriesTable {
        let rows = [
            (0.0, 100.0, 5.0, 0.0),
            (1.0, 94.7, 10.125, 3.3),
            (2.5, 90.0, 0.1 + 0.2, 5.0),
            (3.0, 80.5, 1e-7, 12.75),
        ];
        let records = rows
            .iter()
            .enumerate()
            .map(|(i, &(t, healthy, infected, recovered))| Record {
                t,
                healthy,
                infected,
                recovered,
                vaccinated: vaccinated.then_some(i as f64 / 3.0),
            })
            .collect();
        TimeSeriesTable::new(records).unwrap()
    }

    fn assert_tables_close(a: &TimeSeriesTable, b: &TimeSeriesTable) {
        assert_eq!(a.len(), b.len());
        for (x, y) in a.records().iter().zip(b.records()) {
            assert!((x.t - y.t).abs() < 1e-9);
            assert!((x.healthy - y.healthy).abs() < 1e-9);
            assert!((x.infected - y.infected).abs() < 1e-9);
            assert!((x.recovered - y.recovered).abs() < 1e-9);
            match (x.vaccinated, y.vaccinated) {
                (Some(p), Some(q)) => assert!((p - q).abs() < 1e-9),
                (None, None) => {}
                other => panic!("vaccinated mismatch: {other:?}"),
            }
        }
    }

    #[test]
    fn csv_round_trip_preserves_values_and_order() {
        for vaccinated in [true, false] {
            let table = sample_table(vaccinated);
            let csv = table_to_csv(&table).unwrap();
            let back = load_table(csv.as_bytes(), InputFormat::Csv).unwrap();
            assert_tables_close(&table, &back);
        }
    }

    #[test]
    fn json_round_trip_preserves_values_and_order() {
        let table = sample_table(true);
        let json = table_to_json(&table).unwrap();
        let back = load_table(json.as_bytes(), InputFormat::Json).unwrap();
        assert_tables_close(&table, &back);
    }

    #[test]
    fn csv_header_omits_absent_vaccinated_column() {
        let csv = table_to_csv(&sample_table(false)).unwrap();
        assert!(csv.starts_with("t,healthy,infected,recovered\n"));

        let csv = table_to_csv(&sample_table(true)).unwrap();
        assert!(csv.starts_with("t,healthy,infected,recovered,vaccinated\n"));
    }

    #[test]
    fn json_omits_missing_vaccinated() {
        let json = table_to_json(&sample_table(false)).unwrap();
        assert!(!json.contains("vaccinated"));
        assert!(json.starts_with("[{\"t\":0.0,"));
    }

    #[test]
    fn summary_csv_formats_values() {
        let table = sample_table(false);
        let summary = compute_summary(&table);
        let csv = summary_to_csv(&summary, None).unwrap();

        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Metric,Value");
        assert_eq!(lines[1], "Peak Infected,10");
        assert_eq!(lines[2], "Peak Time,1");
        assert_eq!(lines[3], "Total Infected (sum),15");
        assert_eq!(lines[5], "Duration (days),3");
        assert_eq!(lines[6], "Max Healthy,100");
        assert_eq!(lines.len(), 8);
        assert!(lines[4].starts_with("Attack Rate (%),"));
        assert!(lines[4].ends_with('%'));
    }

    #[test]
    fn summary_includes_fit_rows_when_available() {
        let table = sample_table(false);
        let summary = compute_summary(&table);
        let fit = FitResult {
            a: 812.4,
            b: 0.25,
            c: 30.0,
            r_squared: 0.98765,
            doubling_time: std::f64::consts::LN_2 / 0.25,
            predicted: vec![0.0; 4],
            fit_points: 4,
            evaluations: 12,
        };
        let rows = summary_rows(&summary, Some(&fit));
        assert_eq!(rows.len(), 10);
        assert_eq!(rows[7], ("R² Score".to_string(), "0.9877".to_string()));
        assert_eq!(rows[8], ("Peak (fitted)".to_string(), "812".to_string()));
        assert_eq!(rows[9], ("Doubling Time (days)".to_string(), "2.8".to_string()));
    }
}
