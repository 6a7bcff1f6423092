//! Formatted terminal output for `epi summary`.
//!
//! We keep formatting code in one place so:
//! - the metrics/fitting code stays clean and testable
//! - output changes are localized (snapshot-friendly)

use crate::app::pipeline::Analysis;
use crate::error::FitFailure;
use crate::io::export::summary_rows;

/// Format the full run summary (source + key metrics + fit section).
pub fn format_run_summary(analysis: &Analysis) -> String {
    let mut out = String::new();

    out.push_str("=== epi - Disease Spread Analysis ===\n");
    out.push_str(&format!("Source: {}\n", analysis.source.describe()));

    let t = analysis.table.times();
    let (t_min, t_max) = t
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    out.push_str(&format!(
        "Rows: n={} | t=[{t_min:.1}, {t_max:.1}] | vaccinated: {}\n",
        analysis.table.len(),
        if analysis.table.has_vaccinated() { "yes" } else { "no" },
    ));

    out.push_str("\nSummary statistics:\n");
    out.push_str(&format_metric_table(&summary_rows(&analysis.summary, None)));

    out.push_str("\nLogistic fit (early phase):\n");
    out.push_str(&format_fit_section(&analysis.fit));

    out
}

/// The fit section: fitted parameters, or the reason the fit is unavailable.
pub fn format_fit_section(fit: &Result<crate::domain::FitResult, FitFailure>) -> String {
    match fit {
        Ok(fit) => {
            let mut out = String::new();
            out.push_str(&format!(
                "- model : {:.3} / (1 + exp(-{:.5} * (t - {:.3})))\n",
                fit.a, fit.b, fit.c
            ));
            out.push_str(&format!("- R²    : {:.4}\n", fit.r_squared));
            out.push_str(&format!("- peak (fitted)  : {:.0}\n", fit.a));
            out.push_str(&format!("- doubling time  : {:.1} days\n", fit.doubling_time));
            out.push_str(&format!(
                "- fit subset     : {} rows, {} evaluations\n",
                fit.fit_points, fit.evaluations
            ));
            out
        }
        Err(failure) => format!("- unavailable ({}): {failure}\n", failure.reason()),
    }
}

fn format_metric_table(rows: &[(String, String)]) -> String {
    let width = rows.iter().map(|(m, _)| m.chars().count()).max().unwrap_or(0);
    let mut out = String::new();
    for (metric, value) in rows {
        let pad = width - metric.chars().count();
        out.push_str(&format!("  {metric}{} {value:>10}\n", " ".repeat(pad)));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pipeline::{DataSource, analyze};
    use crate::domain::{Record, TimeSeriesTable};

    fn analysis(infected: &[f64]) -> Analysis {
        let records = infected
            .iter()
            .enumerate()
            .map(|(i, &v)| Record {
                t: i as f64,
                healthy: 100.0 - v,
                infected: v,
                recovered: 0.0,
                vaccinated: None,
            })
            .collect();
        let table = TimeSeriesTable::new(records).unwrap();
        analyze(table, DataSource::Demo { seed: 1 })
    }

    #[test]
    fn summary_lists_metrics_and_fit_failure_reason() {
        let txt = format_run_summary(&analysis(&[5.0, 10.0, 20.0, 35.0, 30.0, 20.0]));
        assert!(txt.contains("Source: demo data (seed 1)"));
        assert!(txt.contains("Rows: n=6 | t=[0.0, 5.0] | vaccinated: no"));
        assert!(txt.contains("  Peak Infected"));
        assert!(txt.contains("- unavailable (insufficient_data): only 2 early-phase points"));
    }

    #[test]
    fn successful_fit_prints_parameters() {
        let infected: Vec<f64> = (0..7).map(|i| 2f64.powi(i)).collect();
        let txt = format_run_summary(&analysis(&infected));
        assert!(txt.contains("- R²    : 1.0000") || txt.contains("- R²    : 0.9999"), "{txt}");
        assert!(txt.contains("- fit subset     : 5 rows"));
    }

    #[test]
    fn metric_table_aligns_values() {
        let rows = vec![
            ("A".to_string(), "1".to_string()),
            ("Longer".to_string(), "22".to_string()),
        ];
        assert_eq!(
            format_metric_table(&rows),
            "  A               1\n  Longer         22\n"
        );
    }
}
