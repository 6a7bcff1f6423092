//! CSV / JSON ingest.
//!
//! This module turns an uploaded file into a `TimeSeriesTable`.
//!
//! Design goals:
//! - **Format by extension** (`.csv` / `.json`, case-insensitive)
//! - **Best-effort**: column order, surrounding whitespace and a UTF-8 BOM are
//!   tolerated; suspicious but parseable rows are kept and logged
//! - **Typed failures**: every problem becomes a `LoadFailure` the caller can
//!   recover from (usually by falling back to demo data)

use std::path::Path;

use crate::domain::{InputFormat, Record, TimeSeriesTable};
use crate::error::LoadFailure;

impl InputFormat {
    /// Pick the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self, LoadFailure> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match ext.as_str() {
            "csv" => Ok(InputFormat::Csv),
            "json" => Ok(InputFormat::Json),
            other => Err(LoadFailure::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Read and parse a data file, dispatching on its extension.
pub fn load_path(path: &Path) -> Result<TimeSeriesTable, LoadFailure> {
    let format = InputFormat::from_path(path)?;
    let bytes = std::fs::read(path).map_err(|e| LoadFailure::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let table = load_table(&bytes, format)?;
    log::info!("loaded {} rows from '{}'", table.len(), path.display());
    Ok(table)
}

/// Parse raw bytes in the given format.
pub fn load_table(bytes: &[u8], format: InputFormat) -> Result<TimeSeriesTable, LoadFailure> {
    let records = match format {
        InputFormat::Csv => parse_csv(bytes)?,
        InputFormat::Json => parse_json(bytes)?,
    };
    let table = TimeSeriesTable::new(records)?;
    warn_on_suspicious_rows(&table);
    Ok(table)
}

fn parse_csv(bytes: &[u8]) -> Result<Vec<Record>, LoadFailure> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(bytes);

    // Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on the
    // first header. Normalize headers so serde field matching still works.
    let headers = reader.headers().map_err(csv_failure)?.clone();
    let normalized: csv::StringRecord = headers
        .iter()
        .map(|h| h.trim().trim_start_matches('\u{feff}').to_ascii_lowercase())
        .collect();
    reader.set_headers(normalized);

    let mut records = Vec::new();
    for result in reader.deserialize::<Record>() {
        records.push(result.map_err(csv_failure)?);
    }
    Ok(records)
}

fn csv_failure(e: csv::Error) -> LoadFailure {
    LoadFailure::Csv {
        line: e.position().map(|p| p.line()),
        message: e.to_string(),
    }
}

fn parse_json(bytes: &[u8]) -> Result<Vec<Record>, LoadFailure> {
    // Tolerate a BOM here too.
    let bytes = bytes.strip_prefix("\u{feff}".as_bytes()).unwrap_or(bytes);
    serde_json::from_slice::<Vec<Record>>(bytes).map_err(|e| LoadFailure::Json(e.to_string()))
}

fn warn_on_suspicious_rows(table: &TimeSeriesTable) {
    let records = table.records();
    for (i, pair) in records.windows(2).enumerate() {
        if pair[1].t < pair[0].t {
            log::warn!(
                "row {}: t={} goes backwards (previous t={}); keeping file order",
                i + 1,
                pair[1].t,
                pair[0].t
            );
        }
    }
    for (i, r) in records.iter().enumerate() {
        let negative = r.healthy < 0.0
            || r.infected < 0.0
            || r.recovered < 0.0
            || r.vaccinated.is_some_and(|v| v < 0.0);
        if negative {
            log::warn!("row {i}: negative population value");
        }
    }
}
