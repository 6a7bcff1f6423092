//! Summary statistics and per-step changes.
//!
//! Both functions are pure reductions over a `TimeSeriesTable`; they never fail
//! because the table is guaranteed non-empty and finite.

use crate::domain::{DeltaRow, DeltaSeries, SummaryMetrics, TimeSeriesTable};

/// Compute the scalar summary for a table.
///
/// `total_infected` is a raw sum over rows. It equals the area under the curve
/// only when samples are one time unit apart.
pub fn compute_summary(table: &TimeSeriesTable) -> SummaryMetrics {
    let records = table.records();

    // First occurrence wins on ties: only replace on a strictly larger value.
    let mut peak_idx = 0usize;
    for (i, r) in records.iter().enumerate() {
        if r.infected > records[peak_idx].infected {
            peak_idx = i;
        }
    }
    let peak = &records[peak_idx];

    let max_healthy = column_max(records.iter().map(|r| r.healthy));
    let max_recovered = column_max(records.iter().map(|r| r.recovered));
    let max_infected = peak.infected;

    let total_infected = records.iter().map(|r| r.infected).sum();
    let duration = column_max(records.iter().map(|r| r.t));

    SummaryMetrics {
        peak_infected: peak.infected,
        peak_time: peak.t,
        total_infected,
        attack_rate: attack_rate(max_healthy, max_recovered, max_infected),
        duration,
        max_healthy,
        max_recovered,
        rows: records.len(),
    }
}

/// `max(recovered) / (max(healthy) + max(recovered) + max(infected)) * 100`.
///
/// Zero when no susceptible population was ever observed or when the
/// denominator vanishes.
pub fn attack_rate(max_healthy: f64, max_recovered: f64, max_infected: f64) -> f64 {
    let denom = max_healthy + max_recovered + max_infected;
    if max_healthy == 0.0 || denom == 0.0 {
        return 0.0;
    }
    max_recovered / denom * 100.0
}

/// First differences of `infected` and `recovered` in row order.
///
/// The first row has no predecessor, so its deltas are `None` rather than `0`.
pub fn compute_deltas(table: &TimeSeriesTable) -> DeltaSeries {
    let records = table.records();
    let mut rows = Vec::with_capacity(records.len());

    let mut prev = None;
    for r in records {
        let (infected_delta, recovered_delta) = match prev {
            Some((pi, pr)) => (Some(r.infected - pi), Some(r.recovered - pr)),
            None => (None, None),
        };
        rows.push(DeltaRow {
            t: r.t,
            infected_delta,
            recovered_delta,
        });
        prev = Some((r.infected, r.recovered));
    }

    DeltaSeries { rows }
}

fn column_max(values: impl Iterator<Item = f64>) -> f64 {
    values.fold(f64::NEG_INFINITY, f64::max)
}
