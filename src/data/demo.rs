//! Synthetic demo epidemic.
//!
//! Used when no file is supplied. The shape is deterministic; noise comes from a
//! seeded RNG so the same options always produce the same table.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{DemoOptions, Record, TimeSeriesTable};
use crate::error::AppError;

/// Standard deviation of the noise added to `healthy`.
const HEALTHY_NOISE_SD: f64 = 2.0;
/// Standard deviation of the noise added to `infected`.
const INFECTED_NOISE_SD: f64 = 1.0;
/// Final value of the linear vaccination ramp.
const VACCINATED_FINAL: f64 = 30.0;

/// Generate the demo table.
///
/// Per time step `t = 0, 1, ...`:
///
/// ```text
/// healthy    = 100 / (1 + exp((t - 30) / 10)) + N(0, 2)
/// infected   = 50 · exp(-t / 20) + N(0, 1)
/// recovered  = 100 - healthy - |infected|
/// vaccinated = linear ramp 0 → 30
/// ```
///
/// `recovered` is derived from the noisy values; every column is clamped at 0
/// afterwards.
pub fn generate_demo(opts: &DemoOptions) -> Result<TimeSeriesTable, AppError> {
    if opts.points == 0 {
        return Err(AppError::new(2, "Demo point count must be > 0."));
    }

    let mut rng = StdRng::seed_from_u64(opts.seed);
    let healthy_noise = Normal::new(0.0, HEALTHY_NOISE_SD)
        .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;
    let infected_noise = Normal::new(0.0, INFECTED_NOISE_SD)
        .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;

    let mut records = Vec::with_capacity(opts.points);
    for i in 0..opts.points {
        let t = i as f64;
        let healthy = 100.0 / (1.0 + ((t - 30.0) / 10.0).exp()) + healthy_noise.sample(&mut rng);
        let infected = 50.0 * (-t / 20.0).exp() + infected_noise.sample(&mut rng);
        let recovered = 100.0 - healthy - infected.abs();

        records.push(Record {
            t,
            healthy: healthy.max(0.0),
            infected: infected.max(0.0),
            recovered: recovered.max(0.0),
            vaccinated: Some(vaccination_ramp(i, opts.points)),
        });
    }

    TimeSeriesTable::new(records).map_err(|e| AppError::new(4, format!("Demo data invalid: {e}")))
}

/// Evenly spaced ramp from 0 to `VACCINATED_FINAL` over `n` samples (inclusive).
fn vaccination_ramp(i: usize, n: usize) -> f64 {
    if n <= 1 {
        return 0.0;
    }
    VACCINATED_FINAL * i as f64 / (n - 1) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_is_reproducible_for_a_seed() {
        let opts = DemoOptions::default();
        let a = generate_demo(&opts).unwrap();
        let b = generate_demo(&opts).unwrap();
        assert_eq!(a, b);

        let c = generate_demo(&DemoOptions { seed: 7, ..opts }).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn demo_shape_and_clamping() {
        let table = generate_demo(&DemoOptions::default()).unwrap();
        assert_eq!(table.len(), 100);

        let records = table.records();
        assert_eq!(records[0].t, 0.0);
        assert_eq!(records[99].t, 99.0);
        assert_eq!(records[0].vaccinated, Some(0.0));
        assert_eq!(records[99].vaccinated, Some(30.0));

        for r in records {
            assert!(r.healthy >= 0.0);
            assert!(r.infected >= 0.0);
            assert!(r.recovered >= 0.0);
            assert!(r.vaccinated.unwrap() >= 0.0);
        }

        // Infections start near 50 and decay towards zero.
        assert!(records[0].infected > 40.0);
        assert!(records[99].infected < 5.0);
    }

    #[test]
    fn zero_points_is_rejected() {
        let err = generate_demo(&DemoOptions { points: 0, seed: 1 }).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn ramp_endpoints() {
        assert_eq!(vaccination_ramp(0, 1), 0.0);
        assert_eq!(vaccination_ramp(0, 5), 0.0);
        assert_eq!(vaccination_ramp(4, 5), 30.0);
    }
}
