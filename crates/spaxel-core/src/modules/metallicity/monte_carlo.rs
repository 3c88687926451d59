//! Monte-Carlo error propagation for metallicity estimates.
//!
//! Each row is resampled on its own: the worker owns a copy of the row and an
//! RNG seeded from the run seed and the row index, so results do not depend on
//! the thread count or on scheduling.

use super::solver::Calibration;
use crate::common::MonteCarloConfig;
use crate::domain::{EmissionLine, FluxRow, SpaxelError, SpaxelResult};
use crate::numerics::SampleSummary;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use rayon::prelude::*;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResampledEstimate {
    pub log_oh12: SampleSummary,
    pub log_u: SampleSummary,
}

/// splitmix64 finaliser over `seed` and `index`.
pub fn row_seed(seed: u64, index: usize) -> u64 {
    let mut z = seed ^ (index as u64).wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Perturbs every line in `lines` by its own Gaussian error `niters` times
/// and summarises the resulting estimates. NaN trials are dropped.
pub fn resample(
    calibration: &Calibration,
    lines: &[EmissionLine],
    row: &FluxRow,
    niters: usize,
    seed: u64,
) -> SpaxelResult<ResampledEstimate> {
    if let Some(&line) = lines.iter().find(|&&line| row.errors.get(line) < 0.0) {
        return Err(SpaxelError::computation(
            "RUN.METALLICITY_WORKER",
            format!(
                "metallicity diagnostic {} failed for {}: {} is negative ({})",
                calibration.diagnostic,
                row.id,
                line.error_column_name(),
                row.errors.get(line)
            ),
        ));
    }

    let mut rng = StdRng::seed_from_u64(row_seed(seed, row.index));
    let mut trial = row.clone();
    let mut log_oh12 = Vec::with_capacity(niters);
    let mut log_u = Vec::with_capacity(niters);
    for _ in 0..niters {
        for &line in lines {
            let noise: f64 = rng.sample(StandardNormal);
            trial.values.set(line, row.flux(line) + row.errors.get(line) * noise);
        }
        let estimate = calibration.estimate(&trial);
        log_oh12.push(estimate.log_oh12);
        log_u.push(estimate.log_u);
    }

    Ok(ResampledEstimate {
        log_oh12: SampleSummary::from_samples(&log_oh12),
        log_u: SampleSummary::from_samples(&log_u),
    })
}

/// Resamples every row on a dedicated pool of `config.nthreads` workers.
/// The first failing row aborts the whole call.
pub fn resample_rows(
    calibration: &Calibration,
    lines: &[EmissionLine],
    rows: &[FluxRow],
    config: &MonteCarloConfig,
) -> SpaxelResult<Vec<ResampledEstimate>> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.nthreads)
        .build()
        .map_err(|error| {
            SpaxelError::internal(
                "SYS.THREAD_POOL",
                format!("failed to start {} metallicity workers: {error}", config.nthreads),
            )
        })?;
    debug!(
        diagnostic = %calibration.diagnostic,
        rows = rows.len(),
        niters = config.niters,
        threads = config.nthreads,
        "resampling metallicity rows"
    );
    pool.install(|| {
        rows.par_iter()
            .map(|row| resample(calibration, lines, row, config.niters, config.seed))
            .collect()
    })
}
