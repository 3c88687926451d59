//! NaN-aware summary statistics for Monte-Carlo samples.

use super::stable_sum;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AsymmetricError {
    pub lower: f64,
    pub upper: f64,
}

impl AsymmetricError {
    pub const NAN: Self = Self {
        lower: f64::NAN,
        upper: f64::NAN,
    };
}

fn finite(samples: &[f64]) -> Vec<f64> {
    samples.iter().copied().filter(|value| value.is_finite()).collect()
}

fn finite_sorted(samples: &[f64]) -> Vec<f64> {
    let mut kept = finite(samples);
    kept.sort_unstable_by(f64::total_cmp);
    kept
}

/// Mean of the finite samples; NaN when no sample is finite.
pub fn nan_mean(samples: &[f64]) -> f64 {
    let kept = finite(samples);
    if kept.is_empty() {
        return f64::NAN;
    }
    stable_sum(&kept) / kept.len() as f64
}

/// Quantile `q` of the finite samples with linear interpolation between
/// order statistics (position `(n - 1) q`).
pub fn nan_quantile(samples: &[f64], q: f64) -> f64 {
    let sorted = finite_sorted(samples);
    quantile_of_sorted(&sorted, q)
}

fn quantile_of_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() || !(0.0..=1.0).contains(&q) {
        return f64::NAN;
    }
    let position = (sorted.len() - 1) as f64 * q;
    let lower = position.floor() as usize;
    let upper = (lower + 1).min(sorted.len() - 1);
    let fraction = position - lower as f64;
    sorted[lower] + fraction * (sorted[upper] - sorted[lower])
}

/// Sample mean with 1-sigma bounds taken from the 16th and 84th percentiles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleSummary {
    pub mean: f64,
    pub error: AsymmetricError,
}

impl SampleSummary {
    pub fn from_samples(samples: &[f64]) -> Self {
        let sorted = finite_sorted(samples);
        if sorted.is_empty() {
            return Self {
                mean: f64::NAN,
                error: AsymmetricError::NAN,
            };
        }
        let mean = stable_sum(&sorted) / sorted.len() as f64;
        Self {
            mean,
            error: AsymmetricError {
                lower: mean - quantile_of_sorted(&sorted, 0.16),
                upper: quantile_of_sorted(&sorted, 0.84) - mean,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{nan_mean, nan_quantile, SampleSummary};

    #[test]
    fn nan_samples_are_ignored() {
        let samples = [1.0, f64::NAN, 3.0];
        assert_eq!(nan_mean(&samples), 2.0);
        assert!(nan_mean(&[f64::NAN, f64::NAN]).is_nan());
        assert!(nan_mean(&[]).is_nan());
    }

    #[test]
    fn quantile_interpolates_linearly() {
        let samples = [4.0, 1.0, 3.0, 2.0, f64::NAN];
        assert_eq!(nan_quantile(&samples, 0.0), 1.0);
        assert_eq!(nan_quantile(&samples, 1.0), 4.0);
        assert_eq!(nan_quantile(&samples, 0.5), 2.5);
        assert!((nan_quantile(&samples, 0.16) - 1.48).abs() < 1.0e-12);
        assert!(nan_quantile(&samples, 1.5).is_nan());
    }

    #[test]
    fn constant_samples_have_zero_spread() {
        let summary = SampleSummary::from_samples(&[8.5; 20]);
        assert_eq!(summary.mean, 8.5);
        assert_eq!(summary.error.lower, 0.0);
        assert_eq!(summary.error.upper, 0.0);

        let empty = SampleSummary::from_samples(&[f64::NAN; 3]);
        assert!(empty.mean.is_nan());
        assert!(empty.error.lower.is_nan());
    }

    #[test]
    fn infinite_trials_are_dropped_like_nan() {
        let summary = SampleSummary::from_samples(&[1.0, 2.0, f64::INFINITY, f64::NEG_INFINITY]);
        assert_eq!(summary.mean, 1.5);
        assert!((summary.error.lower - 0.34).abs() < 1.0e-12);
        assert!((summary.error.upper - 0.34).abs() < 1.0e-12);
        assert_eq!(nan_mean(&[3.0, f64::INFINITY]), 3.0);
        assert_eq!(nan_quantile(&[f64::NEG_INFINITY, 5.0], 0.0), 5.0);
    }
}
