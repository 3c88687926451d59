pub mod cosmology;
pub mod roots;
pub mod stats;

pub use cosmology::luminosity_distance_mpc;
pub use roots::{bisect, RootFindError};
pub use stats::{nan_mean, nan_quantile, AsymmetricError, SampleSummary};

/// `log10(x)` for positive finite `x`, NaN otherwise.
pub fn safe_log10(x: f64) -> f64 {
    if x.is_finite() && x > 0.0 {
        x.log10()
    } else {
        f64::NAN
    }
}

/// Square root of the sum of squares; NaN if any term is NaN.
pub fn quadrature_sum(terms: &[f64]) -> f64 {
    stable_sum(&terms.iter().map(|term| term * term).collect::<Vec<_>>()).sqrt()
}

/// Error of a product/quotient of independent factors with value `ratio`:
/// relative errors of every factor add in quadrature.
pub fn ratio_error(ratio: f64, factors: &[(f64, f64)]) -> f64 {
    let relative: Vec<f64> = factors.iter().map(|&(value, error)| error / value).collect();
    ratio.abs() * quadrature_sum(&relative)
}

/// Asymmetric error bars of `log10(x)` for a linear value `x ± error`.
pub fn log_error_bars(x: f64, error: f64) -> AsymmetricError {
    let log_x = safe_log10(x);
    AsymmetricError {
        lower: log_x - safe_log10(x - error),
        upper: safe_log10(x + error) - log_x,
    }
}

fn kahan_add(sum: &mut f64, correction: &mut f64, value: f64) {
    let corrected = value - *correction;
    let next = *sum + corrected;
    *correction = (next - *sum) - corrected;
    *sum = next;
}

pub fn stable_sum(values: &[f64]) -> f64 {
    let mut sum = 0.0;
    let mut correction = 0.0;

    for &value in values {
        kahan_add(&mut sum, &mut correction, value);
    }

    sum
}

/// `c[0] + c[1] x + c[2] x^2 + ...`
pub fn horner(coefficients: &[f64], x: f64) -> f64 {
    coefficients
        .iter()
        .rev()
        .fold(0.0, |accumulator, &coefficient| accumulator * x + coefficient)
}

pub fn within_tolerance(lhs: f64, rhs: f64, abs_tol: f64, rel_tol: f64) -> bool {
    let abs_diff = (lhs - rhs).abs();
    abs_diff <= abs_tol || abs_diff <= rel_tol * lhs.abs().max(rhs.abs())
}
