//! Flat Lambda-CDM distances.

use crate::common::constants::SPEED_OF_LIGHT_KM_S;
use crate::common::CosmologyConfig;

const SIMPSON_INTERVALS: usize = 1000;

fn inverse_hubble_function(z: f64, omega_m: f64) -> f64 {
    let omega_lambda = 1.0 - omega_m;
    1.0 / (omega_m * (1.0 + z).powi(3) + omega_lambda).sqrt()
}

fn comoving_integral(z: f64, omega_m: f64) -> f64 {
    let step = z / SIMPSON_INTERVALS as f64;
    let mut sum = inverse_hubble_function(0.0, omega_m) + inverse_hubble_function(z, omega_m);
    for index in 1..SIMPSON_INTERVALS {
        let weight = if index % 2 == 1 { 4.0 } else { 2.0 };
        sum += weight * inverse_hubble_function(index as f64 * step, omega_m);
    }
    sum * step / 3.0
}

/// Luminosity distance in Mpc at redshift `z`; NaN for negative or non-finite `z`.
pub fn luminosity_distance_mpc(z: f64, cosmology: &CosmologyConfig) -> f64 {
    if !z.is_finite() || z < 0.0 {
        return f64::NAN;
    }
    let hubble_distance = SPEED_OF_LIGHT_KM_S / cosmology.h0;
    (1.0 + z) * hubble_distance * comoving_integral(z, cosmology.omega_m)
}

#[cfg(test)]
mod tests {
    use super::luminosity_distance_mpc;
    use crate::common::CosmologyConfig;

    #[test]
    fn luminosity_distance_matches_reference_cosmology() {
        let cosmology = CosmologyConfig {
            h0: 70.0,
            omega_m: 0.3,
        };
        assert!((luminosity_distance_mpc(0.1, &cosmology) - 460.2999).abs() < 1.0e-2);
        assert!((luminosity_distance_mpc(1.0, &cosmology) - 6607.66).abs() < 0.1);
        assert_eq!(luminosity_distance_mpc(0.0, &cosmology), 0.0);
        assert!(luminosity_distance_mpc(-0.1, &cosmology).is_nan());
        assert!(luminosity_distance_mpc(f64::NAN, &cosmology).is_nan());
    }
}
