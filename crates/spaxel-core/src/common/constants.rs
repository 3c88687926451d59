//! Physical constants and fixed atomic-physics line ratios.

/// Speed of light in cm/s.
pub const SPEED_OF_LIGHT_CM_S: f64 = 2.997_924_58e10_f64;
/// Speed of light in km/s.
pub const SPEED_OF_LIGHT_KM_S: f64 = 2.997_924_58e5_f64;
/// Centimetres per parsec.
pub const PARSEC_CM: f64 = 3.086e18_f64;
pub const MPC_CM: f64 = 1.0e6 * PARSEC_CM;
pub const PI: f64 = std::f64::consts::PI;

/// Theoretical strong/weak flux ratios of the fixed-ratio doublets.
pub const NII_6583_6548_RATIO: f64 = 3.06;
pub const OIII_5007_4959_RATIO: f64 = 2.94;
pub const SIII_9531_9069_RATIO: f64 = 2.947;

/// Gaussian sigma to FWHM conversion, `2 sqrt(2 ln 2)`.
pub const SIGMA_TO_FWHM: f64 = 2.354_820_045_030_949_3_f64;

/// Calzetti (2013) H-alpha luminosity to star-formation-rate factor (Msun/yr per erg/s).
pub const HALPHA_SFR_FACTOR: f64 = 5.5e-42_f64;

#[cfg(test)]
mod tests {
    use super::{MPC_CM, PARSEC_CM, SIGMA_TO_FWHM, SPEED_OF_LIGHT_CM_S, SPEED_OF_LIGHT_KM_S};

    #[test]
    fn constants_match_expected_relationships() {
        assert!((SIGMA_TO_FWHM - 2.0 * (2.0 * 2.0_f64.ln()).sqrt()).abs() <= 1.0e-15);
        assert!((SPEED_OF_LIGHT_CM_S - SPEED_OF_LIGHT_KM_S * 1.0e5).abs() <= 1.0e-3);
        assert_eq!(MPC_CM, PARSEC_CM * 1.0e6);
        assert!((SPEED_OF_LIGHT_CM_S.log10() - 10.476_820_702_927_927).abs() < 1.0e-12);
    }
}
