use crate::domain::{SpaxelError, SpaxelResult};
use crate::numerics::bisect;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum DensityDiagnostic {
    Proxauf2014,
    Sanders2016,
}

impl DensityDiagnostic {
    pub const ALL: [Self; 2] = [Self::Proxauf2014, Self::Sanders2016];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Proxauf2014 => "Proxauf2014",
            Self::Sanders2016 => "Sanders2016",
        }
    }

    pub const fn supports(self, line: DensityLine) -> bool {
        match self {
            Self::Proxauf2014 => matches!(line, DensityLine::Sii),
            Self::Sanders2016 => true,
        }
    }
}

impl Display for DensityDiagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DensityDiagnostic {
    type Err = SpaxelError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|diagnostic| diagnostic.as_str().eq_ignore_ascii_case(token.trim()))
            .ok_or_else(|| {
                SpaxelError::input_validation(
                    "INPUT.DENSITY_DIAGNOSTIC",
                    format!("unknown electron density diagnostic '{token}' (expected Proxauf2014 or Sanders2016)"),
                )
            })
    }
}

/// Density-sensitive doublet whose flux ratio is the diagnostic input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum DensityLine {
    #[serde(rename = "[SII]")]
    Sii,
    #[serde(rename = "[OII]")]
    Oii,
}

impl DensityLine {
    pub const ALL: [Self; 2] = [Self::Sii, Self::Oii];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sii => "[SII]",
            Self::Oii => "[OII]",
        }
    }

    /// `[SII] ratio` = SII6716/SII6731, `[OII] ratio` = OII3729/OII3726.
    pub const fn ratio_column(self) -> &'static str {
        match self {
            Self::Sii => "[SII] ratio",
            Self::Oii => "[OII] ratio",
        }
    }
}

impl Display for DensityLine {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DensityLine {
    type Err = SpaxelError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let normalized = token.trim().trim_start_matches('[').trim_end_matches(']');
        Self::ALL
            .into_iter()
            .find(|line| line.as_str()[1..line.as_str().len() - 1].eq_ignore_ascii_case(normalized))
            .ok_or_else(|| {
                SpaxelError::input_validation(
                    "INPUT.DENSITY_LINE",
                    format!("unknown density-sensitive doublet '{token}' (expected [SII] or [OII])"),
                )
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DensityRequest {
    pub diagnostic: DensityDiagnostic,
    pub line: DensityLine,
}

impl DensityRequest {
    pub const fn new(diagnostic: DensityDiagnostic, line: DensityLine) -> Self {
        Self { diagnostic, line }
    }

    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new(DensityDiagnostic::Proxauf2014, DensityLine::Sii),
            Self::new(DensityDiagnostic::Sanders2016, DensityLine::Sii),
            Self::new(DensityDiagnostic::Sanders2016, DensityLine::Oii),
        ]
    }

    pub fn validate(&self) -> SpaxelResult<()> {
        if self.diagnostic.supports(self.line) {
            Ok(())
        } else {
            Err(SpaxelError::input_validation(
                "INPUT.DENSITY_DIAGNOSTIC",
                format!(
                    "electron density diagnostic {} has no {} calibration",
                    self.diagnostic, self.line
                ),
            ))
        }
    }

    pub fn density_column(&self) -> String {
        format!("n_e ({} ({}))", self.diagnostic, self.line)
    }

    pub fn lower_limit_column(&self) -> String {
        format!("{} (lower limit)", self.density_column())
    }

    pub fn upper_limit_column(&self) -> String {
        format!("{} (upper limit)", self.density_column())
    }

    pub fn electron_density(&self, ratio: f64) -> DensityEstimate {
        match self.diagnostic {
            DensityDiagnostic::Proxauf2014 => proxauf2014_density(ratio),
            DensityDiagnostic::Sanders2016 => sanders2016_density(sanders2016_coefficients(self.line), ratio),
        }
    }

    /// Flux ratio the calibration predicts at density `n_e`; NaN outside the
    /// calibrated density range.
    pub fn ratio_for_density(&self, n_e: f64) -> f64 {
        match self.diagnostic {
            DensityDiagnostic::Proxauf2014 => proxauf2014_ratio(n_e),
            DensityDiagnostic::Sanders2016 => sanders2016_ratio(sanders2016_coefficients(self.line), n_e),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DensityEstimate {
    pub n_e: f64,
    pub lower_limit: bool,
    pub upper_limit: bool,
}

impl DensityEstimate {
    const UNDEFINED: Self = Self {
        n_e: f64::NAN,
        lower_limit: false,
        upper_limit: false,
    };

    const fn measured(n_e: f64) -> Self {
        Self {
            n_e,
            lower_limit: false,
            upper_limit: false,
        }
    }

    const fn at_lower_limit(n_e: f64) -> Self {
        Self {
            n_e,
            lower_limit: true,
            upper_limit: false,
        }
    }

    const fn at_upper_limit(n_e: f64) -> Self {
        Self {
            n_e,
            lower_limit: false,
            upper_limit: true,
        }
    }
}

pub const PROXAUF2014_R_MIN: f64 = 0.4375;
pub const PROXAUF2014_R_MAX: f64 = 1.4484;
pub const PROXAUF2014_LOW_DENSITY: f64 = 40.0;
pub const PROXAUF2014_HIGH_DENSITY: f64 = 1.0e4;
// The tangent term has a pole at R = 1.44712; the curve is monotonic below it.
const PROXAUF2014_MONOTONIC_R_MAX: f64 = 1.447;

fn proxauf2014_log_density(ratio: f64) -> f64 {
    0.0543 * (-3.0553 * ratio + 2.8506).tan() + 6.98 - 10.6905 * ratio + 9.9186 * ratio.powi(2)
        - 3.5442 * ratio.powi(3)
}

/// Proxauf et al. (2014) [SII] calibration.
pub fn proxauf2014_density(ratio: f64) -> DensityEstimate {
    match ratio {
        r if !r.is_finite() => DensityEstimate::UNDEFINED,
        r if r > PROXAUF2014_R_MAX => DensityEstimate::at_lower_limit(PROXAUF2014_LOW_DENSITY),
        r if r < PROXAUF2014_R_MIN => DensityEstimate::at_upper_limit(PROXAUF2014_HIGH_DENSITY),
        r => DensityEstimate::measured(10.0_f64.powf(proxauf2014_log_density(r))),
    }
}

fn proxauf2014_ratio(n_e: f64) -> f64 {
    if !(n_e.is_finite() && n_e > 0.0) {
        return f64::NAN;
    }
    let target = n_e.log10();
    bisect(
        |ratio| proxauf2014_log_density(ratio) - target,
        PROXAUF2014_R_MIN,
        PROXAUF2014_MONOTONIC_R_MAX,
        1.0e-13,
        200,
    )
    .unwrap_or(f64::NAN)
}

/// Coefficients of `R(n) = a (b + n) / (c + n)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SandersCoefficients {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

pub const SANDERS2016_LOW_DENSITY: f64 = 1.0;
pub const SANDERS2016_HIGH_DENSITY: f64 = 1.0e5;

pub const fn sanders2016_coefficients(line: DensityLine) -> SandersCoefficients {
    match line {
        DensityLine::Oii => SandersCoefficients {
            a: 0.3771,
            b: 2468.0,
            c: 638.4,
        },
        DensityLine::Sii => SandersCoefficients {
            a: 0.4315,
            b: 2107.0,
            c: 627.1,
        },
    }
}

fn sanders2016_forward(coefficients: SandersCoefficients, n_e: f64) -> f64 {
    coefficients.a * (coefficients.b + n_e) / (coefficients.c + n_e)
}

/// Sanders et al. (2016) calibration for [OII] or [SII].
pub fn sanders2016_density(coefficients: SandersCoefficients, ratio: f64) -> DensityEstimate {
    let r_max = sanders2016_forward(coefficients, SANDERS2016_LOW_DENSITY);
    let r_min = sanders2016_forward(coefficients, SANDERS2016_HIGH_DENSITY);
    let SandersCoefficients { a, b, c } = coefficients;
    match ratio {
        r if !r.is_finite() => DensityEstimate::UNDEFINED,
        r if r > r_max => DensityEstimate::at_lower_limit(SANDERS2016_LOW_DENSITY),
        r if r < r_min => DensityEstimate::at_upper_limit(SANDERS2016_HIGH_DENSITY),
        r => DensityEstimate::measured((c * r - a * b) / (a - r)),
    }
}

fn sanders2016_ratio(coefficients: SandersCoefficients, n_e: f64) -> f64 {
    if (SANDERS2016_LOW_DENSITY..=SANDERS2016_HIGH_DENSITY).contains(&n_e) {
        sanders2016_forward(coefficients, n_e)
    } else {
        f64::NAN
    }
}

#[cfg(test)]
mod tests {
    use super::{
        proxauf2014_density, DensityDiagnostic, DensityLine, DensityRequest,
        PROXAUF2014_HIGH_DENSITY, PROXAUF2014_LOW_DENSITY,
    };

    const PROXAUF_SII: DensityRequest =
        DensityRequest::new(DensityDiagnostic::Proxauf2014, DensityLine::Sii);
    const SANDERS_OII: DensityRequest =
        DensityRequest::new(DensityDiagnostic::Sanders2016, DensityLine::Oii);
    const SANDERS_SII: DensityRequest =
        DensityRequest::new(DensityDiagnostic::Sanders2016, DensityLine::Sii);

    #[test]
    fn unit_ratio_reproduces_published_densities() {
        let cases = [
            (PROXAUF_SII, 449.393_609_980_781_2),
            (SANDERS_OII, 469.229_089_741_531_5),
            (SANDERS_SII, 496.166_226_912_928_6),
        ];
        for (request, expected) in cases {
            let estimate = request.electron_density(1.0);
            assert!(
                (estimate.n_e - expected).abs() < 1.0e-8,
                "{} gave {}",
                request.density_column(),
                estimate.n_e
            );
            assert!(!estimate.lower_limit && !estimate.upper_limit);
        }
    }

    #[test]
    fn out_of_range_ratios_saturate_with_flags() {
        for ratio in [1.6, 2.0, 999.0] {
            let estimate = proxauf2014_density(ratio);
            assert_eq!(estimate.n_e, PROXAUF2014_LOW_DENSITY);
            assert!(estimate.lower_limit && !estimate.upper_limit);
        }
        for ratio in [0.1, -0.2, 0.3] {
            let estimate = proxauf2014_density(ratio);
            assert_eq!(estimate.n_e, PROXAUF2014_HIGH_DENSITY);
            assert!(estimate.upper_limit && !estimate.lower_limit);
        }
        for request in [SANDERS_OII, SANDERS_SII] {
            for ratio in [0.1, -0.2, 0.38] {
                let estimate = request.electron_density(ratio);
                assert_eq!(estimate.n_e, 1.0e5);
                assert!(estimate.upper_limit);
            }
            for ratio in [1.46, 2.0, 999.0] {
                let estimate = request.electron_density(ratio);
                assert_eq!(estimate.n_e, 1.0);
                assert!(estimate.lower_limit);
            }
        }
    }

    #[test]
    fn non_finite_ratios_are_undefined_without_flags() {
        for request in [PROXAUF_SII, SANDERS_OII, SANDERS_SII] {
            for ratio in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
                let estimate = request.electron_density(ratio);
                assert!(estimate.n_e.is_nan());
                assert!(!estimate.lower_limit && !estimate.upper_limit);
            }
        }
    }

    #[test]
    fn forward_curve_inverts_the_calibration() {
        for request in [PROXAUF_SII, SANDERS_OII, SANDERS_SII] {
            for n_e in [40.0, 100.0, 1000.0, 5000.0] {
                let ratio = request.ratio_for_density(n_e);
                let recovered = request.electron_density(ratio).n_e;
                assert!(
                    ((recovered - n_e) / n_e).abs() < 1.0e-8,
                    "{} at n_e={n_e} recovered {recovered}",
                    request.density_column()
                );
            }
        }
        assert!(SANDERS_OII.ratio_for_density(2.0e5).is_nan());
        assert!(PROXAUF_SII.ratio_for_density(-1.0).is_nan());
    }

    #[test]
    fn names_and_validation() {
        assert_eq!(PROXAUF_SII.density_column(), "n_e (Proxauf2014 ([SII]))");
        assert_eq!(
            SANDERS_OII.upper_limit_column(),
            "n_e (Sanders2016 ([OII])) (upper limit)"
        );
        assert!(
            DensityRequest::new(DensityDiagnostic::Proxauf2014, DensityLine::Oii)
                .validate()
                .is_err()
        );
        assert_eq!("sanders2016".parse::<DensityDiagnostic>(), Ok(DensityDiagnostic::Sanders2016));
        assert_eq!("OII".parse::<DensityLine>(), Ok(DensityLine::Oii));
        assert_eq!("[SII]".parse::<DensityLine>(), Ok(DensityLine::Sii));
        assert!("[NII]".parse::<DensityLine>().is_err());
    }
}
