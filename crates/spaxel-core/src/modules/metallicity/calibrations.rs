//! Strong-line calibrations evaluated on a single row of line fluxes.
//!
//! Every function here is row-local and never fails: undefined logarithms,
//! unphysical branches and results outside a calibration's validity window
//! all come back as NaN.

use super::model::{IonisationDiagnostic, MetallicityDiagnostic};
use crate::common::constants::SPEED_OF_LIGHT_CM_S;
use crate::domain::{EmissionLine, FluxRow};
use crate::numerics::{horner, safe_log10};

use EmissionLine::{
    Halpha, Hbeta, Nii6583, NiiDoublet, OiiDoublet, Oiii5007, OiiiDoublet, SiiDoublet, Siii9069,
    Siii9531,
};

/// Kewley (2019) surface `A + Bx + Cy + Dxy + Ex² + Fy² + Gxy² + Hyx² + Ix³ + Jy³`
/// with its calibrated (log(O/H)+12, log U) box. Metallicity surfaces place
/// no bound on log U.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct K19Surface {
    pub coefficients: [f64; 10],
    pub z_min: f64,
    pub z_max: f64,
    pub u_min: f64,
    pub u_max: f64,
}

impl K19Surface {
    const fn metallicity(coefficients: [f64; 10], z_min: f64, z_max: f64) -> Self {
        Self {
            coefficients,
            z_min,
            z_max,
            u_min: f64::NEG_INFINITY,
            u_max: f64::INFINITY,
        }
    }

    pub fn evaluate(&self, x: f64, y: f64) -> f64 {
        let [a, b, c, d, e, f, g, h, i, j] = self.coefficients;
        a + b * x
            + c * y
            + d * x * y
            + e * x * x
            + f * y * y
            + g * x * y * y
            + h * y * x * x
            + i * x.powi(3)
            + j * y.powi(3)
    }

    /// Open-interval test; NaN is never contained.
    pub fn contains(&self, log_oh12: f64, log_u: f64) -> bool {
        log_oh12 > self.z_min && log_oh12 < self.z_max && log_u > self.u_min && log_u < self.u_max
    }
}

/// Metallicity surfaces, valid for log(P/k) = 5.
pub fn k19_metallicity_surface(diagnostic: MetallicityDiagnostic) -> Option<K19Surface> {
    use MetallicityDiagnostic as D;
    let surface = match diagnostic {
        D::N2HaK19 => K19Surface::metallicity(
            [10.526, 1.9958, -0.6741, 0.2892, 0.5712, -0.6597, 0.0101, 0.0800, 0.0782, -0.0982],
            7.63,
            8.53,
        ),
        D::S2HaK19 => K19Surface::metallicity(
            [23.370, 11.700, 7.2562, 4.3320, 3.1564, 1.0361, 0.4315, 0.6576, 0.3319, 0.0336],
            7.63,
            8.53,
        ),
        D::N2S2K19 => K19Surface::metallicity(
            [5.8892, 3.1688, -3.5991, 1.6394, -2.3939, -1.6764, 0.4455, -0.9302, -0.0966, -0.2490],
            7.63,
            8.53,
        ),
        D::S23K19 => K19Surface::metallicity(
            [11.033, 0.9907, 1.5789, 0.4233, -3.1663, 0.3666, 0.0654, -0.2146, -1.7045, 0.0316],
            7.63,
            8.53,
        ),
        D::O3N2K19 => K19Surface::metallicity(
            [10.312, -1.6575, 2.2525, -1.3594, 0.4764, 1.1730, -0.2968, 0.1974, -0.0544, 0.1891],
            8.23,
            8.93,
        ),
        D::O2S2K19 => K19Surface::metallicity(
            [12.489, -3.2646, 3.2581, -2.0544, 0.5282, 1.0730, -0.3445, 0.2130, -0.3047, 0.1209],
            8.23,
            9.23,
        ),
        D::O2HbK19 => K19Surface::metallicity(
            [6.2084, -4.0513, -1.4847, -1.9125, -1.0071, -0.1275, -0.2471, -0.1872, -0.1052, 0.0173],
            8.53,
            9.23,
        ),
        D::N2O2K19 => K19Surface::metallicity(
            [9.4772, 1.1797, 0.5085, 0.6879, 0.2807, 0.1612, 0.1187, 0.1200, 0.2293, 0.0164],
            7.63,
            9.23,
        ),
        D::R23K19 => K19Surface::metallicity(
            [9.7757, -0.5059, 0.9707, -0.1744, -0.0255, 0.3838, -0.0378, 0.0806, -0.0852, 0.0462],
            8.23,
            8.93,
        ),
        _ => return None,
    };
    Some(surface)
}

/// Ionisation-parameter surfaces; here `y` is log(O/H)+12.
pub fn k19_ionisation_surface(diagnostic: IonisationDiagnostic) -> Option<K19Surface> {
    match diagnostic {
        IonisationDiagnostic::O3O2K19 => Some(K19Surface {
            coefficients: [13.768, 9.4940, -4.3223, -2.3531, -0.5769, 0.2794, 0.1574, 0.0890, 0.0311, 0.0],
            z_min: 7.63,
            z_max: 8.93,
            u_min: -3.98,
            u_max: -2.98,
        }),
        IonisationDiagnostic::S32K19 => Some(K19Surface {
            coefficients: [90.017, 21.934, -34.095, -5.0818, -1.4762, 4.1343, 0.3096, 0.1786, 0.1959, -0.1668],
            z_min: 7.63,
            z_max: 9.23,
            u_min: -3.98,
            u_max: -2.48,
        }),
        IonisationDiagnostic::O3O2KK04 => None,
    }
}

fn sum(row: &FluxRow, lines: &[EmissionLine]) -> f64 {
    lines.iter().map(|&line| row.flux(line)).sum()
}

fn log_ratio(row: &FluxRow, numerator: &[EmissionLine], denominator: &[EmissionLine]) -> f64 {
    safe_log10(sum(row, numerator) / sum(row, denominator))
}

/// The log line ratio a Kewley (2019) metallicity surface is evaluated at.
pub fn k19_metallicity_log_ratio(diagnostic: MetallicityDiagnostic, row: &FluxRow) -> f64 {
    use MetallicityDiagnostic as D;
    match diagnostic {
        D::N2HaK19 => log_ratio(row, &[Nii6583], &[Halpha]),
        D::S2HaK19 => log_ratio(row, &[SiiDoublet], &[Halpha]),
        D::N2S2K19 => log_ratio(row, &[Nii6583], &[SiiDoublet]),
        D::S23K19 => log_ratio(row, &[SiiDoublet, Siii9069, Siii9531], &[Halpha]),
        D::O3N2K19 => o3n2(row),
        D::O2S2K19 => log_ratio(row, &[OiiDoublet], &[SiiDoublet]),
        D::O2HbK19 => log_ratio(row, &[OiiDoublet], &[Hbeta]),
        D::N2O2K19 => log_ratio(row, &[Nii6583], &[OiiDoublet]),
        D::R23K19 => log_ratio(row, &[OiiiDoublet, OiiDoublet], &[Hbeta]),
        _ => f64::NAN,
    }
}

pub fn ionisation_log_ratio(diagnostic: IonisationDiagnostic, row: &FluxRow) -> f64 {
    match diagnostic {
        IonisationDiagnostic::O3O2K19 => log_ratio(row, &[Oiii5007], &[OiiDoublet]),
        IonisationDiagnostic::S32K19 => log_ratio(row, &[Siii9069, Siii9531], &[SiiDoublet]),
        IonisationDiagnostic::O3O2KK04 => log_ratio(row, &[OiiiDoublet], &[OiiDoublet]),
    }
}

fn o3n2(row: &FluxRow) -> f64 {
    safe_log10((row.flux(Oiii5007) / row.flux(Hbeta)) / (row.flux(Nii6583) / row.flux(Halpha)))
}

/// Open interval `(lower, upper)`, NaN outside.
fn within(value: f64, x: f64, lower: f64, upper: f64) -> f64 {
    if x > lower && x < upper { value } else { f64::NAN }
}

/// Closed-form calibrations with no ionisation-parameter dependence.
pub fn fixed_metallicity(diagnostic: MetallicityDiagnostic, row: &FluxRow) -> f64 {
    use MetallicityDiagnostic as D;
    match diagnostic {
        D::N2HaPP04 => {
            let x = log_ratio(row, &[Nii6583], &[Halpha]);
            within(horner(&[9.37, 2.03, 1.26, 0.32], x), x, -2.5, -0.3)
        }
        D::N2HaM13 => {
            let x = log_ratio(row, &[Nii6583], &[Halpha]);
            within(8.743 + 0.462 * x, x, -1.6, -0.2)
        }
        D::O3N2PP04 => {
            let x = o3n2(row);
            within(8.73 - 0.32 * x, x, -1.0, 1.9)
        }
        D::O3N2M13 => {
            let x = o3n2(row);
            within(8.533 - 0.214 * x, x, -1.1, 1.7)
        }
        D::N2S2HaD16 => {
            let x = log_ratio(row, &[Nii6583], &[SiiDoublet])
                + 0.264 * log_ratio(row, &[Nii6583], &[Halpha]);
            within(8.77 + x + 0.45 * (x + 0.3).powi(5), x, -1.1, 0.5)
        }
        D::N2O2KD02 => {
            let x = log_ratio(row, &[Nii6583], &[OiiDoublet]);
            let log_oh12 = safe_log10(horner(&[1.54020, 1.26602, 0.167977], x)) + 8.93;
            within(log_oh12, log_oh12, 8.6, 9.4)
        }
        D::RcalPG16 => pilyugin_grebel_rcal(row),
        D::ScalPG16 => pilyugin_grebel_scal(row),
        D::OnsP10 => pilyugin_ons(row),
        D::OnP10 => pilyugin_on(row),
        _ => f64::NAN,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Branch {
    Lower,
    Upper,
}

/// Pilyugin & Grebel (2016) branch on log(N2/Hβ).
fn pg16_branch(log_n2_hb: f64) -> Option<Branch> {
    match log_n2_hb {
        x if x < -0.6 => Some(Branch::Lower),
        x if x >= -0.6 => Some(Branch::Upper),
        _ => None,
    }
}

fn pilyugin_grebel_rcal(row: &FluxRow) -> f64 {
    let o32 = log_ratio(row, &[OiiiDoublet], &[OiiDoublet]);
    let n2 = log_ratio(row, &[NiiDoublet], &[Hbeta]);
    let r2 = log_ratio(row, &[OiiDoublet], &[Hbeta]);
    match pg16_branch(n2) {
        Some(Branch::Lower) => {
            7.932 + 0.944 * o32 + 0.695 * n2 + (0.970 - 0.291 * o32 - 0.019 * n2) * r2
        }
        Some(Branch::Upper) => {
            8.589 + 0.022 * o32 + 0.399 * n2 + (-0.137 + 0.164 * o32 + 0.589 * n2) * r2
        }
        None => f64::NAN,
    }
}

fn pilyugin_grebel_scal(row: &FluxRow) -> f64 {
    let o3s2 = log_ratio(row, &[OiiiDoublet], &[SiiDoublet]);
    let n2 = log_ratio(row, &[NiiDoublet], &[Hbeta]);
    let s2 = log_ratio(row, &[SiiDoublet], &[Hbeta]);
    match pg16_branch(n2) {
        Some(Branch::Lower) => {
            8.072 + 0.789 * o3s2 + 0.726 * n2 + (1.069 - 0.170 * o3s2 + 0.022 * n2) * s2
        }
        Some(Branch::Upper) => {
            8.424 + 0.030 * o3s2 + 0.751 * n2 + (-0.349 + 0.182 * o3s2 + 0.508 * n2) * s2
        }
        None => f64::NAN,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Temperature {
    Cool,
    Warm,
    Hot,
}

struct PilyuginRatios {
    n2: f64,
    s2: f64,
    r2: f64,
    r3: f64,
}

impl PilyuginRatios {
    fn from_row(row: &FluxRow) -> Self {
        Self {
            n2: log_ratio(row, &[NiiDoublet], &[Hbeta]),
            s2: log_ratio(row, &[SiiDoublet], &[Hbeta]),
            r2: log_ratio(row, &[OiiDoublet], &[Hbeta]),
            r3: log_ratio(row, &[OiiiDoublet], &[Hbeta]),
        }
    }

    /// Pilyugin et al. (2010) cool/warm/hot classes.
    fn temperature(&self) -> Option<Temperature> {
        match (self.n2, self.n2 - self.s2) {
            (n2, _) if n2 >= -0.1 => Some(Temperature::Cool),
            (n2, n2_s2) if n2 < -0.1 && n2_s2 >= -0.25 => Some(Temperature::Warm),
            (n2, n2_s2) if n2 < -0.1 && n2_s2 < -0.25 => Some(Temperature::Hot),
            _ => None,
        }
    }
}

fn pilyugin_ons(row: &FluxRow) -> f64 {
    let ratios = PilyuginRatios::from_row(row);
    let r3 = row.flux(OiiiDoublet) / row.flux(Hbeta);
    let r2 = row.flux(OiiDoublet) / row.flux(Hbeta);
    let p = r3 / (r3 + r2);
    let PilyuginRatios { n2, s2, r2: log_r2, r3: log_r3 } = ratios;
    match ratios.temperature() {
        Some(Temperature::Cool) => {
            8.277 + 0.657 * p - 0.399 * log_r3 - 0.061 * (n2 - log_r2) + 0.005 * (s2 - log_r2)
        }
        Some(Temperature::Warm) => {
            8.816 - 0.733 * p + 0.454 * log_r3 + 0.710 * (n2 - log_r2) - 0.337 * (s2 - log_r2)
        }
        Some(Temperature::Hot) => {
            8.774 - 1.855 * p + 1.517 * log_r3 + 0.304 * (n2 - log_r2) + 0.328 * (s2 - log_r2)
        }
        None => f64::NAN,
    }
}

fn pilyugin_on(row: &FluxRow) -> f64 {
    let ratios = PilyuginRatios::from_row(row);
    let PilyuginRatios { n2, r2, r3, .. } = ratios;
    match ratios.temperature() {
        Some(Temperature::Cool) => 8.606 - 0.105 * r3 - 0.410 * r2 - 0.150 * (n2 - r2),
        Some(Temperature::Warm) => 8.642 + 0.077 * r3 + 0.411 * r2 + 0.601 * (n2 - r2),
        Some(Temperature::Hot) => 8.013 + 0.905 * r3 + 0.602 * r2 + 0.751 * (n2 - r2),
        None => f64::NAN,
    }
}

/// Log ratios of the Kobulnicky & Kewley (2004) R23 calibration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kk04Ratios {
    pub log_n2o2: f64,
    pub log_o3o2: f64,
    pub log_r23: f64,
}

/// R23 is double-valued; log R23 at or above this is outside both branches.
pub const KK04_LOG_R23_MAX: f64 = 1.0;
pub const KK04_BRANCH_LOG_N2O2: f64 = -1.2;

impl Kk04Ratios {
    pub fn from_row(row: &FluxRow) -> Self {
        Self {
            log_n2o2: log_ratio(row, &[Nii6583], &[OiiDoublet]),
            log_o3o2: ionisation_log_ratio(IonisationDiagnostic::O3O2KK04, row),
            log_r23: log_ratio(row, &[OiiDoublet, OiiiDoublet], &[Hbeta]),
        }
    }

    pub fn is_defined(&self) -> bool {
        !(self.log_n2o2.is_nan() || self.log_o3o2.is_nan() || self.log_r23.is_nan())
    }

    fn branch(&self) -> Option<Branch> {
        match self.log_n2o2 {
            x if x < KK04_BRANCH_LOG_N2O2 => Some(Branch::Lower),
            x if x >= KK04_BRANCH_LOG_N2O2 => Some(Branch::Upper),
            _ => None,
        }
    }

    /// Starting metallicity of the iteration on each branch.
    pub fn seed(&self) -> f64 {
        match self.branch() {
            Some(Branch::Lower) => 8.2,
            _ => 8.7,
        }
    }

    /// log(O/H)+12 at ionisation parameter `log_q` (q in cm/s).
    pub fn metallicity(&self, log_q: f64) -> f64 {
        let x = self.log_r23;
        let log_oh12 = match self.branch() {
            Some(Branch::Lower) => {
                horner(&[9.40, 4.65, -3.17], x) - log_q * horner(&[0.272, 0.547, -0.513], x)
            }
            Some(Branch::Upper) => {
                horner(&[9.72, -0.777, -0.951, -0.072, -0.811], x)
                    - log_q * horner(&[0.0737, -0.0713, -0.141, 0.0373, -0.058], x)
            }
            None => f64::NAN,
        };
        if x < KK04_LOG_R23_MAX { log_oh12 } else { f64::NAN }
    }

    /// log q from O32 at metallicity `log_oh12`.
    pub fn log_q(&self, log_oh12: f64) -> f64 {
        let y = self.log_o3o2;
        let numerator = 32.81 - 1.153 * y * y + log_oh12 * (-3.396 - 0.025 * y + 0.1444 * y * y);
        let denominator =
            4.603 - 0.3119 * y - 0.163 * y * y + log_oh12 * (-0.48 + 0.0271 * y + 0.02037 * y * y);
        numerator / denominator
    }
}

/// `log q = log U + log10(c)` with c in cm/s.
pub fn log_q_from_log_u(log_u: f64) -> f64 {
    log_u + SPEED_OF_LIGHT_CM_S.log10()
}

pub fn log_u_from_log_q(log_q: f64) -> f64 {
    log_q - SPEED_OF_LIGHT_CM_S.log10()
}
