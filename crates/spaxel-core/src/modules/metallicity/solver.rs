use super::calibrations::{
    fixed_metallicity, ionisation_log_ratio, k19_ionisation_surface, k19_metallicity_log_ratio,
    k19_metallicity_surface, log_q_from_log_u, log_u_from_log_q, Kk04Ratios,
};
use super::model::{CalibrationFamily, IonisationDiagnostic, LogUMode, MetallicityDiagnostic};
use crate::domain::FluxRow;

pub const DEFAULT_MAX_ITERATIONS: usize = 10;
pub const CONVERGENCE_TOLERANCE: f64 = 1.0e-3;
pub const K19_SEED_LOG_OH12: f64 = 8.0;
pub const K19_SEED_LOG_U: f64 = -3.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetallicityEstimate {
    pub log_oh12: f64,
    /// NaN when the calibration has no log(U) term or the row is invalid.
    pub log_u: f64,
    /// False only when the joint iteration ran out of iterations or had
    /// nothing to iterate on.
    pub converged: bool,
}

impl MetallicityEstimate {
    pub const UNDEFINED: Self = Self {
        log_oh12: f64::NAN,
        log_u: f64::NAN,
        converged: false,
    };

    const fn closed_form(log_oh12: f64, log_u: f64) -> Self {
        Self {
            log_oh12,
            log_u,
            converged: true,
        }
    }

    /// Blanks both values outside the calibrated box, keeping the flag.
    fn clipped(self, valid: bool) -> Self {
        if valid {
            self
        } else {
            Self {
                log_oh12: f64::NAN,
                log_u: f64::NAN,
                converged: self.converged,
            }
        }
    }
}

/// A validated diagnostic plus its log(U) treatment, evaluated row by row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    pub diagnostic: MetallicityDiagnostic,
    pub mode: LogUMode,
    pub max_iterations: usize,
}

impl Calibration {
    pub fn new(diagnostic: MetallicityDiagnostic, mode: LogUMode) -> Self {
        Self {
            diagnostic,
            mode,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn estimate(&self, row: &FluxRow) -> MetallicityEstimate {
        match (self.diagnostic.family(), self.mode) {
            (CalibrationFamily::Fixed, _) => {
                MetallicityEstimate::closed_form(fixed_metallicity(self.diagnostic, row), f64::NAN)
            }
            (CalibrationFamily::Kewley2019, LogUMode::Fixed(log_u)) => self.k19_fixed(row, log_u),
            (CalibrationFamily::Kewley2019, LogUMode::Solve(ion)) => self.k19_solve(row, ion),
            (CalibrationFamily::Kobulnicky2004, LogUMode::Fixed(log_u)) => kk04_fixed(row, log_u),
            (CalibrationFamily::Kobulnicky2004, LogUMode::Solve(_)) => self.kk04_solve(row),
            (_, LogUMode::None) => MetallicityEstimate::UNDEFINED,
        }
    }

    fn k19_fixed(&self, row: &FluxRow, log_u: f64) -> MetallicityEstimate {
        let Some(surface) = k19_metallicity_surface(self.diagnostic) else {
            return MetallicityEstimate::UNDEFINED;
        };
        let log_oh12 = surface.evaluate(k19_metallicity_log_ratio(self.diagnostic, row), log_u);
        MetallicityEstimate::closed_form(log_oh12, log_u).clipped(surface.contains(log_oh12, log_u))
    }

    fn k19_solve(&self, row: &FluxRow, ion: IonisationDiagnostic) -> MetallicityEstimate {
        let (Some(metallicity), Some(ionisation)) = (
            k19_metallicity_surface(self.diagnostic),
            k19_ionisation_surface(ion),
        ) else {
            return MetallicityEstimate::UNDEFINED;
        };
        let log_r_met = k19_metallicity_log_ratio(self.diagnostic, row);
        let log_r_ion = ionisation_log_ratio(ion, row);
        if log_r_met.is_nan() || log_r_ion.is_nan() {
            return MetallicityEstimate::UNDEFINED;
        }

        let estimate = fixed_point(
            (K19_SEED_LOG_OH12, K19_SEED_LOG_U),
            self.max_iterations,
            true,
            |log_oh12| {
                let log_u = ionisation.evaluate(log_r_ion, log_oh12);
                (metallicity.evaluate(log_r_met, log_u), log_u)
            },
        );
        estimate.clipped(
            metallicity.contains(estimate.log_oh12, estimate.log_u)
                && ionisation.contains(estimate.log_oh12, estimate.log_u),
        )
    }

    fn kk04_solve(&self, row: &FluxRow) -> MetallicityEstimate {
        let ratios = Kk04Ratios::from_row(row);
        if !ratios.is_defined() {
            return MetallicityEstimate::UNDEFINED;
        }
        let estimate = fixed_point((ratios.seed(), f64::NAN), self.max_iterations, false, |log_oh12| {
            let log_q = ratios.log_q(log_oh12);
            (ratios.metallicity(log_q), log_u_from_log_q(log_q))
        });
        estimate.clipped(!estimate.log_oh12.is_nan())
    }
}

fn kk04_fixed(row: &FluxRow, log_u: f64) -> MetallicityEstimate {
    let log_oh12 = Kk04Ratios::from_row(row).metallicity(log_q_from_log_u(log_u));
    MetallicityEstimate::closed_form(log_oh12, log_u).clipped(!log_oh12.is_nan())
}

/// Alternates `step(log_oh12) -> (log_oh12, log_u)` from `seed` until the
/// metallicity (and, when `check_log_u`, log U) moves by less than the
/// tolerance. The last pair is returned either way.
fn fixed_point<F>(
    seed: (f64, f64),
    max_iterations: usize,
    check_log_u: bool,
    step: F,
) -> MetallicityEstimate
where
    F: Fn(f64) -> (f64, f64),
{
    let (mut previous_oh12, mut previous_u) = seed;
    let mut estimate = MetallicityEstimate::UNDEFINED;
    for _ in 0..max_iterations {
        let (log_oh12, log_u) = step(previous_oh12);
        estimate = MetallicityEstimate {
            log_oh12,
            log_u,
            converged: false,
        };
        let settled = (log_oh12 - previous_oh12).abs() < CONVERGENCE_TOLERANCE
            && (!check_log_u || (log_u - previous_u).abs() < CONVERGENCE_TOLERANCE);
        if settled {
            estimate.converged = true;
            break;
        }
        previous_oh12 = log_oh12;
        previous_u = log_u;
    }
    estimate
}

#[cfg(test)]
mod tests {
    use super::{Calibration, MetallicityEstimate};
    use crate::domain::{BinId, EmissionLine, FluxRow};
    use crate::modules::metallicity::{IonisationDiagnostic, LogUMode, MetallicityDiagnostic};

    fn row(fluxes: &[(EmissionLine, f64)]) -> FluxRow {
        let mut row = FluxRow::new(BinId::new("G", 0), 0);
        for &(line, flux) in fluxes {
            row.values.set(line, flux);
        }
        row
    }

    fn n2o2_row(oiii5007: f64) -> FluxRow {
        row(&[
            (EmissionLine::Nii6583, 0.1),
            (EmissionLine::OiiDoublet, 1.0),
            (EmissionLine::Oiii5007, oiii5007),
        ])
    }

    const N2O2_O3O2: LogUMode = LogUMode::Solve(IonisationDiagnostic::O3O2K19);

    #[test]
    fn k19_iteration_converges_inside_the_box() {
        let estimate = Calibration::new(MetallicityDiagnostic::N2O2K19, N2O2_O3O2)
            .estimate(&n2o2_row(10.0_f64.powf(-0.5)));
        assert!(estimate.converged);
        assert!((estimate.log_oh12 - 8.437_913_129_075_403).abs() < 1.0e-9);
        assert!((estimate.log_u - -3.193_426_692_569_030_2).abs() < 1.0e-9);
    }

    #[test]
    fn k19_iteration_outside_the_box_is_blanked() {
        // log(O3/O2) = 0 drives log U above the O3O2_K19 ceiling of -2.98
        let estimate =
            Calibration::new(MetallicityDiagnostic::N2O2K19, N2O2_O3O2).estimate(&n2o2_row(1.0));
        assert!(estimate.log_oh12.is_nan());
        assert!(estimate.log_u.is_nan());
        assert!(estimate.converged);
    }

    #[test]
    fn iteration_cap_is_reported_as_not_converged() {
        let estimate = Calibration::new(MetallicityDiagnostic::N2O2K19, N2O2_O3O2)
            .with_max_iterations(1)
            .estimate(&n2o2_row(10.0_f64.powf(-0.5)));
        assert!(!estimate.converged);
        assert!(estimate.log_oh12.is_finite());

        let missing = Calibration::new(MetallicityDiagnostic::N2O2K19, N2O2_O3O2)
            .estimate(&row(&[(EmissionLine::Nii6583, 0.1)]));
        assert_eq!(missing.converged, MetallicityEstimate::UNDEFINED.converged);
        assert!(missing.log_oh12.is_nan());
    }

    #[test]
    fn k19_fixed_log_u_evaluates_the_surface_once() {
        let fluxes = n2o2_row(1.0);
        let estimate =
            Calibration::new(MetallicityDiagnostic::N2O2K19, LogUMode::Fixed(0.0)).estimate(&fluxes);
        // log R = -1, log U = 0: A - B + E - I
        let expected = 9.4772 - 1.1797 + 0.2807 - 0.2293;
        assert!((estimate.log_oh12 - expected).abs() < 1.0e-12);
        assert_eq!(estimate.log_u, 0.0);
    }

    fn kk04_row(hbeta: f64) -> FluxRow {
        row(&[
            (EmissionLine::Nii6583, 1.0),
            (EmissionLine::OiiDoublet, 10.0),
            (EmissionLine::OiiiDoublet, 5.0),
            (EmissionLine::Hbeta, hbeta),
        ])
    }

    #[test]
    fn kk04_solves_on_the_upper_branch() {
        // log N2O2 = -1, log O32 = log(0.5), log R23 = log(7.5)
        let estimate = Calibration::new(
            MetallicityDiagnostic::R23KK04,
            LogUMode::Solve(IonisationDiagnostic::O3O2KK04),
        )
        .estimate(&kk04_row(2.0));
        assert!(estimate.converged);
        assert!((estimate.log_oh12 - 8.564_041_161_255_19).abs() < 1.0e-9);
        assert!((estimate.log_u - -3.134_049_995_091_607_4).abs() < 1.0e-9);

        let fixed = Calibration::new(MetallicityDiagnostic::R23KK04, LogUMode::Fixed(-3.0))
            .estimate(&kk04_row(2.0));
        assert!((fixed.log_oh12 - 8.578_206_872_130_72).abs() < 1.0e-9);
        assert_eq!(fixed.log_u, -3.0);
    }

    #[test]
    fn kk04_high_r23_is_undefined() {
        // log R23 = log(15) > 1
        let estimate = Calibration::new(MetallicityDiagnostic::R23KK04, LogUMode::Fixed(-3.0))
            .estimate(&kk04_row(1.0));
        assert!(estimate.log_oh12.is_nan());
        assert!(estimate.log_u.is_nan());
    }
}
