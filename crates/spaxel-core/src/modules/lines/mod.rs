//! Per-line quantities that do not involve ratios: FWHM, luminosity and SFR.

use super::classification::{BptClass, BPT_NUMERIC_COLUMN};
use super::TableEngine;
use crate::common::constants::{HALPHA_SFR_FACTOR, MPC_CM, PI, SIGMA_TO_FWHM};
use crate::common::config::DEFAULT_FLUX_UNITS;
use crate::common::CosmologyConfig;
use crate::domain::{ColumnKey, Component, EmissionLine, EngineResult, Table};
use crate::numerics::luminosity_distance_mpc;
use tracing::debug;

pub const SIGMA_COLUMN: &str = "sigma_gas";
pub const SIGMA_ERROR_COLUMN: &str = "sigma_gas error";
pub const FWHM_COLUMN: &str = "FWHM_gas";
pub const FWHM_ERROR_COLUMN: &str = "FWHM_gas error";
pub const DISTANCE_COLUMN: &str = "D_L (Mpc)";
pub const REDSHIFT_COLUMN: &str = "z";
pub const BIN_AREA_COLUMN: &str = "Bin size (square kpc)";
pub const SFR_COLUMN: &str = "SFR";
pub const SFR_ERROR_COLUMN: &str = "SFR error";

pub fn luminosity_column(line: EmissionLine) -> String {
    format!("{} luminosity", line.column_name())
}

pub fn luminosity_error_column(line: EmissionLine) -> String {
    format!("{} luminosity error", line.column_name())
}

/// Gas FWHM from the velocity dispersion of a kinematic component.
#[derive(Debug, Clone, Copy, Default)]
pub struct FwhmEngine;

impl TableEngine for FwhmEngine {
    fn name(&self) -> &'static str {
        "fwhm"
    }

    fn apply(&self, table: &Table, component: Option<Component>) -> EngineResult<Table> {
        if !matches!(component, Some(Component::Index(_))) {
            return Ok(table.clone());
        }
        let mut output = table.clone();
        let mut view = output.view_mut(component);
        for (source, target) in [
            (SIGMA_COLUMN, FWHM_COLUMN),
            (SIGMA_ERROR_COLUMN, FWHM_ERROR_COLUMN),
        ] {
            let Some(sigma) = view.numeric(source) else {
                continue;
            };
            let fwhm = sigma.iter().map(|sigma| sigma * SIGMA_TO_FWHM).collect();
            view.insert_numeric(target, fwhm)?;
        }
        debug!(component = ?component, "computed gas FWHM");
        Ok(output)
    }
}

/// Surface luminosity (erg/s/kpc^2) of every line with a flux and an error column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LuminosityEngine {
    flux_units: f64,
    cosmology: CosmologyConfig,
}

impl LuminosityEngine {
    pub fn new(flux_units: f64, cosmology: CosmologyConfig) -> Self {
        Self {
            flux_units,
            cosmology,
        }
    }

    /// `D_L (Mpc)` when present, otherwise derived from `z`.
    fn distances(&self, table: &Table) -> Option<Vec<f64>> {
        if let Some(distances) = table.numeric(&ColumnKey::bare(DISTANCE_COLUMN)) {
            return Some(distances.to_vec());
        }
        let redshifts = table.numeric(&ColumnKey::bare(REDSHIFT_COLUMN))?;
        Some(
            redshifts
                .iter()
                .map(|&z| luminosity_distance_mpc(z, &self.cosmology))
                .collect(),
        )
    }

    /// Multiplier turning a flux into a surface luminosity, per row.
    fn scale(&self, table: &Table) -> Option<Vec<f64>> {
        let distances = self.distances(table)?;
        let areas = table.numeric(&ColumnKey::bare(BIN_AREA_COLUMN))?;
        Some(
            distances
                .iter()
                .zip(areas)
                .map(|(distance, area)| {
                    let distance_cm = distance * MPC_CM;
                    self.flux_units * 4.0 * PI * distance_cm * distance_cm / area
                })
                .collect(),
        )
    }
}

impl Default for LuminosityEngine {
    fn default() -> Self {
        Self::new(DEFAULT_FLUX_UNITS, CosmologyConfig::default())
    }
}

impl TableEngine for LuminosityEngine {
    fn name(&self) -> &'static str {
        "luminosity"
    }

    fn apply(&self, table: &Table, component: Option<Component>) -> EngineResult<Table> {
        let Some(scale) = self.scale(table) else {
            debug!(
                component = ?component,
                "no distance or bin size columns; skipping line luminosities"
            );
            return Ok(table.clone());
        };

        let mut output = table.clone();
        let mut view = output.view_mut(component);
        let mut lines = 0usize;
        for line in EmissionLine::ALL {
            let (Some(fluxes), Some(errors)) = (
                view.numeric(line.column_name()),
                view.numeric(&line.error_column_name()),
            ) else {
                continue;
            };
            let luminosity: Vec<f64> = fluxes.iter().zip(&scale).map(|(f, s)| f * s).collect();
            let luminosity_error: Vec<f64> =
                errors.iter().zip(&scale).map(|(e, s)| e * s).collect();
            view.insert_numeric(&luminosity_column(line), luminosity)?;
            view.insert_numeric(&luminosity_error_column(line), luminosity_error)?;
            lines += 1;
        }
        debug!(component = ?component, lines, "computed line luminosities");
        Ok(output)
    }
}

/// Calzetti (2013) star-formation rate from the H-alpha luminosity of
/// star-forming rows; every other row is NaN.
#[derive(Debug, Clone, Copy, Default)]
pub struct SfrEngine;

impl TableEngine for SfrEngine {
    fn name(&self) -> &'static str {
        "sfr"
    }

    fn apply(&self, table: &Table, component: Option<Component>) -> EngineResult<Table> {
        let view = table.view(component);
        let luminosity_name = luminosity_column(EmissionLine::Halpha);
        let (Some(codes), Some(luminosity), Some(luminosity_error)) = (
            view.numeric(BPT_NUMERIC_COLUMN),
            view.numeric(&luminosity_name),
            view.numeric(&luminosity_error_column(EmissionLine::Halpha)),
        ) else {
            debug!(component = ?component, "no H-alpha luminosity or BPT codes; skipping SFR");
            return Ok(table.clone());
        };

        let star_forming: Vec<bool> = codes
            .iter()
            .map(|&code| BptClass::from_code(code) == Some(BptClass::StarForming))
            .collect();
        let sfr_of = |values: &[f64]| -> Vec<f64> {
            values
                .iter()
                .zip(&star_forming)
                .map(|(&value, &sf)| if sf { value * HALPHA_SFR_FACTOR } else { f64::NAN })
                .collect()
        };
        let sfr = sfr_of(luminosity);
        let sfr_error = sfr_of(luminosity_error);
        debug!(
            component = ?component,
            star_forming = star_forming.iter().filter(|sf| **sf).count(),
            "computed star-formation rates"
        );

        let mut output = table.clone();
        let mut view = output.view_mut(component);
        view.insert_numeric(SFR_COLUMN, sfr)?;
        view.insert_numeric(SFR_ERROR_COLUMN, sfr_error)?;
        Ok(output)
    }
}
