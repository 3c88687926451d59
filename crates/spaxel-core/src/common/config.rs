//! Run configuration loaded from JSON.
//!
//! Every field has a default so an empty object (`{}`) is a valid file. The
//! configuration is passed explicitly to the assembler and the engines; there
//! is no process-wide settings store.

use crate::domain::{SpaxelError, SpaxelResult};
use crate::modules::density::DensityRequest;
use crate::modules::metallicity::MetallicityRequest;
use serde::{Deserialize, Serialize};
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

pub const DEFAULT_NITERS: usize = 1000;
pub const DEFAULT_SEED: u64 = 0;
pub const DEFAULT_NCOMPONENTS_MAX: u32 = 3;
pub const DEFAULT_FLUX_UNITS: f64 = 1.0e-16;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CosmologyConfig {
    #[serde(rename = "H0", default = "default_h0")]
    pub h0: f64,
    #[serde(rename = "OmegaM", default = "default_omega_m")]
    pub omega_m: f64,
}

impl Default for CosmologyConfig {
    fn default() -> Self {
        Self {
            h0: default_h0(),
            omega_m: default_omega_m(),
        }
    }
}

fn default_h0() -> f64 {
    70.0
}

fn default_omega_m() -> f64 {
    0.3
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MonteCarloConfig {
    #[serde(default = "default_niters")]
    pub niters: usize,
    #[serde(default = "default_nthreads")]
    pub nthreads: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            niters: default_niters(),
            nthreads: default_nthreads(),
            seed: default_seed(),
        }
    }
}

fn default_niters() -> usize {
    DEFAULT_NITERS
}

fn default_nthreads() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SpaxelConfig {
    #[serde(default)]
    pub cosmology: CosmologyConfig,
    /// Flux unit of every line column, in erg/s/cm^2.
    #[serde(default = "default_flux_units")]
    pub flux_units: f64,
    #[serde(default = "default_ncomponents_max")]
    pub ncomponents_max: u32,
    #[serde(default = "default_density_requests")]
    pub density: Vec<DensityRequest>,
    #[serde(default)]
    pub metallicity: Vec<MetallicityRequest>,
    #[serde(default)]
    pub monte_carlo: MonteCarloConfig,
}

impl Default for SpaxelConfig {
    fn default() -> Self {
        Self {
            cosmology: CosmologyConfig::default(),
            flux_units: default_flux_units(),
            ncomponents_max: default_ncomponents_max(),
            density: default_density_requests(),
            metallicity: Vec::new(),
            monte_carlo: MonteCarloConfig::default(),
        }
    }
}

fn default_flux_units() -> f64 {
    DEFAULT_FLUX_UNITS
}

fn default_ncomponents_max() -> u32 {
    DEFAULT_NCOMPONENTS_MAX
}

fn default_density_requests() -> Vec<DensityRequest> {
    DensityRequest::defaults()
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse configuration '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("configuration field '{field}' {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl From<ConfigError> for SpaxelError {
    fn from(error: ConfigError) -> Self {
        match &error {
            ConfigError::Read { .. } => SpaxelError::io_system("IO.CONFIG_READ", error.to_string()),
            ConfigError::Parse { .. } => {
                SpaxelError::input_validation("INPUT.CONFIG_PARSE", error.to_string())
            }
            ConfigError::Invalid { .. } => {
                SpaxelError::input_validation("INPUT.CONFIG_VALUE", error.to_string())
            }
        }
    }
}

impl SpaxelConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&source).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.cosmology.h0.is_finite() && self.cosmology.h0 > 0.0) {
            return Err(invalid("cosmology.H0", "must be a positive number"));
        }
        if !(0.0..=1.0).contains(&self.cosmology.omega_m) {
            return Err(invalid("cosmology.OmegaM", "must lie in [0, 1]"));
        }
        if !(self.flux_units.is_finite() && self.flux_units > 0.0) {
            return Err(invalid("fluxUnits", "must be a positive number"));
        }
        if self.monte_carlo.niters == 0 {
            return Err(invalid("monteCarlo.niters", "must be at least 1"));
        }
        if self.monte_carlo.nthreads == 0 {
            return Err(invalid("monteCarlo.nthreads", "must be at least 1"));
        }
        for request in &self.density {
            request
                .validate()
                .map_err(|error| invalid("density", error.message().to_string()))?;
        }
        for request in &self.metallicity {
            request
                .mode()
                .map_err(|error| invalid("metallicity", error.message().to_string()))?;
        }
        Ok(())
    }

    pub fn validated(self) -> SpaxelResult<Self> {
        self.validate()?;
        Ok(self)
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, SpaxelConfig, DEFAULT_NITERS};
    use crate::domain::SpaxelErrorCategory;
    use crate::modules::density::{DensityDiagnostic, DensityLine};
    use crate::modules::metallicity::MetallicityDiagnostic;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn empty_object_uses_defaults() {
        let config: SpaxelConfig = serde_json::from_str("{}").expect("empty config should parse");
        assert_eq!(config.cosmology.h0, 70.0);
        assert_eq!(config.cosmology.omega_m, 0.3);
        assert_eq!(config.monte_carlo.niters, DEFAULT_NITERS);
        assert!(config.monte_carlo.nthreads >= 1);
        assert_eq!(config.density.len(), 3);
        assert!(config.metallicity.is_empty());
        config.validate().expect("defaults should validate");
    }

    #[test]
    fn load_reads_requests_from_disk() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("spaxel.json");
        fs::write(
            &path,
            r#"{
                "cosmology": { "H0": 67.7, "OmegaM": 0.31 },
                "ncomponentsMax": 1,
                "density": [ { "diagnostic": "Sanders2016", "line": "[OII]" } ],
                "metallicity": [
                    { "diagnostic": "N2O2_K19", "ionDiagnostic": "O3O2_K19", "computeErrors": true }
                ],
                "monteCarlo": { "niters": 50, "nthreads": 2, "seed": 7 }
            }"#,
        )
        .expect("config should be written");

        let config = SpaxelConfig::load(&path).expect("config should load");
        assert_eq!(config.ncomponents_max, 1);
        assert_eq!(config.density[0].diagnostic, DensityDiagnostic::Sanders2016);
        assert_eq!(config.density[0].line, DensityLine::Oii);
        assert_eq!(
            config.metallicity[0].diagnostic,
            MetallicityDiagnostic::N2O2K19
        );
        assert!(config.metallicity[0].compute_errors);
        assert_eq!(config.monte_carlo.seed, 7);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let config: SpaxelConfig =
            serde_json::from_str(r#"{ "monteCarlo": { "niters": 0 } }"#).expect("should parse");
        let error = config.validate().expect_err("zero iterations should fail");
        assert!(matches!(
            error,
            ConfigError::Invalid {
                field: "monteCarlo.niters",
                ..
            }
        ));

        let config: SpaxelConfig = serde_json::from_str(
            r#"{ "density": [ { "diagnostic": "Proxauf2014", "line": "[OII]" } ] }"#,
        )
        .expect("should parse");
        let error = config
            .validated()
            .expect_err("Proxauf2014 has no [OII] calibration");
        assert_eq!(error.category(), SpaxelErrorCategory::InputValidationError);
        assert_eq!(error.placeholder(), "INPUT.CONFIG_VALUE");
    }

    #[test]
    fn unknown_fields_fail_to_parse() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("bad.json");
        fs::write(&path, r#"{ "fluxUnit": 1e-16 }"#).expect("config should be written");
        let error = SpaxelConfig::load(&path).expect_err("unknown field should fail");
        assert!(matches!(error, ConfigError::Parse { .. }));

        let missing = SpaxelConfig::load(temp.path().join("missing.json"))
            .expect_err("missing file should fail");
        assert!(matches!(missing, ConfigError::Read { .. }));
    }
}
