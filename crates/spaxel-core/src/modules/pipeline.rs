use super::classification::ClassificationEngine;
use super::density::{DensityEngine, DensityRequest};
use super::lines::{FwhmEngine, LuminosityEngine, SfrEngine};
use super::metallicity::MetallicityEngine;
use super::ratios::RatioEngine;
use super::TableEngine;
use crate::common::SpaxelConfig;
use crate::domain::{Component, SpaxelResult, Table};
use tracing::{debug, info};

/// Runs every engine over the total and each kinematic component.
///
/// Stages per component: FWHM, ratios, luminosity, classification, density,
/// SFR, then the configured metallicity requests. Luminosity follows the
/// ratio stage so it covers the doublet members and sums that stage fills in.
#[derive(Debug, Clone)]
pub struct TableAssembler {
    config: SpaxelConfig,
    metallicity: Vec<MetallicityEngine>,
}

impl TableAssembler {
    /// Validates the configuration and every metallicity request up front.
    pub fn new(config: SpaxelConfig) -> SpaxelResult<Self> {
        let config = config.validated()?;
        let metallicity = config
            .metallicity
            .iter()
            .map(|request| MetallicityEngine::new(request.clone(), config.monte_carlo))
            .collect::<SpaxelResult<Vec<_>>>()?;
        Ok(Self {
            config,
            metallicity,
        })
    }

    pub fn config(&self) -> &SpaxelConfig {
        &self.config
    }

    pub fn components(&self) -> Vec<Component> {
        Component::all(self.config.ncomponents_max)
    }

    pub fn run(&self, table: &Table) -> SpaxelResult<Table> {
        let components = self.components();
        info!(
            rows = table.len(),
            components = components.len(),
            metallicity_requests = self.metallicity.len(),
            "assembling derived quantities"
        );

        let mut current = table.clone();
        for component in components {
            current = self.run_component(&current, component)?;
        }
        info!(columns = current.column_count(), "assembled table");
        Ok(current)
    }

    fn run_component(&self, table: &Table, component: Component) -> SpaxelResult<Table> {
        let luminosity = LuminosityEngine::new(self.config.flux_units, self.config.cosmology);
        let stages: [&dyn TableEngine; 4] =
            [&FwhmEngine, &RatioEngine, &luminosity, &ClassificationEngine];

        let mut current = table.clone();
        for stage in stages {
            current = stage.apply(&current, Some(component))?;
            debug!(component = %component, stage = stage.name(), "applied stage");
        }

        let density = DensityEngine::new(self.density_requests(&current, component))?;
        current = density.apply(&current, Some(component))?;
        current = SfrEngine.apply(&current, Some(component))?;

        for engine in &self.metallicity {
            if !engine.request().applies_to(component) {
                continue;
            }
            info!(
                component = %component,
                diagnostic = %engine.request().diagnostic,
                "computing metallicity"
            );
            current = engine.apply(&current, Some(component))?;
        }
        info!(component = %component, "component complete");
        Ok(current)
    }

    /// Configured density requests whose ratio column exists for `component`.
    fn density_requests(&self, table: &Table, component: Component) -> Vec<DensityRequest> {
        let view = table.view(Some(component));
        self.config
            .density
            .iter()
            .filter(|request| {
                let available = view.contains(request.line.ratio_column());
                if !available {
                    debug!(
                        component = %component,
                        diagnostic = %request.density_column(),
                        "ratio column absent; skipping electron density"
                    );
                }
                available
            })
            .copied()
            .collect()
    }
}
