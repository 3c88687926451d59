mod model;

pub use model::{
    proxauf2014_density, sanders2016_coefficients, sanders2016_density, DensityDiagnostic,
    DensityEstimate, DensityLine, DensityRequest, SandersCoefficients, PROXAUF2014_HIGH_DENSITY,
    PROXAUF2014_LOW_DENSITY, PROXAUF2014_R_MAX, PROXAUF2014_R_MIN, SANDERS2016_HIGH_DENSITY,
    SANDERS2016_LOW_DENSITY,
};

use super::TableEngine;
use crate::domain::{Component, EngineResult, SpaxelResult, Table};
use tracing::debug;

/// Electron density from the `[SII] ratio` / `[OII] ratio` columns.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityEngine {
    requests: Vec<DensityRequest>,
}

impl DensityEngine {
    pub fn new(requests: Vec<DensityRequest>) -> SpaxelResult<Self> {
        for request in &requests {
            request.validate()?;
        }
        Ok(Self { requests })
    }

    pub fn requests(&self) -> &[DensityRequest] {
        &self.requests
    }

    /// Densities for a slice of ratios, in the same order.
    pub fn estimate(request: &DensityRequest, ratios: &[f64]) -> Vec<DensityEstimate> {
        ratios
            .iter()
            .map(|&ratio| request.electron_density(ratio))
            .collect()
    }
}

impl Default for DensityEngine {
    fn default() -> Self {
        Self {
            requests: DensityRequest::defaults(),
        }
    }
}

impl TableEngine for DensityEngine {
    fn name(&self) -> &'static str {
        "density"
    }

    fn apply(&self, table: &Table, component: Option<Component>) -> EngineResult<Table> {
        let view = table.view(component);
        let mut columns = Vec::with_capacity(self.requests.len());
        for request in &self.requests {
            let requirement = format!("electron density diagnostic {}", request.density_column());
            let ratios = view.require(&requirement, request.line.ratio_column())?;
            columns.push((request, Self::estimate(request, ratios)));
        }

        let mut output = table.clone();
        let mut view = output.view_mut(component);
        for (request, estimates) in columns {
            debug!(
                component = ?component,
                diagnostic = %request.diagnostic,
                line = %request.line,
                lower_limits = estimates.iter().filter(|estimate| estimate.lower_limit).count(),
                upper_limits = estimates.iter().filter(|estimate| estimate.upper_limit).count(),
                "computed electron densities"
            );
            view.insert_numeric(
                &request.density_column(),
                estimates.iter().map(|estimate| estimate.n_e).collect(),
            )?;
            view.insert_flag(
                &request.lower_limit_column(),
                estimates.iter().map(|estimate| estimate.lower_limit).collect(),
            )?;
            view.insert_flag(
                &request.upper_limit_column(),
                estimates.iter().map(|estimate| estimate.upper_limit).collect(),
            )?;
        }
        Ok(output)
    }
}
