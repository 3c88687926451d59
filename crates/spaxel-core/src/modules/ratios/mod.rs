mod doublets;
mod model;

pub use doublets::{reconcile_doublets, Doublet, DOUBLETS};
pub use model::{ratio_definition, RatioDefinition, RATIO_CATALOGUE};

use super::TableEngine;
use crate::domain::{
    Component, ComponentViewMut, EmissionLine, EngineResult, SpaxelResult, Table,
};
use crate::numerics::{log_error_bars, quadrature_sum, ratio_error, safe_log10};
use tracing::debug;

/// Doublet reconciliation followed by the ratio catalogue.
///
/// Ratios whose lines are absent are skipped; ratio errors are only added when
/// every line also carries an error column.
#[derive(Debug, Clone, Copy, Default)]
pub struct RatioEngine;

impl TableEngine for RatioEngine {
    fn name(&self) -> &'static str {
        "ratios"
    }

    fn apply(&self, table: &Table, component: Option<Component>) -> EngineResult<Table> {
        let mut output = table.clone();
        let mut view = output.view_mut(component);
        reconcile_doublets(&mut view)?;

        let mut added = 0usize;
        for definition in &RATIO_CATALOGUE {
            if add_ratio(&mut view, definition)? {
                added += 1;
            }
        }
        debug!(component = ?component, ratios = added, "computed line ratios");
        Ok(output)
    }
}

/// Per-factor flux and error columns: a factor's flux is the sum of its lines
/// and its error is their quadrature sum.
struct Factor {
    values: Vec<f64>,
    errors: Option<Vec<f64>>,
}

fn load_factor(view: &ComponentViewMut<'_>, lines: &[EmissionLine]) -> Option<Factor> {
    let mut line_values: Vec<&[f64]> = Vec::with_capacity(lines.len());
    for &line in lines {
        line_values.push(view.numeric(line.column_name())?);
    }
    let line_errors: Option<Vec<&[f64]>> = lines
        .iter()
        .map(|line| view.numeric(&line.error_column_name()))
        .collect();

    let rows = view.len();
    let values: Vec<f64> = (0..rows)
        .map(|row| line_values.iter().map(|values| values[row]).sum::<f64>())
        .collect();
    let errors: Option<Vec<f64>> = line_errors.map(|line_errors| {
        (0..rows)
            .map(|row| {
                let terms: Vec<f64> = line_errors.iter().map(|errors| errors[row]).collect();
                quadrature_sum(&terms)
            })
            .collect()
    });
    Some(Factor { values, errors })
}

fn add_ratio(view: &mut ComponentViewMut<'_>, definition: &RatioDefinition) -> SpaxelResult<bool> {
    let mut numerator = Vec::with_capacity(definition.numerator.len());
    for lines in definition.numerator {
        match load_factor(view, lines) {
            Some(factor) => numerator.push(factor),
            None => return Ok(false),
        }
    }
    let mut denominator = Vec::with_capacity(definition.denominator.len());
    for lines in definition.denominator {
        match load_factor(view, lines) {
            Some(factor) => denominator.push(factor),
            None => return Ok(false),
        }
    }

    let rows = view.len();
    let ratios: Vec<f64> = (0..rows)
        .map(|row| {
            let top: f64 = numerator.iter().map(|factor| factor.values[row]).product();
            let bottom: f64 = denominator.iter().map(|factor| factor.values[row]).product();
            top / bottom
        })
        .collect();
    let logs: Vec<f64> = ratios.iter().copied().map(safe_log10).collect();

    let added = view.insert_numeric(definition.name, ratios.clone())?;
    view.insert_numeric(&definition.log_name(), logs)?;

    let all_factors: Vec<&Factor> = numerator.iter().chain(&denominator).collect();
    if all_factors.iter().all(|factor| factor.errors.is_some()) {
        let errors: Vec<f64> = (0..rows)
            .map(|row| {
                let pairs: Vec<(f64, f64)> = all_factors
                    .iter()
                    .filter_map(|factor| {
                        factor
                            .errors
                            .as_ref()
                            .map(|errors| (factor.values[row], errors[row]))
                    })
                    .collect();
                ratio_error(ratios[row], &pairs)
            })
            .collect();
        let (lower, upper): (Vec<f64>, Vec<f64>) = ratios
            .iter()
            .zip(&errors)
            .map(|(&ratio, &error)| {
                let bars = log_error_bars(ratio, error);
                (bars.lower, bars.upper)
            })
            .unzip();
        let (lower_name, upper_name) = definition.log_error_names();
        view.insert_numeric(&definition.error_name(), errors)?;
        view.insert_numeric(&lower_name, lower)?;
        view.insert_numeric(&upper_name, upper)?;
    }

    Ok(added)
}
