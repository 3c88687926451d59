mod calibrations;
mod model;
mod monte_carlo;
mod solver;

pub use calibrations::{k19_ionisation_surface, k19_metallicity_surface, K19Surface};
pub use model::{
    error_columns, CalibrationFamily, IonisationDiagnostic, LogUMode, MetallicityDiagnostic,
    MetallicityRequest,
};
pub use monte_carlo::{resample, resample_rows, row_seed, ResampledEstimate};
pub use solver::{Calibration, MetallicityEstimate, DEFAULT_MAX_ITERATIONS};

use super::classification::{BptClass, BPT_NUMERIC_COLUMN};
use super::TableEngine;
use crate::common::MonteCarloConfig;
use crate::domain::{
    Component, ComponentView, EmissionLine, EngineResult, FluxRow, SpaxelError, SpaxelResult,
    Table,
};
use tracing::debug;

/// One metallicity request applied to the star-forming rows of a component.
///
/// All requirements (mode, line and error columns, BPT codes) are checked
/// before any row is evaluated. Rows that are not star-forming get NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct MetallicityEngine {
    request: MetallicityRequest,
    calibration: Calibration,
    monte_carlo: MonteCarloConfig,
}

/// Output columns for every row of the table.
struct MetallicityColumns {
    log_oh12: Vec<f64>,
    log_oh12_lower: Vec<f64>,
    log_oh12_upper: Vec<f64>,
    log_u: Vec<f64>,
    log_u_lower: Vec<f64>,
    log_u_upper: Vec<f64>,
    converged: Vec<bool>,
}

impl MetallicityColumns {
    fn undefined(rows: usize) -> Self {
        Self {
            log_oh12: vec![f64::NAN; rows],
            log_oh12_lower: vec![f64::NAN; rows],
            log_oh12_upper: vec![f64::NAN; rows],
            log_u: vec![f64::NAN; rows],
            log_u_lower: vec![f64::NAN; rows],
            log_u_upper: vec![f64::NAN; rows],
            converged: vec![false; rows],
        }
    }
}

impl MetallicityEngine {
    pub fn new(request: MetallicityRequest, monte_carlo: MonteCarloConfig) -> SpaxelResult<Self> {
        let mode = request.mode()?;
        if request.compute_errors && (monte_carlo.niters == 0 || monte_carlo.nthreads == 0) {
            return Err(SpaxelError::input_validation(
                "INPUT.MONTE_CARLO",
                format!(
                    "metallicity diagnostic {} needs at least one iteration and one thread (got niters={}, nthreads={})",
                    request.diagnostic, monte_carlo.niters, monte_carlo.nthreads
                ),
            ));
        }
        Ok(Self {
            calibration: Calibration::new(request.diagnostic, mode),
            request,
            monte_carlo,
        })
    }

    pub fn request(&self) -> &MetallicityRequest {
        &self.request
    }

    pub fn mode(&self) -> LogUMode {
        self.calibration.mode
    }

    fn lines(&self) -> Vec<EmissionLine> {
        self.request.lines(self.mode())
    }

    fn validate_columns(&self, view: &ComponentView<'_>) -> SpaxelResult<()> {
        let mut requirements = vec![(
            format!("metallicity diagnostic {}", self.request.diagnostic),
            self.request.diagnostic.lines(),
        )];
        if let LogUMode::Solve(ion) = self.mode() {
            requirements.push((format!("ionisation parameter diagnostic {ion}"), ion.lines()));
        }
        for (requirement, lines) in &requirements {
            for line in *lines {
                view.require(requirement, line.column_name())?;
                if self.request.compute_errors {
                    view.require(requirement, &line.error_column_name())?;
                }
            }
        }
        view.require(&requirements[0].0, BPT_NUMERIC_COLUMN)?;
        Ok(())
    }

    fn star_forming_rows(&self, view: &ComponentView<'_>) -> SpaxelResult<Vec<FluxRow>> {
        let requirement = format!("metallicity diagnostic {}", self.request.diagnostic);
        let codes = view.require(&requirement, BPT_NUMERIC_COLUMN)?;
        let lines = self.lines();
        Ok(codes
            .iter()
            .enumerate()
            .filter(|&(_, &code)| BptClass::from_code(code) == Some(BptClass::StarForming))
            .map(|(index, _)| FluxRow::from_view(view, index, &lines))
            .collect())
    }

    fn evaluate(&self, rows: &[FluxRow], total_rows: usize) -> SpaxelResult<MetallicityColumns> {
        let mut columns = MetallicityColumns::undefined(total_rows);
        let estimates: Vec<MetallicityEstimate> =
            rows.iter().map(|row| self.calibration.estimate(row)).collect();
        for (row, estimate) in rows.iter().zip(&estimates) {
            columns.log_oh12[row.index] = estimate.log_oh12;
            columns.log_u[row.index] = estimate.log_u;
            columns.converged[row.index] = estimate.converged;
        }

        if self.request.compute_errors {
            let resampled = resample_rows(&self.calibration, &self.lines(), rows, &self.monte_carlo)?;
            for (row, estimate) in rows.iter().zip(resampled) {
                columns.log_oh12[row.index] = estimate.log_oh12.mean;
                columns.log_oh12_lower[row.index] = estimate.log_oh12.error.lower;
                columns.log_oh12_upper[row.index] = estimate.log_oh12.error.upper;
                columns.log_u[row.index] = estimate.log_u.mean;
                columns.log_u_lower[row.index] = estimate.log_u.error.lower;
                columns.log_u_upper[row.index] = estimate.log_u.error.upper;
            }
        }

        if let LogUMode::Fixed(log_u) = self.mode() {
            for (value, log_oh12) in columns.log_u.iter_mut().zip(&columns.log_oh12) {
                *value = if log_oh12.is_nan() { f64::NAN } else { log_u };
            }
        }
        Ok(columns)
    }
}

impl TableEngine for MetallicityEngine {
    fn name(&self) -> &'static str {
        "metallicity"
    }

    fn apply(&self, table: &Table, component: Option<Component>) -> EngineResult<Table> {
        let view = table.view(component);
        self.validate_columns(&view)?;
        let rows = self.star_forming_rows(&view)?;
        let columns = self.evaluate(&rows, table.len())?;
        debug!(
            component = ?component,
            diagnostic = %self.request.diagnostic,
            star_forming = rows.len(),
            valid = columns.log_oh12.iter().filter(|value| !value.is_nan()).count(),
            errors = self.request.compute_errors,
            "computed metallicities"
        );

        let mode = self.mode();
        let metallicity_column = self.request.metallicity_column(mode);
        let mut output = table.clone();
        let mut view = output.view_mut(component);
        view.insert_numeric(&metallicity_column, columns.log_oh12)?;
        if self.request.compute_errors {
            let (lower, upper) = error_columns(&metallicity_column);
            view.insert_numeric(&lower, columns.log_oh12_lower)?;
            view.insert_numeric(&upper, columns.log_oh12_upper)?;
        }
        if let Some(log_u_column) = self.request.log_u_column(mode) {
            view.insert_numeric(&log_u_column, columns.log_u)?;
            if self.request.compute_errors && matches!(mode, LogUMode::Solve(_)) {
                let (lower, upper) = error_columns(&log_u_column);
                view.insert_numeric(&lower, columns.log_u_lower)?;
                view.insert_numeric(&upper, columns.log_u_upper)?;
            }
        }
        if let Some(convergence_column) = self.request.convergence_column(mode) {
            view.insert_flag(&convergence_column, columns.converged)?;
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::{IonisationDiagnostic, MetallicityDiagnostic, MetallicityEngine, MetallicityRequest};
    use crate::common::MonteCarloConfig;
    use crate::domain::{BinId, ColumnKey, Component, SpaxelErrorCategory, Table};
    use crate::modules::TableEngine;

    const TOTAL: Option<Component> = Some(Component::Total);

    fn n2_table() -> Table {
        let ids = (0..3).map(|bin| BinId::new("G", bin)).collect();
        Table::new(ids)
            .with_numeric(ColumnKey::total("NII6583"), vec![1.0, 1.0, 2.0])
            .and_then(|t| t.with_numeric(ColumnKey::total("NII6583 error"), vec![0.0, 0.0, 0.0]))
            .and_then(|t| t.with_numeric(ColumnKey::total("HALPHA"), vec![3.0, 3.0, 2.0]))
            .and_then(|t| t.with_numeric(ColumnKey::total("HALPHA error"), vec![0.0, 0.0, 0.0]))
            .and_then(|t| t.with_numeric(ColumnKey::total("BPT (numeric)"), vec![0.0, 2.0, 0.0]))
            .expect("columns should insert")
    }

    fn monte_carlo() -> MonteCarloConfig {
        MonteCarloConfig {
            niters: 20,
            nthreads: 2,
            seed: 5,
        }
    }

    #[test]
    fn only_star_forming_rows_get_metallicities() {
        let engine = MetallicityEngine::new(
            MetallicityRequest::new(MetallicityDiagnostic::N2HaPP04),
            monte_carlo(),
        )
        .expect("request should validate");
        let output = engine.apply(&n2_table(), TOTAL).expect("metallicity should compute");
        let values = output
            .numeric(&ColumnKey::total("log(O/H) + 12 (N2Ha_PP04)"))
            .expect("metallicity column should exist");

        let log_r = (1.0_f64 / 3.0).log10();
        let expected = 9.37 + 2.03 * log_r + 1.26 * log_r.powi(2) + 0.32 * log_r.powi(3);
        assert!((values[0] - expected).abs() < 1.0e-12);
        // LINER row
        assert!(values[1].is_nan());
        // log N2 = 0 is outside the calibration
        assert!(values[2].is_nan());
        assert!(!output.contains(&ColumnKey::total("log(O/H) + 12 (N2Ha_PP04) error (lower)")));
    }

    #[test]
    fn error_mode_with_zero_errors_matches_the_deterministic_value() {
        let engine = MetallicityEngine::new(
            MetallicityRequest::new(MetallicityDiagnostic::N2HaPP04).with_errors(true),
            monte_carlo(),
        )
        .expect("request should validate");
        let output = engine.apply(&n2_table(), TOTAL).expect("metallicity should compute");
        let value = output
            .numeric(&ColumnKey::total("log(O/H) + 12 (N2Ha_PP04)"))
            .expect("metallicity column should exist")[0];
        let lower = output
            .numeric(&ColumnKey::total("log(O/H) + 12 (N2Ha_PP04) error (lower)"))
            .expect("lower error should exist")[0];
        let upper = output
            .numeric(&ColumnKey::total("log(O/H) + 12 (N2Ha_PP04) error (upper)"))
            .expect("upper error should exist")[0];
        let log_r = (1.0_f64 / 3.0).log10();
        let expected = 9.37 + 2.03 * log_r + 1.26 * log_r.powi(2) + 0.32 * log_r.powi(3);
        assert!((value - expected).abs() < 1.0e-12);
        assert!(lower.abs() < 1.0e-12 && upper.abs() < 1.0e-12);
    }

    #[test]
    fn fixed_log_u_is_reported_only_where_valid() {
        let engine = MetallicityEngine::new(
            MetallicityRequest::new(MetallicityDiagnostic::N2HaK19).with_log_u(-3.0),
            monte_carlo(),
        )
        .expect("request should validate");
        let output = engine.apply(&n2_table(), TOTAL).expect("metallicity should compute");
        let log_oh12 = output
            .numeric(&ColumnKey::total("log(O/H) + 12 (N2Ha_K19)"))
            .expect("metallicity column should exist");
        let log_u = output
            .numeric(&ColumnKey::total("log(U) (N2Ha_K19)"))
            .expect("log U column should exist");
        for (z, u) in log_oh12.iter().zip(log_u) {
            assert_eq!(z.is_nan(), u.is_nan());
        }
        assert!(log_u[1].is_nan());
    }

    #[test]
    fn missing_columns_fail_before_any_row_is_evaluated() {
        let engine = MetallicityEngine::new(
            MetallicityRequest::new(MetallicityDiagnostic::N2O2K19)
                .solving_log_u(IonisationDiagnostic::O3O2K19),
            monte_carlo(),
        )
        .expect("request should validate");
        let error = engine
            .apply(&n2_table(), TOTAL)
            .expect_err("[OII] is absent");
        assert_eq!(error.category(), SpaxelErrorCategory::InputValidationError);
        assert_eq!(
            error.message(),
            "metallicity diagnostic N2O2_K19 requires column 'OII3726+OII3729 (total)' which was not found in the table"
        );

        let errors_needed = MetallicityEngine::new(
            MetallicityRequest::new(MetallicityDiagnostic::N2HaPP04).with_errors(true),
            monte_carlo(),
        )
        .expect("request should validate");
        let table = Table::new(vec![BinId::new("G", 0)])
            .with_numeric(ColumnKey::total("NII6583"), vec![1.0])
            .and_then(|t| t.with_numeric(ColumnKey::total("HALPHA"), vec![3.0]))
            .and_then(|t| t.with_numeric(ColumnKey::total("BPT (numeric)"), vec![0.0]))
            .expect("columns should insert");
        let error = errors_needed
            .apply(&table, TOTAL)
            .expect_err("error columns are absent");
        assert!(error.message().contains("NII6583 error (total)"));
    }

    #[test]
    fn invalid_monte_carlo_settings_are_rejected() {
        let error = MetallicityEngine::new(
            MetallicityRequest::new(MetallicityDiagnostic::N2HaPP04).with_errors(true),
            MonteCarloConfig {
                niters: 0,
                nthreads: 1,
                seed: 0,
            },
        )
        .expect_err("zero iterations");
        assert_eq!(error.placeholder(), "INPUT.MONTE_CARLO");
    }
}
