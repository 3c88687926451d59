use crate::domain::{Component, EmissionLine, SpaxelError, SpaxelResult};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use EmissionLine::{
    Halpha, Hbeta, Nii6583, NiiDoublet, OiiDoublet, Oiii5007, OiiiDoublet, SiiDoublet, Siii9069,
    Siii9531,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationFamily {
    /// Kewley (2019) bivariate cubics in (log R, log U).
    Kewley2019,
    /// Kobulnicky & Kewley (2004) R23.
    Kobulnicky2004,
    /// Closed-form calibrations with no ionisation-parameter term.
    Fixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum MetallicityDiagnostic {
    #[serde(rename = "N2Ha_K19")]
    N2HaK19,
    #[serde(rename = "S2Ha_K19")]
    S2HaK19,
    #[serde(rename = "N2S2_K19")]
    N2S2K19,
    #[serde(rename = "S23_K19")]
    S23K19,
    #[serde(rename = "O3N2_K19")]
    O3N2K19,
    #[serde(rename = "O2S2_K19")]
    O2S2K19,
    #[serde(rename = "O2Hb_K19")]
    O2HbK19,
    #[serde(rename = "N2O2_K19")]
    N2O2K19,
    #[serde(rename = "R23_K19")]
    R23K19,
    #[serde(rename = "R23_KK04")]
    R23KK04,
    #[serde(rename = "N2Ha_PP04")]
    N2HaPP04,
    #[serde(rename = "N2Ha_M13")]
    N2HaM13,
    #[serde(rename = "O3N2_PP04")]
    O3N2PP04,
    #[serde(rename = "O3N2_M13")]
    O3N2M13,
    #[serde(rename = "N2S2Ha_D16")]
    N2S2HaD16,
    #[serde(rename = "N2O2_KD02")]
    N2O2KD02,
    #[serde(rename = "Rcal_PG16")]
    RcalPG16,
    #[serde(rename = "Scal_PG16")]
    ScalPG16,
    #[serde(rename = "ONS_P10")]
    OnsP10,
    #[serde(rename = "ON_P10")]
    OnP10,
}

impl MetallicityDiagnostic {
    pub const ALL: [Self; 20] = [
        Self::N2HaK19,
        Self::S2HaK19,
        Self::N2S2K19,
        Self::S23K19,
        Self::O3N2K19,
        Self::O2S2K19,
        Self::O2HbK19,
        Self::N2O2K19,
        Self::R23K19,
        Self::R23KK04,
        Self::N2HaPP04,
        Self::N2HaM13,
        Self::O3N2PP04,
        Self::O3N2M13,
        Self::N2S2HaD16,
        Self::N2O2KD02,
        Self::RcalPG16,
        Self::ScalPG16,
        Self::OnsP10,
        Self::OnP10,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::N2HaK19 => "N2Ha_K19",
            Self::S2HaK19 => "S2Ha_K19",
            Self::N2S2K19 => "N2S2_K19",
            Self::S23K19 => "S23_K19",
            Self::O3N2K19 => "O3N2_K19",
            Self::O2S2K19 => "O2S2_K19",
            Self::O2HbK19 => "O2Hb_K19",
            Self::N2O2K19 => "N2O2_K19",
            Self::R23K19 => "R23_K19",
            Self::R23KK04 => "R23_KK04",
            Self::N2HaPP04 => "N2Ha_PP04",
            Self::N2HaM13 => "N2Ha_M13",
            Self::O3N2PP04 => "O3N2_PP04",
            Self::O3N2M13 => "O3N2_M13",
            Self::N2S2HaD16 => "N2S2Ha_D16",
            Self::N2O2KD02 => "N2O2_KD02",
            Self::RcalPG16 => "Rcal_PG16",
            Self::ScalPG16 => "Scal_PG16",
            Self::OnsP10 => "ONS_P10",
            Self::OnP10 => "ON_P10",
        }
    }

    pub const fn family(self) -> CalibrationFamily {
        match self {
            Self::N2HaK19
            | Self::S2HaK19
            | Self::N2S2K19
            | Self::S23K19
            | Self::O3N2K19
            | Self::O2S2K19
            | Self::O2HbK19
            | Self::N2O2K19
            | Self::R23K19 => CalibrationFamily::Kewley2019,
            Self::R23KK04 => CalibrationFamily::Kobulnicky2004,
            _ => CalibrationFamily::Fixed,
        }
    }

    pub const fn requires_log_u(self) -> bool {
        !matches!(self.family(), CalibrationFamily::Fixed)
    }

    /// Flux columns the calibration reads.
    pub const fn lines(self) -> &'static [EmissionLine] {
        match self {
            Self::N2HaK19 | Self::N2HaPP04 | Self::N2HaM13 => &[Nii6583, Halpha],
            Self::S2HaK19 => &[SiiDoublet, Halpha],
            Self::N2S2K19 => &[Nii6583, SiiDoublet],
            Self::S23K19 => &[SiiDoublet, Siii9069, Siii9531, Halpha],
            Self::O3N2K19 | Self::O3N2PP04 | Self::O3N2M13 => &[Oiii5007, Hbeta, Nii6583, Halpha],
            Self::O2S2K19 => &[OiiDoublet, SiiDoublet],
            Self::O2HbK19 => &[OiiDoublet, Hbeta],
            Self::N2O2K19 | Self::N2O2KD02 => &[Nii6583, OiiDoublet],
            Self::R23K19 => &[OiiiDoublet, OiiDoublet, Hbeta],
            Self::R23KK04 => &[Nii6583, OiiDoublet, Hbeta, OiiiDoublet],
            Self::N2S2HaD16 => &[Nii6583, SiiDoublet, Halpha],
            Self::RcalPG16 => &[OiiDoublet, Hbeta, NiiDoublet, OiiiDoublet],
            Self::ScalPG16 => &[Hbeta, NiiDoublet, OiiiDoublet, SiiDoublet],
            Self::OnsP10 | Self::OnP10 => &[OiiDoublet, OiiiDoublet, NiiDoublet, SiiDoublet, Hbeta],
        }
    }
}

impl Display for MetallicityDiagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetallicityDiagnostic {
    type Err = SpaxelError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|diagnostic| diagnostic.as_str() == token.trim())
            .ok_or_else(|| {
                SpaxelError::input_validation(
                    "INPUT.METALLICITY_DIAGNOSTIC",
                    format!("metallicity diagnostic '{token}' is not valid"),
                )
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum IonisationDiagnostic {
    #[serde(rename = "O3O2_K19")]
    O3O2K19,
    #[serde(rename = "S32_K19")]
    S32K19,
    #[serde(rename = "O3O2_KK04")]
    O3O2KK04,
}

impl IonisationDiagnostic {
    pub const ALL: [Self; 3] = [Self::O3O2K19, Self::S32K19, Self::O3O2KK04];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::O3O2K19 => "O3O2_K19",
            Self::S32K19 => "S32_K19",
            Self::O3O2KK04 => "O3O2_KK04",
        }
    }

    pub const fn family(self) -> CalibrationFamily {
        match self {
            Self::O3O2K19 | Self::S32K19 => CalibrationFamily::Kewley2019,
            Self::O3O2KK04 => CalibrationFamily::Kobulnicky2004,
        }
    }

    pub const fn lines(self) -> &'static [EmissionLine] {
        match self {
            Self::O3O2K19 => &[Oiii5007, OiiDoublet],
            Self::S32K19 => &[Siii9069, Siii9531, SiiDoublet],
            Self::O3O2KK04 => &[OiiiDoublet, OiiDoublet],
        }
    }
}

impl Display for IonisationDiagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IonisationDiagnostic {
    type Err = SpaxelError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|diagnostic| diagnostic.as_str() == token.trim())
            .ok_or_else(|| {
                SpaxelError::input_validation(
                    "INPUT.IONISATION_DIAGNOSTIC",
                    format!(
                        "ionisation parameter diagnostic '{token}' is not valid (expected O3O2_K19, S32_K19 or O3O2_KK04)"
                    ),
                )
            })
    }
}

/// How the ionisation parameter enters a calibration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogUMode {
    /// The calibration has no log(U) term.
    None,
    /// A caller-supplied constant log(U).
    Fixed(f64),
    /// log(U) solved jointly with the metallicity.
    Solve(IonisationDiagnostic),
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MetallicityRequest {
    pub diagnostic: MetallicityDiagnostic,
    #[serde(default, rename = "logU")]
    pub log_u: Option<f64>,
    #[serde(default)]
    pub ion_diagnostic: Option<IonisationDiagnostic>,
    #[serde(default)]
    pub compute_errors: bool,
    /// Components to compute on; all components when absent.
    #[serde(default)]
    pub components: Option<Vec<Component>>,
}

impl MetallicityRequest {
    pub fn new(diagnostic: MetallicityDiagnostic) -> Self {
        Self {
            diagnostic,
            log_u: None,
            ion_diagnostic: None,
            compute_errors: false,
            components: None,
        }
    }

    pub fn with_log_u(mut self, log_u: f64) -> Self {
        self.log_u = Some(log_u);
        self
    }

    pub fn solving_log_u(mut self, ion_diagnostic: IonisationDiagnostic) -> Self {
        self.ion_diagnostic = Some(ion_diagnostic);
        self
    }

    pub fn with_errors(mut self, compute_errors: bool) -> Self {
        self.compute_errors = compute_errors;
        self
    }

    pub fn applies_to(&self, component: Component) -> bool {
        self.components
            .as_ref()
            .is_none_or(|components| components.contains(&component))
    }

    /// Checks the combination of diagnostic, log(U) and ionisation diagnostic.
    pub fn mode(&self) -> SpaxelResult<LogUMode> {
        let diagnostic = self.diagnostic;
        let reject = |message: String| {
            Err(SpaxelError::input_validation(
                "INPUT.METALLICITY_MODE",
                format!("metallicity diagnostic {diagnostic}: {message}"),
            ))
        };

        match (diagnostic.family(), self.log_u, self.ion_diagnostic) {
            (CalibrationFamily::Fixed, None, None) => Ok(LogUMode::None),
            (CalibrationFamily::Fixed, _, _) => {
                reject("does not depend on log(U); remove logU and ionDiagnostic".to_string())
            }
            (_, Some(_), Some(_)) => {
                reject("give either a fixed logU or an ionDiagnostic, not both".to_string())
            }
            (_, None, None) => {
                reject("requires either a fixed logU or an ionDiagnostic to solve for log(U)".to_string())
            }
            (_, Some(log_u), None) if !log_u.is_finite() => {
                reject(format!("logU must be finite (got {log_u})"))
            }
            (_, Some(log_u), None) => Ok(LogUMode::Fixed(log_u)),
            (family, None, Some(ion)) if ion.family() != family => reject(format!(
                "cannot be solved with ionisation parameter diagnostic {ion}; use {}",
                matching_ionisation_diagnostics(family)
            )),
            (_, None, Some(ion)) => Ok(LogUMode::Solve(ion)),
        }
    }

    /// Every line a computation in `mode` reads, without duplicates.
    pub fn lines(&self, mode: LogUMode) -> Vec<EmissionLine> {
        let mut lines = self.diagnostic.lines().to_vec();
        if let LogUMode::Solve(ion) = mode {
            lines.extend(ion.lines().iter().filter(|line| !self.diagnostic.lines().contains(line)));
        }
        lines
    }

    pub fn metallicity_column(&self, mode: LogUMode) -> String {
        match mode {
            LogUMode::Solve(ion) => format!("log(O/H) + 12 ({}/{ion})", self.diagnostic),
            _ => format!("log(O/H) + 12 ({})", self.diagnostic),
        }
    }

    pub fn log_u_column(&self, mode: LogUMode) -> Option<String> {
        match mode {
            LogUMode::None => None,
            LogUMode::Fixed(_) => Some(format!("log(U) ({})", self.diagnostic)),
            LogUMode::Solve(ion) => Some(format!("log(U) ({}/{ion})", self.diagnostic)),
        }
    }

    pub fn convergence_column(&self, mode: LogUMode) -> Option<String> {
        matches!(mode, LogUMode::Solve(_))
            .then(|| format!("{} converged", self.metallicity_column(mode)))
    }
}

fn matching_ionisation_diagnostics(family: CalibrationFamily) -> &'static str {
    match family {
        CalibrationFamily::Kobulnicky2004 => "O3O2_KK04",
        _ => "O3O2_K19 or S32_K19",
    }
}

pub fn error_columns(column: &str) -> (String, String) {
    (format!("{column} error (lower)"), format!("{column} error (upper)"))
}
