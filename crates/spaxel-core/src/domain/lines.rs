use super::{BinId, ComponentView};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Emission lines and doublet sums the engines read by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EmissionLine {
    Halpha,
    Hbeta,
    HeIi4686,
    NeV3426,
    NeIii3869,
    Oi6300,
    Oii3726,
    Oii3729,
    OiiDoublet,
    Nii6548,
    Nii6583,
    NiiDoublet,
    Oiii4959,
    Oiii5007,
    OiiiDoublet,
    Sii6716,
    Sii6731,
    SiiDoublet,
    Siii9069,
    Siii9531,
    SiiiDoublet,
}

impl EmissionLine {
    pub const COUNT: usize = 21;

    pub const ALL: [Self; Self::COUNT] = [
        Self::Halpha,
        Self::Hbeta,
        Self::HeIi4686,
        Self::NeV3426,
        Self::NeIii3869,
        Self::Oi6300,
        Self::Oii3726,
        Self::Oii3729,
        Self::OiiDoublet,
        Self::Nii6548,
        Self::Nii6583,
        Self::NiiDoublet,
        Self::Oiii4959,
        Self::Oiii5007,
        Self::OiiiDoublet,
        Self::Sii6716,
        Self::Sii6731,
        Self::SiiDoublet,
        Self::Siii9069,
        Self::Siii9531,
        Self::SiiiDoublet,
    ];

    pub const fn column_name(self) -> &'static str {
        match self {
            Self::Halpha => "HALPHA",
            Self::Hbeta => "HBETA",
            Self::HeIi4686 => "HeII4686",
            Self::NeV3426 => "NeV3426",
            Self::NeIii3869 => "NeIII3869",
            Self::Oi6300 => "OI6300",
            Self::Oii3726 => "OII3726",
            Self::Oii3729 => "OII3729",
            Self::OiiDoublet => "OII3726+OII3729",
            Self::Nii6548 => "NII6548",
            Self::Nii6583 => "NII6583",
            Self::NiiDoublet => "NII6548+NII6583",
            Self::Oiii4959 => "OIII4959",
            Self::Oiii5007 => "OIII5007",
            Self::OiiiDoublet => "OIII4959+OIII5007",
            Self::Sii6716 => "SII6716",
            Self::Sii6731 => "SII6731",
            Self::SiiDoublet => "SII6716+SII6731",
            Self::Siii9069 => "SIII9069",
            Self::Siii9531 => "SIII9531",
            Self::SiiiDoublet => "SIII9069+SIII9531",
        }
    }

    pub fn error_column_name(self) -> String {
        format!("{} error", self.column_name())
    }

    pub const fn index(self) -> usize {
        self as usize
    }
}

impl Display for EmissionLine {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.column_name())
    }
}

impl FromStr for EmissionLine {
    type Err = String;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|line| line.column_name() == name)
            .ok_or_else(|| format!("unknown emission line '{name}'"))
    }
}

/// Per-line scalar storage indexed by [`EmissionLine`]; absent lines are NaN.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineFluxes([f64; EmissionLine::COUNT]);

impl Default for LineFluxes {
    fn default() -> Self {
        Self([f64::NAN; EmissionLine::COUNT])
    }
}

impl LineFluxes {
    pub fn get(&self, line: EmissionLine) -> f64 {
        self.0[line.index()]
    }

    pub fn set(&mut self, line: EmissionLine, value: f64) {
        self.0[line.index()] = value;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FluxMeasurement {
    pub value: f64,
    pub error: f64,
}

impl FluxMeasurement {
    pub const fn new(value: f64, error: f64) -> Self {
        Self { value, error }
    }
}

/// Value-type copy of one table row's line fluxes, owned by a single worker.
#[derive(Debug, Clone, PartialEq)]
pub struct FluxRow {
    pub id: BinId,
    pub index: usize,
    pub values: LineFluxes,
    pub errors: LineFluxes,
}

impl FluxRow {
    pub fn new(id: BinId, index: usize) -> Self {
        Self {
            id,
            index,
            values: LineFluxes::default(),
            errors: LineFluxes::default(),
        }
    }

    /// Copies the listed lines of row `index` out of a component view.
    /// Lines without a column stay NaN.
    pub fn from_view(view: &ComponentView<'_>, index: usize, lines: &[EmissionLine]) -> Self {
        let mut row = Self::new(view.ids()[index].clone(), index);
        for &line in lines {
            if let Some(values) = view.numeric(line.column_name()) {
                row.values.set(line, values[index]);
            }
            if let Some(errors) = view.numeric(&line.error_column_name()) {
                row.errors.set(line, errors[index]);
            }
        }
        row
    }

    pub fn measurement(&self, line: EmissionLine) -> FluxMeasurement {
        FluxMeasurement::new(self.values.get(line), self.errors.get(line))
    }

    pub fn flux(&self, line: EmissionLine) -> f64 {
        self.values.get(line)
    }
}
