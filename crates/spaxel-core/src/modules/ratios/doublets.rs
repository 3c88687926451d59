use crate::common::constants::{NII_6583_6548_RATIO, OIII_5007_4959_RATIO, SIII_9531_9069_RATIO};
use crate::domain::{ComponentViewMut, EmissionLine, SpaxelResult};

/// A pair of lines from one ion plus the column holding their sum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Doublet {
    pub weak: EmissionLine,
    pub strong: EmissionLine,
    pub sum: EmissionLine,
    /// Theoretical strong/weak flux ratio; `None` for density-sensitive pairs.
    pub ratio: Option<f64>,
}

pub const DOUBLETS: [Doublet; 5] = [
    Doublet {
        weak: EmissionLine::Oii3726,
        strong: EmissionLine::Oii3729,
        sum: EmissionLine::OiiDoublet,
        ratio: None,
    },
    Doublet {
        weak: EmissionLine::Sii6716,
        strong: EmissionLine::Sii6731,
        sum: EmissionLine::SiiDoublet,
        ratio: None,
    },
    Doublet {
        weak: EmissionLine::Nii6548,
        strong: EmissionLine::Nii6583,
        sum: EmissionLine::NiiDoublet,
        ratio: Some(NII_6583_6548_RATIO),
    },
    Doublet {
        weak: EmissionLine::Oiii4959,
        strong: EmissionLine::Oiii5007,
        sum: EmissionLine::OiiiDoublet,
        ratio: Some(OIII_5007_4959_RATIO),
    },
    Doublet {
        weak: EmissionLine::Siii9069,
        strong: EmissionLine::Siii9531,
        sum: EmissionLine::SiiiDoublet,
        ratio: Some(SIII_9531_9069_RATIO),
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quantity {
    Flux,
    Error,
}

impl Quantity {
    fn column(self, line: EmissionLine) -> String {
        match self {
            Self::Flux => line.column_name().to_string(),
            Self::Error => line.error_column_name(),
        }
    }

    fn combine(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            Self::Flux => lhs + rhs,
            Self::Error => lhs.hypot(rhs),
        }
    }
}

fn read(view: &ComponentViewMut<'_>, quantity: Quantity, line: EmissionLine) -> Option<Vec<f64>> {
    view.numeric(&quantity.column(line)).map(<[f64]>::to_vec)
}

fn scaled(values: &[f64], factor: f64) -> Vec<f64> {
    values.iter().map(|value| value * factor).collect()
}

fn combine(
    view: &mut ComponentViewMut<'_>,
    quantity: Quantity,
    doublet: &Doublet,
) -> SpaxelResult<()> {
    if view.contains(&quantity.column(doublet.sum)) {
        return Ok(());
    }
    if let (Some(weak), Some(strong)) = (
        read(view, quantity, doublet.weak),
        read(view, quantity, doublet.strong),
    ) {
        let sum = weak
            .iter()
            .zip(&strong)
            .map(|(&lhs, &rhs)| quantity.combine(lhs, rhs))
            .collect();
        view.insert_numeric(&quantity.column(doublet.sum), sum)?;
    }
    Ok(())
}

fn split(
    view: &mut ComponentViewMut<'_>,
    quantity: Quantity,
    doublet: &Doublet,
    ratio: f64,
) -> SpaxelResult<()> {
    let weak_column = quantity.column(doublet.weak);
    let strong_column = quantity.column(doublet.strong);
    if view.contains(&weak_column) || view.contains(&strong_column) {
        return Ok(());
    }
    if let Some(sum) = read(view, quantity, doublet.sum) {
        view.insert_numeric(&weak_column, scaled(&sum, 1.0 / (1.0 + ratio)))?;
        view.insert_numeric(&strong_column, scaled(&sum, 1.0 / (1.0 + 1.0 / ratio)))?;
    }
    Ok(())
}

fn infer(
    view: &mut ComponentViewMut<'_>,
    quantity: Quantity,
    doublet: &Doublet,
    ratio: f64,
) -> SpaxelResult<()> {
    let weak_column = quantity.column(doublet.weak);
    let strong_column = quantity.column(doublet.strong);
    match (
        read(view, quantity, doublet.weak),
        read(view, quantity, doublet.strong),
    ) {
        (None, Some(strong)) => {
            view.insert_numeric(&weak_column, scaled(&strong, 1.0 / ratio))?;
        }
        (Some(weak), None) => {
            view.insert_numeric(&strong_column, scaled(&weak, ratio))?;
        }
        _ => {}
    }
    Ok(())
}

/// Fills in doublet members and sums: combine, then split sums whose members
/// are both absent, then infer a single missing member, then combine again.
/// Flux and error columns are reconciled independently; existing columns are
/// never replaced.
pub fn reconcile_doublets(view: &mut ComponentViewMut<'_>) -> SpaxelResult<()> {
    for quantity in [Quantity::Flux, Quantity::Error] {
        for doublet in &DOUBLETS {
            combine(view, quantity, doublet)?;
        }
        for doublet in &DOUBLETS {
            if let Some(ratio) = doublet.ratio {
                split(view, quantity, doublet, ratio)?;
            }
        }
        for doublet in &DOUBLETS {
            if let Some(ratio) = doublet.ratio {
                infer(view, quantity, doublet, ratio)?;
            }
        }
        for doublet in &DOUBLETS {
            combine(view, quantity, doublet)?;
        }
    }
    Ok(())
}
