//! Demarcation curves on the N2, S2 and O1 BPT diagrams.
//!
//! Each curve returns the boundary value of log O3 (or, for the 3-sigma
//! Law+2021 curves, of the x-axis ratio) and NaN wherever the curve is
//! undefined. Any comparison against NaN is false.

use crate::numerics::horner;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BptAxis {
    N2,
    S2,
    O1,
}

impl BptAxis {
    pub const fn column(self) -> &'static str {
        match self {
            Self::N2 => "log N2",
            Self::S2 => "log S2",
            Self::O1 => "log O1",
        }
    }
}

fn defined_below(x: f64, cutoff: f64) -> f64 {
    if x > cutoff { f64::NAN } else { x }
}

fn defined_above(x: f64, cutoff: f64) -> f64 {
    if x < cutoff { f64::NAN } else { x }
}

/// Kewley et al. (2001) maximum-starburst line.
pub fn kewley2001(axis: BptAxis, x: f64) -> f64 {
    match axis {
        BptAxis::N2 => 0.61 / (defined_below(x, 0.47) - 0.47) + 1.19,
        BptAxis::S2 => 0.72 / (defined_below(x, 0.32) - 0.32) + 1.30,
        BptAxis::O1 => 0.73 / (defined_below(x, -0.59) + 0.59) + 1.33,
    }
}

/// Kauffmann et al. (2003) empirical star-forming line, N2 diagram only.
pub fn kauffmann2003(log_n2: f64) -> f64 {
    0.61 / (defined_below(log_n2, 0.05) - 0.05) + 1.3
}

/// Lower end of the Kewley et al. (2006) S2 line, close to where it meets
/// the Kewley et al. (2001) curve.
pub const KEWLEY2006_S2_CUTOFF: f64 = -0.314_320_052_018_516_3;
pub const KEWLEY2006_O1_CUTOFF: f64 = -1.1259;

/// Kewley et al. (2006) Seyfert/LINER line, truncated where it crosses the
/// maximum-starburst line on both diagrams.
pub fn kewley2006(axis: BptAxis, x: f64) -> Option<f64> {
    match axis {
        BptAxis::N2 => None,
        BptAxis::S2 => Some(1.89 * defined_above(x, KEWLEY2006_S2_CUTOFF) + 0.76),
        BptAxis::O1 => Some(1.18 * defined_above(x, KEWLEY2006_O1_CUTOFF) + 1.30),
    }
}

/// The S2 Seyfert/LINER line without its lower cutoff, as used by the BPT
/// classifier: rows left of the cutoff are already excluded by the
/// Kewley et al. (2001) conditions.
pub fn kewley2006_s2_unbounded(log_s2: f64) -> f64 {
    1.89 * log_s2 + 0.76
}

/// Law et al. (2021) 1-sigma line: boundary log O3 as a function of x.
pub fn law2021_1sigma(axis: BptAxis, x: f64) -> f64 {
    match axis {
        BptAxis::N2 => 0.359 / (defined_below(x, -0.032) + 0.032) + 1.083,
        BptAxis::S2 => 0.410 / (defined_below(x, 0.198) - 0.198) + 1.164,
        BptAxis::O1 => 0.612 / (defined_below(x, -0.360) + 0.360) + 1.179,
    }
}

/// Law et al. (2021) 3-sigma line: boundary x as a quartic in log O3.
pub fn law2021_3sigma(axis: BptAxis, log_o3: f64) -> f64 {
    match axis {
        BptAxis::N2 => horner(
            &[-0.143, -0.056, -0.542, -0.594, -0.479],
            defined_above(log_o3, -0.61),
        ),
        BptAxis::S2 => horner(
            &[-0.025, -0.610, 0.408, -0.450, -0.943],
            defined_above(log_o3, -0.80),
        ),
        BptAxis::O1 => horner(
            &[-0.283, -6.134, 22.238, -36.343, 18.664],
            defined_below(log_o3, 0.65),
        ),
    }
}
