use super::curves::{
    kauffmann2003, kewley2001, kewley2006_s2_unbounded, law2021_1sigma, law2021_3sigma, BptAxis,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BptClass {
    StarForming,
    Composite,
    Liner,
    Seyfert,
    Ambiguous,
    NotClassified,
}

impl BptClass {
    pub const ALL: [Self; 6] = [
        Self::StarForming,
        Self::Composite,
        Self::Liner,
        Self::Seyfert,
        Self::Ambiguous,
        Self::NotClassified,
    ];

    pub const fn code(self) -> f64 {
        match self {
            Self::StarForming => 0.0,
            Self::Composite => 1.0,
            Self::Liner => 2.0,
            Self::Seyfert => 3.0,
            Self::Ambiguous => 4.0,
            Self::NotClassified => -1.0,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::StarForming => "SF",
            Self::Composite => "Composite",
            Self::Liner => "LINER",
            Self::Seyfert => "Seyfert",
            Self::Ambiguous => "Ambiguous",
            Self::NotClassified => "Not classified",
        }
    }

    pub fn from_code(code: f64) -> Option<Self> {
        Self::ALL.into_iter().find(|class| class.code() == code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Law2021Class {
    Cold,
    Intermediate,
    Warm,
    Ambiguous,
    NotClassified,
}

impl Law2021Class {
    pub const fn code(self) -> f64 {
        match self {
            Self::Cold => 0.0,
            Self::Intermediate => 1.0,
            Self::Warm => 2.0,
            Self::Ambiguous => 3.0,
            Self::NotClassified => -1.0,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Cold => "Cold",
            Self::Intermediate => "Intermediate",
            Self::Warm => "Warm",
            Self::Ambiguous => "Ambiguous",
            Self::NotClassified => "Not classified",
        }
    }
}

/// One row's position on the N2 and S2 BPT diagrams.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BptPoint {
    pub log_o3: f64,
    pub log_n2: f64,
    pub log_s2: f64,
}

impl BptPoint {
    pub const fn new(log_o3: f64, log_n2: f64, log_s2: f64) -> Self {
        Self {
            log_o3,
            log_n2,
            log_s2,
        }
    }

    fn is_complete(&self) -> bool {
        !(self.log_o3.is_nan() || self.log_n2.is_nan() || self.log_s2.is_nan())
    }
}

/// Classes are tried in order SF, Composite, LINER, Seyfert; the first
/// matching guard wins and anything left over is Ambiguous.
pub fn classify_bpt(point: BptPoint) -> BptClass {
    if !point.is_complete() {
        return BptClass::NotClassified;
    }
    let o3 = point.log_o3;
    let kauffmann = kauffmann2003(point.log_n2);
    let max_starburst_n2 = kewley2001(BptAxis::N2, point.log_n2);
    let max_starburst_s2 = kewley2001(BptAxis::S2, point.log_s2);
    let seyfert_liner = kewley2006_s2_unbounded(point.log_s2);
    let above_max_starburst = o3 >= max_starburst_n2 && o3 >= max_starburst_s2;

    match o3 {
        o3 if o3 < kauffmann && o3 < max_starburst_s2 => BptClass::StarForming,
        o3 if o3 >= kauffmann && o3 < max_starburst_n2 && o3 < max_starburst_s2 => {
            BptClass::Composite
        }
        o3 if above_max_starburst && o3 < seyfert_liner => BptClass::Liner,
        o3 if above_max_starburst && o3 >= seyfert_liner => BptClass::Seyfert,
        _ => BptClass::Ambiguous,
    }
}

/// Classes are tried in order Cold, Intermediate, Warm; anything left over is
/// Ambiguous.
pub fn classify_law2021(point: BptPoint) -> Law2021Class {
    if !point.is_complete() {
        return Law2021Class::NotClassified;
    }
    let BptPoint {
        log_o3,
        log_n2,
        log_s2,
    } = point;
    let one_sigma_n2 = law2021_1sigma(BptAxis::N2, log_n2);
    let one_sigma_s2 = law2021_1sigma(BptAxis::S2, log_s2);
    let three_sigma_n2 = law2021_3sigma(BptAxis::N2, log_o3);
    let three_sigma_s2 = law2021_3sigma(BptAxis::S2, log_o3);

    match point {
        _ if log_o3 < one_sigma_n2 && log_o3 < one_sigma_s2 => Law2021Class::Cold,
        _ if log_o3 >= one_sigma_n2
            && log_o3 >= one_sigma_s2
            && log_n2 < three_sigma_n2
            && log_s2 < three_sigma_s2
            && log_o3 > -0.61 =>
        {
            Law2021Class::Intermediate
        }
        _ if log_n2 >= three_sigma_n2 && log_s2 >= three_sigma_s2 => Law2021Class::Warm,
        _ => Law2021Class::Ambiguous,
    }
}
