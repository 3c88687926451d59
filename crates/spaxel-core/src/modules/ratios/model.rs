use crate::domain::EmissionLine::{self, *};

/// A line ratio written as a product of sums over a product of sums.
///
/// Every inner slice is one factor whose flux is the sum of its lines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatioDefinition {
    pub name: &'static str,
    pub numerator: &'static [&'static [EmissionLine]],
    pub denominator: &'static [&'static [EmissionLine]],
}

impl RatioDefinition {
    pub fn lines(&self) -> impl Iterator<Item = EmissionLine> + '_ {
        self.numerator
            .iter()
            .chain(self.denominator)
            .flat_map(|factor| factor.iter().copied())
    }

    pub fn log_name(&self) -> String {
        format!("log {}", self.name)
    }

    pub fn error_name(&self) -> String {
        format!("{} error", self.name)
    }

    pub fn log_error_names(&self) -> (String, String) {
        (
            format!("log {} error (lower)", self.name),
            format!("log {} error (upper)", self.name),
        )
    }
}

const fn ratio(
    name: &'static str,
    numerator: &'static [&'static [EmissionLine]],
    denominator: &'static [&'static [EmissionLine]],
) -> RatioDefinition {
    RatioDefinition {
        name,
        numerator,
        denominator,
    }
}

pub const RATIO_CATALOGUE: [RatioDefinition; 19] = [
    ratio("N2", &[&[Nii6583]], &[&[Halpha]]),
    ratio("S2", &[&[SiiDoublet]], &[&[Halpha]]),
    ratio("O3", &[&[Oiii5007]], &[&[Hbeta]]),
    ratio("O1", &[&[Oi6300]], &[&[Halpha]]),
    ratio("He2", &[&[HeIi4686]], &[&[Hbeta]]),
    ratio("N2O2", &[&[Nii6583]], &[&[OiiDoublet]]),
    ratio("N2S2", &[&[Nii6583]], &[&[SiiDoublet]]),
    ratio("O3N2", &[&[Oiii5007], &[Halpha]], &[&[Hbeta], &[Nii6583]]),
    ratio("R23", &[&[OiiiDoublet, OiiDoublet]], &[&[Hbeta]]),
    ratio("S23", &[&[SiiDoublet, SiiiDoublet]], &[&[Halpha]]),
    ratio("S3O3", &[&[SiiiDoublet]], &[&[OiiiDoublet]]),
    ratio("O3O2", &[&[Oiii5007]], &[&[OiiDoublet]]),
    ratio("O2O3", &[&[Oii3726]], &[&[Oiii5007]]),
    ratio("O1O3", &[&[Oi6300]], &[&[Oiii5007]]),
    ratio("S32", &[&[SiiiDoublet]], &[&[SiiDoublet]]),
    ratio("S3", &[&[SiiiDoublet]], &[&[Halpha]]),
    ratio("Ne53", &[&[NeV3426]], &[&[NeIii3869]]),
    ratio("[SII] ratio", &[&[Sii6716]], &[&[Sii6731]]),
    ratio("[OII] ratio", &[&[Oii3729]], &[&[Oii3726]]),
];

pub fn ratio_definition(name: &str) -> Option<&'static RatioDefinition> {
    RATIO_CATALOGUE.iter().find(|definition| definition.name == name)
}

#[cfg(test)]
mod tests {
    use super::{ratio_definition, RATIO_CATALOGUE};
    use crate::domain::EmissionLine;

    #[test]
    fn catalogue_names_are_unique() {
        for (index, definition) in RATIO_CATALOGUE.iter().enumerate() {
            assert!(
                RATIO_CATALOGUE[index + 1..]
                    .iter()
                    .all(|other| other.name != definition.name),
                "{} is listed twice",
                definition.name
            );
        }
    }

    #[test]
    fn o3n2_uses_four_lines() {
        let definition = ratio_definition("O3N2").expect("O3N2 should be catalogued");
        let lines: Vec<EmissionLine> = definition.lines().collect();
        assert_eq!(
            lines,
            vec![
                EmissionLine::Oiii5007,
                EmissionLine::Halpha,
                EmissionLine::Hbeta,
                EmissionLine::Nii6583
            ]
        );
        assert_eq!(definition.log_name(), "log O3N2");
        assert!(ratio_definition("N2Ha").is_none());
    }
}
