pub mod errors;
mod lines;
mod table;

pub use errors::{EngineResult, SpaxelError, SpaxelErrorCategory, SpaxelResult};
pub use lines::{EmissionLine, FluxMeasurement, FluxRow, LineFluxes};
pub use table::{Column, ComponentView, ComponentViewMut, Table};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

const TOTAL_SUFFIX: &str = " (total)";
const COMPONENT_PREFIX: &str = " (component ";

/// Which set of line measurements a column belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Component {
    Total,
    Index(u32),
}

impl Component {
    pub fn suffix(self) -> String {
        match self {
            Self::Total => TOTAL_SUFFIX.to_string(),
            Self::Index(index) => format!("{COMPONENT_PREFIX}{index})"),
        }
    }

    /// Total plus kinematic components `1..=ncomponents`.
    pub fn all(ncomponents: u32) -> Vec<Self> {
        std::iter::once(Self::Total)
            .chain((1..=ncomponents).map(Self::Index))
            .collect()
    }
}

impl Display for Component {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Total => f.write_str("total"),
            Self::Index(index) => write!(f, "component {index}"),
        }
    }
}

impl FromStr for Component {
    type Err = ColumnKeyError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let normalized = token.trim();
        if normalized.eq_ignore_ascii_case("total") {
            return Ok(Self::Total);
        }
        let index = normalized
            .strip_prefix("component ")
            .unwrap_or(normalized)
            .trim();
        index
            .parse::<u32>()
            .map(Self::Index)
            .map_err(|_| ColumnKeyError::InvalidComponent {
                token: token.to_string(),
            })
    }
}

impl Serialize for Component {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Component {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        token.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ColumnKeyError {
    #[error("column name '{name}' has an empty quantity")]
    EmptyQuantity { name: String },
    #[error("'{token}' is not a valid component (expected 'total' or a component number)")]
    InvalidComponent { token: String },
}

/// Typed column identity: a physical quantity plus an optional component.
///
/// The string form (`"HALPHA error (component 2)"`) only exists at the table
/// I/O boundary; engines address columns through [`ComponentView`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnKey {
    pub quantity: String,
    pub component: Option<Component>,
}

impl ColumnKey {
    pub fn new(quantity: impl Into<String>, component: Option<Component>) -> Self {
        Self {
            quantity: quantity.into(),
            component,
        }
    }

    pub fn bare(quantity: impl Into<String>) -> Self {
        Self::new(quantity, None)
    }

    pub fn total(quantity: impl Into<String>) -> Self {
        Self::new(quantity, Some(Component::Total))
    }

    pub fn component(quantity: impl Into<String>, index: u32) -> Self {
        Self::new(quantity, Some(Component::Index(index)))
    }

    pub fn parse(name: &str) -> Result<Self, ColumnKeyError> {
        let (quantity, component) = if let Some(quantity) = name.strip_suffix(TOTAL_SUFFIX) {
            (quantity, Some(Component::Total))
        } else if let Some((quantity, index)) = split_component_suffix(name) {
            (quantity, Some(Component::Index(index)))
        } else {
            (name, None)
        };

        if quantity.trim().is_empty() {
            return Err(ColumnKeyError::EmptyQuantity {
                name: name.to_string(),
            });
        }
        Ok(Self::new(quantity, component))
    }
}

fn split_component_suffix(name: &str) -> Option<(&str, u32)> {
    let body = name.strip_suffix(')')?;
    let start = body.rfind(COMPONENT_PREFIX)?;
    let index = body[start + COMPONENT_PREFIX.len()..].parse::<u32>().ok()?;
    Some((&name[..start], index))
}

impl Display for ColumnKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.quantity)?;
        if let Some(component) = self.component {
            f.write_str(&component.suffix())?;
        }
        Ok(())
    }
}

impl FromStr for ColumnKey {
    type Err = ColumnKeyError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::parse(name)
    }
}

/// Identity of one spatial bin: galaxy plus bin number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BinId {
    pub galaxy: String,
    pub bin: u32,
}

impl BinId {
    pub fn new(galaxy: impl Into<String>, bin: u32) -> Self {
        Self {
            galaxy: galaxy.into(),
            bin,
        }
    }
}

impl Display for BinId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "galaxy {} bin {}", self.galaxy, self.bin)
    }
}

#[cfg(test)]
mod tests {
    use super::{BinId, ColumnKey, ColumnKeyError, Component};

    #[test]
    fn parse_recognises_total_and_component_suffixes() {
        let total = ColumnKey::parse("HALPHA error (total)").expect("total key should parse");
        assert_eq!(total, ColumnKey::total("HALPHA error"));

        let component =
            ColumnKey::parse("log N2 (component 12)").expect("component key should parse");
        assert_eq!(component, ColumnKey::component("log N2", 12));

        let bare = ColumnKey::parse("D_L (Mpc)").expect("bare key should parse");
        assert_eq!(bare, ColumnKey::bare("D_L (Mpc)"));
    }

    #[test]
    fn parse_keeps_inner_parentheses_in_quantity() {
        let key = ColumnKey::parse("n_e (Proxauf2014 ([SII])) (component 1)")
            .expect("density key should parse");
        assert_eq!(key.quantity, "n_e (Proxauf2014 ([SII]))");
        assert_eq!(key.component, Some(Component::Index(1)));

        let not_a_component =
            ColumnKey::parse("sigma (component x)").expect("key should parse as bare");
        assert_eq!(not_a_component.component, None);
    }

    #[test]
    fn display_round_trips_through_parse() {
        for name in [
            "log(O/H) + 12 (N2Ha_PP04) error (upper) (total)",
            "BPT (numeric) (component 3)",
            "HALPHA",
        ] {
            let key = ColumnKey::parse(name).expect("key should parse");
            assert_eq!(key.to_string(), name);
        }
    }

    #[test]
    fn parse_rejects_empty_quantity() {
        assert_eq!(
            ColumnKey::parse(" (total)"),
            Err(ColumnKeyError::EmptyQuantity {
                name: " (total)".to_string()
            })
        );
    }

    #[test]
    fn component_tokens_parse() {
        assert_eq!("total".parse::<Component>(), Ok(Component::Total));
        assert_eq!("2".parse::<Component>(), Ok(Component::Index(2)));
        assert_eq!("component 3".parse::<Component>(), Ok(Component::Index(3)));
        assert!("first".parse::<Component>().is_err());
        assert_eq!(
            Component::all(2),
            vec![Component::Total, Component::Index(1), Component::Index(2)]
        );
    }

    #[test]
    fn components_serialize_as_tokens() {
        let components: Vec<Component> = serde_json::from_str(r#"["total", "component 2", "3"]"#)
            .expect("component tokens should deserialize");
        assert_eq!(
            components,
            vec![Component::Total, Component::Index(2), Component::Index(3)]
        );
        assert_eq!(
            serde_json::to_string(&components).expect("components should serialize"),
            r#"["total","component 2","component 3"]"#
        );
    }

    #[test]
    fn bin_identity_renders_galaxy_and_bin() {
        assert_eq!(BinId::new("572402", 17).to_string(), "galaxy 572402 bin 17");
    }
}
