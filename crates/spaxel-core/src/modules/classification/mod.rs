pub mod curves;
mod model;

pub use model::{classify_bpt, classify_law2021, BptClass, BptPoint, Law2021Class};

use super::TableEngine;
use crate::domain::{Component, ComponentView, EngineResult, Table};
use curves::BptAxis;
use tracing::{debug, warn};

pub const BPT_NUMERIC_COLUMN: &str = "BPT (numeric)";
pub const BPT_LABEL_COLUMN: &str = "BPT";
pub const LAW2021_NUMERIC_COLUMN: &str = "Law+2021 (numeric)";
pub const LAW2021_LABEL_COLUMN: &str = "Law+2021";
const LOG_O3_COLUMN: &str = "log O3";

fn bpt_points(view: &ComponentView<'_>, scheme: &str) -> Option<Vec<BptPoint>> {
    let columns = (
        view.numeric(LOG_O3_COLUMN),
        view.numeric(BptAxis::N2.column()),
        view.numeric(BptAxis::S2.column()),
    );
    match columns {
        (Some(o3), Some(n2), Some(s2)) => Some(
            o3.iter()
                .zip(n2)
                .zip(s2)
                .map(|((&o3, &n2), &s2)| BptPoint::new(o3, n2, s2))
                .collect(),
        ),
        _ => {
            warn!(
                component = ?view.component(),
                scheme,
                "log O3, log N2 or log S2 missing; every row is left unclassified"
            );
            None
        }
    }
}

/// Five-way BPT classification from log O3, log N2 and log S2.
#[derive(Debug, Clone, Copy, Default)]
pub struct BptClassifier;

impl TableEngine for BptClassifier {
    fn name(&self) -> &'static str {
        "bpt"
    }

    fn apply(&self, table: &Table, component: Option<Component>) -> EngineResult<Table> {
        let classes: Vec<BptClass> = match bpt_points(&table.view(component), "BPT") {
            Some(points) => points.into_iter().map(classify_bpt).collect(),
            None => vec![BptClass::NotClassified; table.len()],
        };
        debug!(
            component = ?component,
            star_forming = classes.iter().filter(|class| **class == BptClass::StarForming).count(),
            "classified rows on the BPT diagrams"
        );

        let mut output = table.clone();
        let mut view = output.view_mut(component);
        view.insert_numeric(
            BPT_NUMERIC_COLUMN,
            classes.iter().map(|class| class.code()).collect(),
        )?;
        view.insert_category(
            BPT_LABEL_COLUMN,
            classes.iter().map(|class| class.label().to_string()).collect(),
        )?;
        Ok(output)
    }
}

/// Four-way kinematic classification of Law et al. (2021).
#[derive(Debug, Clone, Copy, Default)]
pub struct Law2021Classifier;

impl TableEngine for Law2021Classifier {
    fn name(&self) -> &'static str {
        "law2021"
    }

    fn apply(&self, table: &Table, component: Option<Component>) -> EngineResult<Table> {
        let classes: Vec<Law2021Class> = match bpt_points(&table.view(component), "Law+2021") {
            Some(points) => points.into_iter().map(classify_law2021).collect(),
            None => vec![Law2021Class::NotClassified; table.len()],
        };
        debug!(component = ?component, "classified rows with Law+2021");

        let mut output = table.clone();
        let mut view = output.view_mut(component);
        view.insert_numeric(
            LAW2021_NUMERIC_COLUMN,
            classes.iter().map(|class| class.code()).collect(),
        )?;
        view.insert_category(
            LAW2021_LABEL_COLUMN,
            classes.iter().map(|class| class.label().to_string()).collect(),
        )?;
        Ok(output)
    }
}

/// BPT followed by Law+2021.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassificationEngine;

impl TableEngine for ClassificationEngine {
    fn name(&self) -> &'static str {
        "classification"
    }

    fn apply(&self, table: &Table, component: Option<Component>) -> EngineResult<Table> {
        let table = BptClassifier.apply(table, component)?;
        Law2021Classifier.apply(&table, component)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        BptClassifier, ClassificationEngine, BPT_LABEL_COLUMN, BPT_NUMERIC_COLUMN,
        LAW2021_NUMERIC_COLUMN,
    };
    use crate::domain::{BinId, ColumnKey, Component, Table};
    use crate::modules::TableEngine;

    fn ratio_table() -> Table {
        let ids = (0..4).map(|bin| BinId::new("G", bin)).collect();
        Table::new(ids)
            .with_numeric(ColumnKey::total("log O3"), vec![-0.5, 1.0, f64::NAN, 0.3])
            .and_then(|t| t.with_numeric(ColumnKey::total("log N2"), vec![-0.6, 0.2, -0.6, 0.2]))
            .and_then(|t| t.with_numeric(ColumnKey::total("log S2"), vec![-0.6, -0.1, -0.6, 0.1]))
            .expect("columns should insert")
    }

    #[test]
    fn every_row_lands_in_exactly_one_class() {
        let output = ClassificationEngine
            .apply(&ratio_table(), Some(Component::Total))
            .expect("classification should succeed");
        let codes = output
            .numeric(&ColumnKey::total(BPT_NUMERIC_COLUMN))
            .expect("BPT codes should exist");
        assert_eq!(codes, &[0.0, 3.0, -1.0, 2.0]);
        let labels = output
            .category(&ColumnKey::total(BPT_LABEL_COLUMN))
            .expect("BPT labels should exist");
        assert_eq!(labels[2], "Not classified");
        assert!(output.contains(&ColumnKey::total(LAW2021_NUMERIC_COLUMN)));
    }

    #[test]
    fn missing_ratios_leave_rows_unclassified() {
        let output = BptClassifier
            .apply(&ratio_table(), Some(Component::Index(1)))
            .expect("classification should not fail");
        let codes = output
            .numeric(&ColumnKey::component(BPT_NUMERIC_COLUMN, 1))
            .expect("BPT codes should exist");
        assert!(codes.iter().all(|code| *code == -1.0));
    }

    #[test]
    fn classification_is_idempotent() {
        let once = ClassificationEngine
            .apply(&ratio_table(), Some(Component::Total))
            .expect("first pass should succeed");
        let twice = ClassificationEngine
            .apply(&once, Some(Component::Total))
            .expect("second pass should succeed");
        assert_eq!(once.column_count(), twice.column_count());
        assert_eq!(
            once.numeric(&ColumnKey::total(BPT_NUMERIC_COLUMN)),
            twice.numeric(&ColumnKey::total(BPT_NUMERIC_COLUMN))
        );
    }
}
