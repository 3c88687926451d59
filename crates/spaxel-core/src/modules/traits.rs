use crate::domain::{Component, EngineResult, Table};

/// A pure table transform that appends the columns it owns.
///
/// `component` selects which measurement set the engine reads and writes;
/// `None` addresses unsuffixed columns.
pub trait TableEngine {
    fn name(&self) -> &'static str;

    fn apply(&self, table: &Table, component: Option<Component>) -> EngineResult<Table>;

    /// Applies the engine to each component in turn, threading the table through.
    fn apply_each(&self, table: &Table, components: &[Component]) -> EngineResult<Table> {
        let mut current = table.clone();
        for &component in components {
            current = self.apply(&current, Some(component))?;
        }
        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::TableEngine;
    use crate::domain::{
        BinId, ColumnKey, Component, EngineResult, SpaxelError, SpaxelErrorCategory, Table,
    };

    struct FailingEngine;

    impl TableEngine for FailingEngine {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn apply(&self, _table: &Table, _component: Option<Component>) -> EngineResult<Table> {
            Err(SpaxelError::computation("RUN.ENGINE", "engine failed"))
        }
    }

    struct MarkerEngine;

    impl TableEngine for MarkerEngine {
        fn name(&self) -> &'static str {
            "marker"
        }

        fn apply(&self, table: &Table, component: Option<Component>) -> EngineResult<Table> {
            let mut output = table.clone();
            output
                .view_mut(component)
                .insert_numeric("marker", vec![1.0; table.len()])?;
            Ok(output)
        }
    }

    #[test]
    fn engine_uses_shared_error_types() {
        let table = Table::new(vec![BinId::new("G", 0)]);
        let error = FailingEngine
            .apply(&table, None)
            .expect_err("engine should fail");
        assert_eq!(error.category(), SpaxelErrorCategory::ComputationError);
        assert_eq!(error.exit_code(), 4);
        assert_eq!(error.placeholder(), "RUN.ENGINE");
    }

    #[test]
    fn apply_each_visits_every_component() {
        let table = Table::new(vec![BinId::new("G", 0)]);
        let output = MarkerEngine
            .apply_each(&table, &Component::all(2))
            .expect("marker engine should succeed");
        assert!(output.contains(&ColumnKey::total("marker")));
        assert!(output.contains(&ColumnKey::component("marker", 1)));
        assert!(output.contains(&ColumnKey::component("marker", 2)));
        assert_eq!(MarkerEngine.name(), "marker");
    }
}
