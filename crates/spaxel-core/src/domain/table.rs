use super::{BinId, ColumnKey, Component, SpaxelError, SpaxelResult};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Numeric(Vec<f64>),
    Flag(Vec<bool>),
    Category(Vec<String>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Self::Numeric(values) => values.len(),
            Self::Flag(values) => values.len(),
            Self::Category(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Numeric(_) => "numeric",
            Self::Flag(_) => "flag",
            Self::Category(_) => "category",
        }
    }
}

/// Struct-of-arrays table: one [`BinId`] per row plus ordered columns.
///
/// Columns are append-only. `insert_if_absent` never replaces an existing
/// column, so re-running an engine on its own output changes nothing.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    ids: Vec<BinId>,
    order: Vec<ColumnKey>,
    columns: HashMap<ColumnKey, Column>,
}

impl Table {
    pub fn new(ids: Vec<BinId>) -> Self {
        Self {
            ids,
            order: Vec::new(),
            columns: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[BinId] {
        &self.ids
    }

    pub fn keys(&self) -> impl Iterator<Item = &ColumnKey> {
        self.order.iter()
    }

    pub fn column_count(&self) -> usize {
        self.order.len()
    }

    pub fn contains(&self, key: &ColumnKey) -> bool {
        self.columns.contains_key(key)
    }

    pub fn column(&self, key: &ColumnKey) -> Option<&Column> {
        self.columns.get(key)
    }

    pub fn numeric(&self, key: &ColumnKey) -> Option<&[f64]> {
        match self.columns.get(key) {
            Some(Column::Numeric(values)) => Some(values),
            _ => None,
        }
    }

    pub fn flag(&self, key: &ColumnKey) -> Option<&[bool]> {
        match self.columns.get(key) {
            Some(Column::Flag(values)) => Some(values),
            _ => None,
        }
    }

    pub fn category(&self, key: &ColumnKey) -> Option<&[String]> {
        match self.columns.get(key) {
            Some(Column::Category(values)) => Some(values),
            _ => None,
        }
    }

    /// Appends `column` under `key` unless the key already exists.
    /// Returns whether the column was added.
    pub fn insert_if_absent(&mut self, key: ColumnKey, column: Column) -> SpaxelResult<bool> {
        if column.len() != self.ids.len() {
            return Err(SpaxelError::internal(
                "SYS.COLUMN_LENGTH",
                format!(
                    "{} column '{}' has {} rows but the table has {}",
                    column.kind(),
                    key,
                    column.len(),
                    self.ids.len()
                ),
            ));
        }
        if self.columns.contains_key(&key) {
            return Ok(false);
        }
        self.order.push(key.clone());
        self.columns.insert(key, column);
        Ok(true)
    }

    pub fn with_numeric(mut self, key: ColumnKey, values: Vec<f64>) -> SpaxelResult<Self> {
        self.insert_if_absent(key, Column::Numeric(values))?;
        Ok(self)
    }

    pub fn view(&self, component: Option<Component>) -> ComponentView<'_> {
        ComponentView {
            table: self,
            component,
        }
    }

    pub fn view_mut(&mut self, component: Option<Component>) -> ComponentViewMut<'_> {
        ComponentViewMut {
            table: self,
            component,
        }
    }
}

/// Read access to the columns of one component by bare quantity name.
#[derive(Debug, Clone, Copy)]
pub struct ComponentView<'a> {
    table: &'a Table,
    component: Option<Component>,
}

impl<'a> ComponentView<'a> {
    pub fn component(&self) -> Option<Component> {
        self.component
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn ids(&self) -> &'a [BinId] {
        self.table.ids()
    }

    pub fn key(&self, quantity: &str) -> ColumnKey {
        ColumnKey::new(quantity, self.component)
    }

    pub fn contains(&self, quantity: &str) -> bool {
        self.table.contains(&self.key(quantity))
    }

    pub fn numeric(&self, quantity: &str) -> Option<&'a [f64]> {
        self.table.numeric(&self.key(quantity))
    }

    pub fn category(&self, quantity: &str) -> Option<&'a [String]> {
        self.table.category(&self.key(quantity))
    }

    /// Numeric column that the caller cannot proceed without.
    pub fn require(&self, requirement: &str, quantity: &str) -> SpaxelResult<&'a [f64]> {
        self.numeric(quantity)
            .ok_or_else(|| SpaxelError::missing_column(requirement, self.key(quantity)))
    }
}

/// Write access scoped to one component; new columns inherit the component.
#[derive(Debug)]
pub struct ComponentViewMut<'a> {
    table: &'a mut Table,
    component: Option<Component>,
}

impl ComponentViewMut<'_> {
    pub fn component(&self) -> Option<Component> {
        self.component
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn key(&self, quantity: &str) -> ColumnKey {
        ColumnKey::new(quantity, self.component)
    }

    pub fn contains(&self, quantity: &str) -> bool {
        self.table.contains(&self.key(quantity))
    }

    pub fn numeric(&self, quantity: &str) -> Option<&[f64]> {
        self.table.numeric(&self.key(quantity))
    }

    pub fn insert_numeric(&mut self, quantity: &str, values: Vec<f64>) -> SpaxelResult<bool> {
        let key = self.key(quantity);
        self.table.insert_if_absent(key, Column::Numeric(values))
    }

    pub fn insert_flag(&mut self, quantity: &str, values: Vec<bool>) -> SpaxelResult<bool> {
        let key = self.key(quantity);
        self.table.insert_if_absent(key, Column::Flag(values))
    }

    pub fn insert_category(&mut self, quantity: &str, values: Vec<String>) -> SpaxelResult<bool> {
        let key = self.key(quantity);
        self.table.insert_if_absent(key, Column::Category(values))
    }
}
