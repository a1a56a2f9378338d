use arrow::datatypes::Schema;
use std::collections::HashMap;

/// Column names of one table, with exact and ASCII case-insensitive lookup.
///
/// Call names are lower-cased before parsing, so every lookup falls back to
/// the lower-cased form when the exact name is not present.
#[derive(Debug, Clone, Default)]
pub struct ColumnCatalog {
    columns: Vec<String>,
    by_lower: HashMap<String, usize>,
}

impl ColumnCatalog {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut catalog = Self::default();
        for name in names {
            catalog.register_column(name.into());
        }
        catalog
    }

    pub fn from_schema(schema: &Schema) -> Self {
        Self::new(schema.fields().iter().map(|f| f.name().clone()))
    }

    pub fn register_column(&mut self, name: String) {
        // First spelling wins when two columns differ only by case.
        self.by_lower.entry(name.to_ascii_lowercase()).or_insert(self.columns.len());
        self.columns.push(name);
    }

    /// Returns the canonical spelling of `name`, if the table has it.
    pub fn resolve(&self, name: &str) -> Option<&str> {
        if let Some(exact) = self.columns.iter().find(|c| c.as_str() == name) {
            return Some(exact.as_str());
        }
        self.by_lower
            .get(&name.to_ascii_lowercase())
            .map(|&idx| self.columns[idx].as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    pub fn names(&self) -> &[String] {
        &self.columns
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
