//! Column references checked against a live schema.

use arrow::datatypes::{DataType, Field, SchemaRef};
use callframe_common::{ColumnCatalog, Error, Result};
use callframe_grammar::ColumnRef;
use datafusion::common::Column;
use datafusion::prelude::Expr;

pub(crate) struct Resolver {
    schema: SchemaRef,
    catalog: ColumnCatalog,
}

impl Resolver {
    pub fn new(schema: SchemaRef) -> Self {
        let catalog = ColumnCatalog::from_schema(&schema);
        Self { schema, catalog }
    }

    pub fn contains(&self, column: &ColumnRef) -> bool {
        self.catalog.contains(&column.name)
    }

    /// Canonical spelling of `column` in this schema.
    pub fn name(&self, column: &ColumnRef) -> Result<String> {
        self.catalog
            .resolve(&column.name)
            .map(str::to_string)
            .ok_or_else(|| self.unknown(column))
    }

    pub fn index(&self, column: &ColumnRef) -> Result<usize> {
        let name = self.name(column)?;
        Ok(self.schema.index_of(&name)?)
    }

    pub fn field(&self, column: &ColumnRef) -> Result<&Field> {
        let index = self.index(column)?;
        Ok(self.schema.field(index))
    }

    pub fn unknown(&self, column: &ColumnRef) -> Error {
        Error::UnknownColumn {
            column: column.name.clone(),
            available: self.catalog.names().to_vec(),
        }
    }
}

/// Unqualified column expression. `datafusion::prelude::col` would
/// lower-case and split the name on dots.
pub(crate) fn column(name: &str) -> Expr {
    Expr::Column(Column::new_unqualified(name))
}

pub(crate) fn qualified(relation: &str, name: &str) -> Expr {
    Expr::Column(Column::new(Some(relation), name))
}

pub(crate) fn is_text(data_type: &DataType) -> bool {
    matches!(data_type, DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View)
}

pub(crate) fn type_mismatch(column: &str, data_type: &DataType, operator: impl Into<String>) -> Error {
    Error::TypeMismatch {
        column: column.to_string(),
        data_type: data_type.clone(),
        operator: operator.into(),
    }
}
