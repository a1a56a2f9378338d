//! Operators that execute one plan each against an input batch.

pub mod aggregate;
pub mod append;
pub mod filter;
pub mod hash_join;
pub mod projection;
pub mod sort;

pub use aggregate::AggregateExec;
pub use append::AppendExec;
pub use filter::FilterExec;
pub use hash_join::HashJoinExec;
pub use projection::ProjectionExec;
pub use sort::SortExec;

use crate::session::Engine;
use arrow::array::{ArrayRef, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use callframe_common::Result;
use std::sync::Arc;

/// A single executable step. Operators never modify `input`.
pub trait ExecutionPlan {
    fn name(&self) -> &'static str;

    fn execute(&self, engine: &Engine, input: &RecordBatch) -> Result<RecordBatch>;
}

/// Appends a `UInt64` column numbering the rows of `batch` from zero.
pub(crate) fn with_row_index(batch: &RecordBatch, name: &str) -> Result<RecordBatch> {
    let schema = batch.schema();
    let mut fields: Vec<Field> = schema.fields().iter().map(|f| f.as_ref().clone()).collect();
    fields.push(Field::new(name, DataType::UInt64, false));
    let mut columns: Vec<ArrayRef> = batch.columns().to_vec();
    columns.push(Arc::new(UInt64Array::from_iter_values(0..batch.num_rows() as u64)));
    let schema = Schema::new_with_metadata(fields, schema.metadata().clone());
    Ok(RecordBatch::try_new(Arc::new(schema), columns)?)
}

/// Removes the trailing helper column added by [`with_row_index`].
pub(crate) fn without_row_index(batch: &RecordBatch) -> Result<RecordBatch> {
    let keep: Vec<usize> = (0..batch.num_columns().saturating_sub(1)).collect();
    Ok(batch.project(&keep)?)
}
