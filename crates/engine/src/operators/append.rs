//! Append operator: stacks an external table under the input.

use super::ExecutionPlan;
use crate::session::Engine;
use arrow::array::{new_null_array, ArrayRef};
use arrow::compute::{cast, concat_batches};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use callframe_common::Result;
use std::sync::Arc;

/// Columns are aligned by name: input columns first, then columns only the
/// other table has. Cells a side does not have are null.
#[derive(Debug)]
pub struct AppendExec<'p> {
    other: &'p RecordBatch,
}

impl<'p> AppendExec<'p> {
    pub fn new(other: &'p RecordBatch) -> Self {
        Self { other }
    }
}

impl ExecutionPlan for AppendExec<'_> {
    fn name(&self) -> &'static str {
        "append"
    }

    fn execute(&self, _engine: &Engine, input: &RecordBatch) -> Result<RecordBatch> {
        let top = input.schema();
        let bottom = self.other.schema();

        let mut fields: Vec<Field> = Vec::with_capacity(top.fields().len() + bottom.fields().len());
        for field in top.fields() {
            let data_type = match bottom.field_with_name(field.name()) {
                Ok(other) => common_type(field.data_type(), other.data_type()),
                Err(_) => field.data_type().clone(),
            };
            fields.push(Field::new(field.name(), data_type, true));
        }
        for field in bottom.fields() {
            if top.field_with_name(field.name()).is_err() {
                fields.push(Field::new(field.name(), field.data_type().clone(), true));
            }
        }
        let schema = Arc::new(Schema::new(fields));

        let aligned = [align(input, &schema)?, align(self.other, &schema)?];
        Ok(concat_batches(&schema, &aligned)?)
    }
}

fn align(batch: &RecordBatch, schema: &Arc<Schema>) -> Result<RecordBatch> {
    let columns = schema
        .fields()
        .iter()
        .map(|field| match batch.column_by_name(field.name()) {
            Some(array) => Ok(cast(array, field.data_type())?),
            None => Ok(new_null_array(field.data_type(), batch.num_rows())),
        })
        .collect::<Result<Vec<ArrayRef>>>()?;
    Ok(RecordBatch::try_new(Arc::clone(schema), columns)?)
}

/// Type both sides of a shared column are cast to.
fn common_type(left: &DataType, right: &DataType) -> DataType {
    if left == right {
        left.clone()
    } else if left.is_integer() && right.is_integer() {
        DataType::Int64
    } else if left.is_numeric() && right.is_numeric() {
        DataType::Float64
    } else if *left == DataType::Null {
        right.clone()
    } else if *right == DataType::Null {
        left.clone()
    } else {
        DataType::Utf8
    }
}
