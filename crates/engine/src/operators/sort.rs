//! Sort operator

use super::{with_row_index, without_row_index, ExecutionPlan};
use crate::resolve::{column, Resolver};
use crate::session::Engine;
use arrow::record_batch::RecordBatch;
use callframe_common::Result;
use callframe_grammar::SortPlan;

const ROW_INDEX: &str = "__callframe_sort_row";

/// Stable multi-key sort. Nulls sort last in either direction; rows with
/// equal keys keep their input order.
#[derive(Debug)]
pub struct SortExec<'p> {
    plan: &'p SortPlan,
}

impl<'p> SortExec<'p> {
    pub fn new(plan: &'p SortPlan) -> Self {
        Self { plan }
    }
}

impl ExecutionPlan for SortExec<'_> {
    fn name(&self) -> &'static str {
        "sort"
    }

    fn execute(&self, engine: &Engine, input: &RecordBatch) -> Result<RecordBatch> {
        let resolver = Resolver::new(input.schema());
        let mut keys = self
            .plan
            .keys
            .iter()
            .map(|key| {
                let name = resolver.name(&key.column)?;
                Ok(column(&name).sort(key.direction.is_ascending(), false))
            })
            .collect::<Result<Vec<_>>>()?;
        keys.push(column(ROW_INDEX).sort(true, false));
        let df = engine.read(with_row_index(input, ROW_INDEX)?)?.sort(keys)?;
        without_row_index(&engine.collect(df)?)
    }
}
