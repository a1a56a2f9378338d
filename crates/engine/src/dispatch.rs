//! Routes a parsed plan to the operator that executes it.

use crate::operators::{
    AggregateExec, AppendExec, ExecutionPlan, FilterExec, HashJoinExec, ProjectionExec, SortExec,
};
use crate::session::Engine;
use arrow::record_batch::RecordBatch;
use callframe_common::{Error, Result};
use callframe_grammar::Plan;
use std::collections::HashMap;

/// Source of the external tables that joins and appends refer to by name.
pub trait TableLookup {
    fn table(&self, name: &str) -> Option<&RecordBatch>;
}

impl TableLookup for HashMap<String, RecordBatch> {
    fn table(&self, name: &str) -> Option<&RecordBatch> {
        self.get(name)
    }
}

/// Lookup with no tables, for calls that need none.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTables;

impl TableLookup for NoTables {
    fn table(&self, _name: &str) -> Option<&RecordBatch> {
        None
    }
}

impl Engine {
    /// Executes `plan` against `input` and returns a new batch.
    ///
    /// Column references are validated here against the live schema.
    pub fn execute(
        &self,
        plan: &Plan,
        input: &RecordBatch,
        tables: &dyn TableLookup,
    ) -> Result<RecordBatch> {
        tracing::debug!(%plan, rows = input.num_rows(), "dispatching plan");
        let operator: Box<dyn ExecutionPlan + '_> = match plan {
            Plan::Filter(p) => Box::new(FilterExec::new(p)),
            Plan::Sort(p) => Box::new(SortExec::new(p)),
            Plan::Aggregate(p) => Box::new(AggregateExec::whole(p)),
            Plan::GroupAggregate(p) => Box::new(AggregateExec::grouped(p)),
            Plan::Select(p) => Box::new(ProjectionExec::Select(p)),
            Plan::Rename(p) => Box::new(ProjectionExec::Rename(p)),
            Plan::Drop(p) => Box::new(ProjectionExec::Drop(p)),
            Plan::Join(p) => {
                let right = resolve_target(tables, &p.target, plan.name())?;
                Box::new(HashJoinExec::new(p, right))
            }
            Plan::Append(p) => {
                let other = resolve_target(tables, &p.target, plan.name())?;
                Box::new(AppendExec::new(other))
            }
        };
        let output = operator.execute(self, input)?;
        tracing::debug!(operator = operator.name(), rows = output.num_rows(), "plan executed");
        Ok(output)
    }
}

/// The named table. A call without a target name reads `DEFAULT_TARGET`;
/// a named target never falls back to it.
fn resolve_target<'t>(
    tables: &'t dyn TableLookup,
    target: &str,
    operation: &str,
) -> Result<&'t RecordBatch> {
    tables
        .table(target)
        .ok_or_else(|| Error::MissingJoinTarget {
            operation: operation.to_string(),
            target: target.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Int64Array;
    use arrow::datatypes::{DataType, Field, Schema};
    use callframe_grammar::{parse_call, DEFAULT_TARGET};
    use std::sync::Arc;

    fn table() -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![Field::new("id", DataType::Int64, false)]));
        RecordBatch::try_new(schema, vec![Arc::new(Int64Array::from(vec![1, 2]))]).unwrap()
    }

    #[test]
    fn join_without_table_is_missing_target() {
        let engine = Engine::new().unwrap();
        let plan = parse_call("join_orders_on_id", None).unwrap();
        let err = engine.execute(&plan, &table(), &NoTables).unwrap_err();
        assert!(matches!(
            err,
            Error::MissingJoinTarget { ref operation, ref target }
                if operation == "join" && target == "orders"
        ));
    }

    #[test]
    fn unnamed_target_reads_default_table() {
        let engine = Engine::new().unwrap();
        let mut tables = HashMap::new();
        tables.insert(DEFAULT_TARGET.to_string(), table());
        let plan = parse_call("append", None).unwrap();
        let out = engine.execute(&plan, &table(), &tables).unwrap();
        assert_eq!(out.num_rows(), 4);
    }

    #[test]
    fn misspelled_target_does_not_read_default_table() {
        let engine = Engine::new().unwrap();
        let mut tables = HashMap::new();
        tables.insert(DEFAULT_TARGET.to_string(), table());
        let plan = parse_call("join_salries_on_id", None).unwrap();
        let err = engine.execute(&plan, &table(), &tables).unwrap_err();
        assert!(matches!(
            err,
            Error::MissingJoinTarget { ref target, .. } if target == "salries"
        ));
    }
}
