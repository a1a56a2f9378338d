//! Filter operator

use super::ExecutionPlan;
use crate::expr::lower_condition;
use crate::resolve::Resolver;
use crate::session::Engine;
use arrow::record_batch::RecordBatch;
use callframe_common::Result;
use callframe_grammar::FilterPlan;

/// Keeps the rows matching the plan's condition, in input order.
#[derive(Debug)]
pub struct FilterExec<'p> {
    plan: &'p FilterPlan,
}

impl<'p> FilterExec<'p> {
    pub fn new(plan: &'p FilterPlan) -> Self {
        Self { plan }
    }
}

impl ExecutionPlan for FilterExec<'_> {
    fn name(&self) -> &'static str {
        "filter"
    }

    fn execute(&self, engine: &Engine, input: &RecordBatch) -> Result<RecordBatch> {
        let resolver = Resolver::new(input.schema());
        let predicate = lower_condition(&self.plan.condition, &resolver)?;
        tracing::trace!(%predicate, "lowered filter predicate");
        let df = engine.read(input.clone())?.filter(predicate)?;
        engine.collect(df)
    }
}
