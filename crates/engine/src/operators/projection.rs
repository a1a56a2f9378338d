//! Projection operator: column selection, renaming and dropping.
//!
//! Projections only rearrange columns, so they run directly on the Arrow
//! batch without a DataFusion plan.

use super::ExecutionPlan;
use crate::resolve::Resolver;
use crate::session::Engine;
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use callframe_common::{Error, Result};
use callframe_grammar::{DropPlan, RenamePlan, SelectPlan};
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug)]
pub enum ProjectionExec<'p> {
    Select(&'p SelectPlan),
    Rename(&'p RenamePlan),
    Drop(&'p DropPlan),
}

impl ExecutionPlan for ProjectionExec<'_> {
    fn name(&self) -> &'static str {
        match self {
            ProjectionExec::Select(_) => "select",
            ProjectionExec::Rename(_) => "rename",
            ProjectionExec::Drop(_) => "drop",
        }
    }

    fn execute(&self, _engine: &Engine, input: &RecordBatch) -> Result<RecordBatch> {
        let resolver = Resolver::new(input.schema());
        match self {
            ProjectionExec::Select(plan) => {
                let indices = plan
                    .columns
                    .iter()
                    .map(|c| resolver.index(c))
                    .collect::<Result<Vec<_>>>()?;
                Ok(input.project(&indices)?)
            }
            ProjectionExec::Drop(plan) => {
                let dropped = plan
                    .columns
                    .iter()
                    .map(|c| resolver.index(c))
                    .collect::<Result<HashSet<_>>>()?;
                let keep: Vec<usize> =
                    (0..input.num_columns()).filter(|i| !dropped.contains(i)).collect();
                Ok(input.project(&keep)?)
            }
            ProjectionExec::Rename(plan) => rename(input, plan, &resolver),
        }
    }
}

fn rename(input: &RecordBatch, plan: &RenamePlan, resolver: &Resolver) -> Result<RecordBatch> {
    let schema = input.schema();
    let mut names: Vec<String> = schema.fields().iter().map(|f| f.name().clone()).collect();
    for (old, new) in &plan.mappings {
        let index = resolver.index(old)?;
        names[index] = new.clone();
    }

    if let Some(duplicate) = first_duplicate(&names) {
        return Err(Error::DuplicateColumn(duplicate));
    }

    let fields: Vec<Field> = schema
        .fields()
        .iter()
        .zip(names)
        .map(|(field, name)| field.as_ref().clone().with_name(name))
        .collect();
    let renamed = Schema::new_with_metadata(fields, schema.metadata().clone());
    Ok(RecordBatch::try_new(Arc::new(renamed), input.columns().to_vec())?)
}

fn first_duplicate(names: &[String]) -> Option<String> {
    let mut seen = HashSet::new();
    names.iter().find(|n| !seen.insert(n.as_str())).cloned()
}
