//! Aggregate operator, with or without group keys.

use super::ExecutionPlan;
use crate::resolve::{column, type_mismatch, Resolver};
use crate::session::Engine;
use arrow::record_batch::RecordBatch;
use callframe_common::{Error, Result};
use callframe_grammar::{AggFunc, AggregatePlan, Aggregation, ColumnRef, GroupAggregatePlan};
use datafusion::functions_aggregate::expr_fn::{
    avg, count, count_distinct, max, median, min, stddev, sum, var_sample,
};
use datafusion::functions_aggregate::first_last::{first_value_udaf, last_value_udaf};
use datafusion::logical_expr::{lit, Expr};
use std::collections::HashSet;

/// Output column holding the row count of each group when no aggregation
/// is requested.
pub const GROUP_COUNT_COLUMN: &str = "count";

#[derive(Debug)]
pub struct AggregateExec<'p> {
    keys: &'p [ColumnRef],
    aggregations: &'p [Aggregation],
}

impl<'p> AggregateExec<'p> {
    /// Whole-table aggregation producing a single row.
    pub fn whole(plan: &'p AggregatePlan) -> Self {
        Self { keys: &[], aggregations: &plan.aggregations }
    }

    /// One row per distinct key combination, ordered by the keys.
    pub fn grouped(plan: &'p GroupAggregatePlan) -> Self {
        Self { keys: &plan.keys, aggregations: &plan.aggregations }
    }

    fn is_grouped(&self) -> bool {
        !self.keys.is_empty()
    }

    /// Output name of each aggregation.
    ///
    /// Whole-table results are always `<column>_<func>`. Grouped results keep
    /// the column name unless the column is aggregated more than once or is
    /// itself a group key.
    fn output_names(&self, columns: &[String], keys: &[String]) -> Vec<String> {
        columns
            .iter()
            .zip(self.aggregations)
            .map(|(name, agg)| {
                let repeated = columns.iter().filter(|c| *c == name).count() > 1;
                if !self.is_grouped() || repeated || keys.contains(name) {
                    format!("{}_{}", name, agg.func)
                } else {
                    name.clone()
                }
            })
            .collect()
    }
}

impl ExecutionPlan for AggregateExec<'_> {
    fn name(&self) -> &'static str {
        if self.is_grouped() {
            "groupby"
        } else {
            "aggregate"
        }
    }

    fn execute(&self, engine: &Engine, input: &RecordBatch) -> Result<RecordBatch> {
        let resolver = Resolver::new(input.schema());
        let keys = self.keys.iter().map(|k| resolver.name(k)).collect::<Result<Vec<_>>>()?;
        let columns = self
            .aggregations
            .iter()
            .map(|agg| {
                let field = resolver.field(&agg.column)?;
                if requires_numeric(agg.func) && !field.data_type().is_numeric() {
                    return Err(type_mismatch(field.name(), field.data_type(), agg.func.as_str()));
                }
                Ok(field.name().clone())
            })
            .collect::<Result<Vec<_>>>()?;

        let mut seen = HashSet::new();
        let mut aggr_exprs: Vec<Expr> = self
            .output_names(&columns, &keys)
            .into_iter()
            .zip(columns.iter().zip(self.aggregations))
            .filter(|(out, _)| seen.insert(out.clone()))
            .map(|(out, (name, agg))| aggregate_expr(agg.func, column(name)).alias(out))
            .collect();

        if aggr_exprs.is_empty() {
            if !self.is_grouped() {
                return Err(Error::new("aggregate requires at least one aggregation"));
            }
            aggr_exprs.push(count(lit(1i64)).alias(GROUP_COUNT_COLUMN));
        }

        let group_exprs: Vec<Expr> = keys.iter().map(|k| column(k)).collect();
        let mut df = engine.read(input.clone())?;
        // Rows with a null key belong to no group.
        if let Some(present) = keys.iter().map(|k| column(k).is_not_null()).reduce(Expr::and) {
            df = df.filter(present)?;
        }
        df = df.aggregate(group_exprs, aggr_exprs)?;
        if self.is_grouped() {
            df = df.sort(keys.iter().map(|k| column(k).sort(true, false)).collect())?;
        }
        engine.collect(df)
    }
}

fn requires_numeric(func: AggFunc) -> bool {
    matches!(func, AggFunc::Sum | AggFunc::Mean | AggFunc::Std | AggFunc::Var | AggFunc::Median)
}

fn aggregate_expr(func: AggFunc, arg: Expr) -> Expr {
    match func {
        AggFunc::Sum => sum(arg),
        AggFunc::Mean => avg(arg),
        AggFunc::Count => count(arg),
        AggFunc::Min => min(arg),
        AggFunc::Max => max(arg),
        AggFunc::Std => stddev(arg),
        AggFunc::Var => var_sample(arg),
        AggFunc::Median => median(arg),
        AggFunc::NUnique => count_distinct(arg),
        AggFunc::First => first_value_udaf().call(vec![arg]),
        AggFunc::Last => last_value_udaf().call(vec![arg]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agg(column: &str, func: AggFunc) -> Aggregation {
        Aggregation { column: ColumnRef::unresolved(column), func }
    }

    #[test]
    fn grouped_names_disambiguate_repeated_columns() {
        let plan = GroupAggregatePlan {
            keys: vec![ColumnRef::unresolved("city")],
            aggregations: vec![
                agg("age", AggFunc::Min),
                agg("age", AggFunc::Max),
                agg("score", AggFunc::Mean),
                agg("city", AggFunc::Count),
            ],
        };
        let exec = AggregateExec::grouped(&plan);
        let columns: Vec<String> =
            ["age", "age", "score", "city"].iter().map(|s| s.to_string()).collect();
        assert_eq!(
            exec.output_names(&columns, &["city".to_string()]),
            vec!["age_min", "age_max", "score", "city_count"]
        );
    }

    #[test]
    fn whole_table_names_carry_the_function() {
        let plan = AggregatePlan { aggregations: vec![agg("age", AggFunc::Sum)] };
        let exec = AggregateExec::whole(&plan);
        assert_eq!(exec.output_names(&["age".to_string()], &[]), vec!["age_sum"]);
        assert_eq!(exec.name(), "aggregate");
    }
}
