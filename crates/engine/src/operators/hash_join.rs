//! Hash join operator

use super::{with_row_index, ExecutionPlan};
use crate::resolve::{is_text, qualified, type_mismatch, Resolver};
use crate::session::Engine;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use callframe_common::{Error, Result};
use callframe_grammar::{ColumnRef, JoinKind, JoinPlan};
use datafusion::functions::expr_fn::coalesce;
use datafusion::logical_expr::Expr;
use datafusion::prelude::JoinType;

const LEFT: &str = "l";
const RIGHT: &str = "r";
const LEFT_ROW: &str = "__callframe_left_row";
const RIGHT_ROW: &str = "__callframe_right_row";

/// Equi-join of the input (left) with an external table (right).
///
/// Output columns are the join keys once, then the remaining left columns,
/// then the remaining right columns. Non-key names present on both sides
/// get `_x` and `_y` suffixes. Rows follow left order, then right order;
/// right joins follow right order and outer joins place right-only rows last.
#[derive(Debug)]
pub struct HashJoinExec<'p> {
    plan: &'p JoinPlan,
    right: &'p RecordBatch,
}

struct KeyPair {
    left: String,
    right: String,
}

impl<'p> HashJoinExec<'p> {
    pub fn new(plan: &'p JoinPlan, right: &'p RecordBatch) -> Self {
        Self { plan, right }
    }

    fn join_type(&self) -> JoinType {
        match self.plan.kind {
            JoinKind::Inner => JoinType::Inner,
            JoinKind::Left => JoinType::Left,
            JoinKind::Right => JoinType::Right,
            JoinKind::Outer => JoinType::Full,
        }
    }

    fn key_pairs(&self, left: &RecordBatch) -> Result<Vec<KeyPair>> {
        let left_resolver = Resolver::new(left.schema());
        let right_resolver = Resolver::new(self.right.schema());

        let requested: Vec<ColumnRef> = if self.plan.on.is_empty() {
            let right_schema = self.right.schema();
            left.schema()
                .fields()
                .iter()
                .filter(|f| right_schema.field_with_name(f.name()).is_ok())
                .map(|f| ColumnRef::resolved(f.name().clone()))
                .collect()
        } else {
            self.plan.on.clone()
        };
        if requested.is_empty() {
            return Err(Error::new("tables share no column to join on"));
        }

        requested
            .iter()
            .map(|key| {
                let left_field = left_resolver
                    .field(key)
                    .map_err(|_| Error::JoinKeyNotFound { column: key.name.clone(), side: "left" })?;
                let right_field = right_resolver
                    .field(key)
                    .map_err(|_| Error::JoinKeyNotFound { column: key.name.clone(), side: "right" })?;
                if !comparable(left_field.data_type(), right_field.data_type()) {
                    return Err(type_mismatch(right_field.name(), right_field.data_type(), "join"));
                }
                Ok(KeyPair { left: left_field.name().clone(), right: right_field.name().clone() })
            })
            .collect()
    }

    /// Final projection over the joined, row-indexed frame.
    fn output_columns(&self, left: &RecordBatch, keys: &[KeyPair]) -> Vec<Expr> {
        let left_schema = left.schema();
        let right_schema = self.right.schema();
        let left_names: Vec<&String> = left_schema.fields().iter().map(|f| f.name()).collect();
        let right_rest: Vec<&String> = right_schema
            .fields()
            .iter()
            .map(|f| f.name())
            .filter(|n| !keys.iter().any(|k| &k.right == *n))
            .collect();

        let mut out = Vec::with_capacity(left_names.len() + right_rest.len());
        for name in &left_names {
            match keys.iter().find(|k| &k.left == *name) {
                Some(key) => out.push(self.key_column(key).alias(name.as_str())),
                None => {
                    let alias = if right_rest.contains(name) {
                        format!("{}_x", name)
                    } else {
                        name.to_string()
                    };
                    out.push(qualified(LEFT, name).alias(alias));
                }
            }
        }
        for name in right_rest {
            let alias = if left_names.contains(&name) { format!("{}_y", name) } else { name.clone() };
            out.push(qualified(RIGHT, name).alias(alias));
        }
        out
    }

    fn key_column(&self, key: &KeyPair) -> Expr {
        let left = qualified(LEFT, &key.left);
        let right = qualified(RIGHT, &key.right);
        match self.plan.kind {
            JoinKind::Inner | JoinKind::Left => left,
            JoinKind::Right => right,
            JoinKind::Outer => coalesce(vec![left, right]),
        }
    }
}

fn comparable(left: &DataType, right: &DataType) -> bool {
    left == right
        || (left.is_numeric() && right.is_numeric())
        || (is_text(left) && is_text(right))
}

impl ExecutionPlan for HashJoinExec<'_> {
    fn name(&self) -> &'static str {
        match self.plan.kind {
            JoinKind::Inner => "join",
            JoinKind::Left => "leftjoin",
            JoinKind::Right => "rightjoin",
            JoinKind::Outer => "outerjoin",
        }
    }

    fn execute(&self, engine: &Engine, input: &RecordBatch) -> Result<RecordBatch> {
        let keys = self.key_pairs(input)?;
        let left = engine.read(with_row_index(input, LEFT_ROW)?)?.alias(LEFT)?;
        let right = engine.read(with_row_index(self.right, RIGHT_ROW)?)?.alias(RIGHT)?;
        let on: Vec<Expr> = keys
            .iter()
            .map(|k| qualified(LEFT, &k.left).eq(qualified(RIGHT, &k.right)))
            .collect();

        let order = match self.plan.kind {
            JoinKind::Right => [(RIGHT, RIGHT_ROW), (LEFT, LEFT_ROW)],
            _ => [(LEFT, LEFT_ROW), (RIGHT, RIGHT_ROW)],
        };
        let df = left
            .join_on(right, self.join_type(), on)?
            .sort(order.iter().map(|(rel, row)| qualified(rel, row).sort(true, false)).collect())?
            .select(self.output_columns(input, &keys))?;
        tracing::debug!(
            kind = ?self.plan.kind,
            target = %self.plan.target,
            keys = keys.len(),
            "executing join"
        );
        engine.collect(df)
    }
}
