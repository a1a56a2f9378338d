//! Lowers filter conditions into DataFusion expressions.
//!
//! Every predicate is type-checked against the resolved column before an
//! expression is built, so mismatches surface as `TypeMismatch` instead of
//! a DataFusion planning error.

use crate::resolve::{column, is_text, type_mismatch, Resolver};
use arrow::datatypes::DataType;
use callframe_common::{Error, Result};
use callframe_grammar::{Condition, Literal, Logic, Operand, Operator, Predicate, Value};
use datafusion::functions::expr_fn::{ends_with, lower, starts_with, strpos};
use datafusion::logical_expr::{cast, lit, Expr};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Numeric,
    Text,
    Boolean,
    Temporal,
    Other,
}

impl ColumnKind {
    fn of(data_type: &DataType) -> Self {
        if data_type.is_numeric() {
            ColumnKind::Numeric
        } else if is_text(data_type) {
            ColumnKind::Text
        } else if *data_type == DataType::Boolean {
            ColumnKind::Boolean
        } else if data_type.is_temporal() {
            ColumnKind::Temporal
        } else {
            ColumnKind::Other
        }
    }
}

pub(crate) fn lower_condition(condition: &Condition, resolver: &Resolver) -> Result<Expr> {
    match condition {
        Condition::Leaf(predicate) => lower_predicate(predicate, resolver),
        Condition::OneOf(candidates) => {
            let first = candidates
                .first()
                .ok_or_else(|| Error::new("empty set of candidate predicates"))?;
            match candidates.iter().find(|p| resolver.contains(&p.column)) {
                Some(chosen) => {
                    tracing::trace!(predicate = %chosen, "resolved ambiguous condition");
                    lower_predicate(chosen, resolver)
                }
                None => Err(resolver.unknown(&first.column)),
            }
        }
        Condition::Node { logic, children } => {
            let mut lowered = children.iter().map(|child| lower_condition(child, resolver));
            let first = lowered
                .next()
                .ok_or_else(|| Error::new("condition node without children"))??;
            lowered.try_fold(first, |acc, next| {
                let next = next?;
                Ok(match logic {
                    Logic::And => acc.and(next),
                    Logic::Or => acc.or(next),
                })
            })
        }
    }
}

fn lower_predicate(predicate: &Predicate, resolver: &Resolver) -> Result<Expr> {
    let field = resolver.field(&predicate.column)?;
    let name = field.name().as_str();
    let data_type = field.data_type();
    let kind = ColumnKind::of(data_type);
    let op = predicate.op;
    let mismatch = || type_mismatch(name, data_type, op.as_str());

    if op.is_unary() {
        let target = column(name);
        return Ok(match op {
            Operator::IsNull => target.is_null(),
            _ => target.is_not_null(),
        });
    }
    if op.is_text_match() && kind != ColumnKind::Text {
        return Err(mismatch());
    }
    if (op.is_ordering() && kind == ColumnKind::Boolean) || kind == ColumnKind::Other {
        return Err(mismatch());
    }

    // Call names are lower-cased, so text is compared case-insensitively.
    let subject = match kind {
        ColumnKind::Text => lower(column(name)),
        _ => column(name),
    };
    let value = |literal: &Literal| literal_expr(kind, data_type, literal).ok_or_else(mismatch);

    let expr = match (&predicate.operand, op) {
        (Operand::Scalar(literal), Operator::Contains) => {
            strpos(subject, lit(literal.raw.clone())).gt(lit(0i64))
        }
        (Operand::Scalar(literal), Operator::StartsWith) => starts_with(subject, lit(literal.raw.clone())),
        (Operand::Scalar(literal), Operator::EndsWith) => ends_with(subject, lit(literal.raw.clone())),
        (Operand::Scalar(literal), Operator::Eq) => subject.eq(value(literal)?),
        (Operand::Scalar(literal), Operator::NotEq) => {
            subject.not_eq(value(literal)?).or(column(name).is_null())
        }
        (Operand::Scalar(literal), Operator::Gt) => subject.gt(value(literal)?),
        (Operand::Scalar(literal), Operator::Lt) => subject.lt(value(literal)?),
        (Operand::Scalar(literal), Operator::GtEq) => subject.gt_eq(value(literal)?),
        (Operand::Scalar(literal), Operator::LtEq) => subject.lt_eq(value(literal)?),
        (Operand::Range(low, high), Operator::Between) => subject.between(value(low)?, value(high)?),
        (Operand::Set(items), Operator::IsIn) => {
            subject.in_list(items.iter().map(value).collect::<Result<Vec<_>>>()?, false)
        }
        // A null is never equal to a value, so negated matches keep it.
        (Operand::Set(items), Operator::NotIn) => subject
            .in_list(items.iter().map(value).collect::<Result<Vec<_>>>()?, true)
            .or(column(name).is_null()),
        (operand, op) => {
            return Err(Error::Execution(format!(
                "operator '{}' does not take operand {:?}",
                op, operand
            )))
        }
    };
    Ok(expr)
}

/// Literal expression comparable with a column of `kind`, or `None` when the
/// literal cannot be compared with it.
fn literal_expr(kind: ColumnKind, data_type: &DataType, literal: &Literal) -> Option<Expr> {
    match (kind, &literal.value) {
        (ColumnKind::Numeric, Value::Int(i)) => Some(lit(*i)),
        (ColumnKind::Numeric, Value::Float(f)) => Some(lit(*f)),
        (ColumnKind::Numeric, _) => None,
        // Text columns compare against the literal exactly as written,
        // so `zip_equals_007` keeps its leading zeros.
        (ColumnKind::Text, _) => Some(lit(literal.raw.clone())),
        (ColumnKind::Boolean, Value::Bool(b)) => Some(lit(*b)),
        (ColumnKind::Boolean, _) => None,
        (ColumnKind::Temporal, _) => Some(cast(lit(literal.raw.clone()), data_type.clone())),
        (ColumnKind::Other, _) => None,
    }
}
