//! Operation plans produced by the builder.
//!
//! Plans are plain data: they hold column references and literals but never
//! a reference to the table they will run against.

use crate::keyword::{AggFunc, Direction, JoinKind, Operator};
use std::fmt;

/// One parsed call.
#[derive(Debug, Clone, PartialEq)]
pub enum Plan {
    Filter(FilterPlan),
    Sort(SortPlan),
    Aggregate(AggregatePlan),
    GroupAggregate(GroupAggregatePlan),
    Select(SelectPlan),
    Rename(RenamePlan),
    Drop(DropPlan),
    Join(JoinPlan),
    Append(AppendPlan),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterPlan {
    pub condition: Condition,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortPlan {
    pub keys: Vec<SortKey>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortKey {
    pub column: ColumnRef,
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregatePlan {
    pub aggregations: Vec<Aggregation>,
}

/// Group keys plus aggregations. No aggregations means "count rows per group".
#[derive(Debug, Clone, PartialEq)]
pub struct GroupAggregatePlan {
    pub keys: Vec<ColumnRef>,
    pub aggregations: Vec<Aggregation>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    pub column: ColumnRef,
    pub func: AggFunc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectPlan {
    pub columns: Vec<ColumnRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenamePlan {
    pub mappings: Vec<(ColumnRef, String)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropPlan {
    pub columns: Vec<ColumnRef>,
}

/// Join against an externally supplied table.
///
/// An empty `on` list joins on every column the two tables share.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinPlan {
    pub kind: JoinKind,
    pub target: String,
    pub on: Vec<ColumnRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppendPlan {
    pub target: String,
}

/// Name of the external table used when a call does not name one.
pub const DEFAULT_TARGET: &str = "other";

/// A column name taken from the call.
///
/// `resolved` is set when the matcher found the name in a known schema; the
/// dispatcher still validates every reference against the live table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    pub name: String,
    pub resolved: bool,
}

impl ColumnRef {
    pub fn resolved(name: impl Into<String>) -> Self {
        Self { name: name.into(), resolved: true }
    }

    pub fn unresolved(name: impl Into<String>) -> Self {
        Self { name: name.into(), resolved: false }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

/// A literal together with the exact text it was parsed from.
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub raw: String,
    pub value: Value,
}

impl Literal {
    /// Greedy coercion: integer, then decimal, then boolean words, else text.
    pub fn coerce(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let value = if let Ok(i) = raw.parse::<i64>() {
            Value::Int(i)
        } else if let Some(f) = parse_decimal(&raw) {
            Value::Float(f)
        } else {
            match raw.as_str() {
                "true" | "yes" => Value::Bool(true),
                "false" | "no" => Value::Bool(false),
                _ => Value::Text(raw.clone()),
            }
        };
        Self { raw, value }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.value, Value::Int(_) | Value::Float(_))
    }
}

// Only plain decimal syntax counts; `f64::from_str` would also accept
// words such as "inf" or "nan".
fn parse_decimal(raw: &str) -> Option<f64> {
    let digits = raw.strip_prefix('-').unwrap_or(raw);
    let well_formed = digits.contains('.')
        && digits.chars().all(|c| c.is_ascii_digit() || c == '.')
        && digits.chars().any(|c| c.is_ascii_digit());
    if well_formed {
        raw.parse().ok()
    } else {
        None
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    None,
    Scalar(Literal),
    Range(Literal, Literal),
    Set(Vec<Literal>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub column: ColumnRef,
    pub op: Operator,
    pub operand: Operand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Logic {
    And,
    Or,
}

/// Boolean condition tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Leaf(Predicate),
    /// Alternative readings of one ambiguous span, most specific first.
    /// The first whose column exists in the table wins.
    OneOf(Vec<Predicate>),
    Node { logic: Logic, children: Vec<Condition> },
}

impl Condition {
    /// Left-fold step: `(self) logic rhs`.
    ///
    /// A node already combined with the same connector absorbs `rhs`, which
    /// keeps `a and b and c` flat without changing its meaning.
    pub fn combine(self, logic: Logic, rhs: Condition) -> Condition {
        match self {
            Condition::Node { logic: current, mut children } if current == logic => {
                children.push(rhs);
                Condition::Node { logic, children }
            }
            lhs => Condition::Node { logic, children: vec![lhs, rhs] },
        }
    }
}

impl Plan {
    pub fn name(&self) -> &'static str {
        match self {
            Plan::Filter(_) => "filter",
            Plan::Sort(_) => "sort",
            Plan::Aggregate(_) => "aggregate",
            Plan::GroupAggregate(_) => "groupby",
            Plan::Select(_) => "select",
            Plan::Rename(_) => "rename",
            Plan::Drop(_) => "drop",
            Plan::Join(_) => "join",
            Plan::Append(_) => "append",
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Value::Text(s) => write!(f, "'{}'", s),
            _ => f.write_str(&self.raw),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.column, self.op)?;
        match &self.operand {
            Operand::None => Ok(()),
            Operand::Scalar(lit) => write!(f, " {}", lit),
            Operand::Range(lo, hi) => write!(f, " [{}, {}]", lo, hi),
            Operand::Set(items) => {
                let items: Vec<String> = items.iter().map(|l| l.to_string()).collect();
                write!(f, " ({})", items.join(", "))
            }
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Leaf(p) => write!(f, "{}", p),
            Condition::OneOf(candidates) => {
                let parts: Vec<String> = candidates.iter().map(|p| p.to_string()).collect();
                write!(f, "oneof({})", parts.join(" | "))
            }
            Condition::Node { logic, children } => {
                let sep = match logic {
                    Logic::And => " and ",
                    Logic::Or => " or ",
                };
                let parts: Vec<String> = children.iter().map(|c| c.to_string()).collect();
                write!(f, "({})", parts.join(sep))
            }
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Plan::Filter(p) => write!(f, "Filter {}", p.condition),
            Plan::Sort(p) => {
                let keys: Vec<String> = p
                    .keys
                    .iter()
                    .map(|k| format!("{} {:?}", k.column, k.direction).to_lowercase())
                    .collect();
                write!(f, "Sort [{}]", keys.join(", "))
            }
            Plan::Aggregate(p) => write!(f, "Aggregate [{}]", format_aggregations(&p.aggregations)),
            Plan::GroupAggregate(p) => write!(
                f,
                "GroupAggregate by [{}] [{}]",
                join_columns(&p.keys),
                format_aggregations(&p.aggregations)
            ),
            Plan::Select(p) => write!(f, "Select [{}]", join_columns(&p.columns)),
            Plan::Rename(p) => {
                let pairs: Vec<String> =
                    p.mappings.iter().map(|(old, new)| format!("{} -> {}", old, new)).collect();
                write!(f, "Rename [{}]", pairs.join(", "))
            }
            Plan::Drop(p) => write!(f, "Drop [{}]", join_columns(&p.columns)),
            Plan::Join(p) => {
                write!(f, "Join {:?} {} on [{}]", p.kind, p.target, join_columns(&p.on))
            }
            Plan::Append(p) => write!(f, "Append {}", p.target),
        }
    }
}

fn join_columns(columns: &[ColumnRef]) -> String {
    columns.iter().map(|c| c.name.as_str()).collect::<Vec<_>>().join(", ")
}

fn format_aggregations(aggregations: &[Aggregation]) -> String {
    aggregations
        .iter()
        .map(|a| format!("{}({})", a.func, a.column))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(column: &str) -> Condition {
        Condition::Leaf(Predicate {
            column: ColumnRef::unresolved(column),
            op: Operator::IsNull,
            operand: Operand::None,
        })
    }

    #[test]
    fn literal_coercion() {
        assert_eq!(Literal::coerce("30").value, Value::Int(30));
        assert_eq!(Literal::coerce("-4").value, Value::Int(-4));
        assert_eq!(Literal::coerce("9.5").value, Value::Float(9.5));
        assert_eq!(Literal::coerce("yes").value, Value::Bool(true));
        assert_eq!(Literal::coerce("inf").value, Value::Text("inf".to_string()));
        assert_eq!(Literal::coerce("new_york").value, Value::Text("new_york".to_string()));
        assert_eq!(Literal::coerce("007").raw, "007");
    }

    #[test]
    fn combine_flattens_same_connector_only() {
        let tree = leaf("a").combine(Logic::And, leaf("b")).combine(Logic::And, leaf("c"));
        assert!(matches!(&tree, Condition::Node { logic: Logic::And, children } if children.len() == 3));

        let mixed = leaf("a").combine(Logic::Or, leaf("b")).combine(Logic::And, leaf("c"));
        match mixed {
            Condition::Node { logic: Logic::And, children } => {
                assert_eq!(children.len(), 2);
                assert!(matches!(&children[0], Condition::Node { logic: Logic::Or, .. }));
            }
            other => panic!("unexpected tree: {:?}", other),
        }
    }

    #[test]
    fn display_is_compact() {
        let tree = leaf("a").combine(Logic::Or, leaf("b"));
        assert_eq!(Plan::Filter(FilterPlan { condition: tree }).to_string(), "Filter (a isna or b isna)");
    }
}
