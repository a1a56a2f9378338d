//! Assembles matched spans into an operation [`Plan`].

use crate::keyword::{AggFunc, Connector, Direction, JoinKind, Keyword, Operator, OperationKind};
use crate::matcher::{Context, Matcher};
use crate::plan::*;
use crate::tokenizer::tokenize;
use callframe_common::{ColumnCatalog, Error, Result};

/// Parses a call name into a plan.
///
/// `catalog` is the schema of the table the call will run against. It only
/// guides span matching; column references are validated at dispatch.
pub fn parse_call(name: &str, catalog: Option<&ColumnCatalog>) -> Result<Plan> {
    let tokens = tokenize(name)?;
    let mut m = Matcher::new(name, &tokens, catalog);

    let operation = match m.peek_keyword() {
        Some(Keyword::Operation(op)) => op,
        _ => {
            let leading = m.peek().unwrap_or_default();
            return Err(Error::unrecognized(
                name,
                format!("'{}' is not an operation keyword", leading),
            ));
        }
    };
    m.advance();

    let plan = match operation {
        OperationKind::Filter => Plan::Filter(build_filter(&mut m)?),
        OperationKind::Sort => Plan::Sort(build_sort(&mut m)?),
        OperationKind::GroupBy => Plan::GroupAggregate(build_groupby(&mut m)?),
        OperationKind::Aggregate => {
            Plan::Aggregate(AggregatePlan { aggregations: build_aggregations(&mut m)? })
        }
        OperationKind::Select => Plan::Select(SelectPlan { columns: build_column_list(&mut m)? }),
        OperationKind::Rename => Plan::Rename(build_rename(&mut m)?),
        OperationKind::Drop => Plan::Drop(DropPlan { columns: build_column_list(&mut m)? }),
        OperationKind::Join(kind) => Plan::Join(build_join(&mut m, kind)?),
        OperationKind::Append => Plan::Append(build_append(&mut m)?),
    };
    m.finish(operation)?;

    tracing::debug!(call = name, %plan, "parsed call");
    Ok(plan)
}

fn build_filter(m: &mut Matcher<'_>) -> Result<FilterPlan> {
    // Streaming left fold: each connector binds everything to its left.
    let mut condition = build_condition(m)?;
    while let Some(logic) = eat_logic(m) {
        if m.is_done() {
            return Err(Error::malformed(m.name(), "dangling connector at end of filter"));
        }
        let rhs = build_condition(m)?;
        condition = condition.combine(logic, rhs);
    }
    Ok(FilterPlan { condition })
}

fn eat_logic(m: &mut Matcher<'_>) -> Option<Logic> {
    if m.eat_connector(Connector::And) {
        Some(Logic::And)
    } else if m.eat_connector(Connector::Or) {
        Some(Logic::Or)
    } else {
        None
    }
}

fn build_condition(m: &mut Matcher<'_>) -> Result<Condition> {
    let start = m.position();
    let column = m.take_column(Context::FilterTerm)?;

    if let Some(Keyword::Operator(op)) = m.peek_keyword() {
        m.advance();
        let operand = build_operand(m, op)?;
        return Ok(Condition::Leaf(Predicate { column, op, operand }));
    }
    implicit_equality(m, start, column)
}

/// `filter_city_london`: a column directly followed by a value.
fn implicit_equality(m: &mut Matcher<'_>, start: usize, column: ColumnRef) -> Result<Condition> {
    if column.resolved {
        if m.run_len(Context::FilterTerm) == 0 {
            return Err(Error::malformed(
                m.name(),
                format!("condition on '{}' has no operator or value", column),
            ));
        }
        let value = m.take_value(Context::FilterTerm, "value")?;
        return Ok(Condition::Leaf(eq(column, value)));
    }

    // Without a schema match the free run holds both column and value.
    // Every split point is a candidate; longest column first.
    let span = m.span(start, m.position());
    if span.len() < 2 {
        return Err(Error::malformed(
            m.name(),
            format!("condition on '{}' has no operator or value", column),
        ));
    }
    let mut candidates: Vec<Predicate> = (1..span.len())
        .rev()
        .map(|split| {
            eq(
                ColumnRef::unresolved(span[..split].join("_")),
                Literal::coerce(span[split..].join("_")),
            )
        })
        .collect();
    if candidates.len() == 1 {
        return Ok(Condition::Leaf(candidates.remove(0)));
    }
    Ok(Condition::OneOf(candidates))
}

fn eq(column: ColumnRef, value: Literal) -> Predicate {
    Predicate { column, op: Operator::Eq, operand: Operand::Scalar(value) }
}

fn build_operand(m: &mut Matcher<'_>, op: Operator) -> Result<Operand> {
    match op {
        Operator::IsNull | Operator::NotNull => Ok(Operand::None),
        Operator::Between => build_range(m),
        Operator::IsIn | Operator::NotIn => build_set(m, op),
        _ => Ok(Operand::Scalar(m.take_value(Context::FilterTerm, &format!("value for '{}'", op))?)),
    }
}

/// `between_1_5` (fixed two-token span) or `between_1_and_5`.
fn build_range(m: &mut Matcher<'_>) -> Result<Operand> {
    let first = m.take_run(Context::FilterTerm);
    match first.len() {
        2 => Ok(Operand::Range(Literal::coerce(first[0].as_str()), Literal::coerce(first[1].as_str()))),
        1 => {
            let lo = Literal::coerce(first[0].as_str());
            if !m.eat_connector(Connector::And) || m.run_len(Context::FilterTerm) == 0 {
                return Err(Error::malformed(m.name(), "'between' requires two bounds"));
            }
            let run = m.run_len(Context::FilterTerm);
            if matches!(m.keyword_at(m.position() + run), Some(Keyword::Operator(_))) {
                return Err(Error::malformed(
                    m.name(),
                    "'between' upper bound is followed by an operator",
                ));
            }
            let hi = m.take_value(Context::FilterTerm, "upper bound")?;
            Ok(Operand::Range(lo, hi))
        }
        0 => Err(Error::malformed(m.name(), "'between' requires two bounds")),
        n => Err(Error::malformed(
            m.name(),
            format!("'between' expects two bounds, found {} tokens", n),
        )),
    }
}

/// `isin_a_and_b_and_c`. An `and` followed by a run that is itself followed
/// by an operator starts the next condition instead of extending the list,
/// as does a known column followed by a value (`and_name_bob`).
fn build_set(m: &mut Matcher<'_>, op: Operator) -> Result<Operand> {
    let mut items = vec![m.take_value(Context::FilterTerm, &format!("value for '{}'", op))?];
    loop {
        if m.keyword_at(m.position()) != Some(Keyword::Connector(Connector::And)) {
            break;
        }
        let next = m.position() + 1;
        let run = m.run_len_at(next, Context::FilterTerm);
        let starts_condition = matches!(m.keyword_at(next + run), Some(Keyword::Operator(_)))
            || m
                .schema_match_at(next)
                .is_some_and(|(len, _)| m.run_len_at(next + len, Context::FilterTerm) > 0);
        if run == 0 || starts_condition {
            break;
        }
        m.advance();
        items.push(m.take_value(Context::FilterTerm, "list item")?);
    }
    Ok(Operand::Set(items))
}

fn build_sort(m: &mut Matcher<'_>) -> Result<SortPlan> {
    m.eat_connector(Connector::By);
    let mut keys = Vec::new();
    loop {
        let column = m.take_column(Context::SortColumn)?;
        let direction = match m.peek_keyword() {
            Some(Keyword::Direction(d)) => {
                m.advance();
                d
            }
            _ => Direction::Asc,
        };
        keys.push(SortKey { column, direction });
        if !m.eat_connector(Connector::And) {
            break;
        }
    }
    Ok(SortPlan { keys })
}

fn build_groupby(m: &mut Matcher<'_>) -> Result<GroupAggregatePlan> {
    let aggregate = Keyword::Operation(OperationKind::Aggregate);
    m.eat_connector(Connector::By);
    let mut keys = Vec::new();
    let mut aggregations = Vec::new();
    loop {
        keys.push(m.take_column(Context::GroupKey)?);
        if m.eat_keyword(aggregate) {
            aggregations = build_aggregations(m)?;
            break;
        }
        if !m.eat_connector(Connector::And) {
            break;
        }
        if m.eat_keyword(aggregate) {
            aggregations = build_aggregations(m)?;
            break;
        }
    }
    Ok(GroupAggregatePlan { keys, aggregations })
}

/// `<col>_<func>` pairs joined by `and`. The function may also lead
/// (`mean_salary`) and defaults to `sum` when omitted.
fn build_aggregations(m: &mut Matcher<'_>) -> Result<Vec<Aggregation>> {
    let mut aggregations = Vec::new();
    loop {
        let leading = match m.peek_keyword() {
            Some(Keyword::Agg(func)) if m.schema_match_at(m.position()).is_none() => {
                m.advance();
                Some(func)
            }
            _ => None,
        };
        let column = m.take_column(Context::AggColumn)?;
        let trailing = match m.peek_keyword() {
            Some(Keyword::Agg(func)) if leading.is_none() => {
                m.advance();
                Some(func)
            }
            _ => None,
        };
        let func = leading.or(trailing).unwrap_or(AggFunc::Sum);
        aggregations.push(Aggregation { column, func });
        if !m.eat_connector(Connector::And) {
            break;
        }
    }
    Ok(aggregations)
}

/// Columns joined by `and`. Schema-known columns may also follow each
/// other directly (`select_name_age`).
fn build_column_list(m: &mut Matcher<'_>) -> Result<Vec<ColumnRef>> {
    let mut columns = vec![m.take_column(Context::ListColumn)?];
    loop {
        if m.eat_connector(Connector::And) || m.schema_match_at(m.position()).is_some() {
            columns.push(m.take_column(Context::ListColumn)?);
        } else {
            break;
        }
    }
    Ok(columns)
}

fn build_rename(m: &mut Matcher<'_>) -> Result<RenamePlan> {
    let mut mappings = Vec::new();
    loop {
        let old = m.take_column(Context::RenameOld)?;
        if !(m.eat_connector(Connector::To) || m.eat_connector(Connector::As)) {
            return Err(Error::malformed(
                m.name(),
                format!("rename of '{}' is missing 'to'", old),
            ));
        }
        let new = m.take_name(Context::RenameNew, "new column name")?;
        mappings.push((old, new));
        if !m.eat_connector(Connector::And) {
            break;
        }
    }
    Ok(RenamePlan { mappings })
}

fn build_join(m: &mut Matcher<'_>, kind: JoinKind) -> Result<JoinPlan> {
    let target = if m.is_done() || m.peek_keyword() == Some(Keyword::Connector(Connector::On)) {
        DEFAULT_TARGET.to_string()
    } else {
        m.take_name(Context::JoinTarget, "join target")?
    };
    let mut on = Vec::new();
    if m.eat_connector(Connector::On) {
        loop {
            on.push(m.take_column(Context::JoinKey)?);
            if !m.eat_connector(Connector::And) {
                break;
            }
        }
    }
    Ok(JoinPlan { kind, target, on })
}

fn build_append(m: &mut Matcher<'_>) -> Result<AppendPlan> {
    m.eat_connector(Connector::To);
    let target = if m.is_done() {
        DEFAULT_TARGET.to_string()
    } else {
        m.take_name(Context::JoinTarget, "append target")?
    };
    Ok(AppendPlan { target })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> ColumnCatalog {
        ColumnCatalog::new(["age", "city", "salary", "name", "first_name", "department"])
    }

    fn filter(name: &str) -> Condition {
        match parse_call(name, Some(&catalog())).unwrap() {
            Plan::Filter(p) => p.condition,
            other => panic!("expected filter, got {:?}", other),
        }
    }

    fn leaf(cond: &Condition) -> &Predicate {
        match cond {
            Condition::Leaf(p) => p,
            other => panic!("expected leaf, got {:?}", other),
        }
    }

    #[test]
    fn simple_comparison() {
        let cond = filter("filter_age_greaterthan_30");
        let p = leaf(&cond);
        assert_eq!(p.column, ColumnRef::resolved("age"));
        assert_eq!(p.op, Operator::Gt);
        assert_eq!(p.operand, Operand::Scalar(Literal::coerce("30")));
    }

    #[test]
    fn connectors_fold_left_without_precedence() {
        let cond = filter("filter_age_gt_1_or_salary_gt_2_and_name_equals_bob");
        match cond {
            Condition::Node { logic: Logic::And, children } => {
                assert_eq!(children.len(), 2);
                match &children[0] {
                    Condition::Node { logic: Logic::Or, children } => assert_eq!(children.len(), 2),
                    other => panic!("expected or-node, got {:?}", other),
                }
                assert_eq!(leaf(&children[1]).column.name, "name");
            }
            other => panic!("expected and-node, got {:?}", other),
        }
    }

    #[test]
    fn between_accepts_both_spellings() {
        for name in ["filter_age_between_20_and_30", "filter_age_between_20_30"] {
            let cond = filter(name);
            assert_eq!(
                leaf(&cond).operand,
                Operand::Range(Literal::coerce("20"), Literal::coerce("30"))
            );
        }
    }

    #[test]
    fn between_followed_by_another_condition() {
        let cond = filter("filter_age_between_20_and_30_and_city_equals_paris");
        match cond {
            Condition::Node { logic: Logic::And, children } => {
                assert_eq!(children.len(), 2);
                assert_eq!(leaf(&children[1]).column.name, "city");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn dangling_between_is_malformed() {
        let err = parse_call("filter_age_between_20", Some(&catalog())).unwrap_err();
        assert!(matches!(err, Error::MalformedSpan { .. }));
        let err = parse_call("filter_age_between", Some(&catalog())).unwrap_err();
        assert!(matches!(err, Error::MalformedSpan { .. }));
    }

    #[test]
    fn isin_list_stops_before_next_condition() {
        let cond = filter("filter_city_isin_london_and_paris_and_new_york_and_age_gt_30");
        match cond {
            Condition::Node { logic: Logic::And, children } => {
                let set = &leaf(&children[0]).operand;
                let expected: Vec<Literal> =
                    ["london", "paris", "new_york"].iter().map(|s| Literal::coerce(*s)).collect();
                assert_eq!(set, &Operand::Set(expected));
                assert_eq!(leaf(&children[1]).op, Operator::Gt);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn isin_list_stops_before_implicit_equality_on_known_column() {
        let cond = filter("filter_city_isin_ny_and_ln_and_name_cy");
        let Condition::Node { logic: Logic::And, children } = cond else {
            panic!("expected and-node");
        };
        let expected: Vec<Literal> = ["ny", "ln"].iter().map(|s| Literal::coerce(*s)).collect();
        assert_eq!(leaf(&children[0]).operand, Operand::Set(expected));
        let next = leaf(&children[1]);
        assert_eq!(next.column, ColumnRef::resolved("name"));
        assert_eq!(next.operand, Operand::Scalar(Literal::coerce("cy")));
    }

    #[test]
    fn between_upper_bound_followed_by_operator_is_malformed() {
        let err = parse_call("filter_age_between_1_and_name_equals_a", Some(&catalog())).unwrap_err();
        assert!(matches!(err, Error::MalformedSpan { .. }), "{:?}", err);
    }

    #[test]
    fn unary_operators_take_no_value() {
        let cond = filter("filter_salary_isnull_or_age_notna");
        let Condition::Node { logic: Logic::Or, children } = cond else {
            panic!("expected or-node");
        };
        assert_eq!(children.len(), 2);
        assert_eq!(leaf(&children[0]).operand, Operand::None);
        assert_eq!(leaf(&children[1]).op, Operator::NotNull);
    }

    #[test]
    fn implicit_equality_with_schema() {
        let cond = filter("filter_city_london");
        let p = leaf(&cond);
        assert_eq!(p.op, Operator::Eq);
        assert_eq!(p.column, ColumnRef::resolved("city"));
    }

    #[test]
    fn implicit_equality_without_schema_defers_choice() {
        let plan = parse_call("filter_home_city_new_york", None).unwrap();
        let Plan::Filter(FilterPlan { condition: Condition::OneOf(candidates) }) = plan else {
            panic!("expected deferred candidates");
        };
        let columns: Vec<&str> = candidates.iter().map(|p| p.column.name.as_str()).collect();
        assert_eq!(columns, vec!["home_city_new", "home_city", "home"]);
    }

    #[test]
    fn reserved_word_literal_is_rejected() {
        let err = parse_call("filter_city_equals_and", Some(&catalog())).unwrap_err();
        assert!(matches!(err, Error::ReservedWordLiteral { ref keyword } if keyword == "and"));
    }

    #[test]
    fn unknown_column_is_not_a_parse_error() {
        let plan = parse_call("filter_nosuchcol_equals_5", Some(&catalog())).unwrap();
        let Plan::Filter(FilterPlan { condition }) = plan else { panic!() };
        assert_eq!(leaf(&condition).column, ColumnRef::unresolved("nosuchcol"));
    }

    #[test]
    fn sort_keys_with_default_direction() {
        let plan = parse_call("sort_by_age_asc_and_salary_desc_and_name", Some(&catalog())).unwrap();
        let Plan::Sort(SortPlan { keys }) = plan else { panic!() };
        let got: Vec<(&str, Direction)> =
            keys.iter().map(|k| (k.column.name.as_str(), k.direction)).collect();
        assert_eq!(
            got,
            vec![("age", Direction::Asc), ("salary", Direction::Desc), ("name", Direction::Asc)]
        );
    }

    #[test]
    fn sortby_alias() {
        assert!(matches!(parse_call("sortby_age_desc", None).unwrap(), Plan::Sort(_)));
    }

    #[test]
    fn groupby_with_aggregations() {
        let plan = parse_call(
            "groupby_city_and_department_and_aggregate_salary_mean_and_age_max",
            Some(&catalog()),
        )
        .unwrap();
        let Plan::GroupAggregate(p) = plan else { panic!() };
        assert_eq!(p.keys, vec![ColumnRef::resolved("city"), ColumnRef::resolved("department")]);
        assert_eq!(
            p.aggregations,
            vec![
                Aggregation { column: ColumnRef::resolved("salary"), func: AggFunc::Mean },
                Aggregation { column: ColumnRef::resolved("age"), func: AggFunc::Max },
            ]
        );
    }

    #[test]
    fn groupby_without_aggregate_counts() {
        let plan = parse_call("groupby_city", Some(&catalog())).unwrap();
        let Plan::GroupAggregate(p) = plan else { panic!() };
        assert!(p.aggregations.is_empty());
    }

    #[test]
    fn aggregate_defaults_and_leading_function() {
        let plan = parse_call("aggregate_salary_and_mean_age", Some(&catalog())).unwrap();
        let Plan::Aggregate(p) = plan else { panic!() };
        assert_eq!(p.aggregations[0].func, AggFunc::Sum);
        assert_eq!(p.aggregations[1], Aggregation { column: ColumnRef::resolved("age"), func: AggFunc::Mean });
    }

    #[test]
    fn select_keeps_order_and_schema_columns_with_keywords() {
        let plan = parse_call("select_first_name_and_age_city", Some(&catalog())).unwrap();
        let Plan::Select(p) = plan else { panic!() };
        let names: Vec<&str> = p.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["first_name", "age", "city"]);
    }

    #[test]
    fn rename_pairs() {
        let plan = parse_call("rename_age_to_years_and_city_as_town_name", Some(&catalog())).unwrap();
        let Plan::Rename(p) = plan else { panic!() };
        assert_eq!(
            p.mappings,
            vec![
                (ColumnRef::resolved("age"), "years".to_string()),
                (ColumnRef::resolved("city"), "town_name".to_string()),
            ]
        );
        let err = parse_call("rename_age", Some(&catalog())).unwrap_err();
        assert!(matches!(err, Error::MalformedSpan { .. }));
    }

    #[test]
    fn drop_columns() {
        let plan = parse_call("drop_age_and_salary", Some(&catalog())).unwrap();
        let Plan::Drop(p) = plan else { panic!() };
        assert_eq!(p.columns.len(), 2);
    }

    #[test]
    fn join_kinds_targets_and_keys() {
        let plan = parse_call("leftjoin_customers_on_id_and_region", None).unwrap();
        assert_eq!(
            plan,
            Plan::Join(JoinPlan {
                kind: JoinKind::Left,
                target: "customers".to_string(),
                on: vec![ColumnRef::unresolved("id"), ColumnRef::unresolved("region")],
            })
        );
        let Plan::Join(p) = parse_call("join_on_id", None).unwrap() else { panic!() };
        assert_eq!((p.kind, p.target.as_str()), (JoinKind::Inner, DEFAULT_TARGET));
        let Plan::Join(p) = parse_call("outerjoin_other", None).unwrap() else { panic!() };
        assert!(p.on.is_empty());
    }

    #[test]
    fn append_targets() {
        for (name, target) in [("appendto_other", "other"), ("append_to_extra", "extra"), ("append", "other")] {
            let Plan::Append(p) = parse_call(name, None).unwrap() else { panic!() };
            assert_eq!(p.target, target);
        }
    }

    #[test]
    fn unrecognized_operations() {
        for name in ["age_filter_gt_3", "hello", "sort_by_age_desc_extra_gt_3"] {
            let err = parse_call(name, Some(&catalog())).unwrap_err();
            assert!(matches!(err, Error::UnrecognizedOperation { .. }), "{}: {:?}", name, err);
        }
    }

    #[test]
    fn dangling_connector_is_malformed() {
        let err = parse_call("filter_age_gt_3_and", Some(&catalog())).unwrap_err();
        assert!(matches!(err, Error::MalformedSpan { .. }));
    }
}
