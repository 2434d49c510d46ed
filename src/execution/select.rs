//! SELECT processing: source materialization, filter, group, project,
//! sort, offset and limit.

use super::aggregate::evaluate_grouped;
use super::expression::evaluate;
use super::join::nested_loop_join;
use super::row::RowContext;
use crate::error::{Error, Result};
use crate::parsing::ast::{Direction, Expression, FromClause, SelectStatement};
use crate::semantic::{self, TableContext};
use crate::storage::Store;
use crate::types::{Row, Value};

/// The evaluated output of a SELECT.
pub struct QueryOutput {
    pub rows: Vec<Row>,
    pub column_names: Option<Vec<String>>,
}

/// Runs a validated SELECT against the store. Execution order: build row
/// contexts from FROM and joins, filter, group, project, sort, then apply
/// OFFSET and LIMIT.
pub fn process(select: &SelectStatement, scope: &TableContext, store: &Store) -> Result<QueryOutput> {
    let column_names = column_names(&select.projections);

    let Some(from) = &select.from else {
        // A constant SELECT produces a single row from an empty
        // environment.
        let context = RowContext::empty();
        let row = select
            .projections
            .iter()
            .map(|(expr, _)| evaluate(expr, &context))
            .collect::<Result<Row>>()?;
        return Ok(QueryOutput {
            rows: vec![row],
            column_names,
        });
    };

    let contexts = build_contexts(from, scope, store)?;
    let contexts = filter(contexts, select.r#where.as_ref())?;
    let grouping = group(contexts, select)?;
    let mut results = project(grouping, select)?;
    if let Some((_, direction)) = &select.order_by {
        sort(&mut results, *direction);
    }
    let rows = apply_bounds(results, select)?;
    Ok(QueryOutput { rows, column_names })
}

/// Expands `*` projections against the scope, qualifying each column with
/// its source alias so joined duplicates stay unambiguous.
pub fn expand_projections(
    projections: Vec<(Expression, Option<String>)>,
    scope: &TableContext,
) -> Result<Vec<(Expression, Option<String>)>> {
    if !projections.iter().any(|(expr, _)| *expr == Expression::All) {
        return Ok(projections);
    }
    if scope.sources().is_empty() {
        return Err(Error::Validation("SELECT * requires a FROM clause".into()));
    }
    let mut expanded = Vec::new();
    for (expr, alias) in projections {
        if expr == Expression::All {
            for (source_alias, table) in scope.sources() {
                for column in &table.columns {
                    expanded.push((
                        Expression::Column(Some(source_alias.clone()), column.name.clone()),
                        None,
                    ));
                }
            }
        } else {
            expanded.push((expr, alias));
        }
    }
    Ok(expanded)
}

/// Materializes the row contexts for the FROM clause: the base table's
/// rows, then one join pass per JOIN in source order.
fn build_contexts(
    from: &FromClause,
    scope: &TableContext,
    store: &Store,
) -> Result<Vec<RowContext>> {
    let base_alias = from.alias.as_deref().unwrap_or(&from.table);
    let base_table = scope
        .get_table(base_alias)
        .ok_or_else(|| Error::Validation(format!("unknown table {base_alias}")))?;
    let mut contexts: Vec<RowContext> = store
        .rows(&from.table)?
        .iter()
        .map(|row| RowContext::from_row(base_alias, base_table, row))
        .collect();

    // The all-NULL template for padding unmatched right rows grows with
    // each join pass.
    let mut padding = RowContext::empty();
    padding.add_source(base_alias, base_table, None);

    for join in &from.joins {
        let right_alias = join.alias.as_deref().unwrap_or(&join.table);
        let right_table = scope
            .get_table(right_alias)
            .ok_or_else(|| Error::Validation(format!("unknown table {right_alias}")))?;
        let right_rows = store.rows(&join.table)?;
        contexts = nested_loop_join(
            contexts,
            &padding,
            right_alias,
            right_table,
            right_rows,
            &join.on,
            join.kind,
        );
        padding.add_source(right_alias, right_table, None);
    }

    Ok(contexts)
}

/// Keeps the rows where the predicate evaluates to exactly TRUE. FALSE and
/// NULL both exclude the row.
fn filter(contexts: Vec<RowContext>, predicate: Option<&Expression>) -> Result<Vec<RowContext>> {
    let Some(predicate) = predicate else {
        return Ok(contexts);
    };
    let mut kept = Vec::new();
    for context in contexts {
        if evaluate(predicate, &context)? == Value::Boolean(true) {
            kept.push(context);
        }
    }
    Ok(kept)
}

/// The unit of projection: individual rows, or groups of them.
enum Grouping {
    Rows(Vec<RowContext>),
    Groups(Vec<Vec<RowContext>>),
}

/// Groups the filtered rows. An explicit GROUP BY keys rows by the
/// grouping expression in first-seen order, with NULL keys forming a
/// single group. Aggregates without GROUP BY make the whole input one
/// group, even when it is empty.
fn group(contexts: Vec<RowContext>, select: &SelectStatement) -> Result<Grouping> {
    if let Some(group_by) = &select.group_by {
        let mut keys: Vec<Value> = Vec::new();
        let mut groups: Vec<Vec<RowContext>> = Vec::new();
        for context in contexts {
            let key = evaluate(group_by, &context)?;
            match keys.iter().position(|k| *k == key) {
                Some(index) => groups[index].push(context),
                None => {
                    keys.push(key);
                    groups.push(vec![context]);
                }
            }
        }
        return Ok(Grouping::Groups(groups));
    }
    let aggregated = select
        .projections
        .iter()
        .any(|(expr, _)| expr.contains_aggregate());
    if aggregated {
        return Ok(Grouping::Groups(vec![contexts]));
    }
    Ok(Grouping::Rows(contexts))
}

/// Evaluates the projections (and the ORDER BY key, while the row
/// environments are still at hand) per row or per group.
fn project(grouping: Grouping, select: &SelectStatement) -> Result<Vec<(Row, Option<Value>)>> {
    let order_by = match &select.order_by {
        Some((expr, _)) => Some(semantic::resolve_order_by(expr, &select.projections)?),
        None => None,
    };
    let mut results = Vec::new();
    match grouping {
        Grouping::Rows(contexts) => {
            for context in contexts {
                let row = select
                    .projections
                    .iter()
                    .map(|(expr, _)| evaluate(expr, &context))
                    .collect::<Result<Row>>()?;
                let key = order_by
                    .as_ref()
                    .map(|expr| evaluate(expr, &context))
                    .transpose()?;
                results.push((row, key));
            }
        }
        Grouping::Groups(groups) => {
            for rows in groups {
                let row = select
                    .projections
                    .iter()
                    .map(|(expr, _)| evaluate_grouped(expr, &rows))
                    .collect::<Result<Row>>()?;
                let key = order_by
                    .as_ref()
                    .map(|expr| evaluate_grouped(expr, &rows))
                    .transpose()?;
                results.push((row, key));
            }
        }
    }
    Ok(results)
}

/// Stable sort by the precomputed ORDER BY key. NULL sorts last under ASC;
/// DESC reverses the comparison.
fn sort(results: &mut [(Row, Option<Value>)], direction: Direction) {
    results.sort_by(|(_, a), (_, b)| {
        let ordering = match (a, b) {
            (Some(a), Some(b)) => a.sort_cmp(b),
            _ => std::cmp::Ordering::Equal,
        };
        match direction {
            Direction::Ascending => ordering,
            Direction::Descending => ordering.reverse(),
        }
    });
}

/// Applies OFFSET then LIMIT. Both are evaluated once against an empty
/// environment; NULL means no offset and no limit respectively, and
/// negative values clamp to zero.
fn apply_bounds(results: Vec<(Row, Option<Value>)>, select: &SelectStatement) -> Result<Vec<Row>> {
    let offset = match bound_value(select.offset.as_ref())? {
        Some(offset) => offset.max(0) as usize,
        None => 0,
    };
    let limit = match bound_value(select.limit.as_ref())? {
        Some(limit) => limit.max(0) as usize,
        None => usize::MAX,
    };
    Ok(results
        .into_iter()
        .map(|(row, _)| row)
        .skip(offset)
        .take(limit)
        .collect())
}

fn bound_value(expr: Option<&Expression>) -> Result<Option<i64>> {
    let Some(expr) = expr else { return Ok(None) };
    match evaluate(expr, &RowContext::empty())? {
        Value::Null => Ok(None),
        Value::Integer(i) => Ok(Some(i)),
        value => Err(Error::Validation(format!(
            "LIMIT/OFFSET must be an integer, got {}",
            value.data_type()
        ))),
    }
}

/// Output column names: the alias when given; otherwise the column a
/// projection refers to, either directly or as the sole argument of a
/// function call. None when no projection is named at all.
fn column_names(projections: &[(Expression, Option<String>)]) -> Option<Vec<String>> {
    let names: Vec<Option<String>> = projections
        .iter()
        .map(|(expr, alias)| {
            if let Some(alias) = alias {
                return Some(alias.clone());
            }
            projection_name(expr)
        })
        .collect();
    if names.iter().all(|name| name.is_none()) {
        return None;
    }
    Some(names.into_iter().map(Option::unwrap_or_default).collect())
}

fn projection_name(expr: &Expression) -> Option<String> {
    match expr {
        Expression::Column(_, name) => Some(name.clone()),
        Expression::Function(_, args) | Expression::Aggregate(_, args) => match args.as_slice() {
            [Expression::Column(_, name)] => Some(name.clone()),
            _ => None,
        },
        _ => None,
    }
}
