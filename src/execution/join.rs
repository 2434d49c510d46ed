//! Join execution.
//!
//! A join is a nested loop over row contexts: every accumulated left
//! context is combined with every right-table row in insertion order, and
//! the ON predicate decides which combinations survive. Matched rows come
//! out in that combined order; the padded rows of outer joins are appended
//! after the matched sweep.

use std::collections::HashSet;

use super::expression::evaluate;
use super::row::RowContext;
use crate::parsing::ast::{Expression, JoinKind};
use crate::types::{Row, Table, Value};

/// Joins the accumulated left contexts against a right table.
///
/// A combination is kept only when the predicate evaluates to exactly
/// TRUE. FALSE, NULL, and runtime evaluation errors all exclude the pair,
/// matching SQL predicate behavior on ill-typed rows.
///
/// `left_padding` is a context with every prior source bound to NULL, used
/// to pad unmatched right rows for RIGHT and FULL OUTER joins.
pub fn nested_loop_join(
    left: Vec<RowContext>,
    left_padding: &RowContext,
    right_alias: &str,
    right_table: &Table,
    right_rows: &[Row],
    predicate: &Expression,
    kind: JoinKind,
) -> Vec<RowContext> {
    let mut matched = Vec::new();
    let mut unmatched_left = Vec::new();
    let mut matched_right = HashSet::new();

    for left_context in &left {
        let mut left_matched = false;
        for (right_index, right_row) in right_rows.iter().enumerate() {
            let mut combined = left_context.clone();
            combined.add_source(right_alias, right_table, Some(right_row));
            if evaluate(predicate, &combined) == Ok(Value::Boolean(true)) {
                left_matched = true;
                matched_right.insert(right_index);
                matched.push(combined);
            }
        }
        if !left_matched && matches!(kind, JoinKind::Left | JoinKind::Full) {
            let mut padded = left_context.clone();
            padded.add_source(right_alias, right_table, None);
            unmatched_left.push(padded);
        }
    }

    matched.append(&mut unmatched_left);

    if matches!(kind, JoinKind::Right | JoinKind::Full) {
        for (right_index, right_row) in right_rows.iter().enumerate() {
            if matched_right.contains(&right_index) {
                continue;
            }
            let mut padded = left_padding.clone();
            padded.add_source(right_alias, right_table, Some(right_row));
            matched.push(padded);
        }
    }

    matched
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::Parser;
    use crate::types::{Column, DataType};

    fn table(name: &str, columns: &[&str]) -> Table {
        Table::new(
            name.into(),
            columns
                .iter()
                .map(|name| Column {
                    name: (*name).into(),
                    data_type: DataType::Integer,
                })
                .collect(),
        )
        .unwrap()
    }

    fn join(kind: JoinKind) -> Vec<RowContext> {
        let left_table = table("p", &["id"]);
        let right_table = table("q", &["id", "m"]);
        let left: Vec<RowContext> = [1, 2, 3]
            .iter()
            .map(|id| RowContext::from_row("p", &left_table, &vec![Value::Integer(*id)]))
            .collect();
        let right_rows = vec![
            vec![Value::Integer(1), Value::Integer(100)],
            vec![Value::Integer(3), Value::Integer(300)],
            vec![Value::Integer(4), Value::Integer(400)],
        ];
        let mut padding = RowContext::empty();
        padding.add_source("p", &left_table, None);
        let predicate = Parser::parse_expr("p.id = q.id").unwrap();
        nested_loop_join(
            left,
            &padding,
            "q",
            &right_table,
            &right_rows,
            &predicate,
            kind,
        )
    }

    fn ids(contexts: &[RowContext]) -> Vec<(Value, Value)> {
        contexts
            .iter()
            .map(|c| {
                (
                    c.get(Some("p"), "id").unwrap(),
                    c.get(Some("q"), "m").unwrap(),
                )
            })
            .collect()
    }

    #[test]
    fn test_inner_join() {
        assert_eq!(
            ids(&join(JoinKind::Inner)),
            vec![
                (Value::Integer(1), Value::Integer(100)),
                (Value::Integer(3), Value::Integer(300)),
            ]
        );
    }

    #[test]
    fn test_left_outer_join() {
        // The unmatched left row comes after the matched sweep, padded with
        // NULLs on the right.
        assert_eq!(
            ids(&join(JoinKind::Left)),
            vec![
                (Value::Integer(1), Value::Integer(100)),
                (Value::Integer(3), Value::Integer(300)),
                (Value::Integer(2), Value::Null),
            ]
        );
    }

    #[test]
    fn test_right_outer_join() {
        assert_eq!(
            ids(&join(JoinKind::Right)),
            vec![
                (Value::Integer(1), Value::Integer(100)),
                (Value::Integer(3), Value::Integer(300)),
                (Value::Null, Value::Integer(400)),
            ]
        );
    }

    #[test]
    fn test_full_outer_join() {
        assert_eq!(
            ids(&join(JoinKind::Full)),
            vec![
                (Value::Integer(1), Value::Integer(100)),
                (Value::Integer(3), Value::Integer(300)),
                (Value::Integer(2), Value::Null),
                (Value::Null, Value::Integer(400)),
            ]
        );
    }

    #[test]
    fn test_null_predicate_excludes_pair() {
        let left_table = table("p", &["id"]);
        let right_table = table("q", &["id", "m"]);
        let left = vec![RowContext::from_row(
            "p",
            &left_table,
            &vec![Value::Null],
        )];
        let right_rows = vec![vec![Value::Integer(1), Value::Integer(100)]];
        let mut padding = RowContext::empty();
        padding.add_source("p", &left_table, None);
        let predicate = Parser::parse_expr("p.id = q.id").unwrap();
        // NULL = 1 is NULL, which is not a match; the LEFT join pads.
        let out = nested_loop_join(
            left,
            &padding,
            "q",
            &right_table,
            &right_rows,
            &predicate,
            JoinKind::Left,
        );
        assert_eq!(ids(&out), vec![(Value::Null, Value::Null)]);
    }
}
