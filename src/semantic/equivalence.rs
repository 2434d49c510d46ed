//! Expression equivalence for GROUP BY validation.
//!
//! GROUP BY needs to decide whether a projection refers to the same
//! computation as the grouping expression. Identifier case is ignored, and
//! a bare column `c` counts as the same reference as `t.c` when `t` is the
//! only source in scope with a column `c`.

use std::fmt;

use super::scope::TableContext;
use crate::parsing::ast::{Expression, Operator};

/// A borrowed column reference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnRef<'a> {
    pub qualifier: Option<&'a str>,
    pub name: &'a str,
}

impl fmt::Display for ColumnRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.qualifier {
            Some(qualifier) => write!(f, "{}.{}", qualifier, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Whether two expressions denote the same computation under the scope's
/// qualification rules.
pub fn expr_equiv(a: &Expression, b: &Expression, scope: &TableContext) -> bool {
    match (a, b) {
        (Expression::Literal(a), Expression::Literal(b)) => a == b,
        (Expression::Column(qa, ca), Expression::Column(qb, cb)) => column_equiv(
            ColumnRef {
                qualifier: qa.as_deref(),
                name: ca,
            },
            ColumnRef {
                qualifier: qb.as_deref(),
                name: cb,
            },
            scope,
        ),
        (Expression::Function(na, aa), Expression::Function(nb, ab))
        | (Expression::Aggregate(na, aa), Expression::Aggregate(nb, ab)) => {
            na.eq_ignore_ascii_case(nb)
                && aa.len() == ab.len()
                && aa.iter().zip(ab).all(|(a, b)| expr_equiv(a, b, scope))
        }
        (Expression::Operator(a), Expression::Operator(b)) => operator_equiv(a, b, scope),
        _ => false,
    }
}

/// Whether two column references resolve to the same column.
pub fn column_equiv(a: ColumnRef<'_>, b: ColumnRef<'_>, scope: &TableContext) -> bool {
    if !a.name.eq_ignore_ascii_case(b.name) {
        return false;
    }
    match (a.qualifier, b.qualifier) {
        (Some(qa), Some(qb)) => qa.eq_ignore_ascii_case(qb),
        (None, None) => true,
        (Some(qualifier), None) | (None, Some(qualifier)) => scope
            .sole_source_of(a.name)
            .is_some_and(|alias| alias.eq_ignore_ascii_case(qualifier)),
    }
}

fn operator_equiv(a: &Operator, b: &Operator, scope: &TableContext) -> bool {
    use Operator::*;
    match (a, b) {
        (And(al, ar), And(bl, br))
        | (Or(al, ar), Or(bl, br))
        | (Equal(al, ar), Equal(bl, br))
        | (NotEqual(al, ar), NotEqual(bl, br))
        | (LessThan(al, ar), LessThan(bl, br))
        | (LessThanOrEqual(al, ar), LessThanOrEqual(bl, br))
        | (GreaterThan(al, ar), GreaterThan(bl, br))
        | (GreaterThanOrEqual(al, ar), GreaterThanOrEqual(bl, br))
        | (Add(al, ar), Add(bl, br))
        | (Subtract(al, ar), Subtract(bl, br))
        | (Multiply(al, ar), Multiply(bl, br))
        | (Divide(al, ar), Divide(bl, br)) => {
            expr_equiv(al, bl, scope) && expr_equiv(ar, br, scope)
        }
        (Not(a), Not(b))
        | (Negate(a), Negate(b))
        | (IsNull(a), IsNull(b))
        | (IsNotNull(a), IsNotNull(b)) => expr_equiv(a, b, scope),
        _ => false,
    }
}

/// Collects every column referenced anywhere in the expression, including
/// inside aggregate arguments.
pub fn columns_in(expr: &Expression) -> Vec<ColumnRef<'_>> {
    let mut columns = Vec::new();
    collect(expr, true, &mut columns);
    columns
}

/// Collects the columns referenced outside aggregate arguments. These are
/// the references that need per-row identity under grouping.
pub fn scalar_columns(expr: &Expression) -> Vec<ColumnRef<'_>> {
    let mut columns = Vec::new();
    collect(expr, false, &mut columns);
    columns
}

fn collect<'a>(expr: &'a Expression, into_aggregates: bool, columns: &mut Vec<ColumnRef<'a>>) {
    use Operator::*;
    match expr {
        Expression::Column(qualifier, name) => columns.push(ColumnRef {
            qualifier: qualifier.as_deref(),
            name,
        }),
        Expression::Function(_, args) => {
            for arg in args {
                collect(arg, into_aggregates, columns);
            }
        }
        Expression::Aggregate(_, args) if into_aggregates => {
            for arg in args {
                collect(arg, into_aggregates, columns);
            }
        }
        Expression::Aggregate(_, _) => {}
        Expression::Operator(op) => match op {
            And(lhs, rhs)
            | Or(lhs, rhs)
            | Equal(lhs, rhs)
            | NotEqual(lhs, rhs)
            | LessThan(lhs, rhs)
            | LessThanOrEqual(lhs, rhs)
            | GreaterThan(lhs, rhs)
            | GreaterThanOrEqual(lhs, rhs)
            | Add(lhs, rhs)
            | Subtract(lhs, rhs)
            | Multiply(lhs, rhs)
            | Divide(lhs, rhs) => {
                collect(lhs, into_aggregates, columns);
                collect(rhs, into_aggregates, columns);
            }
            Not(expr) | Negate(expr) | IsNull(expr) | IsNotNull(expr) => {
                collect(expr, into_aggregates, columns)
            }
        },
        Expression::All | Expression::Literal(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::Parser;
    use crate::types::{Column, DataType, Table};

    fn scope() -> TableContext {
        let mut scope = TableContext::new();
        scope
            .add_table(
                Table::new(
                    "s".into(),
                    vec![
                        Column {
                            name: "k".into(),
                            data_type: DataType::Integer,
                        },
                        Column {
                            name: "v".into(),
                            data_type: DataType::Integer,
                        },
                    ],
                )
                .unwrap(),
                None,
            )
            .unwrap();
        scope
    }

    fn equiv(a: &str, b: &str) -> bool {
        expr_equiv(
            &Parser::parse_expr(a).unwrap(),
            &Parser::parse_expr(b).unwrap(),
            &scope(),
        )
    }

    #[test]
    fn test_case_insensitive_columns() {
        assert!(equiv("k", "K"));
        assert!(!equiv("k", "v"));
    }

    #[test]
    fn test_qualified_and_bare_are_equivalent() {
        // `s` is the only source with a column `k`.
        assert!(equiv("k", "s.k"));
        assert!(equiv("S.k", "k"));
        assert!(!equiv("other.k", "k"));
    }

    #[test]
    fn test_structural_equivalence() {
        assert!(equiv("k + 1", "K + 1"));
        assert!(!equiv("k + 1", "k + 2"));
        assert!(equiv("ABS(k)", "abs(s.k)"));
        assert!(!equiv("ABS(k)", "MOD(k, 2)"));
        assert!(equiv("SUM(v)", "SUM(s.v)"));
    }

    #[test]
    fn test_column_collection() {
        let expr = Parser::parse_expr("k + SUM(v)").unwrap();
        let all: Vec<String> = columns_in(&expr).iter().map(|c| c.to_string()).collect();
        assert_eq!(all, vec!["k", "v"]);
        // `v` only occurs inside the aggregate.
        let scalar: Vec<String> = scalar_columns(&expr).iter().map(|c| c.to_string()).collect();
        assert_eq!(scalar, vec!["k"]);
    }
}
