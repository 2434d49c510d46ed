//! Statement validation.
//!
//! Checks a parsed SELECT against its scope before anything executes:
//! projection resolution, clause typing, aggregate placement, GROUP BY
//! coverage, ORDER BY alias handling, and LIMIT/OFFSET restrictions.

use super::equivalence::{self, expr_equiv};
use super::scope::TableContext;
use super::typing::type_of;
use crate::error::{Error, Result};
use crate::parsing::ast::{Expression, SelectStatement};
use crate::types::DataType;

/// Validates a SELECT statement against its scope. Projections must
/// already have `*` expanded.
pub fn validate_select(select: &SelectStatement, scope: &TableContext) -> Result<()> {
    let aggregated = select
        .projections
        .iter()
        .any(|(expr, _)| expr.contains_aggregate());

    if select.from.is_none() && aggregated {
        return Err(Error::Validation(
            "aggregate functions require a FROM clause".into(),
        ));
    }

    // Projections resolve and type-check.
    for (expr, _) in &select.projections {
        type_of(expr, scope)?;
    }

    // WHERE is a boolean condition over individual rows.
    if let Some(r#where) = &select.r#where {
        if r#where.contains_aggregate() {
            return Err(Error::Validation(
                "aggregate functions are not allowed in WHERE".into(),
            ));
        }
        expect_boolean(r#where, scope, "WHERE")?;
    }

    // JOIN ON conditions likewise.
    if let Some(from) = &select.from {
        for join in &from.joins {
            if join.on.contains_aggregate() {
                return Err(Error::Validation(
                    "aggregate functions are not allowed in JOIN conditions".into(),
                ));
            }
            expect_boolean(&join.on, scope, "JOIN ON")?;
        }
    }

    // Grouping rules.
    if let Some(group_by) = &select.group_by {
        if group_by.contains_aggregate() {
            return Err(Error::Validation(
                "aggregate functions are not allowed in GROUP BY".into(),
            ));
        }
        type_of(group_by, scope)?;
        for (expr, _) in &select.projections {
            check_grouped(expr, group_by, scope)?;
        }
    } else if aggregated {
        // Implicit grouping: the whole input is one group, so there is no
        // per-row identity for plain column references.
        for (expr, _) in &select.projections {
            check_implicit_grouped(expr)?;
        }
    }

    // ORDER BY is validated like a projection, with projection aliases
    // visible as bare references.
    if let Some((order_by, _)) = &select.order_by {
        let resolved = resolve_order_by(order_by, &select.projections)?;
        type_of(&resolved, scope)?;
        if let Some(group_by) = &select.group_by {
            check_grouped(&resolved, group_by, scope)?;
        } else if aggregated {
            check_implicit_grouped(&resolved)?;
        } else if resolved.contains_aggregate() {
            return Err(Error::Validation(
                "aggregate in ORDER BY requires grouping".into(),
            ));
        }
    }

    // LIMIT and OFFSET are row-independent integers.
    for (clause, expr) in [("LIMIT", &select.limit), ("OFFSET", &select.offset)] {
        if let Some(expr) = expr {
            validate_bound(expr, clause, scope)?;
        }
    }

    Ok(())
}

/// Resolves a bare projection-alias reference in ORDER BY to the aliased
/// expression. An alias is only visible as the entire ORDER BY expression;
/// one buried inside a larger expression is an error.
pub fn resolve_order_by(
    expr: &Expression,
    projections: &[(Expression, Option<String>)],
) -> Result<Expression> {
    let alias_of = |name: &str| {
        projections
            .iter()
            .find(|(_, alias)| alias.as_deref().is_some_and(|a| a.eq_ignore_ascii_case(name)))
            .map(|(expr, _)| expr.clone())
    };

    // The alias lookup is consulted before general resolution.
    if let Expression::Column(None, name) = expr
        && let Some(aliased) = alias_of(name)
    {
        return Ok(aliased);
    }

    let mut nested = None;
    expr.walk(&mut |e| {
        if let Expression::Column(None, name) = e
            && alias_of(name).is_some()
        {
            nested = Some(name.clone());
            return false;
        }
        true
    });
    if let Some(name) = nested {
        return Err(Error::Validation(format!(
            "alias {name} cannot be used inside an ORDER BY expression"
        )));
    }

    Ok(expr.clone())
}

fn expect_boolean(expr: &Expression, scope: &TableContext, clause: &str) -> Result<()> {
    let data_type = type_of(expr, scope)?;
    if !data_type.compatible_with(DataType::Boolean) {
        return Err(Error::Validation(format!(
            "{clause} must be a boolean condition, got {data_type}"
        )));
    }
    Ok(())
}

/// Checks that an expression is computable per group: it is equivalent to
/// the GROUP BY expression, or every column it references outside
/// aggregate arguments appears inside the GROUP BY expression.
fn check_grouped(expr: &Expression, group_by: &Expression, scope: &TableContext) -> Result<()> {
    if expr_equiv(expr, group_by, scope) {
        return Ok(());
    }
    let group_columns = equivalence::columns_in(group_by);
    for column in equivalence::scalar_columns(expr) {
        if !group_columns
            .iter()
            .any(|grouped| equivalence::column_equiv(*grouped, column, scope))
        {
            return Err(Error::Validation(format!(
                "column {column} must appear in GROUP BY"
            )));
        }
    }
    Ok(())
}

/// Under implicit grouping, a projection must be an aggregate or a
/// constant.
fn check_implicit_grouped(expr: &Expression) -> Result<()> {
    if !expr.contains_aggregate() && !expr.is_constant() {
        return Err(Error::Validation(
            "non-aggregate projections must be constant when aggregating without GROUP BY".into(),
        ));
    }
    Ok(())
}

fn validate_bound(expr: &Expression, clause: &str, scope: &TableContext) -> Result<()> {
    if expr.contains_aggregate() {
        return Err(Error::Validation(format!(
            "aggregate functions are not allowed in {clause}"
        )));
    }
    if !expr.is_constant() {
        return Err(Error::Validation(format!(
            "{clause} cannot reference columns"
        )));
    }
    let data_type = type_of(expr, scope)?;
    if !data_type.compatible_with(DataType::Integer) {
        return Err(Error::Validation(format!(
            "{clause} must be an integer, got {data_type}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::{Parser, Statement};
    use crate::types::{Column, Table};

    fn scope() -> TableContext {
        let mut scope = TableContext::new();
        scope
            .add_table(
                Table::new(
                    "sales".into(),
                    vec![
                        Column {
                            name: "category".into(),
                            data_type: DataType::Integer,
                        },
                        Column {
                            name: "product".into(),
                            data_type: DataType::Integer,
                        },
                        Column {
                            name: "amount".into(),
                            data_type: DataType::Integer,
                        },
                        Column {
                            name: "active".into(),
                            data_type: DataType::Boolean,
                        },
                    ],
                )
                .unwrap(),
                None,
            )
            .unwrap();
        scope
    }

    fn validate(sql: &str) -> Result<()> {
        let Statement::Select(select) = Parser::parse(sql).unwrap() else {
            panic!("expected SELECT");
        };
        validate_select(&select, &scope())
    }

    #[test]
    fn test_group_by_with_aggregate_valid() {
        assert!(validate("SELECT category, SUM(amount) FROM sales GROUP BY category").is_ok());
    }

    #[test]
    fn test_group_by_missing_column() {
        let err = validate("SELECT product, SUM(amount) FROM sales GROUP BY category").unwrap_err();
        assert!(err.to_string().contains("must appear in GROUP BY"));
    }

    #[test]
    fn test_group_by_expression_in_select() {
        // amount * 2 uses a column not in GROUP BY.
        assert!(
            validate("SELECT category, amount * 2, COUNT(*) FROM sales GROUP BY category").is_err()
        );
        // category + 1 only uses grouped columns.
        assert!(validate("SELECT category + 1, COUNT(*) FROM sales GROUP BY category").is_ok());
    }

    #[test]
    fn test_function_valued_group_by() {
        // Equal to the full grouping function, or a column inside it.
        assert!(validate("SELECT ABS(category) FROM sales GROUP BY ABS(category)").is_ok());
        assert!(validate("SELECT category FROM sales GROUP BY ABS(category)").is_ok());
        assert!(validate("SELECT product FROM sales GROUP BY ABS(category)").is_err());
    }

    #[test]
    fn test_qualified_group_by_equivalence() {
        assert!(validate("SELECT sales.category FROM sales GROUP BY category").is_ok());
        assert!(validate("SELECT category FROM sales GROUP BY sales.category").is_ok());
    }

    #[test]
    fn test_aggregate_without_group_by() {
        assert!(validate("SELECT SUM(amount) FROM sales").is_ok());
        // Literals are allowed next to the aggregate, columns are not.
        assert!(validate("SELECT 1, SUM(amount) FROM sales").is_ok());
        assert!(validate("SELECT product, SUM(amount) FROM sales").is_err());
    }

    #[test]
    fn test_aggregates_forbidden_in_where() {
        let err = validate("SELECT 1 FROM sales WHERE SUM(amount) > 10").unwrap_err();
        assert!(err.to_string().contains("WHERE"));
    }

    #[test]
    fn test_where_must_be_boolean() {
        assert!(validate("SELECT 1 FROM sales WHERE amount").is_err());
        assert!(validate("SELECT 1 FROM sales WHERE amount + 1").is_err());
        assert!(validate("SELECT 1 FROM sales WHERE active").is_ok());
        // NULL-typed conditions are fine; they just never match.
        assert!(validate("SELECT 1 FROM sales WHERE NULL").is_ok());
    }

    #[test]
    fn test_order_by_alias() {
        assert!(validate("SELECT amount AS x FROM sales ORDER BY x").is_ok());
        // An alias inside a larger expression is not visible.
        let err = validate("SELECT amount AS x FROM sales ORDER BY x + 1").unwrap_err();
        assert!(err.to_string().contains("alias"));
    }

    #[test]
    fn test_order_by_aggregate_requires_grouping() {
        assert!(validate("SELECT amount FROM sales ORDER BY SUM(amount)").is_err());
        assert!(
            validate("SELECT category, SUM(amount) FROM sales GROUP BY category ORDER BY SUM(amount)")
                .is_ok()
        );
    }

    #[test]
    fn test_limit_and_offset_restrictions() {
        assert!(validate("SELECT amount FROM sales LIMIT 10 OFFSET 2").is_ok());
        assert!(validate("SELECT amount FROM sales LIMIT 5 + 5").is_ok());
        assert!(validate("SELECT amount FROM sales LIMIT NULL").is_ok());
        assert!(validate("SELECT amount FROM sales LIMIT amount").is_err());
        assert!(validate("SELECT amount FROM sales LIMIT COUNT(amount)").is_err());
        assert!(validate("SELECT amount FROM sales LIMIT TRUE").is_err());
    }

    #[test]
    fn test_aggregate_without_from_is_rejected() {
        assert!(validate("SELECT COUNT(1)").is_err());
    }

    #[test]
    fn test_unknown_function_is_rejected() {
        assert!(validate("SELECT shazam(amount) FROM sales").is_err());
    }
}
