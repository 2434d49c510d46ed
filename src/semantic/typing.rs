//! Pure type inference for expressions.
//!
//! Derives a static type for an expression from table schemas alone,
//! without evaluating anything against real or synthetic rows. `Unknown`
//! flows through operators the way NULL flows through evaluation: an
//! expression typed `Unknown` is already known to produce NULL.

use super::scope::TableContext;
use crate::error::{Error, Result};
use crate::functions;
use crate::parsing::ast::{Expression, Literal, Operator};
use crate::types::DataType;

/// Infers the type of an expression against the given scope. Fails on
/// unknown or ambiguous columns, unknown functions, wrong argument counts,
/// operand type mismatches, and nested aggregates.
pub fn type_of(expr: &Expression, scope: &TableContext) -> Result<DataType> {
    check(expr, scope, false)
}

fn check(expr: &Expression, scope: &TableContext, in_aggregate: bool) -> Result<DataType> {
    match expr {
        Expression::All => Err(Error::Validation(
            "* is only allowed as a projection".into(),
        )),
        Expression::Literal(Literal::Null) => Ok(DataType::Unknown),
        Expression::Literal(Literal::Boolean(_)) => Ok(DataType::Boolean),
        Expression::Literal(Literal::Integer(_)) => Ok(DataType::Integer),
        Expression::Column(table, name) => scope.resolve_column(table.as_deref(), name),
        Expression::Function(name, args) => {
            let Some(function) = functions::get_function(name) else {
                return Err(Error::Validation(format!("unknown function {name}")));
            };
            let arg_types = args
                .iter()
                .map(|arg| check(arg, scope, in_aggregate))
                .collect::<Result<Vec<_>>>()?;
            function.validate(&arg_types)
        }
        Expression::Aggregate(name, args) => {
            if in_aggregate {
                return Err(Error::Validation(format!(
                    "aggregate function {name} cannot be nested"
                )));
            }
            let Some(function) = functions::get_function(name) else {
                return Err(Error::Validation(format!("unknown function {name}")));
            };
            let arg_types = args
                .iter()
                .map(|arg| check(arg, scope, true))
                .collect::<Result<Vec<_>>>()?;
            function.validate(&arg_types)
        }
        Expression::Operator(op) => check_operator(op, scope, in_aggregate),
    }
}

fn check_operator(op: &Operator, scope: &TableContext, in_aggregate: bool) -> Result<DataType> {
    use Operator::*;

    match op {
        And(lhs, rhs) | Or(lhs, rhs) => {
            let lhs = check(lhs, scope, in_aggregate)?;
            let rhs = check(rhs, scope, in_aggregate)?;
            for side in [lhs, rhs] {
                if !side.compatible_with(DataType::Boolean) {
                    return Err(Error::Validation(format!(
                        "boolean operator applied to {side}"
                    )));
                }
            }
            Ok(strict(DataType::Boolean, &[lhs, rhs]))
        }
        Not(expr) => {
            let operand = check(expr, scope, in_aggregate)?;
            if !operand.compatible_with(DataType::Boolean) {
                return Err(Error::Validation(format!("NOT applied to {operand}")));
            }
            Ok(strict(DataType::Boolean, &[operand]))
        }

        Equal(lhs, rhs)
        | NotEqual(lhs, rhs)
        | LessThan(lhs, rhs)
        | LessThanOrEqual(lhs, rhs)
        | GreaterThan(lhs, rhs)
        | GreaterThanOrEqual(lhs, rhs) => {
            let lhs = check(lhs, scope, in_aggregate)?;
            let rhs = check(rhs, scope, in_aggregate)?;
            if !lhs.compatible_with(rhs) {
                return Err(Error::Validation(format!("cannot compare {lhs} and {rhs}")));
            }
            Ok(strict(DataType::Boolean, &[lhs, rhs]))
        }

        // IS [NOT] NULL works on any operand and never yields NULL itself.
        IsNull(expr) | IsNotNull(expr) => {
            check(expr, scope, in_aggregate)?;
            Ok(DataType::Boolean)
        }

        Add(lhs, rhs) | Subtract(lhs, rhs) | Multiply(lhs, rhs) | Divide(lhs, rhs) => {
            let lhs = check(lhs, scope, in_aggregate)?;
            let rhs = check(rhs, scope, in_aggregate)?;
            for side in [lhs, rhs] {
                if !side.compatible_with(DataType::Integer) {
                    return Err(Error::Validation(format!(
                        "arithmetic operator applied to {side}"
                    )));
                }
            }
            Ok(strict(DataType::Integer, &[lhs, rhs]))
        }
        Negate(expr) => {
            let operand = check(expr, scope, in_aggregate)?;
            if !operand.compatible_with(DataType::Integer) {
                return Err(Error::Validation(format!("cannot negate {operand}")));
            }
            Ok(strict(DataType::Integer, &[operand]))
        }
    }
}

/// The result type of a strict operator: Unknown (i.e. NULL) as soon as
/// any operand is Unknown.
fn strict(result: DataType, operands: &[DataType]) -> DataType {
    if operands.contains(&DataType::Unknown) {
        DataType::Unknown
    } else {
        result
    }
}
