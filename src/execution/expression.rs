//! Scalar expression evaluation.
//!
//! NULL propagates through arithmetic and comparisons; AND and OR follow
//! Kleene three-valued logic; IS [NOT] NULL always yields a boolean.

use std::cmp::Ordering;

use super::row::RowContext;
use crate::error::{Error, Result};
use crate::functions;
use crate::parsing::ast::{Expression, Operator};
use crate::types::Value;

/// Evaluates an expression against a row environment.
pub fn evaluate(expr: &Expression, context: &RowContext) -> Result<Value> {
    match expr {
        Expression::All => Err(Error::Validation(
            "* is only allowed as a projection".into(),
        )),
        Expression::Literal(literal) => Ok(literal.clone().into()),
        Expression::Column(qualifier, name) => context.get(qualifier.as_deref(), name),
        Expression::Function(name, args) => {
            let Some(function) = functions::get_function(name) else {
                return Err(Error::Validation(format!("unknown function {name}")));
            };
            let args = args
                .iter()
                .map(|arg| evaluate(arg, context))
                .collect::<Result<Vec<_>>>()?;
            function.execute(&args)
        }
        // Aggregates collapse per group, not per row; see the aggregate
        // module. Reaching one here means it sits outside any group.
        Expression::Aggregate(name, _) => Err(Error::Validation(format!(
            "aggregate function {name} is not allowed here"
        ))),
        Expression::Operator(op) => evaluate_operator(op, context),
    }
}

fn evaluate_operator(op: &Operator, context: &RowContext) -> Result<Value> {
    use Operator::*;

    match op {
        And(lhs, rhs) => {
            let lhs = as_boolean("AND", evaluate(lhs, context)?)?;
            let rhs = as_boolean("AND", evaluate(rhs, context)?)?;
            Ok(match (lhs, rhs) {
                (Some(false), _) | (_, Some(false)) => Value::Boolean(false),
                (Some(true), Some(true)) => Value::Boolean(true),
                _ => Value::Null,
            })
        }
        Or(lhs, rhs) => {
            let lhs = as_boolean("OR", evaluate(lhs, context)?)?;
            let rhs = as_boolean("OR", evaluate(rhs, context)?)?;
            Ok(match (lhs, rhs) {
                (Some(true), _) | (_, Some(true)) => Value::Boolean(true),
                (Some(false), Some(false)) => Value::Boolean(false),
                _ => Value::Null,
            })
        }
        Not(expr) => Ok(match as_boolean("NOT", evaluate(expr, context)?)? {
            Some(b) => Value::Boolean(!b),
            None => Value::Null,
        }),

        Equal(lhs, rhs) => compare_values("=", lhs, rhs, context, |o| o == Ordering::Equal),
        NotEqual(lhs, rhs) => compare_values("<>", lhs, rhs, context, |o| o != Ordering::Equal),
        LessThan(lhs, rhs) => compare_values("<", lhs, rhs, context, |o| o == Ordering::Less),
        LessThanOrEqual(lhs, rhs) => {
            compare_values("<=", lhs, rhs, context, |o| o != Ordering::Greater)
        }
        GreaterThan(lhs, rhs) => compare_values(">", lhs, rhs, context, |o| o == Ordering::Greater),
        GreaterThanOrEqual(lhs, rhs) => {
            compare_values(">=", lhs, rhs, context, |o| o != Ordering::Less)
        }

        IsNull(expr) => Ok(Value::Boolean(evaluate(expr, context)?.is_null())),
        IsNotNull(expr) => Ok(Value::Boolean(!evaluate(expr, context)?.is_null())),

        Add(lhs, rhs) => arithmetic("+", lhs, rhs, context, |a, b| a.checked_add(b)),
        Subtract(lhs, rhs) => arithmetic("-", lhs, rhs, context, |a, b| a.checked_sub(b)),
        Multiply(lhs, rhs) => arithmetic("*", lhs, rhs, context, |a, b| a.checked_mul(b)),
        Divide(lhs, rhs) => {
            let lhs = as_integer("/", evaluate(lhs, context)?)?;
            let rhs = as_integer("/", evaluate(rhs, context)?)?;
            match (lhs, rhs) {
                // NULL on either side propagates, even NULL / 0.
                (None, _) | (_, None) => Ok(Value::Null),
                (Some(_), Some(0)) => Err(Error::DivisionByZero),
                (Some(a), Some(b)) => a
                    .checked_div(b)
                    .map(Value::Integer)
                    .ok_or_else(|| Error::Validation("integer overflow".into())),
            }
        }
        Negate(expr) => match as_integer("-", evaluate(expr, context)?)? {
            Some(n) => n
                .checked_neg()
                .map(Value::Integer)
                .ok_or_else(|| Error::Validation("integer overflow".into())),
            None => Ok(Value::Null),
        },
    }
}

/// Evaluates a comparison. NULL on either side yields NULL; concrete
/// operands must share a type. FALSE orders before TRUE.
fn compare_values(
    op: &str,
    lhs: &Expression,
    rhs: &Expression,
    context: &RowContext,
    test: impl Fn(Ordering) -> bool,
) -> Result<Value> {
    let lhs = evaluate(lhs, context)?;
    let rhs = evaluate(rhs, context)?;
    let ordering = match (&lhs, &rhs) {
        (Value::Null, _) | (_, Value::Null) => return Ok(Value::Null),
        (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
        (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
        _ => return Err(type_mismatch(op, &lhs, &rhs)),
    };
    Ok(Value::Boolean(test(ordering)))
}

fn arithmetic(
    op: &str,
    lhs: &Expression,
    rhs: &Expression,
    context: &RowContext,
    apply: impl Fn(i64, i64) -> Option<i64>,
) -> Result<Value> {
    let lhs = as_integer(op, evaluate(lhs, context)?)?;
    let rhs = as_integer(op, evaluate(rhs, context)?)?;
    match (lhs, rhs) {
        (Some(a), Some(b)) => apply(a, b)
            .map(Value::Integer)
            .ok_or_else(|| Error::Validation("integer overflow".into())),
        _ => Ok(Value::Null),
    }
}

/// Unwraps a boolean operand, with NULL as None. Any other type fails.
fn as_boolean(op: &str, value: Value) -> Result<Option<bool>> {
    match value {
        Value::Boolean(b) => Ok(Some(b)),
        Value::Null => Ok(None),
        value => Err(Error::Validation(format!(
            "{op} expects BOOLEAN, got {}",
            value.data_type()
        ))),
    }
}

/// Unwraps an integer operand, with NULL as None. Any other type fails.
fn as_integer(op: &str, value: Value) -> Result<Option<i64>> {
    match value {
        Value::Integer(i) => Ok(Some(i)),
        Value::Null => Ok(None),
        value => Err(Error::Validation(format!(
            "{op} expects INTEGER, got {}",
            value.data_type()
        ))),
    }
}

fn type_mismatch(op: &str, lhs: &Value, rhs: &Value) -> Error {
    Error::Validation(format!(
        "cannot apply {op} to {} and {}",
        lhs.data_type(),
        rhs.data_type()
    ))
}
