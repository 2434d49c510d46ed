//! Aggregate accumulation and per-group expression evaluation.

use super::expression::evaluate;
use super::row::RowContext;
use crate::error::{Error, Result};
use crate::functions;
use crate::parsing::ast::{Expression, Literal};
use crate::types::Value;

/// Accumulates one aggregate function over the rows of a group.
trait Accumulator {
    /// Folds in the argument value for one row.
    fn add(&mut self, value: Value) -> Result<()>;

    /// Produces the aggregate result.
    fn finalize(self: Box<Self>) -> Value;
}

/// COUNT: the number of rows whose argument is not NULL. The argumentless
/// form counts every row.
struct CountAccumulator {
    count: i64,
}

impl Accumulator for CountAccumulator {
    fn add(&mut self, value: Value) -> Result<()> {
        if value != Value::Null {
            self.count += 1;
        }
        Ok(())
    }

    fn finalize(self: Box<Self>) -> Value {
        Value::Integer(self.count)
    }
}

/// SUM: integer sum over non-NULL arguments. NULL when every argument was
/// NULL.
struct SumAccumulator {
    sum: Option<i64>,
}

impl Accumulator for SumAccumulator {
    fn add(&mut self, value: Value) -> Result<()> {
        match value {
            Value::Null => {}
            Value::Integer(n) => {
                let sum = self
                    .sum
                    .unwrap_or(0)
                    .checked_add(n)
                    .ok_or_else(|| Error::Validation("integer overflow".into()))?;
                self.sum = Some(sum);
            }
            value => {
                return Err(Error::Validation(format!(
                    "SUM expects INTEGER, got {}",
                    value.data_type()
                )));
            }
        }
        Ok(())
    }

    fn finalize(self: Box<Self>) -> Value {
        self.sum.map_or(Value::Null, Value::Integer)
    }
}

/// Creates an accumulator for a named aggregate function.
fn create_accumulator(name: &str) -> Result<Box<dyn Accumulator>> {
    match name.to_uppercase().as_str() {
        "COUNT" => Ok(Box::new(CountAccumulator { count: 0 })),
        "SUM" => Ok(Box::new(SumAccumulator { sum: None })),
        name => Err(Error::Validation(format!(
            "unknown aggregate function {name}"
        ))),
    }
}

/// Computes an aggregate call over a group's rows. The empty group yields
/// the function's registry default (COUNT → 0, SUM → NULL).
fn aggregate_over(name: &str, args: &[Expression], rows: &[RowContext]) -> Result<Value> {
    if rows.is_empty() {
        let function = functions::get_function(name)
            .ok_or_else(|| Error::Validation(format!("unknown function {name}")))?;
        return Ok(function.default_value());
    }
    let mut accumulator = create_accumulator(name)?;
    for row in rows {
        let value = match args.first() {
            Some(arg) => evaluate(arg, row)?,
            // The argumentless COUNT counts rows; any non-NULL stand-in
            // does.
            None => Value::Integer(1),
        };
        accumulator.add(value)?;
    }
    Ok(accumulator.finalize())
}

/// Evaluates an expression over one group. Aggregate nodes collapse to a
/// single value for the group; what remains is evaluated against the
/// group's first row, which validation guarantees is representative.
pub fn evaluate_grouped(expr: &Expression, rows: &[RowContext]) -> Result<Value> {
    let mut expr = expr.clone();
    expr.transform(&mut |e| {
        if let Expression::Aggregate(name, args) = e {
            let value = aggregate_over(name, args, rows)?;
            *e = Expression::Literal(Literal::from(value));
        }
        Ok(())
    })?;
    match rows.first() {
        Some(row) => evaluate(&expr, row),
        None => evaluate(&expr, &RowContext::empty()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::Parser;
    use crate::types::{Column, DataType, Table, Value};

    fn group(values: &[Value]) -> Vec<RowContext> {
        let table = Table::new(
            "t".into(),
            vec![Column {
                name: "v".into(),
                data_type: DataType::Integer,
            }],
        )
        .unwrap();
        values
            .iter()
            .map(|value| RowContext::from_row("t", &table, &vec![value.clone()]))
            .collect()
    }

    fn eval(expr: &str, values: &[Value]) -> Result<Value> {
        evaluate_grouped(&Parser::parse_expr(expr).unwrap(), &group(values))
    }

    #[test]
    fn test_count_skips_nulls() {
        let values = [Value::Integer(1), Value::Null, Value::Integer(3)];
        assert_eq!(eval("COUNT(v)", &values).unwrap(), Value::Integer(2));
        // The argumentless form counts every row.
        assert_eq!(eval("COUNT()", &values).unwrap(), Value::Integer(3));
    }

    #[test]
    fn test_sum_skips_nulls() {
        let values = [Value::Integer(10), Value::Null, Value::Integer(20)];
        assert_eq!(eval("SUM(v)", &values).unwrap(), Value::Integer(30));
        // All-NULL input sums to NULL.
        assert_eq!(eval("SUM(v)", &[Value::Null]).unwrap(), Value::Null);
    }

    #[test]
    fn test_empty_group_defaults() {
        assert_eq!(eval("COUNT(v)", &[]).unwrap(), Value::Integer(0));
        assert_eq!(eval("SUM(v)", &[]).unwrap(), Value::Null);
    }

    #[test]
    fn test_aggregates_compose_with_scalars() {
        let values = [Value::Integer(10), Value::Integer(20)];
        assert_eq!(eval("SUM(v) + 1", &values).unwrap(), Value::Integer(31));
        assert_eq!(eval("COUNT(v) * 2", &values).unwrap(), Value::Integer(4));
        assert_eq!(eval("ABS(0 - SUM(v))", &values).unwrap(), Value::Integer(30));
    }

    #[test]
    fn test_non_aggregate_uses_representative_row() {
        // Validation only lets this through when the value is constant per
        // group, so the first row stands in for all of them.
        let values = [Value::Integer(5), Value::Integer(5)];
        assert_eq!(eval("v", &values).unwrap(), Value::Integer(5));
        assert_eq!(eval("v + COUNT(v)", &values).unwrap(), Value::Integer(7));
    }
}
