//! Response envelopes.
//!
//! Success without rows: `{"status":"ok"}`. Success with rows adds `rows`
//! and, when any projection is named, `column_names`. Failure carries the
//! error kind only: `{"status":"error","error_type":...}`.

use serde_json::{Value as Json, json};

use crate::error::Result;
use crate::execution::StatementResult;
use crate::types::Value;

/// Encodes an execution result as the wire JSON object.
pub fn encode(result: Result<StatementResult>) -> Json {
    match result {
        Ok(StatementResult::Ok) => json!({"status": "ok"}),
        Ok(StatementResult::Rows { rows, column_names }) => {
            let rows: Vec<Json> = rows
                .iter()
                .map(|row| Json::Array(row.iter().map(encode_value).collect()))
                .collect();
            match column_names {
                Some(names) => json!({"status": "ok", "rows": rows, "column_names": names}),
                None => json!({"status": "ok", "rows": rows}),
            }
        }
        Err(error) => json!({"status": "error", "error_type": error.kind()}),
    }
}

/// SQL-canonical value encoding: booleans are the strings "TRUE" and
/// "FALSE", not JSON booleans.
fn encode_value(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Boolean(true) => json!("TRUE"),
        Value::Boolean(false) => json!("FALSE"),
        Value::Integer(i) => json!(i),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_ok_envelope() {
        assert_eq!(encode(Ok(StatementResult::Ok)), json!({"status": "ok"}));
    }

    #[test]
    fn test_rows_envelope() {
        let result = StatementResult::Rows {
            rows: vec![vec![Value::Integer(2), Value::Boolean(false)]],
            column_names: Some(vec!["x".into(), "b".into()]),
        };
        assert_eq!(
            encode(Ok(result)),
            json!({"status": "ok", "rows": [[2, "FALSE"]], "column_names": ["x", "b"]})
        );
    }

    #[test]
    fn test_unnamed_rows_omit_column_names() {
        let result = StatementResult::Rows {
            rows: vec![vec![Value::Integer(3), Value::Null]],
            column_names: None,
        };
        assert_eq!(
            encode(Ok(result)),
            json!({"status": "ok", "rows": [[3, null]]})
        );
    }

    #[test]
    fn test_error_envelope() {
        assert_eq!(
            encode(Err(Error::DivisionByZero)),
            json!({"status": "error", "error_type": "division_by_zero_error"})
        );
        assert_eq!(
            encode(Err(Error::Parse("nope".into()))),
            json!({"status": "error", "error_type": "parsing_error"})
        );
    }
}
