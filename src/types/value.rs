//! SQL runtime values.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::DataType;

/// A row of values in a table.
pub type Row = Vec<Value>;

/// A runtime SQL value. NULL is a first-class value, distinct from every
/// integer and boolean.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The static type of this value. NULL has no concrete type.
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Null => DataType::Unknown,
            Value::Boolean(_) => DataType::Boolean,
            Value::Integer(_) => DataType::Integer,
        }
    }

    /// The ordering used by ORDER BY: NULL sorts after any concrete value,
    /// and FALSE before TRUE. Values of incompatible types compare as equal
    /// (validation rejects such comparisons upstream).
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Greater,
            (_, Value::Null) => Ordering::Less,
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Boolean(true) => write!(f, "TRUE"),
            Value::Boolean(false) => write!(f, "FALSE"),
            Value::Integer(i) => write!(f, "{i}"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_ordering() {
        assert_eq!(
            Value::Integer(1).sort_cmp(&Value::Integer(2)),
            Ordering::Less
        );
        assert_eq!(
            Value::Boolean(false).sort_cmp(&Value::Boolean(true)),
            Ordering::Less
        );
        // NULL sorts after everything.
        assert_eq!(Value::Null.sort_cmp(&Value::Integer(i64::MAX)), Ordering::Greater);
        assert_eq!(Value::Integer(i64::MIN).sort_cmp(&Value::Null), Ordering::Less);
        assert_eq!(Value::Null.sort_cmp(&Value::Null), Ordering::Equal);
        // Incompatible types are equal for sorting purposes.
        assert_eq!(
            Value::Integer(1).sort_cmp(&Value::Boolean(true)),
            Ordering::Equal
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Null.to_string(), "NULL");
        assert_eq!(Value::Boolean(true).to_string(), "TRUE");
        assert_eq!(Value::Integer(-7).to_string(), "-7");
    }
}
