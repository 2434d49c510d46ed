//! Static expression types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The static type of an expression. `Unknown` is the type of a NULL
/// literal, or of any expression already known to evaluate to NULL; it is
/// compatible with every concrete type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Integer,
    Boolean,
    Unknown,
}

impl DataType {
    /// Whether a value of this type can appear where `other` is required.
    pub fn compatible_with(self, other: DataType) -> bool {
        self == DataType::Unknown || other == DataType::Unknown || self == other
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Integer => write!(f, "INTEGER"),
            DataType::Boolean => write!(f, "BOOLEAN"),
            DataType::Unknown => write!(f, "NULL"),
        }
    }
}
