//! Table schemas.
//!
//! Tables can't change after they are created. There is no ALTER TABLE,
//! only CREATE TABLE and DROP TABLE.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use super::{DataType, Row};
use crate::error::{Error, Result};

/// A table schema: the name and the ordered column list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// The table name, as written in CREATE TABLE. Resolution against it is
    /// case-insensitive.
    pub name: String,
    /// The table's columns, in declaration order. At least one.
    pub columns: Vec<Column>,
}

/// A table column.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Column name, with its original case preserved.
    pub name: String,
    /// The declared column type.
    pub data_type: DataType,
}

impl Table {
    /// Creates a new table schema, rejecting duplicate column names.
    pub fn new(name: String, columns: Vec<Column>) -> Result<Self> {
        for (i, column) in columns.iter().enumerate() {
            if columns[..i]
                .iter()
                .any(|c| c.name.eq_ignore_ascii_case(&column.name))
            {
                return Err(Error::Validation(format!(
                    "duplicate column {}",
                    column.name
                )));
            }
        }
        Ok(Table { name, columns })
    }

    /// Looks up a column by name, case-insensitively.
    pub fn get_column(&self, name: &str) -> Option<(usize, &Column)> {
        self.columns
            .iter()
            .enumerate()
            .find(|(_, c)| c.name.eq_ignore_ascii_case(name))
    }

    /// Whether a column with the given name exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.get_column(name).is_some()
    }

    /// Validates a full-length row against the schema. NULL is accepted for
    /// any column; a non-NULL value must match the declared type exactly.
    pub fn validate_row(&self, row: &Row) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(Error::Validation(format!(
                "row has {} values, table {} has {} columns",
                row.len(),
                self.name,
                self.columns.len()
            )));
        }
        for (column, value) in self.columns.iter().zip(row) {
            if !value.is_null() && value.data_type() != column.data_type {
                return Err(Error::Validation(format!(
                    "column {} expects {}, got {}",
                    column.name,
                    column.data_type,
                    value.data_type()
                )));
            }
        }
        Ok(())
    }
}

// Formats the table as a SQL CREATE TABLE statement.
impl Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CREATE TABLE {} (", self.name)?;
        for (i, column) in self.columns.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} {}", column.name, column.data_type)?;
        }
        write!(f, ")")
    }
}
