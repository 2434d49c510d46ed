//! The in-memory table store.
//!
//! Tables live here from CREATE TABLE until DROP TABLE, rows from INSERT
//! until the table is dropped. Nothing is persisted. Names resolve
//! case-insensitively; rows keep their insertion order.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::types::{Row, Table, Value};

/// One stored table: its schema plus its rows in insertion order.
#[derive(Debug, Clone)]
struct StoredTable {
    schema: Table,
    rows: Vec<Row>,
}

/// The in-memory store, keyed by lowercased table name.
#[derive(Debug, Clone, Default)]
pub struct Store {
    tables: HashMap<String, StoredTable>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table. Fails when the name is already taken.
    pub fn create_table(&mut self, schema: Table) -> Result<()> {
        let key = schema.name.to_lowercase();
        if self.tables.contains_key(&key) {
            return Err(Error::Validation(format!(
                "table {} already exists",
                schema.name
            )));
        }
        self.tables.insert(
            key,
            StoredTable {
                schema,
                rows: Vec::new(),
            },
        );
        Ok(())
    }

    /// Drops a table. With `if_exists`, dropping a missing table is a
    /// no-op success.
    pub fn drop_table(&mut self, name: &str, if_exists: bool) -> Result<()> {
        if self.tables.remove(&name.to_lowercase()).is_none() && !if_exists {
            return Err(Error::Validation(format!("table {name} does not exist")));
        }
        Ok(())
    }

    /// Looks up a table schema.
    pub fn get_table(&self, name: &str) -> Result<&Table> {
        self.tables
            .get(&name.to_lowercase())
            .map(|table| &table.schema)
            .ok_or_else(|| Error::Validation(format!("table {name} does not exist")))
    }

    /// Inserts rows into a table. Short rows pad with trailing NULLs; rows
    /// longer than the schema and non-NULL type mismatches fail. Every row
    /// is validated before any of them is appended, so a failure midway
    /// inserts nothing.
    pub fn insert(&mut self, name: &str, rows: Vec<Row>) -> Result<()> {
        let table = self
            .tables
            .get_mut(&name.to_lowercase())
            .ok_or_else(|| Error::Validation(format!("table {name} does not exist")))?;
        let mut padded = Vec::with_capacity(rows.len());
        for mut row in rows {
            if row.len() > table.schema.columns.len() {
                return Err(Error::Validation(format!(
                    "table {} has {} columns, got {} values",
                    table.schema.name,
                    table.schema.columns.len(),
                    row.len()
                )));
            }
            row.resize(table.schema.columns.len(), Value::Null);
            table.schema.validate_row(&row)?;
            padded.push(row);
        }
        table.rows.append(&mut padded);
        Ok(())
    }

    /// The rows of a table, in insertion order.
    pub fn rows(&self, name: &str) -> Result<&[Row]> {
        self.tables
            .get(&name.to_lowercase())
            .map(|table| table.rows.as_slice())
            .ok_or_else(|| Error::Validation(format!("table {name} does not exist")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Column, DataType};

    fn schema() -> Table {
        Table::new(
            "t".into(),
            vec![
                Column {
                    name: "a".into(),
                    data_type: DataType::Integer,
                },
                Column {
                    name: "b".into(),
                    data_type: DataType::Boolean,
                },
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_create_and_drop() {
        let mut store = Store::new();
        store.create_table(schema()).unwrap();
        // Table names are case-insensitive.
        assert!(store.create_table(schema()).is_err());
        assert!(store.get_table("T").is_ok());

        store.drop_table("t", false).unwrap();
        assert!(store.drop_table("t", false).is_err());
        // IF EXISTS is idempotent.
        store.drop_table("t", true).unwrap();
        store.drop_table("t", true).unwrap();
    }

    #[test]
    fn test_insert_pads_and_validates() {
        let mut store = Store::new();
        store.create_table(schema()).unwrap();

        // Short rows pad with NULL.
        store.insert("t", vec![vec![Value::Integer(1)]]).unwrap();
        assert_eq!(store.rows("t").unwrap()[0], vec![Value::Integer(1), Value::Null]);

        // Too many values.
        assert!(
            store
                .insert(
                    "t",
                    vec![vec![Value::Integer(1), Value::Boolean(true), Value::Null]]
                )
                .is_err()
        );
        // Type mismatch.
        assert!(store.insert("t", vec![vec![Value::Boolean(true)]]).is_err());
        // NULL fits any column.
        store.insert("t", vec![vec![Value::Null, Value::Null]]).unwrap();
    }

    #[test]
    fn test_insert_is_atomic() {
        let mut store = Store::new();
        store.create_table(schema()).unwrap();
        // The second row fails, so the first must not land either.
        assert!(
            store
                .insert(
                    "t",
                    vec![vec![Value::Integer(1)], vec![Value::Boolean(true)]]
                )
                .is_err()
        );
        assert!(store.rows("t").unwrap().is_empty());
    }

    #[test]
    fn test_rows_keep_insertion_order() {
        let mut store = Store::new();
        store.create_table(schema()).unwrap();
        for i in 0..5 {
            store.insert("t", vec![vec![Value::Integer(i)]]).unwrap();
        }
        let firsts: Vec<Value> = store.rows("t").unwrap().iter().map(|r| r[0].clone()).collect();
        assert_eq!(
            firsts,
            (0..5).map(Value::Integer).collect::<Vec<_>>()
        );
    }
}
