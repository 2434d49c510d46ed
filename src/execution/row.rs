//! Per-row evaluation environments.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::types::{Row, Table, Value};

/// A bare-name binding. Names present in more than one source are
/// remembered as ambiguous so stray references fail cleanly at runtime.
#[derive(Debug, Clone)]
enum Binding {
    Unique(Value),
    Ambiguous,
}

/// The evaluation environment for one (possibly joined) row. Every column
/// is reachable as `alias.column`, and under its bare name when that name
/// occurs in a single source. Lookup is case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct RowContext {
    qualified: HashMap<String, Value>,
    bare: HashMap<String, Binding>,
}

impl RowContext {
    /// An environment with no columns, for row-independent expressions.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds an environment from a single table row.
    pub fn from_row(alias: &str, table: &Table, row: &Row) -> Self {
        let mut context = Self::default();
        context.add_source(alias, table, Some(row));
        context
    }

    /// Adds a source's columns to the environment. An absent row (the
    /// padded side of an outer join) binds every column to NULL.
    pub fn add_source(&mut self, alias: &str, table: &Table, row: Option<&Row>) {
        for (index, column) in table.columns.iter().enumerate() {
            let value = row
                .and_then(|row| row.get(index).cloned())
                .unwrap_or(Value::Null);
            self.qualified.insert(
                format!("{}.{}", alias.to_lowercase(), column.name.to_lowercase()),
                value.clone(),
            );
            self.bare
                .entry(column.name.to_lowercase())
                .and_modify(|binding| *binding = Binding::Ambiguous)
                .or_insert(Binding::Unique(value));
        }
    }

    /// Looks up a column reference. A bare name succeeds only if exactly
    /// one source has a column with that name.
    pub fn get(&self, qualifier: Option<&str>, name: &str) -> Result<Value> {
        if let Some(qualifier) = qualifier {
            let key = format!("{}.{}", qualifier.to_lowercase(), name.to_lowercase());
            return self
                .qualified
                .get(&key)
                .cloned()
                .ok_or_else(|| Error::Validation(format!("unknown column {qualifier}.{name}")));
        }
        match self.bare.get(&name.to_lowercase()) {
            Some(Binding::Unique(value)) => Ok(value.clone()),
            Some(Binding::Ambiguous) => Err(Error::Validation(format!("ambiguous column {name}"))),
            None => Err(Error::Validation(format!("unknown column {name}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Column, DataType};

    fn table(name: &str, columns: &[&str]) -> Table {
        Table::new(
            name.into(),
            columns
                .iter()
                .map(|name| Column {
                    name: (*name).into(),
                    data_type: DataType::Integer,
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_single_source() {
        let table = table("t", &["a", "b"]);
        let context = RowContext::from_row("t", &table, &vec![Value::Integer(1), Value::Null]);
        assert_eq!(context.get(None, "a").unwrap(), Value::Integer(1));
        assert_eq!(context.get(Some("t"), "a").unwrap(), Value::Integer(1));
        assert_eq!(context.get(None, "B").unwrap(), Value::Null);
        assert!(context.get(None, "c").is_err());
        assert!(context.get(Some("u"), "a").is_err());
    }

    #[test]
    fn test_joined_sources_and_ambiguity() {
        let left = table("p", &["id", "x"]);
        let right = table("q", &["id", "m"]);
        let mut context = RowContext::from_row("p", &left, &vec![Value::Integer(1), Value::Integer(2)]);
        context.add_source("q", &right, Some(&vec![Value::Integer(1), Value::Integer(100)]));

        // Qualified lookups are unambiguous by construction.
        assert_eq!(context.get(Some("p"), "id").unwrap(), Value::Integer(1));
        assert_eq!(context.get(Some("q"), "m").unwrap(), Value::Integer(100));
        // `id` is in both sources; `x` and `m` are unique.
        assert!(context.get(None, "id").is_err());
        assert_eq!(context.get(None, "x").unwrap(), Value::Integer(2));
        assert_eq!(context.get(None, "m").unwrap(), Value::Integer(100));
    }

    #[test]
    fn test_padded_source_is_all_null() {
        let left = table("p", &["id"]);
        let right = table("q", &["id", "m"]);
        let mut context = RowContext::from_row("p", &left, &vec![Value::Integer(2)]);
        context.add_source("q", &right, None);
        assert_eq!(context.get(Some("q"), "id").unwrap(), Value::Null);
        assert_eq!(context.get(Some("q"), "m").unwrap(), Value::Null);
        assert_eq!(context.get(None, "m").unwrap(), Value::Null);
    }
}
