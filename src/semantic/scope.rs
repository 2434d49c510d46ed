//! Name resolution scope for a single query.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::types::{DataType, Table};

/// The tables (and aliases) in scope for a query: the FROM table plus one
/// entry per join, in source order. Aliases are unique within a query and
/// resolve case-insensitively; an unaliased table goes by its own name.
#[derive(Debug, Clone, Default)]
pub struct TableContext {
    /// Sources in registration order: (display alias, schema).
    sources: Vec<(String, Table)>,
    /// Lowercased alias to index into sources.
    by_alias: HashMap<String, usize>,
}

impl TableContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a table under its alias, or its own name when unaliased.
    /// Fails if the alias is already taken.
    pub fn add_table(&mut self, table: Table, alias: Option<String>) -> Result<()> {
        let alias = alias.unwrap_or_else(|| table.name.clone());
        let key = alias.to_lowercase();
        if self.by_alias.contains_key(&key) {
            return Err(Error::Validation(format!("duplicate table alias {alias}")));
        }
        self.by_alias.insert(key, self.sources.len());
        self.sources.push((alias, table));
        Ok(())
    }

    /// The sources in registration order.
    pub fn sources(&self) -> &[(String, Table)] {
        &self.sources
    }

    /// Resolves an alias to its schema.
    pub fn get_table(&self, alias: &str) -> Option<&Table> {
        self.by_alias
            .get(&alias.to_lowercase())
            .map(|&i| &self.sources[i].1)
    }

    /// Resolves a column reference to its declared type. A bare name must
    /// be present in exactly one source.
    pub fn resolve_column(&self, table_ref: Option<&str>, name: &str) -> Result<DataType> {
        if let Some(table_ref) = table_ref {
            let Some(table) = self.get_table(table_ref) else {
                return Err(Error::Validation(format!("unknown table {table_ref}")));
            };
            let Some((_, column)) = table.get_column(name) else {
                return Err(Error::Validation(format!(
                    "unknown column {table_ref}.{name}"
                )));
            };
            return Ok(column.data_type);
        }
        let mut found = None;
        for (_, table) in &self.sources {
            if let Some((_, column)) = table.get_column(name) {
                if found.is_some() {
                    return Err(Error::Validation(format!("ambiguous column {name}")));
                }
                found = Some(column.data_type);
            }
        }
        found.ok_or_else(|| Error::Validation(format!("unknown column {name}")))
    }

    /// The alias of the single source that has the given column, if exactly
    /// one does. Used to treat `c` and `t.c` as the same reference.
    pub fn sole_source_of(&self, name: &str) -> Option<&str> {
        let mut found = None;
        for (alias, table) in &self.sources {
            if table.has_column(name) {
                if found.is_some() {
                    return None;
                }
                found = Some(alias.as_str());
            }
        }
        found
    }
}
