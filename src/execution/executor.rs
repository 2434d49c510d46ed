//! Statement execution against the table store.

use super::expression::evaluate;
use super::row::RowContext;
use super::select;
use crate::error::Result;
use crate::parsing::ast::{Expression, SelectStatement, Statement};
use crate::semantic::{self, TableContext};
use crate::storage::Store;
use crate::types::{Column, Row, Table};

/// The result of executing a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum StatementResult {
    /// DDL or DML succeeded without producing rows.
    Ok,
    /// A query produced rows, with output column names when any projection
    /// is named.
    Rows {
        rows: Vec<Row>,
        column_names: Option<Vec<String>>,
    },
}

/// Executes statements against an in-memory store.
///
/// Statements are processed one at a time in submission order. Each is
/// validated before it touches the store, so a failed statement leaves the
/// store unchanged; INSERT in particular evaluates and checks all of its
/// rows before appending any of them.
pub struct Engine {
    store: Store,
}

impl Engine {
    pub fn new() -> Self {
        Self {
            store: Store::new(),
        }
    }

    /// Parses and executes a single SQL statement.
    pub fn execute_sql(&mut self, sql: &str) -> Result<StatementResult> {
        let statement = crate::parsing::parse_sql(sql)?;
        self.execute(statement)
    }

    /// Executes a parsed statement.
    pub fn execute(&mut self, statement: Statement) -> Result<StatementResult> {
        match statement {
            Statement::CreateTable { name, columns } => self.create_table(name, columns),
            Statement::DropTable { name, if_exists } => {
                self.store.drop_table(&name, if_exists)?;
                Ok(StatementResult::Ok)
            }
            Statement::Insert { table, rows } => self.insert(&table, rows),
            Statement::Select(select) => self.select(*select),
        }
    }

    fn create_table(&mut self, name: String, columns: Vec<Column>) -> Result<StatementResult> {
        let table = Table::new(name, columns)?;
        self.store.create_table(table)?;
        Ok(StatementResult::Ok)
    }

    fn insert(&mut self, table: &str, rows: Vec<Vec<Expression>>) -> Result<StatementResult> {
        // Value lists are constant expressions; a column reference fails
        // lookup against the empty environment.
        let context = RowContext::empty();
        let rows = rows
            .iter()
            .map(|exprs| {
                exprs
                    .iter()
                    .map(|expr| evaluate(expr, &context))
                    .collect::<Result<Row>>()
            })
            .collect::<Result<Vec<Row>>>()?;
        self.store.insert(table, rows)?;
        Ok(StatementResult::Ok)
    }

    fn select(&mut self, mut select: SelectStatement) -> Result<StatementResult> {
        let scope = self.build_scope(&select)?;
        select.projections = select::expand_projections(select.projections, &scope)?;
        semantic::validate_select(&select, &scope)?;
        let output = select::process(&select, &scope, &self.store)?;
        Ok(StatementResult::Rows {
            rows: output.rows,
            column_names: output.column_names,
        })
    }

    /// Builds the name resolution scope for a SELECT: the FROM table plus
    /// one entry per join. Unknown tables and duplicate aliases fail here.
    fn build_scope(&self, select: &SelectStatement) -> Result<TableContext> {
        let mut scope = TableContext::new();
        if let Some(from) = &select.from {
            let table = self.store.get_table(&from.table)?;
            scope.add_table(table.clone(), from.alias.clone())?;
            for join in &from.joins {
                let table = self.store.get_table(&join.table)?;
                scope.add_table(table.clone(), join.alias.clone())?;
            }
        }
        Ok(scope)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
