//! The SQL front end.
//!
//! This module turns raw SQL strings into a structured Abstract Syntax
//! Tree. It only ensures the syntax is well-formed; whether a given table
//! or column exists is the job of the semantic layer.

pub mod ast;
mod lexer;
mod parser;

use crate::error::Result;

pub use ast::Statement;
pub use lexer::{Keyword, Lexer, Token};
pub use parser::Parser;

/// Parses a SQL statement string into an AST.
pub fn parse_sql(sql: &str) -> Result<Statement> {
    Parser::parse(sql)
}
