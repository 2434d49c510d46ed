//! Error types for the SQL engine

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Engine errors. Every failure a statement can produce maps onto one of
/// these four kinds, and the wire protocol reports the kind only.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Lexing or parsing failed, or the statement is structurally invalid.
    #[error("parse error: {0}")]
    Parse(String),

    /// The statement is well-formed but breaks a semantic rule: unknown or
    /// ambiguous names, type mismatches, duplicate definitions, misplaced
    /// aggregates, and so on.
    #[error("validation error: {0}")]
    Validation(String),

    /// Integer division or MOD with a non-NULL zero divisor.
    #[error("division by zero")]
    DivisionByZero,

    /// Statement dispatch fell through on input that does not start a known
    /// statement kind.
    #[error("unknown command {0}")]
    UnknownCommand(String),
}

impl Error {
    /// The wire identifier for this error, carried in response envelopes.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Parse(_) => "parsing_error",
            Error::Validation(_) => "validation_error",
            Error::DivisionByZero => "division_by_zero_error",
            Error::UnknownCommand(_) => "unknown_command",
        }
    }
}
