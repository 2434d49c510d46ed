//! An in-memory SQL database engine served over a null-delimited TCP
//! protocol.
//!
//! The engine core is a synchronous pipeline:
//!
//! - `parsing`: lexer, statement parser, and precedence-climbing
//!   expression parser producing a typed AST.
//! - `semantic`: schema-aware validation with three-valued logic, GROUP BY
//!   and aggregate rules, JOIN-scope column resolution, and alias
//!   handling.
//! - `execution`: table store access, row-context materialization for
//!   joins, filter/group/project/sort/limit stages, and scalar and
//!   aggregate evaluators with NULL propagation.
//! - `server`: the thin TCP front end with null-byte framing and JSON
//!   response envelopes.

pub mod error;
pub mod execution;
pub mod functions;
pub mod parsing;
pub mod semantic;
pub mod server;
pub mod storage;
pub mod types;

pub use error::{Error, Result};
pub use execution::{Engine, StatementResult};
pub use parsing::parse_sql;
pub use types::Value;
