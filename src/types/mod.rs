//! Core data model: runtime values, static types, and table schemas.

pub mod data_type;
pub mod schema;
pub mod value;

pub use data_type::DataType;
pub use schema::{Column, Table};
pub use value::{Row, Value};
