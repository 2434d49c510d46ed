//! Semantic analysis: name resolution scope, pure type inference, and
//! statement validation.

mod equivalence;
mod scope;
mod typing;
mod validator;

pub use equivalence::{ColumnRef, expr_equiv};
pub use scope::TableContext;
pub use typing::type_of;
pub use validator::{resolve_order_by, validate_select};
