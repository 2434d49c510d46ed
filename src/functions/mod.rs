//! SQL function definitions and registry.
//!
//! Each function carries its signature metadata (arity, argument type,
//! return type, aggregate flag) so that validation and execution share one
//! source of truth.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::error::{Error, Result};
use crate::types::{DataType, Value};

// Scalar functions
mod abs;
mod modulo;

// Aggregate functions
mod count;
mod sum;

/// Metadata about a function's signature.
#[derive(Debug, Clone)]
pub struct FunctionSignature {
    /// Function name (uppercase).
    pub name: &'static str,
    /// Minimum number of arguments.
    pub min_args: usize,
    /// Maximum number of arguments, None for unbounded.
    pub max_args: Option<usize>,
    /// The required argument type. None accepts any type.
    pub argument_type: Option<DataType>,
    /// The type of the function's result.
    pub return_type: DataType,
    /// Whether this is an aggregate function.
    pub is_aggregate: bool,
}

/// A SQL function. Scalar functions implement `execute`; aggregates are
/// accumulated row by row in the execution layer and implement
/// `default_value` for the empty group.
pub trait Function: Send + Sync {
    /// The function's signature.
    fn signature(&self) -> &FunctionSignature;

    /// Validates argument types against the signature and returns the
    /// result type. NULL-typed arguments are accepted everywhere and make
    /// the result NULL-typed for scalar functions.
    fn validate(&self, arg_types: &[DataType]) -> Result<DataType> {
        let signature = self.signature();
        if arg_types.len() < signature.min_args
            || signature.max_args.is_some_and(|max| arg_types.len() > max)
        {
            return Err(Error::Validation(format!(
                "wrong number of arguments to {}",
                signature.name
            )));
        }
        if let Some(required) = signature.argument_type {
            for arg_type in arg_types {
                if !arg_type.compatible_with(required) {
                    return Err(Error::Validation(format!(
                        "{} expects {} arguments, got {}",
                        signature.name, required, arg_type
                    )));
                }
            }
        }
        if !signature.is_aggregate && arg_types.contains(&DataType::Unknown) {
            return Ok(DataType::Unknown);
        }
        Ok(signature.return_type)
    }

    /// Executes a scalar function with runtime values. Aggregates are not
    /// evaluated through this path.
    fn execute(&self, args: &[Value]) -> Result<Value> {
        let _ = args;
        Err(Error::Validation(format!(
            "{} cannot be evaluated per row",
            self.signature().name
        )))
    }

    /// The aggregate's result over an empty group.
    fn default_value(&self) -> Value {
        Value::Null
    }
}

/// Registry of all available SQL functions.
pub struct FunctionRegistry {
    functions: HashMap<&'static str, Box<dyn Function>>,
}

impl FunctionRegistry {
    /// Creates a new function registry with all builtin functions.
    fn new() -> Self {
        let mut registry = Self {
            functions: HashMap::new(),
        };
        abs::register(&mut registry);
        modulo::register(&mut registry);
        count::register(&mut registry);
        sum::register(&mut registry);
        registry
    }

    /// Registers a function under its signature name.
    fn register(&mut self, function: Box<dyn Function>) {
        self.functions.insert(function.signature().name, function);
    }
}

// Global static registry
static REGISTRY: LazyLock<FunctionRegistry> = LazyLock::new(FunctionRegistry::new);

/// Looks up a function by name, case-insensitively.
pub fn get_function(name: &str) -> Option<&'static dyn Function> {
    REGISTRY
        .functions
        .get(name.to_uppercase().as_str())
        .map(|f| f.as_ref())
}

/// Whether the named function is an aggregate.
pub fn is_aggregate(name: &str) -> bool {
    get_function(name)
        .map(|f| f.signature().is_aggregate)
        .unwrap_or(false)
}
