//! SUM aggregate function

use super::{Function, FunctionRegistry, FunctionSignature};
use crate::types::{DataType, Value};

pub struct SumFunction;

impl Function for SumFunction {
    fn signature(&self) -> &FunctionSignature {
        static SIGNATURE: FunctionSignature = FunctionSignature {
            name: "SUM",
            min_args: 1,
            max_args: Some(1),
            argument_type: Some(DataType::Integer),
            return_type: DataType::Integer,
            is_aggregate: true,
        };
        &SIGNATURE
    }

    // SUM of nothing is NULL, not 0.
    fn default_value(&self) -> Value {
        Value::Null
    }
}

/// Registers the SUM function.
pub fn register(registry: &mut FunctionRegistry) {
    registry.register(Box::new(SumFunction));
}
