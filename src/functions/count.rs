//! COUNT aggregate function

use super::{Function, FunctionRegistry, FunctionSignature};
use crate::types::{DataType, Value};

pub struct CountFunction;

impl Function for CountFunction {
    fn signature(&self) -> &FunctionSignature {
        static SIGNATURE: FunctionSignature = FunctionSignature {
            name: "COUNT",
            // The argumentless form counts rows.
            min_args: 0,
            max_args: Some(1),
            argument_type: None,
            return_type: DataType::Integer,
            is_aggregate: true,
        };
        &SIGNATURE
    }

    fn default_value(&self) -> Value {
        Value::Integer(0)
    }
}

/// Registers the COUNT function.
pub fn register(registry: &mut FunctionRegistry) {
    registry.register(Box::new(CountFunction));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_signature() {
        let func = CountFunction;
        let sig = func.signature();
        assert_eq!(sig.name, "COUNT");
        assert!(sig.is_aggregate);
        // Zero or one argument, of any type.
        assert_eq!(func.validate(&[]).unwrap(), DataType::Integer);
        assert_eq!(func.validate(&[DataType::Boolean]).unwrap(), DataType::Integer);
        assert!(func.validate(&[DataType::Integer, DataType::Integer]).is_err());
    }

    #[test]
    fn test_count_default() {
        assert_eq!(CountFunction.default_value(), Value::Integer(0));
    }
}
