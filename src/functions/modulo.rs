//! MOD scalar function

use super::{Function, FunctionRegistry, FunctionSignature};
use crate::error::{Error, Result};
use crate::types::{DataType, Value};

pub struct ModFunction;

impl Function for ModFunction {
    fn signature(&self) -> &FunctionSignature {
        static SIGNATURE: FunctionSignature = FunctionSignature {
            name: "MOD",
            min_args: 2,
            max_args: Some(2),
            argument_type: Some(DataType::Integer),
            return_type: DataType::Integer,
            is_aggregate: false,
        };
        &SIGNATURE
    }

    fn execute(&self, args: &[Value]) -> Result<Value> {
        match args {
            [Value::Null, _] | [_, Value::Null] => Ok(Value::Null),
            [Value::Integer(_), Value::Integer(0)] => Err(Error::DivisionByZero),
            [Value::Integer(a), Value::Integer(b)] => a
                .checked_rem(*b)
                .map(Value::Integer)
                .ok_or_else(|| Error::Validation("integer overflow".into())),
            _ => Err(Error::Validation("MOD expects INTEGER arguments".into())),
        }
    }
}

/// Registers the MOD function.
pub fn register(registry: &mut FunctionRegistry) {
    registry.register(Box::new(ModFunction));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mod_execute() {
        let func = ModFunction;
        assert_eq!(
            func.execute(&[Value::Integer(7), Value::Integer(3)]).unwrap(),
            Value::Integer(1)
        );
        // NULL on either side propagates, even NULL MOD 0.
        assert_eq!(
            func.execute(&[Value::Null, Value::Integer(3)]).unwrap(),
            Value::Null
        );
        assert_eq!(
            func.execute(&[Value::Null, Value::Integer(0)]).unwrap(),
            Value::Null
        );
        // A concrete zero divisor fails.
        assert_eq!(
            func.execute(&[Value::Integer(7), Value::Integer(0)]),
            Err(Error::DivisionByZero)
        );
    }

    #[test]
    fn test_mod_validate() {
        let func = ModFunction;
        assert_eq!(
            func.validate(&[DataType::Integer, DataType::Integer]).unwrap(),
            DataType::Integer
        );
        assert!(func.validate(&[DataType::Integer]).is_err());
        assert!(func.validate(&[DataType::Integer, DataType::Boolean]).is_err());
    }
}
