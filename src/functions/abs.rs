//! ABS scalar function

use super::{Function, FunctionRegistry, FunctionSignature};
use crate::error::{Error, Result};
use crate::types::{DataType, Value};

pub struct AbsFunction;

impl Function for AbsFunction {
    fn signature(&self) -> &FunctionSignature {
        static SIGNATURE: FunctionSignature = FunctionSignature {
            name: "ABS",
            min_args: 1,
            max_args: Some(1),
            argument_type: Some(DataType::Integer),
            return_type: DataType::Integer,
            is_aggregate: false,
        };
        &SIGNATURE
    }

    fn execute(&self, args: &[Value]) -> Result<Value> {
        match args {
            [Value::Null] => Ok(Value::Null),
            [Value::Integer(n)] => n
                .checked_abs()
                .map(Value::Integer)
                .ok_or_else(|| Error::Validation("integer overflow".into())),
            _ => Err(Error::Validation("ABS expects an INTEGER argument".into())),
        }
    }
}

/// Registers the ABS function.
pub fn register(registry: &mut FunctionRegistry) {
    registry.register(Box::new(AbsFunction));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abs_execute() {
        let func = AbsFunction;
        assert_eq!(
            func.execute(&[Value::Integer(-5)]).unwrap(),
            Value::Integer(5)
        );
        assert_eq!(
            func.execute(&[Value::Integer(5)]).unwrap(),
            Value::Integer(5)
        );
        // NULL propagates.
        assert_eq!(func.execute(&[Value::Null]).unwrap(), Value::Null);
        // Booleans are rejected.
        assert!(func.execute(&[Value::Boolean(true)]).is_err());
    }

    #[test]
    fn test_abs_validate() {
        let func = AbsFunction;
        assert_eq!(
            func.validate(&[DataType::Integer]).unwrap(),
            DataType::Integer
        );
        assert_eq!(
            func.validate(&[DataType::Unknown]).unwrap(),
            DataType::Unknown
        );
        assert!(func.validate(&[DataType::Boolean]).is_err());
        assert!(func.validate(&[]).is_err());
        assert!(func.validate(&[DataType::Integer, DataType::Integer]).is_err());
    }
}
