//! `math` module

use crate::bridge::{native_error, number_arg, NativeFunction, NativeModule};
use crate::error::Result;
use crate::runtime::Value;

/// Builds the `math` module
pub fn module() -> NativeModule {
    let mut module = NativeModule::new("math");
    module.register(SqrtFn);
    module.register(PowFn);
    module.register(AbsFn);
    module.register(FloorFn);
    module
}

/// Square root
///
/// Declared as `NUMBER sqrtFn(NUMBER);`
pub struct SqrtFn;

impl NativeFunction for SqrtFn {
    fn name(&self) -> &str {
        "sqrtFn"
    }

    fn description(&self) -> &str {
        "Square root"
    }

    fn call(&self, args: &[Value]) -> Result<Value> {
        let x = number_arg(self.name(), args, 0)?;
        if x < 0.0 {
            return Err(native_error(
                self.name(),
                format!("square root of negative number {}", x),
            ));
        }
        Ok(Value::Float(x.sqrt()))
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }
}

/// `base` raised to `exponent`
///
/// Declared as `NUMBER powFn(NUMBER, NUMBER);`
pub struct PowFn;

impl NativeFunction for PowFn {
    fn name(&self) -> &str {
        "powFn"
    }

    fn description(&self) -> &str {
        "Power"
    }

    fn call(&self, args: &[Value]) -> Result<Value> {
        let base = number_arg(self.name(), args, 0)?;
        let exponent = number_arg(self.name(), args, 1)?;
        Ok(Value::Float(base.powf(exponent)))
    }

    fn arity(&self) -> Option<usize> {
        Some(2)
    }
}

/// Absolute value; integers stay integers
pub struct AbsFn;

impl NativeFunction for AbsFn {
    fn name(&self) -> &str {
        "absFn"
    }

    fn description(&self) -> &str {
        "Absolute value"
    }

    fn call(&self, args: &[Value]) -> Result<Value> {
        match args.first() {
            Some(Value::Int(n)) => n
                .checked_abs()
                .map(Value::Int)
                .ok_or_else(|| native_error(self.name(), "integer overflow")),
            _ => Ok(Value::Float(number_arg(self.name(), args, 0)?.abs())),
        }
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }
}

/// Largest integer not greater than the argument
pub struct FloorFn;

impl NativeFunction for FloorFn {
    fn name(&self) -> &str {
        "floorFn"
    }

    fn description(&self) -> &str {
        "Floor"
    }

    fn call(&self, args: &[Value]) -> Result<Value> {
        match args.first() {
            Some(Value::Int(n)) => Ok(Value::Int(*n)),
            _ => {
                let floored = number_arg(self.name(), args, 0)?.floor();
                if floored.is_finite() && floored.abs() < i64::MAX as f64 {
                    Ok(Value::Int(floored as i64))
                } else {
                    Ok(Value::Float(floored))
                }
            }
        }
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }
}
