//! Arithmetic and comparison on typed values
//!
//! The evaluator short-circuits `and`/`or` itself; [`compare`] only combines
//! operands that were both evaluated.

use std::cmp::Ordering;

use crate::error::{Error, Result};
use crate::parser::{BinaryOp, ConditionalOp, UnaryOp};
use crate::runtime::{TypedValue, Value};

/// Applies `+ - * /`
///
/// `+` also concatenates two strings. Integer arithmetic is checked; `/`
/// stays integral when the division is exact and produces a float otherwise.
pub fn binary(op: BinaryOp, left: &TypedValue, right: &TypedValue) -> Result<TypedValue> {
    match (op, &left.value, &right.value) {
        (BinaryOp::Add, Value::String(a), Value::String(b)) => {
            Ok(TypedValue::string(format!("{}{}", a, b)))
        }
        (_, Value::Int(a), Value::Int(b)) => integer(op, *a, *b),
        (_, l, r) if l.is_number() && r.is_number() => float(op, l.as_float()?, r.as_float()?),
        _ => Err(Error::TypeMismatch {
            name: op.to_string(),
            expected: match op {
                BinaryOp::Add => "NUMBER or STRING operands".to_string(),
                _ => "NUMBER operands".to_string(),
            },
            got: format!("{} and {}", left.type_label(), right.type_label()),
        }),
    }
}

fn integer(op: BinaryOp, a: i64, b: i64) -> Result<TypedValue> {
    let overflow = || Error::arithmetic(format!("integer overflow in {} {} {}", a, op, b));
    let result = match op {
        BinaryOp::Add => a.checked_add(b).ok_or_else(overflow)?,
        BinaryOp::Sub => a.checked_sub(b).ok_or_else(overflow)?,
        BinaryOp::Mul => a.checked_mul(b).ok_or_else(overflow)?,
        BinaryOp::Div => {
            if b == 0 {
                return Err(Error::arithmetic("division by zero"));
            }
            match a.checked_rem(b) {
                Some(0) => a.checked_div(b).ok_or_else(overflow)?,
                Some(_) => return Ok(TypedValue::float(a as f64 / b as f64)),
                None => return Err(overflow()),
            }
        }
    };
    Ok(TypedValue::int(result))
}

fn float(op: BinaryOp, a: f64, b: f64) -> Result<TypedValue> {
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => {
            if b == 0.0 {
                return Err(Error::arithmetic("division by zero"));
            }
            a / b
        }
    };
    Ok(TypedValue::float(result))
}

/// Applies unary `+`/`-` to a number
pub fn unary(op: UnaryOp, operand: &TypedValue) -> Result<TypedValue> {
    match (op, &operand.value) {
        (UnaryOp::Plus, Value::Int(n)) => Ok(TypedValue::int(*n)),
        (UnaryOp::Plus, Value::Float(f)) => Ok(TypedValue::float(*f)),
        (UnaryOp::Neg, Value::Int(n)) => n
            .checked_neg()
            .map(TypedValue::int)
            .ok_or_else(|| Error::arithmetic(format!("integer overflow in -{}", n))),
        (UnaryOp::Neg, Value::Float(f)) => Ok(TypedValue::float(-f)),
        _ => Err(Error::TypeMismatch {
            name: op.to_string(),
            expected: "NUMBER operand".to_string(),
            got: operand.type_label(),
        }),
    }
}

/// Applies `== != < > <= >=`, producing a boolean
///
/// Equality is defined for any pair of values. Ordering needs two numbers or
/// two strings.
pub fn compare(op: ConditionalOp, left: &TypedValue, right: &TypedValue) -> Result<TypedValue> {
    let result = match op {
        ConditionalOp::Eq => left.value == right.value,
        ConditionalOp::NotEq => left.value != right.value,
        ConditionalOp::Lt | ConditionalOp::Gt | ConditionalOp::LtEq | ConditionalOp::GtEq => {
            match ordering(op, left, right)? {
                // NaN is unordered with everything
                None => false,
                Some(ord) => match op {
                    ConditionalOp::Lt => ord == Ordering::Less,
                    ConditionalOp::Gt => ord == Ordering::Greater,
                    ConditionalOp::LtEq => ord != Ordering::Greater,
                    _ => ord != Ordering::Less,
                },
            }
        }
        ConditionalOp::And => left.value.is_truthy() && right.value.is_truthy(),
        ConditionalOp::Or => left.value.is_truthy() || right.value.is_truthy(),
    };
    Ok(TypedValue::boolean(result))
}

fn ordering(op: ConditionalOp, left: &TypedValue, right: &TypedValue) -> Result<Option<Ordering>> {
    match (&left.value, &right.value) {
        (Value::Int(a), Value::Int(b)) => Ok(Some(a.cmp(b))),
        (Value::String(a), Value::String(b)) => Ok(Some(a.cmp(b))),
        (l, r) if l.is_number() && r.is_number() => Ok(l.as_float()?.partial_cmp(&r.as_float()?)),
        _ => Err(Error::TypeMismatch {
            name: op.to_string(),
            expected: "two NUMBER or two STRING operands".to_string(),
            got: format!("{} and {}", left.type_label(), right.type_label()),
        }),
    }
}
