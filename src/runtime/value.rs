use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Runtime value representation
#[derive(Debug, Clone)]
pub enum Value {
    /// Null value (result of a call that returned nothing)
    Null,
    /// Boolean value produced by comparisons and connectives
    Bool(bool),
    /// 64-bit integer value
    Int(i64),
    /// 64-bit floating-point value
    Float(f64),
    /// String value
    String(String),
    /// Opaque value handed out by a native function
    Native(NativeHandle),
}

/// Reference-counted opaque payload of a [`Value::Native`]
///
/// Native modules use these to pass values of declared external types (`Types: Sound;`)
/// through scripts without the evaluator knowing their layout.
#[derive(Clone)]
pub struct NativeHandle(Arc<dyn Any + Send + Sync>);

impl NativeHandle {
    /// Wraps a native payload
    pub fn new<T: Any + Send + Sync>(payload: T) -> Self {
        NativeHandle(Arc::new(payload))
    }

    /// Borrows the payload if it has type `T`
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl fmt::Debug for NativeHandle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "NativeHandle({:p})", Arc::as_ptr(&self.0))
    }
}

impl Value {
    /// Returns the value kind as a string
    pub fn type_name(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(_) => "bool".to_string(),
            Value::Int(_) => "int".to_string(),
            Value::Float(_) => "float".to_string(),
            Value::String(_) => "string".to_string(),
            Value::Native(_) => "native".to_string(),
        }
    }

    /// Returns true for `Int` and `Float`
    pub fn is_number(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    /// Returns true if the value is truthy in a boolean context
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(f) => *f != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Native(_) => true,
        }
    }

    /// Converts value to a 64-bit integer
    pub fn as_int(&self) -> Result<i64> {
        match self {
            Value::Int(n) => Ok(*n),
            Value::Float(f) => Ok(*f as i64),
            _ => Err(Error::TypeMismatch {
                name: "value".to_string(),
                expected: "NUMBER".to_string(),
                got: self.type_name(),
            }),
        }
    }

    /// Converts value to a 64-bit floating-point number
    pub fn as_float(&self) -> Result<f64> {
        match self {
            Value::Float(f) => Ok(*f),
            Value::Int(n) => Ok(*n as f64),
            _ => Err(Error::TypeMismatch {
                name: "value".to_string(),
                expected: "NUMBER".to_string(),
                got: self.type_name(),
            }),
        }
    }

    /// Returns a reference to the string value
    pub fn as_string(&self) -> Result<&str> {
        match self {
            Value::String(s) => Ok(s),
            _ => Err(Error::TypeMismatch {
                name: "value".to_string(),
                expected: "STRING".to_string(),
                got: self.type_name(),
            }),
        }
    }

    /// The type a value carries when it is produced without a declaration
    pub fn natural_type(&self) -> Type {
        match self {
            Value::Int(_) | Value::Float(_) => Type::Number,
            Value::String(_) => Type::String,
            Value::Null => Type::Null,
            Value::Bool(_) | Value::Native(_) => Type::Var,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(fl) => write!(f, "{}", fl),
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::Native(_) => write!(f, "<native>"),
        }
    }
}

// Numbers compare by value across Int/Float; native handles by identity
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                (*a as f64) == *b
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Native(a), Value::Native(b)) => Arc::ptr_eq(&a.0, &b.0),
            _ => false,
        }
    }
}

/// Declared type of a variable, parameter or return value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    /// `NUMBER`, integers and floats
    Number,
    /// `STRING`
    String,
    /// `VAR`, accepts any value
    Var,
    /// Type of an absent result (external function without a return type)
    Null,
    /// External type introduced by `Types: name;`
    Named(String),
}

impl Type {
    /// Resolves a type name; builtin names are case-insensitive
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_uppercase().as_str() {
            "NUMBER" => Type::Number,
            "STRING" => Type::String,
            "VAR" => Type::Var,
            _ => Type::Named(name.to_string()),
        }
    }

    /// Canonical type name
    pub fn name(&self) -> &str {
        match self {
            Type::Number => "NUMBER",
            Type::String => "STRING",
            Type::Var => "VAR",
            Type::Null => "NULL",
            Type::Named(name) => name,
        }
    }

    /// Whether a value may be stored in, or passed as, something of this type
    ///
    /// `NUMBER` and `STRING` look at the runtime value; declared external types
    /// require the value to carry exactly that type name.
    pub fn accepts(&self, value: &TypedValue) -> bool {
        match self {
            Type::Var => true,
            Type::Number => value.value.is_number(),
            Type::String => matches!(value.value, Value::String(_)),
            Type::Null => matches!(value.value, Value::Null),
            Type::Named(name) => matches!(&value.ty, Type::Named(other) if other == name),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A value paired with the type it was produced or stored under
#[derive(Debug, Clone, PartialEq)]
pub struct TypedValue {
    /// Type the value carries
    pub ty: Type,
    /// The runtime value
    pub value: Value,
}

impl TypedValue {
    /// Pairs a value with a type
    pub fn new(ty: Type, value: Value) -> Self {
        TypedValue { ty, value }
    }

    /// Wraps a value under its natural type
    pub fn from_value(value: Value) -> Self {
        TypedValue {
            ty: value.natural_type(),
            value,
        }
    }

    /// The absent result of a call
    pub fn null() -> Self {
        TypedValue::new(Type::Null, Value::Null)
    }

    /// Integer `NUMBER`
    pub fn int(n: i64) -> Self {
        TypedValue::new(Type::Number, Value::Int(n))
    }

    /// Float `NUMBER`
    pub fn float(f: f64) -> Self {
        TypedValue::new(Type::Number, Value::Float(f))
    }

    /// `STRING`
    pub fn string(s: impl Into<String>) -> Self {
        TypedValue::new(Type::String, Value::String(s.into()))
    }

    /// Boolean, typed `VAR`
    pub fn boolean(b: bool) -> Self {
        TypedValue::new(Type::Var, Value::Bool(b))
    }

    /// Name used for this value in type errors
    pub fn type_label(&self) -> String {
        match (&self.ty, &self.value) {
            (Type::Named(name), _) => name.clone(),
            (_, Value::Int(_)) | (_, Value::Float(_)) => "NUMBER".to_string(),
            (_, Value::String(_)) => "STRING".to_string(),
            (_, Value::Null) => "NULL".to_string(),
            (_, Value::Bool(_)) => "BOOL".to_string(),
            (_, Value::Native(_)) => "VAR".to_string(),
        }
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names() {
        assert_eq!(Value::Null.type_name(), "null");
        assert_eq!(Value::Bool(true).type_name(), "bool");
        assert_eq!(Value::Int(42).type_name(), "int");
        assert_eq!(Value::Float(2.71).type_name(), "float");
        assert_eq!(Value::String("test".to_string()).type_name(), "string");
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(Value::Bool(true).is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(Value::Int(42).is_truthy());
        assert!(!Value::String(String::new()).is_truthy());
        assert!(Value::String("test".to_string()).is_truthy());
    }

    #[test]
    fn test_numeric_equality_across_kinds() {
        assert_eq!(Value::Int(3), Value::Float(3.0));
        assert_ne!(Value::Int(3), Value::String("3".to_string()));
    }

    #[test]
    fn test_type_from_name() {
        assert_eq!(Type::from_name("number"), Type::Number);
        assert_eq!(Type::from_name("VAR"), Type::Var);
        assert_eq!(Type::from_name("Sound"), Type::Named("Sound".to_string()));
        assert_eq!(Type::Named("Sound".to_string()).name(), "Sound");
    }

    #[test]
    fn test_type_accepts() {
        assert!(Type::Number.accepts(&TypedValue::float(1.5)));
        assert!(!Type::Number.accepts(&TypedValue::string("1.5")));
        assert!(Type::String.accepts(&TypedValue::string("x")));
        assert!(Type::Var.accepts(&TypedValue::boolean(true)));

        let sound = Type::Named("Sound".to_string());
        let handle = TypedValue::new(sound.clone(), Value::Native(NativeHandle::new(7u32)));
        assert!(sound.accepts(&handle));
        assert!(!sound.accepts(&TypedValue::int(7)));
        assert!(!Type::Named("Track".to_string()).accepts(&handle));
    }

    #[test]
    fn test_native_handle_identity() {
        let handle = NativeHandle::new(String::from("payload"));
        let same = Value::Native(handle.clone());
        let other = Value::Native(NativeHandle::new(String::from("payload")));
        assert_eq!(same, Value::Native(handle.clone()));
        assert_ne!(same, other);
        assert_eq!(
            handle.downcast_ref::<String>().map(String::as_str),
            Some("payload")
        );
    }
}
