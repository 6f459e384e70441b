//! `text` module

use crate::bridge::{string_arg, NativeModule};
use crate::runtime::Value;

/// Builds the `text` module
///
/// `NUMBER length(STRING)` counts characters, not bytes.
pub fn module() -> NativeModule {
    NativeModule::new("text")
        .with_fn("upper", Some(1), |args| {
            Ok(Value::String(string_arg("upper", args, 0)?.to_uppercase()))
        })
        .with_fn("lower", Some(1), |args| {
            Ok(Value::String(string_arg("lower", args, 0)?.to_lowercase()))
        })
        .with_fn("length", Some(1), |args| {
            let count = string_arg("length", args, 0)?.chars().count();
            Ok(Value::Int(count as i64))
        })
        .with_fn("concat", None, |args| {
            let mut out = String::new();
            for index in 0..args.len() {
                out.push_str(string_arg("concat", args, index)?);
            }
            Ok(Value::String(out))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, args: &[Value]) -> Value {
        module().function(name).unwrap().call(args).unwrap()
    }

    #[test]
    fn test_case_conversion() {
        let s = Value::String("Kick".to_string());
        assert_eq!(call("upper", &[s.clone()]), Value::String("KICK".to_string()));
        assert_eq!(call("lower", &[s]), Value::String("kick".to_string()));
    }

    #[test]
    fn test_length_counts_chars() {
        assert_eq!(call("length", &[Value::String("héllo".to_string())]), Value::Int(5));
    }

    #[test]
    fn test_concat_is_variadic() {
        let args = [
            Value::String("a".to_string()),
            Value::String("b".to_string()),
            Value::String("c".to_string()),
        ];
        assert_eq!(call("concat", &args), Value::String("abc".to_string()));
        assert_eq!(call("concat", &[]), Value::String(String::new()));
        assert_eq!(module().function("concat").unwrap().arity(), None);
    }
}
