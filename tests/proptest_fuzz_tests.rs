//! Property-based tests for the AudioScript front end and evaluator
//!
//! These tests use proptest to generate random inputs and verify that:
//! 1. The scanner and parser never panic on arbitrary input
//! 2. Integer arithmetic agrees with Rust's checked arithmetic
//! 3. Sequencing statements does not change their individual results

use audioscript::{Evaluator, Execution, Parser, Result, Scanner, TypedValue, Value};
use proptest::prelude::*;

fn execute(source: &str) -> Result<Execution> {
    let tokens = Scanner::new(source).scan_tokens()?;
    let program = Parser::new(tokens).parse()?;
    Evaluator::new().execute(&program)
}

// =============================================================================
// STRATEGY GENERATORS
// =============================================================================

/// Generate random strings that might break the scanner
fn arbitrary_source_string() -> impl Strategy<Value = String> {
    prop::string::string_regex(r"[\x00-\x7F]{0,300}").unwrap()
}

/// Generate token soup built from the language's own vocabulary
fn token_soup() -> impl Strategy<Value = String> {
    prop::collection::vec(script_token(), 0..60).prop_map(|tokens| tokens.join(" "))
}

fn script_token() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("{".to_string()),
        Just("}".to_string()),
        Just("(".to_string()),
        Just(")".to_string()),
        Just(";".to_string()),
        Just(",".to_string()),
        Just("=".to_string()),
        Just("def".to_string()),
        Just("return".to_string()),
        Just("if".to_string()),
        Just("while".to_string()),
        Just("VAR".to_string()),
        Just("NUMBER".to_string()),
        Just("Declarations".to_string()),
        Just("Modules".to_string()),
        Just("+".to_string()),
        Just("*".to_string()),
        Just("<=".to_string()),
        Just("and".to_string()),
        (-1000i64..1000i64).prop_map(|n| n.to_string()),
        "'[a-z ]{0,8}'".prop_map(|s| s),
        "[a-z][a-z0-9_]{0,6}".prop_map(|s| s),
    ]
}

/// Arithmetic statement over small integers, paired with its checked value
fn arith_statement() -> impl Strategy<Value = (String, Option<i64>)> {
    let op = prop_oneof![Just('+'), Just('-'), Just('*')];
    (-10_000i64..10_000, op, -10_000i64..10_000).prop_map(|(a, op, b)| {
        let expected = match op {
            '+' => a.checked_add(b),
            '-' => a.checked_sub(b),
            _ => a.checked_mul(b),
        };
        (format!("({}) {} ({});", a, op, b), expected)
    })
}

// =============================================================================
// FRONT END
// =============================================================================

proptest! {
    /// The scanner should never panic on arbitrary input
    #[test]
    fn scanner_never_panics(source in arbitrary_source_string()) {
        let mut scanner = Scanner::new(&source);
        let _ = scanner.scan_tokens();
    }

    /// The parser should never panic when given valid tokens
    #[test]
    fn parser_never_panics_on_token_soup(source in token_soup()) {
        if let Ok(tokens) = Scanner::new(&source).scan_tokens() {
            let _ = Parser::new(tokens).parse();
        }
    }

    /// Parser handles deeply nested blocks and parentheses
    #[test]
    fn parser_handles_deep_nesting(depth in 1usize..64) {
        let source = format!(
            "{}{}1{};{}",
            "{".repeat(depth),
            "(".repeat(depth),
            ")".repeat(depth),
            "}".repeat(depth)
        );
        let tokens = Scanner::new(&source).scan_tokens().unwrap();
        prop_assert!(Parser::new(tokens).parse().is_ok());
    }
}

// =============================================================================
// EVALUATOR
// =============================================================================

proptest! {
    /// Integer arithmetic matches checked i64 arithmetic
    #[test]
    fn arithmetic_matches_checked_i64((statement, expected) in arith_statement()) {
        let result = execute(&statement);
        match expected {
            Some(n) => prop_assert_eq!(result.unwrap().results, vec![TypedValue::int(n)]),
            None => prop_assert!(result.is_err()),
        }
    }

    /// A sequence of statements yields the same results as each statement alone
    #[test]
    fn sequence_equals_independent_statements(
        statements in prop::collection::vec(arith_statement(), 1..8)
    ) {
        let source: String = statements.iter().map(|(s, _)| s.as_str()).collect();
        let together = execute(&source).unwrap().results;
        let separately: Vec<TypedValue> = statements
            .iter()
            .flat_map(|(s, _)| execute(s).unwrap().results)
            .collect();
        prop_assert_eq!(together, separately);
    }

    /// Division yields a number whose product with the divisor gives back the dividend
    #[test]
    fn division_inverts_multiplication(a in -1000i64..1000, b in 1i64..100) {
        let execution = execute(&format!("VAR q; q = ({}) / {};", a, b)).unwrap();
        let q = execution.global("q").unwrap().value.as_float().unwrap();
        prop_assert!((q * b as f64 - a as f64).abs() < 1e-9);
    }

    /// Any value can be stored in a VAR variable
    #[test]
    fn var_accepts_any_literal(n in any::<i32>(), s in "[a-z]{0,10}", flag in any::<bool>()) {
        let source = format!("VAR v; v = {}; v = '{}'; v = {};", n, s, flag);
        let execution = execute(&source).unwrap();
        prop_assert_eq!(
            execution.global("v").map(|v| v.value.clone()),
            Some(Value::Bool(flag))
        );
    }

    /// Names declared in a block never survive the block
    #[test]
    fn block_locals_do_not_escape(name in "[a-z][a-z0-9]{0,6}") {
        prop_assume!(!["def", "if", "while", "and", "or", "var", "return", "true", "false", "number", "string"].contains(&name.as_str()));
        let source = format!("{{ VAR {0}; {0} = 1; }} {0};", name);
        prop_assert!(execute(&source).is_err());
    }
}
