//! Programs built without the front end: hand-made ASTs and JSON interchange
use audioscript::parser::{Declarations, ExternalFunctionDeclaration, ModuleDeclaration};
use audioscript::{
    BinaryOp, Evaluator, Expression, Parser, Program, Scanner, Statement, TypedValue,
};

fn var(name: &str) -> Box<Expression> {
    Box::new(Expression::Variable(name.to_string()))
}

#[test]
fn test_hand_built_program() {
    // def add(a, b) { return a + b; } VAR r; r = add(2, 3);
    let program = Program {
        declarations: None,
        body: vec![
            Statement::FunctionDeclaration {
                name: "add".to_string(),
                params: vec!["a".to_string(), "b".to_string()],
                body: vec![Statement::Return {
                    value: Some(Expression::Binary {
                        op: BinaryOp::Add,
                        left: var("a"),
                        right: var("b"),
                    }),
                }],
            },
            Statement::VarDeclaration {
                type_name: "VAR".to_string(),
                names: vec!["r".to_string()],
            },
            Statement::Assignment {
                name: "r".to_string(),
                value: Expression::FunctionCall {
                    name: "add".to_string(),
                    args: vec![Expression::IntLiteral(2), Expression::IntLiteral(3)],
                },
            },
        ],
    };

    let execution = Evaluator::new().execute(&program).unwrap();
    assert_eq!(execution.global("r"), Some(&TypedValue::int(5)));
}

#[test]
fn test_parsed_program_survives_json() {
    let source = include_str!("../demos/scripts/modules.as");
    let tokens = Scanner::new(source).scan_tokens().unwrap();
    let program = Parser::new(tokens).parse().unwrap();

    let json = serde_json::to_string(&program).unwrap();
    let decoded: Program = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded, program);

    let direct = Evaluator::new().execute(&program).unwrap();
    let via_json = Evaluator::new().execute(&decoded).unwrap();
    assert_eq!(direct, via_json);
}

#[test]
fn test_json_program_with_declarations() {
    let json = r#"{
        "declarations": {
            "types": [],
            "modules": [{
                "name": "math",
                "functions": [{
                    "name": "sqrtFn",
                    "parameter_types": ["NUMBER"],
                    "return_type": "NUMBER"
                }]
            }]
        },
        "body": [
            {"Expression": {"FunctionCall": {"name": "sqrtFn", "args": [{"IntLiteral": 16}]}}}
        ]
    }"#;
    let program: Program = serde_json::from_str(json).unwrap();
    assert_eq!(
        program.declarations,
        Some(Declarations {
            types: vec![],
            modules: vec![ModuleDeclaration {
                name: "math".to_string(),
                functions: vec![ExternalFunctionDeclaration {
                    name: "sqrtFn".to_string(),
                    parameter_types: vec!["NUMBER".to_string()],
                    return_type: Some("NUMBER".to_string()),
                }],
            }],
        })
    );

    let execution = Evaluator::new().execute(&program).unwrap();
    assert_eq!(execution.last(), Some(&TypedValue::int(4)));
}

#[test]
fn test_evaluator_is_reusable_across_programs() {
    let first = Parser::new(Scanner::new("VAR x; x = 1;").scan_tokens().unwrap())
        .parse()
        .unwrap();
    let second = Parser::new(Scanner::new("x;").scan_tokens().unwrap())
        .parse()
        .unwrap();

    let mut evaluator = Evaluator::new();
    evaluator.execute(&first).unwrap();
    // globals do not outlive their program
    assert!(evaluator.execute(&second).is_err());
    assert!(evaluator.execute(&first).is_ok());
}
