//! # AudioScript
//!
//! A tree-walking interpreter for AudioScript, a small imperative scripting
//! language with typed variables, user functions and native modules.
//!
//! ## Quick Start
//!
//! ```rust
//! use audioscript::{Evaluator, Parser, Scanner, TypedValue};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let code = r#"
//!     VAR total, i;
//!     total = 0;
//!     i = 1;
//!     while i <= 10 {
//!         total = total + i;
//!         i = i + 1;
//!     }
//!     total;
//! "#;
//!
//! // Tokenize (scan)
//! let mut scanner = Scanner::new(code);
//! let tokens = scanner.scan_tokens()?;
//!
//! // Parse into AST
//! let mut parser = Parser::new(tokens);
//! let program = parser.parse()?;
//!
//! // Execute
//! let mut evaluator = Evaluator::new();
//! let execution = evaluator.execute(&program)?;
//!
//! assert_eq!(execution.last(), Some(&TypedValue::int(55)));
//! # Ok(())
//! # }
//! ```
//!
//! ## Language Overview
//!
//! ### Types
//!
//! - `NUMBER` - integers and floats
//! - `STRING` - text
//! - `VAR` - untyped, holds anything
//! - external types declared in the `Declarations` header (`Types: Sound;`)
//!
//! Variables are declared before use (`NUMBER x, y;`) and keep their declared
//! type; assigning an incompatible value is an error.
//!
//! ### Control Flow
//!
//! - `if cond { ... }` - run a block at most once
//! - `while cond { ... }` - loop while the condition holds
//! - `def name(a, b) { ... return a; }` - user functions, evaluated in a scope
//!   nested in the scope they were declared in
//!
//! ### Native Modules
//!
//! A program lists the native functions it uses, with their signatures:
//!
//! ```rust
//! # use audioscript::{Evaluator, Parser, Scanner, TypedValue};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let code = r#"
//!     Declarations {
//!         Modules {
//!             math { NUMBER sqrtFn(NUMBER); }
//!         }
//!     }
//!     NUMBER r;
//!     r = sqrtFn(9);
//! "#;
//! let program = Parser::new(Scanner::new(code).scan_tokens()?).parse()?;
//! let execution = Evaluator::new().execute(&program)?;
//! assert_eq!(execution.global("r"), Some(&TypedValue::int(3)));
//! # Ok(())
//! # }
//! ```
//!
//! Modules are looked up through a [`ModuleResolver`]; [`ModuleRegistry::new`]
//! carries the bundled `math` and `text` modules, and embedders register their
//! own [`NativeModule`]s.
//!
//! ## Architecture
//!
//! ```text
//! Source Code → Scanner → Tokens → Parser → AST → Evaluator → Execution
//! ```
//!
//! - [`Scanner`] - Tokenizes source code into tokens
//! - [`Parser`] - Parses tokens into an AST ([`Program`])
//! - [`Evaluator`] - Executes the AST and reports an [`Execution`]
//! - [`Environment`] - Scope chain holding the bound [`Symbol`]s
//! - [`ModuleRegistry`] - Native modules
//!
//! The AST is plain data and derives `serde`, so an embedder can also build it
//! by hand or load it from JSON instead of parsing source text.
//!
//! ## Error Handling
//!
//! Every error is fatal; evaluation stops at the first one:
//!
//! ```rust
//! # use audioscript::{Evaluator, Parser, Scanner, ErrorKind};
//! let code = "VAR x; x = 10 / 0;";
//!
//! let tokens = Scanner::new(code).scan_tokens().unwrap();
//! let program = Parser::new(tokens).parse().unwrap();
//! let mut evaluator = Evaluator::new();
//!
//! match evaluator.execute(&program) {
//!     Ok(_) => panic!("Should have failed"),
//!     Err(e) => {
//!         assert_eq!(e.kind(), ErrorKind::Arithmetic);
//!         assert!(e.to_string().contains("division by zero"));
//!     }
//! }
//! ```

/// Version of the AudioScript interpreter
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod bridge;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod runtime;

// Re-export main types
pub use bridge::{ModuleRegistry, ModuleResolver, NativeFunction, NativeModule};
pub use error::{Error, ErrorKind, Result};
pub use lexer::{ScriptScanner, Token, TokenKind};
pub use parser::{
    BinaryOp, ConditionalOp, Expression, Program, ScriptParser, Statement, UnaryOp,
};
pub use runtime::{
    Environment, Evaluator, EvaluatorConfig, Execution, Symbol, Type, TypedValue, Value,
};

/// Type alias for the AudioScript scanner (lexer).
/// Converts raw source text into tokens for the parser.
pub type Scanner = ScriptScanner;

/// Type alias for the AudioScript parser.
/// Converts tokens into an abstract syntax tree (AST).
pub type Parser = ScriptParser;
