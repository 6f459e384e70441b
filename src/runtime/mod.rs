//! Runtime execution for AudioScript programs

pub mod config;
pub mod environment;
mod evaluator;
pub mod operators;
pub mod symbol;
mod value;

pub use config::EvaluatorConfig;
pub use environment::{Environment, Scope, ScopeId, ScopeKind};
pub use evaluator::{Evaluator, Execution};
pub use symbol::{BuiltinTypeSymbol, ExternalFunctionSymbol, FunctionSymbol, Symbol, VarSymbol};
pub use value::{NativeHandle, Type, TypedValue, Value};
