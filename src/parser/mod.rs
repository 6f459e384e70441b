//! AudioScript Parser Module
//!
//! Parses the token stream into an Abstract Syntax Tree (AST).

mod ast;
mod script_parser;

pub use ast::{
    BinaryOp, ConditionalOp, DeclaredType, Declarations, Expression, ExternalFunctionDeclaration,
    ModuleDeclaration, Program, Statement, StatementList, UnaryOp,
};
pub use script_parser::ScriptParser;
