//! Lexical analysis for AudioScript
//!
//! Converts source text into a stream of tokens.

mod script_scanner;
mod token;

pub use script_scanner::ScriptScanner;
pub use token::{Token, TokenKind};
