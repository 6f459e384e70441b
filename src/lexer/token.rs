use serde::{Deserialize, Serialize};
use std::fmt;

/// A single token from the source code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// The type of token
    pub kind: TokenKind,
    /// Original text of the token
    pub lexeme: String,
    /// Line number where token appears (1-indexed)
    pub line: usize,
    /// Column number where token starts (1-indexed)
    pub column: usize,
}

impl Token {
    /// Creates a new token with the given properties
    pub fn new(kind: TokenKind, lexeme: String, line: usize, column: usize) -> Self {
        Token {
            kind,
            lexeme,
            line,
            column,
        }
    }
}

/// All possible token types in AudioScript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TokenKind {
    // Literals
    /// Integer literal
    Integer(i64),
    /// Floating-point literal
    Float(f64),
    /// String literal (quotes and escapes already processed)
    String(String),
    /// `true`
    True,
    /// `false`
    False,

    /// Identifier
    Identifier(String),
    /// Builtin type keyword, normalized to upper case (`NUMBER`, `STRING`, `VAR`)
    TypeName(String),

    // Keywords
    /// `def`
    Def,
    /// `return`
    Return,
    /// `if`
    If,
    /// `while`
    While,
    /// `and`
    And,
    /// `or`
    Or,
    /// `Declarations`
    Declarations,
    /// `Types`
    Types,
    /// `Modules`
    Modules,

    // Operators
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `=`
    Assign,
    /// `==`
    Eq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    LtEq,
    /// `>=`
    GtEq,

    // Delimiters
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `{`
    LeftBrace,
    /// `}`
    RightBrace,
    /// `;`
    Semicolon,
    /// `,`
    Comma,
    /// `:`
    Colon,

    /// End of input
    Eof,
}

impl TokenKind {
    /// Maps a word to its keyword token, if it is one
    pub fn keyword(word: &str) -> Option<TokenKind> {
        let kind = match word {
            "def" => TokenKind::Def,
            "return" => TokenKind::Return,
            "if" => TokenKind::If,
            "while" => TokenKind::While,
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "Declarations" => TokenKind::Declarations,
            "Types" => TokenKind::Types,
            "Modules" => TokenKind::Modules,
            _ => match word.to_ascii_uppercase().as_str() {
                "NUMBER" => TokenKind::TypeName("NUMBER".to_string()),
                "STRING" => TokenKind::TypeName("STRING".to_string()),
                "VAR" => TokenKind::TypeName("VAR".to_string()),
                _ => return None,
            },
        };
        Some(kind)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TokenKind::Integer(n) => write!(f, "number {}", n),
            TokenKind::Float(n) => write!(f, "number {}", n),
            TokenKind::String(s) => write!(f, "string \"{}\"", s),
            TokenKind::True => write!(f, "'true'"),
            TokenKind::False => write!(f, "'false'"),
            TokenKind::Identifier(name) => write!(f, "identifier '{}'", name),
            TokenKind::TypeName(name) => write!(f, "type '{}'", name),
            TokenKind::Def => write!(f, "'def'"),
            TokenKind::Return => write!(f, "'return'"),
            TokenKind::If => write!(f, "'if'"),
            TokenKind::While => write!(f, "'while'"),
            TokenKind::And => write!(f, "'and'"),
            TokenKind::Or => write!(f, "'or'"),
            TokenKind::Declarations => write!(f, "'Declarations'"),
            TokenKind::Types => write!(f, "'Types'"),
            TokenKind::Modules => write!(f, "'Modules'"),
            TokenKind::Plus => write!(f, "'+'"),
            TokenKind::Minus => write!(f, "'-'"),
            TokenKind::Star => write!(f, "'*'"),
            TokenKind::Slash => write!(f, "'/'"),
            TokenKind::Assign => write!(f, "'='"),
            TokenKind::Eq => write!(f, "'=='"),
            TokenKind::NotEq => write!(f, "'!='"),
            TokenKind::Lt => write!(f, "'<'"),
            TokenKind::Gt => write!(f, "'>'"),
            TokenKind::LtEq => write!(f, "'<='"),
            TokenKind::GtEq => write!(f, "'>='"),
            TokenKind::LeftParen => write!(f, "'('"),
            TokenKind::RightParen => write!(f, "')'"),
            TokenKind::LeftBrace => write!(f, "'{{'"),
            TokenKind::RightBrace => write!(f, "'}}'"),
            TokenKind::Semicolon => write!(f, "';'"),
            TokenKind::Comma => write!(f, "','"),
            TokenKind::Colon => write!(f, "':'"),
            TokenKind::Eof => write!(f, "end of input"),
        }
    }
}
