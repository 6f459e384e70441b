use serde::{Deserialize, Serialize};
use std::fmt;

/// Complete AudioScript program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// Optional `Declarations { ... }` header
    pub declarations: Option<Declarations>,
    /// Top-level statement list
    pub body: StatementList,
}

/// `Declarations { Types: ...; Modules { ... } }`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Declarations {
    /// External type names
    pub types: Vec<DeclaredType>,
    /// Native modules and the functions used from them
    pub modules: Vec<ModuleDeclaration>,
}

/// External type introduced by `Types: name;`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeclaredType {
    /// Type name
    pub name: String,
}

/// `name { ...functions... }` inside `Modules`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleDeclaration {
    /// Native module name
    pub name: String,
    /// Functions taken from the module
    pub functions: Vec<ExternalFunctionDeclaration>,
}

/// `[return-type] name(param-types...);`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalFunctionDeclaration {
    /// Function name, also the native callable's name
    pub name: String,
    /// Declared parameter type names
    pub parameter_types: Vec<String>,
    /// Declared return type name, if any
    pub return_type: Option<String>,
}

/// Ordered list of statements
pub type StatementList = Vec<Statement>;

/// Statements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    /// `{ statements }`, evaluated in a nested scope
    Block(StatementList),

    /// `TYPE a, b, c;`
    VarDeclaration {
        /// Declared type name
        type_name: String,
        /// Declared variable names
        names: Vec<String>,
    },

    /// `def name(params) { body }`
    FunctionDeclaration {
        /// Function name
        name: String,
        /// Parameter names
        params: Vec<String>,
        /// Function body
        body: StatementList,
    },

    /// `name = expr;`
    Assignment {
        /// Variable being assigned
        name: String,
        /// Right-hand side
        value: Expression,
    },

    /// `if cond { ... }`
    If {
        /// Condition expression
        condition: Expression,
        /// Block run when the condition holds
        body: StatementList,
    },

    /// `while cond { ... }`
    While {
        /// Loop condition
        condition: Expression,
        /// Loop body block
        body: StatementList,
    },

    /// `return [expr];`
    Return {
        /// Returned expression
        value: Option<Expression>,
    },

    /// Expression statement (`f(1);`, `x + 1;`)
    Expression(Expression),

    /// Empty statement
    NoOp,
}

/// Expressions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    // Literals
    /// Integer number literal
    IntLiteral(i64),
    /// Floating-point number literal
    FloatLiteral(f64),
    /// String literal
    StringLiteral(String),
    /// `true` / `false`
    BoolLiteral(bool),

    /// Variable reference
    Variable(String),

    /// `name(args...)`
    FunctionCall {
        /// Callee name
        name: String,
        /// Argument expressions
        args: Vec<Expression>,
    },

    /// Arithmetic operation
    Binary {
        /// Operator
        op: BinaryOp,
        /// Left operand
        left: Box<Expression>,
        /// Right operand
        right: Box<Expression>,
    },

    /// Unary sign operation
    Unary {
        /// Operator
        op: UnaryOp,
        /// Operand
        operand: Box<Expression>,
    },

    /// Comparison or boolean connective
    Conditional {
        /// Operator
        op: ConditionalOp,
        /// Left operand
        left: Box<Expression>,
        /// Right operand
        right: Box<Expression>,
    },
}

/// Arithmetic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    /// `+x`
    Plus,
    /// `-x`
    Neg,
}

/// Comparison operators and boolean connectives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionalOp {
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
    /// `and`
    And,
    /// `or`
    Or,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let symbol = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        };
        write!(f, "{}", symbol)
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            UnaryOp::Plus => write!(f, "unary +"),
            UnaryOp::Neg => write!(f, "unary -"),
        }
    }
}

impl fmt::Display for ConditionalOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let symbol = match self {
            ConditionalOp::Eq => "==",
            ConditionalOp::NotEq => "!=",
            ConditionalOp::Lt => "<",
            ConditionalOp::Gt => ">",
            ConditionalOp::LtEq => "<=",
            ConditionalOp::GtEq => ">=",
            ConditionalOp::And => "and",
            ConditionalOp::Or => "or",
        };
        write!(f, "{}", symbol)
    }
}
