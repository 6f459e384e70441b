//! Error types for the AudioScript interpreter

use thiserror::Error;

/// AudioScript interpreter errors
///
/// Every variant is fatal: evaluation stops at the first error and the error is
/// handed back to the embedder unchanged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // Front-end errors
    /// Syntax error encountered while scanning or parsing
    ///
    /// **Triggered by:** Invalid characters, unterminated strings, malformed statements
    /// **Example:** `x = 3` (missing `;`)
    #[error("Syntax error at line {line}, column {col}: {message}")]
    SyntaxError {
        /// Line number where error occurred
        line: usize,
        /// Column number where error occurred
        col: usize,
        /// Error description
        message: String,
    },

    /// Unexpected token encountered during parsing
    #[error("Unexpected token at line {line}: expected {expected}, got {got}")]
    UnexpectedToken {
        /// Line number of the offending token
        line: usize,
        /// Expected token description
        expected: String,
        /// Actual token received
        got: String,
    },

    /// Unexpected end of file during parsing
    #[error("Unexpected end of file")]
    UnexpectedEof,

    // Name resolution
    /// Reference to a name that is not bound in any enclosing scope
    ///
    /// **Triggered by:** Reading, assigning or calling a name that was never declared,
    /// or that was declared in a block that has already ended
    /// **Example:** `{ var y; } y = 1;`
    #[error("Undefined identifier: {name}")]
    UndefinedIdentifier {
        /// Identifier name
        name: String,
    },

    /// Name already bound in the current scope
    ///
    /// **Triggered by:** Declaring a variable, function, type or external function twice
    /// in the same scope
    /// **Example:** `var x; var x;`
    #[error("Duplicate declaration: {name}")]
    DuplicateDeclaration {
        /// Identifier name
        name: String,
    },

    /// Variable read before its first assignment
    #[error("Variable used before assignment: {name}")]
    UnassignedVariable {
        /// Variable name
        name: String,
    },

    // Type errors
    /// Value incompatible with the declared type of a variable or with an operator
    ///
    /// **Triggered by:** `NUMBER x; x = "text";`, `"a" - 1`, `-"a"`
    #[error("Type mismatch for {name}: expected {expected}, got {got}")]
    TypeMismatch {
        /// Variable name or operator
        name: String,
        /// Expected type
        expected: String,
        /// Actual type
        got: String,
    },

    /// Call argument incompatible with the declared parameter type
    ///
    /// **Triggered by:** `sqrtFn("nine")` when `sqrtFn` is declared `NUMBER sqrtFn(NUMBER);`
    #[error("Argument {position} of {function}: expected {expected}, got {got}")]
    ArgumentTypeMismatch {
        /// Function name
        function: String,
        /// 1-based argument position
        position: usize,
        /// Declared parameter type
        expected: String,
        /// Actual argument type
        got: String,
    },

    /// Call with the wrong number of arguments
    #[error("{function} expects {expected} argument(s), got {got}")]
    ArityMismatch {
        /// Function name
        function: String,
        /// Declared parameter count
        expected: usize,
        /// Supplied argument count
        got: usize,
    },

    /// Attempt to call a name that is not a function
    #[error("{name} is not callable (bound to {kind})")]
    NotCallable {
        /// Name that was called
        name: String,
        /// Kind of symbol the name is bound to
        kind: String,
    },

    // Control flow
    /// `return` evaluated with no function call on the scope chain
    #[error("Return statement outside function")]
    ReturnOutsideFunction,

    // Modules
    /// Declared module, one of its functions, or a type in a signature cannot be resolved
    ///
    /// **Triggered by:** `Modules { nosuch { ... } }`, a function the native module does
    /// not provide, or `Sound play(Sound);` without `Types: Sound;`
    #[error("Cannot resolve module {module}: {reason}")]
    ModuleResolutionError {
        /// Module name
        module: String,
        /// Failure reason
        reason: String,
    },

    /// Native function reported a failure
    #[error("Native function {function} failed: {reason}")]
    NativeFunctionError {
        /// Function name
        function: String,
        /// Failure reason
        reason: String,
    },

    // Numeric faults
    /// Arithmetic fault (division by zero, overflow)
    ///
    /// **Example:** `x = 10 / 0;`
    #[error("Arithmetic error: {message}")]
    ArithmeticError {
        /// Fault description
        message: String,
    },
}

/// Coarse classification of [`Error`] variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Scanner or parser failure
    Syntax,
    /// Name not found
    UndefinedIdentifier,
    /// Name bound twice in one scope
    DuplicateDeclaration,
    /// Read of an unassigned variable
    UnassignedVariable,
    /// Assignment or operator type failure
    TypeMismatch,
    /// Call argument type failure
    ArgumentTypeMismatch,
    /// Call argument count failure
    ArityMismatch,
    /// Call of a non-function
    NotCallable,
    /// Misplaced `return`
    ReturnOutsideFunction,
    /// Module bridge failure
    ModuleResolution,
    /// Native callable failure
    NativeFunction,
    /// Numeric fault
    Arithmetic,
}

impl Error {
    /// Create an arithmetic error with a message
    pub fn arithmetic(msg: impl Into<String>) -> Self {
        Error::ArithmeticError {
            message: msg.into(),
        }
    }

    /// Create a module resolution error
    pub fn module(module: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::ModuleResolutionError {
            module: module.into(),
            reason: reason.into(),
        }
    }

    /// Create an undefined identifier error
    pub fn undefined(name: impl Into<String>) -> Self {
        Error::UndefinedIdentifier { name: name.into() }
    }

    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::SyntaxError { .. } | Error::UnexpectedToken { .. } | Error::UnexpectedEof => {
                ErrorKind::Syntax
            }
            Error::UndefinedIdentifier { .. } => ErrorKind::UndefinedIdentifier,
            Error::DuplicateDeclaration { .. } => ErrorKind::DuplicateDeclaration,
            Error::UnassignedVariable { .. } => ErrorKind::UnassignedVariable,
            Error::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Error::ArgumentTypeMismatch { .. } => ErrorKind::ArgumentTypeMismatch,
            Error::ArityMismatch { .. } => ErrorKind::ArityMismatch,
            Error::NotCallable { .. } => ErrorKind::NotCallable,
            Error::ReturnOutsideFunction => ErrorKind::ReturnOutsideFunction,
            Error::ModuleResolutionError { .. } => ErrorKind::ModuleResolution,
            Error::NativeFunctionError { .. } => ErrorKind::NativeFunction,
            Error::ArithmeticError { .. } => ErrorKind::Arithmetic,
        }
    }
}

/// Result type for AudioScript operations
pub type Result<T> = std::result::Result<T, Error>;
