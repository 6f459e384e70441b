use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::parser::StatementList;
use crate::runtime::environment::ScopeId;
use crate::runtime::{Type, TypedValue};

/// A name bound in some scope
#[derive(Debug, Clone)]
pub enum Symbol {
    /// Declared variable
    Var(VarSymbol),
    /// Type marker (`NUMBER`, `STRING`, `VAR`, declared external types)
    BuiltinType(BuiltinTypeSymbol),
    /// Function defined with `def`
    Function(FunctionSymbol),
    /// Function bound to a native module
    ExternalFunction(ExternalFunctionSymbol),
}

impl Symbol {
    /// Name the symbol is bound under
    pub fn name(&self) -> &str {
        match self {
            Symbol::Var(var) => &var.name,
            Symbol::BuiltinType(ty) => &ty.name,
            Symbol::Function(function) => &function.name,
            Symbol::ExternalFunction(function) => &function.name,
        }
    }

    /// Short description of the symbol kind, used in diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            Symbol::Var(_) => "variable",
            Symbol::BuiltinType(_) => "type",
            Symbol::Function(_) => "function",
            Symbol::ExternalFunction(_) => "external function",
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Symbol::Var(var) => match &var.value {
                Some(value) => write!(f, "<VarSymbol({}: {})> = {}", var.name, var.ty, value),
                None => write!(f, "<VarSymbol({}: {})>", var.name, var.ty),
            },
            Symbol::BuiltinType(ty) => write!(f, "{}", ty.name),
            Symbol::Function(function) => write!(
                f,
                "<FunctionSymbol({}({}))>",
                function.name,
                function.params.join(", ")
            ),
            Symbol::ExternalFunction(function) => {
                let params: Vec<&str> = function.parameter_types.iter().map(Type::name).collect();
                write!(
                    f,
                    "<ExternalFunctionSymbol({} {}({}))>",
                    function.return_type,
                    function.name,
                    params.join(", ")
                )
            }
        }
    }
}

/// Variable with an immutable declared type and a reassignable value
#[derive(Debug, Clone, PartialEq)]
pub struct VarSymbol {
    /// Variable name
    pub name: String,
    /// Declared type
    pub ty: Type,
    /// Current value; `None` until the first assignment
    pub value: Option<TypedValue>,
}

impl VarSymbol {
    /// Declares an unassigned variable
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        VarSymbol {
            name: name.into(),
            ty,
            value: None,
        }
    }

    /// Declares a variable and assigns it in one step
    pub fn with_value(name: impl Into<String>, ty: Type, value: TypedValue) -> Result<Self> {
        let mut var = VarSymbol::new(name, ty);
        var.assign(value)?;
        Ok(var)
    }

    /// Replaces the value after checking it against the declared type
    ///
    /// Values stored in `VAR` variables keep the type they arrived with; every
    /// other variable re-labels the value with its own declared type.
    pub fn assign(&mut self, value: TypedValue) -> Result<()> {
        if !self.ty.accepts(&value) {
            return Err(Error::TypeMismatch {
                name: self.name.clone(),
                expected: self.ty.name().to_string(),
                got: value.type_label(),
            });
        }

        let stored = match self.ty {
            Type::Var => value,
            _ => TypedValue::new(self.ty.clone(), value.value),
        };
        self.value = Some(stored);
        Ok(())
    }
}

/// Type marker
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltinTypeSymbol {
    /// Type name
    pub name: String,
}

impl BuiltinTypeSymbol {
    /// Creates a type marker
    pub fn new(name: impl Into<String>) -> Self {
        BuiltinTypeSymbol { name: name.into() }
    }

    /// The type this marker names
    pub fn ty(&self) -> Type {
        Type::from_name(&self.name)
    }
}

/// User function; the body is evaluated afresh on every call
#[derive(Debug, Clone)]
pub struct FunctionSymbol {
    /// Function name
    pub name: String,
    /// Parameter names, bound as `VAR` on each call
    pub params: Vec<String>,
    /// Function body
    pub body: Arc<StatementList>,
    /// Scope the function was declared in; call scopes are opened as its children
    pub scope: ScopeId,
}

/// Function implemented by a native module
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalFunctionSymbol {
    /// Function name
    pub name: String,
    /// Declared parameter types
    pub parameter_types: Vec<Type>,
    /// Declared return type, `NULL` when none was declared
    pub return_type: Type,
}
