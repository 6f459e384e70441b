//! Tree-walking evaluator
//!
//! Every statement evaluates to a `Flow`: either it completed normally, or a
//! `return` fired and its value must unwind to the nearest call. Aggregating
//! nodes (statement lists, blocks, loops) stop at the first `Flow::Return` and
//! hand it up unchanged; the call handler is the only place that consumes it.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::bridge::{ModuleRegistry, ModuleResolver, NativeFunction, NativeModule};
use crate::error::{Error, Result};
use crate::parser::{
    ConditionalOp, Declarations, DeclaredType, Expression, ExternalFunctionDeclaration,
    ModuleDeclaration, Program, Statement, StatementList,
};
use crate::runtime::config::EvaluatorConfig;
use crate::runtime::environment::{Environment, ScopeId, ScopeKind};
use crate::runtime::operators;
use crate::runtime::symbol::{
    BuiltinTypeSymbol, ExternalFunctionSymbol, FunctionSymbol, Symbol, VarSymbol,
};
use crate::runtime::{Type, TypedValue, Value};

/// Outcome of evaluating one statement
#[derive(Debug, Clone, PartialEq)]
enum Flow {
    /// Completed; expression statements carry their value
    Normal(Option<TypedValue>),
    /// A `return` fired and is unwinding to its call
    Return(TypedValue),
}

/// What a program run produced
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Execution {
    /// Values of the top-level expression statements, in order
    pub results: Vec<TypedValue>,
    /// Global variables as they stood when the program finished
    pub globals: IndexMap<String, Option<TypedValue>>,
}

impl Execution {
    /// Value of a global variable, `None` if undeclared or unassigned
    pub fn global(&self, name: &str) -> Option<&TypedValue> {
        self.globals.get(name).and_then(Option::as_ref)
    }

    /// Value of the last top-level expression statement
    pub fn last(&self) -> Option<&TypedValue> {
        self.results.last()
    }
}

/// AudioScript evaluator
pub struct Evaluator {
    env: Environment,
    resolver: Arc<dyn ModuleResolver>,
    /// Native callables bound by the current program's declarations
    natives: HashMap<String, Arc<dyn NativeFunction>>,
    config: EvaluatorConfig,
    /// Assignment trace (variable name, assigned value)
    execution_trace: Vec<(String, TypedValue)>,
}

impl Evaluator {
    /// Creates an evaluator that resolves modules from the bundled registry
    pub fn new() -> Self {
        Evaluator::with_resolver(Arc::new(ModuleRegistry::new()))
    }

    /// Creates an evaluator with a custom module resolver
    pub fn with_resolver(resolver: Arc<dyn ModuleResolver>) -> Self {
        Evaluator {
            env: Environment::new(),
            resolver,
            natives: HashMap::new(),
            config: EvaluatorConfig::default(),
            execution_trace: Vec::new(),
        }
    }

    /// Replaces the configuration
    pub fn with_config(mut self, config: EvaluatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Current configuration
    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    /// Get the execution trace (variable assignments) of the last run
    ///
    /// Empty unless [`EvaluatorConfig::trace`] is set.
    pub fn get_execution_trace(&self) -> &[(String, TypedValue)] {
        &self.execution_trace
    }

    /// Runs a program from a fresh global scope
    ///
    /// The global scope lives only for this call; nothing carries over to the
    /// next `execute` except the resolver and configuration.
    pub fn execute(&mut self, program: &Program) -> Result<Execution> {
        self.natives.clear();
        self.execution_trace.clear();

        let previous = self.env.current();
        self.env.push_global();
        let outcome = self.run_program(program);
        self.env.pop_scope(previous);
        outcome
    }

    fn run_program(&mut self, program: &Program) -> Result<Execution> {
        if let Some(declarations) = &program.declarations {
            self.declare(declarations)?;
        }

        let mut results = Vec::new();
        for statement in &program.body {
            match self.evaluate_statement(statement)? {
                Flow::Normal(Some(value)) => {
                    if self.config.echo {
                        println!("{}", value);
                    }
                    results.push(value);
                }
                Flow::Normal(None) => {}
                // evaluate_statement rejects `return` outside a call before it fires
                Flow::Return(_) => return Err(Error::ReturnOutsideFunction),
            }
        }

        Ok(Execution {
            results,
            globals: self.env.variables(),
        })
    }

    // Declarations

    fn declare(&mut self, declarations: &Declarations) -> Result<()> {
        for ty in &declarations.types {
            self.declare_type(ty)?;
        }
        for module in &declarations.modules {
            self.declare_module(module)?;
        }
        Ok(())
    }

    fn declare_type(&mut self, ty: &DeclaredType) -> Result<()> {
        self.ensure_undeclared(&ty.name)?;
        debug!(name = %ty.name, "declare type");
        self.env
            .insert(Symbol::BuiltinType(BuiltinTypeSymbol::new(ty.name.as_str())));
        Ok(())
    }

    fn declare_module(&mut self, declaration: &ModuleDeclaration) -> Result<()> {
        let module = self
            .resolver
            .resolve(&declaration.name)
            .ok_or_else(|| Error::module(&declaration.name, "no such native module"))?;
        debug!(
            module = %module.name(),
            functions = declaration.functions.len(),
            "bind native module"
        );

        for function in &declaration.functions {
            self.declare_external_function(&module, function)?;
        }
        Ok(())
    }

    fn declare_external_function(
        &mut self,
        module: &NativeModule,
        declaration: &ExternalFunctionDeclaration,
    ) -> Result<()> {
        let callable = module.function(&declaration.name).ok_or_else(|| {
            Error::module(
                module.name(),
                format!("module does not provide {}", declaration.name),
            )
        })?;

        if let Some(arity) = callable.arity() {
            if arity != declaration.parameter_types.len() {
                return Err(Error::module(
                    module.name(),
                    format!(
                        "{} takes {} argument(s) but is declared with {}",
                        declaration.name,
                        arity,
                        declaration.parameter_types.len()
                    ),
                ));
            }
        }

        let parameter_types = declaration
            .parameter_types
            .iter()
            .map(|name| self.signature_type(module, declaration, name))
            .collect::<Result<Vec<_>>>()?;
        let return_type = match &declaration.return_type {
            Some(name) => self.signature_type(module, declaration, name)?,
            None => Type::Null,
        };

        self.ensure_undeclared(&declaration.name)?;
        debug!(module = %module.name(), function = %declaration.name, "declare external function");
        self.env.insert(Symbol::ExternalFunction(ExternalFunctionSymbol {
            name: declaration.name.clone(),
            parameter_types,
            return_type,
        }));
        self.natives.insert(declaration.name.clone(), callable);
        Ok(())
    }

    fn signature_type(
        &self,
        module: &NativeModule,
        declaration: &ExternalFunctionDeclaration,
        name: &str,
    ) -> Result<Type> {
        self.resolve_type(name).map_err(|_| {
            Error::module(
                module.name(),
                format!("unknown type {} in signature of {}", name, declaration.name),
            )
        })
    }

    /// Resolves a type name through the scope chain
    fn resolve_type(&self, name: &str) -> Result<Type> {
        match self.env.lookup(name, false) {
            Some(Symbol::BuiltinType(ty)) => Ok(ty.ty()),
            Some(other) => Err(Error::TypeMismatch {
                name: name.to_string(),
                expected: "type".to_string(),
                got: other.kind_name().to_string(),
            }),
            None => Err(Error::undefined(name)),
        }
    }

    fn ensure_undeclared(&self, name: &str) -> Result<()> {
        if self.env.lookup(name, true).is_some() {
            return Err(Error::DuplicateDeclaration {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    // Statements

    fn evaluate_statement(&mut self, statement: &Statement) -> Result<Flow> {
        match statement {
            Statement::Block(statements) => self.evaluate_block(statements),

            Statement::VarDeclaration { type_name, names } => {
                let ty = self.resolve_type(type_name)?;
                for name in names {
                    self.ensure_undeclared(name)?;
                    self.env.insert(Symbol::Var(VarSymbol::new(name.as_str(), ty.clone())));
                }
                Ok(Flow::Normal(None))
            }

            Statement::FunctionDeclaration { name, params, body } => {
                self.ensure_undeclared(name)?;
                let scope = self.current_scope()?;
                self.env.insert(Symbol::Function(FunctionSymbol {
                    name: name.clone(),
                    params: params.clone(),
                    body: Arc::new(body.clone()),
                    scope,
                }));
                Ok(Flow::Normal(None))
            }

            Statement::Assignment { name, value } => {
                let value = self.evaluate_expression(value)?;
                self.assign(name, value)?;
                Ok(Flow::Normal(None))
            }

            Statement::If { condition, body } => {
                if self.evaluate_condition(condition)? {
                    self.evaluate_block(body)
                } else {
                    Ok(Flow::Normal(None))
                }
            }

            Statement::While { condition, body } => {
                while self.evaluate_condition(condition)? {
                    if let Flow::Return(value) = self.evaluate_block(body)? {
                        return Ok(Flow::Return(value));
                    }
                }
                Ok(Flow::Normal(None))
            }

            Statement::Return { value } => {
                if !self.env.in_function() {
                    return Err(Error::ReturnOutsideFunction);
                }
                let value = match value {
                    Some(expr) => self.evaluate_expression(expr)?,
                    None => TypedValue::null(),
                };
                Ok(Flow::Return(value))
            }

            Statement::Expression(expr) => Ok(Flow::Normal(Some(self.evaluate_expression(expr)?))),

            Statement::NoOp => Ok(Flow::Normal(None)),
        }
    }

    fn evaluate_statements(&mut self, statements: &StatementList) -> Result<Flow> {
        for statement in statements {
            if let Flow::Return(value) = self.evaluate_statement(statement)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal(None))
    }

    fn evaluate_block(&mut self, statements: &StatementList) -> Result<Flow> {
        let parent = self.current_scope()?;
        self.in_scope("block", ScopeKind::Block, parent, |evaluator| {
            evaluator.evaluate_statements(statements)
        })
    }

    /// Runs `f` in a new scope, tearing the scope down whether or not `f` fails
    fn in_scope<T>(
        &mut self,
        name: &str,
        kind: ScopeKind,
        parent: ScopeId,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        let previous = self.env.current();
        self.env.push_scope(name, kind, parent);
        let result = f(self);
        self.env.pop_scope(previous);
        result
    }

    fn current_scope(&self) -> Result<ScopeId> {
        // Only reachable before `execute` opened the global scope
        self.env
            .current()
            .ok_or_else(|| Error::undefined("global scope"))
    }

    fn assign(&mut self, name: &str, value: TypedValue) -> Result<()> {
        match self.env.lookup_mut(name) {
            Some(Symbol::Var(var)) => {
                trace!(name, value = %value, "assign");
                var.assign(value.clone())?;
                if self.config.trace {
                    self.execution_trace.push((name.to_string(), value));
                }
                Ok(())
            }
            Some(other) => Err(Error::TypeMismatch {
                name: name.to_string(),
                expected: "variable".to_string(),
                got: other.kind_name().to_string(),
            }),
            None => Err(Error::undefined(name)),
        }
    }

    fn evaluate_condition(&mut self, condition: &Expression) -> Result<bool> {
        Ok(self.evaluate_expression(condition)?.value.is_truthy())
    }

    // Expressions

    fn evaluate_expression(&mut self, expr: &Expression) -> Result<TypedValue> {
        match expr {
            Expression::IntLiteral(n) => Ok(TypedValue::int(*n)),
            Expression::FloatLiteral(f) => Ok(TypedValue::float(*f)),
            Expression::StringLiteral(s) => Ok(TypedValue::string(s.as_str())),
            Expression::BoolLiteral(b) => Ok(TypedValue::boolean(*b)),

            Expression::Variable(name) => match self.env.lookup(name, false) {
                Some(Symbol::Var(var)) => var.value.clone().ok_or_else(|| Error::UnassignedVariable {
                    name: name.clone(),
                }),
                Some(other) => Err(Error::TypeMismatch {
                    name: name.clone(),
                    expected: "variable".to_string(),
                    got: other.kind_name().to_string(),
                }),
                None => Err(Error::undefined(name.as_str())),
            },

            Expression::FunctionCall { name, args } => self.call_function(name, args),

            Expression::Binary { op, left, right } => {
                let left = self.evaluate_expression(left)?;
                let right = self.evaluate_expression(right)?;
                operators::binary(*op, &left, &right)
            }

            Expression::Unary { op, operand } => {
                let operand = self.evaluate_expression(operand)?;
                operators::unary(*op, &operand)
            }

            Expression::Conditional { op, left, right } => {
                let left = self.evaluate_expression(left)?;
                match op {
                    ConditionalOp::And if !left.value.is_truthy() => Ok(TypedValue::boolean(false)),
                    ConditionalOp::Or if left.value.is_truthy() => Ok(TypedValue::boolean(true)),
                    _ => {
                        let right = self.evaluate_expression(right)?;
                        operators::compare(*op, &left, &right)
                    }
                }
            }
        }
    }

    // Calls

    fn call_function(&mut self, name: &str, args: &[Expression]) -> Result<TypedValue> {
        let symbol = self
            .env
            .lookup(name, false)
            .cloned()
            .ok_or_else(|| Error::undefined(name))?;

        match symbol {
            Symbol::Function(function) => self.call_user_function(&function, args),
            Symbol::ExternalFunction(function) => self.call_external_function(&function, args),
            other => Err(Error::NotCallable {
                name: name.to_string(),
                kind: other.kind_name().to_string(),
            }),
        }
    }

    fn call_user_function(
        &mut self,
        function: &FunctionSymbol,
        args: &[Expression],
    ) -> Result<TypedValue> {
        let formals = vec![Type::Var; function.params.len()];
        let values = self.evaluate_arguments(&function.name, &formals, args)?;

        debug!(function = %function.name, args = values.len(), "call");
        let flow = self.in_scope(
            &function.name,
            ScopeKind::Function,
            function.scope,
            |evaluator| {
                for (param, value) in function.params.iter().zip(values) {
                    evaluator.ensure_undeclared(param)?;
                    evaluator
                        .env
                        .insert(Symbol::Var(VarSymbol::with_value(param.as_str(), Type::Var, value)?));
                }
                evaluator.evaluate_statements(&function.body)
            },
        )?;

        let result = match flow {
            Flow::Return(value) => value,
            Flow::Normal(_) => TypedValue::null(),
        };
        debug!(function = %function.name, result = %result, "return");
        Ok(result)
    }

    fn call_external_function(
        &mut self,
        function: &ExternalFunctionSymbol,
        args: &[Expression],
    ) -> Result<TypedValue> {
        let values = self.evaluate_arguments(&function.name, &function.parameter_types, args)?;
        let callable = self
            .natives
            .get(&function.name)
            .cloned()
            .ok_or_else(|| Error::undefined(function.name.as_str()))?;

        debug!(function = %function.name, args = values.len(), "call native");
        let raw: Vec<Value> = values.into_iter().map(|v| v.value).collect();
        let result = callable.call(&raw)?;

        match &function.return_type {
            Type::Null => Ok(TypedValue::null()),
            ty => {
                let typed = TypedValue::new(ty.clone(), result);
                if !ty.accepts(&typed) {
                    return Err(Error::NativeFunctionError {
                        function: function.name.clone(),
                        reason: format!("returned {}, declared {}", typed.value.type_name(), ty),
                    });
                }
                Ok(typed)
            }
        }
    }

    /// Checks arity, evaluates arguments in the caller's scope, then checks their types
    fn evaluate_arguments(
        &mut self,
        function: &str,
        formals: &[Type],
        args: &[Expression],
    ) -> Result<Vec<TypedValue>> {
        if formals.len() != args.len() {
            return Err(Error::ArityMismatch {
                function: function.to_string(),
                expected: formals.len(),
                got: args.len(),
            });
        }

        let values = args
            .iter()
            .map(|arg| self.evaluate_expression(arg))
            .collect::<Result<Vec<_>>>()?;

        for (position, (formal, value)) in formals.iter().zip(&values).enumerate() {
            if !formal.accepts(value) {
                return Err(Error::ArgumentTypeMismatch {
                    function: function.to_string(),
                    position: position + 1,
                    expected: formal.name().to_string(),
                    got: value.type_label(),
                });
            }
        }
        Ok(values)
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::ScriptScanner;
    use crate::parser::ScriptParser;

    fn run(source: &str) -> Result<Execution> {
        let mut scanner = ScriptScanner::new(source);
        let tokens = scanner.scan_tokens()?;
        let mut parser = ScriptParser::new(tokens);
        let program = parser.parse()?;
        Evaluator::new().execute(&program)
    }

    #[test]
    fn test_top_level_results() {
        let execution = run("1 + 2; 3 * 4; 10 - 5;").unwrap();
        assert_eq!(
            execution.results,
            vec![TypedValue::int(3), TypedValue::int(12), TypedValue::int(5)]
        );
    }

    #[test]
    fn test_globals_snapshot() {
        let execution = run("NUMBER x, y; x = 4; VAR s; s = 'hi';").unwrap();
        assert_eq!(execution.global("x"), Some(&TypedValue::int(4)));
        assert_eq!(execution.global("s"), Some(&TypedValue::string("hi")));
        assert_eq!(execution.globals.get("y"), Some(&None));
    }

    #[test]
    fn test_block_names_do_not_escape() {
        let err = run("{ VAR y; y = 1; } y = 2;").unwrap_err();
        assert_eq!(err, Error::undefined("y"));
    }

    #[test]
    fn test_block_sees_enclosing_names() {
        let execution = run("VAR x; x = 1; { x = x + 1; }").unwrap();
        assert_eq!(execution.global("x"), Some(&TypedValue::int(2)));
    }

    #[test]
    fn test_return_stops_function() {
        let execution = run("def f() { return 1; return 2; } f();").unwrap();
        assert_eq!(execution.last(), Some(&TypedValue::int(1)));
    }

    #[test]
    fn test_return_unwinds_nested_blocks() {
        let source = "
            def find() {
                VAR i; i = 0;
                while i < 10 {
                    if i == 3 { { return i; } }
                    i = i + 1;
                }
                return 99;
            }
            find();
        ";
        assert_eq!(run(source).unwrap().last(), Some(&TypedValue::int(3)));
    }

    #[test]
    fn test_function_without_return_yields_null() {
        let execution = run("def f() { VAR a; a = 1; } f();").unwrap();
        assert_eq!(execution.last(), Some(&TypedValue::null()));
    }

    #[test]
    fn test_return_outside_function() {
        assert_eq!(run("return 1;").unwrap_err(), Error::ReturnOutsideFunction);
        assert_eq!(run("{ return; }").unwrap_err(), Error::ReturnOutsideFunction);
    }

    #[test]
    fn test_function_scope_parent_is_declaring_scope() {
        let source = "
            VAR x; x = 1;
            def f() { return x; }
            def g() { VAR x; x = 2; return f(); }
            g();
        ";
        assert_eq!(run(source).unwrap().last(), Some(&TypedValue::int(1)));
    }

    #[test]
    fn test_recursion() {
        let source = "
            def fact(n) {
                if n <= 1 { return 1; }
                return n * fact(n - 1);
            }
            fact(10);
        ";
        assert_eq!(run(source).unwrap().last(), Some(&TypedValue::int(3628800)));
    }

    #[test]
    fn test_arity_mismatch() {
        let err = run("def f(a, b) { return a; } f(1);").unwrap_err();
        assert_eq!(
            err,
            Error::ArityMismatch {
                function: "f".to_string(),
                expected: 2,
                got: 1,
            }
        );
    }

    #[test]
    fn test_typed_assignment() {
        let err = run("NUMBER x; x = 'three';").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::TypeMismatch);
        assert!(run("STRING s; s = 'ok';").is_ok());
    }

    #[test]
    fn test_duplicate_declarations() {
        assert!(matches!(
            run("VAR x; NUMBER x;"),
            Err(Error::DuplicateDeclaration { .. })
        ));
        assert!(matches!(
            run("def f() {} def f() {}"),
            Err(Error::DuplicateDeclaration { .. })
        ));
        // shadowing in a nested scope is fine
        assert!(run("VAR x; { VAR x; }").is_ok());
    }

    #[test]
    fn test_unassigned_variable() {
        assert_eq!(
            run("VAR x; x + 1;").unwrap_err(),
            Error::UnassignedVariable {
                name: "x".to_string()
            }
        );
    }

    #[test]
    fn test_not_callable() {
        let err = run("VAR x; x = 1; x();").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::NotCallable);
    }

    #[test]
    fn test_short_circuit() {
        // the right side would fail if evaluated
        let execution = run("false and nosuch(); true or nosuch();").unwrap();
        assert_eq!(
            execution.results,
            vec![TypedValue::boolean(false), TypedValue::boolean(true)]
        );
    }

    #[test]
    fn test_external_function() {
        let source = "
            Declarations { Modules { math { NUMBER sqrtFn(NUMBER); } } }
            NUMBER r;
            r = sqrtFn(9);
        ";
        let execution = run(source).unwrap();
        assert_eq!(execution.global("r"), Some(&TypedValue::int(3)));
    }

    #[test]
    fn test_external_argument_type_mismatch() {
        let source = "
            Declarations { Modules { math { NUMBER sqrtFn(NUMBER); } } }
            sqrtFn('nine');
        ";
        assert_eq!(
            run(source).unwrap_err(),
            Error::ArgumentTypeMismatch {
                function: "sqrtFn".to_string(),
                position: 1,
                expected: "NUMBER".to_string(),
                got: "STRING".to_string(),
            }
        );
    }

    #[test]
    fn test_module_resolution_errors() {
        let unknown_module = "Declarations { Modules { audio { play(); } } }";
        let unknown_function = "Declarations { Modules { math { NUMBER cbrtFn(NUMBER); } } }";
        let unknown_type = "Declarations { Modules { math { Sound sqrtFn(NUMBER); } } }";
        for source in [unknown_module, unknown_function, unknown_type] {
            assert!(
                matches!(run(source), Err(Error::ModuleResolutionError { .. })),
                "{}",
                source
            );
        }
    }

    #[test]
    fn test_trace_records_assignments() {
        let program = ScriptParser::new(
            ScriptScanner::new("VAR a; a = 1; a = a + 1;")
                .scan_tokens()
                .unwrap(),
        )
        .parse()
        .unwrap();
        let mut evaluator = Evaluator::new().with_config(EvaluatorConfig {
            trace: true,
            echo: false,
        });
        evaluator.execute(&program).unwrap();
        assert_eq!(
            evaluator.get_execution_trace(),
            &[
                ("a".to_string(), TypedValue::int(1)),
                ("a".to_string(), TypedValue::int(2)),
            ]
        );
    }

    #[test]
    fn test_scopes_released_after_error() {
        let program = ScriptParser::new(
            ScriptScanner::new("def f() { { 1 / 0; } } f();")
                .scan_tokens()
                .unwrap(),
        )
        .parse()
        .unwrap();
        let mut evaluator = Evaluator::new();
        assert!(evaluator.execute(&program).is_err());
        assert_eq!(evaluator.env.depth(), 0);
        assert_eq!(evaluator.env.current(), None);
    }
}
