//! Native module bridge
//!
//! Scripts name the native functions they use in their `Declarations` header.
//! The evaluator asks a [`ModuleResolver`] for each declared module and binds
//! the declared functions to the module's [`NativeFunction`]s.

pub mod stdlib;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::{Error, Result};
use crate::runtime::Value;

/// Function implemented outside the script
pub trait NativeFunction: Send + Sync {
    /// Name scripts declare the function under
    fn name(&self) -> &str;

    /// Function description
    fn description(&self) -> &str {
        ""
    }

    /// Invokes the function with already type-checked arguments
    fn call(&self, args: &[Value]) -> Result<Value>;

    /// Fixed number of arguments, `None` if the function is variadic
    fn arity(&self) -> Option<usize> {
        None
    }
}

/// Adapts a closure into a [`NativeFunction`]
pub struct FnNative<F> {
    name: String,
    arity: Option<usize>,
    f: F,
}

impl<F> FnNative<F>
where
    F: Fn(&[Value]) -> Result<Value> + Send + Sync,
{
    /// Wraps `f` under `name`
    pub fn new(name: impl Into<String>, arity: Option<usize>, f: F) -> Self {
        FnNative {
            name: name.into(),
            arity,
            f,
        }
    }
}

impl<F> NativeFunction for FnNative<F>
where
    F: Fn(&[Value]) -> Result<Value> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn call(&self, args: &[Value]) -> Result<Value> {
        (self.f)(args)
    }

    fn arity(&self) -> Option<usize> {
        self.arity
    }
}

/// Named set of native functions
pub struct NativeModule {
    name: String,
    functions: HashMap<String, Arc<dyn NativeFunction>>,
}

impl NativeModule {
    /// Creates an empty module
    pub fn new(name: impl Into<String>) -> Self {
        NativeModule {
            name: name.into(),
            functions: HashMap::new(),
        }
    }

    /// Module name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a function
    pub fn register<T: NativeFunction + 'static>(&mut self, function: T) {
        let name = function.name().to_string();
        self.functions.insert(name, Arc::new(function));
    }

    /// Builder form of [`register`](Self::register) for closures
    ///
    /// ```
    /// use audioscript::bridge::NativeModule;
    ///
    /// let module = NativeModule::new("audio")
    ///     .with_fn("gain", Some(1), |args| Ok(args[0].clone()));
    /// assert!(module.has("gain"));
    /// ```
    pub fn with_fn<F>(mut self, name: &str, arity: Option<usize>, f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        self.register(FnNative::new(name, arity, f));
        self
    }

    /// Get a function by exact name
    pub fn function(&self, name: &str) -> Option<Arc<dyn NativeFunction>> {
        self.functions.get(name).cloned()
    }

    /// Check if the module provides a function
    pub fn has(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Sorted function names
    pub fn list_functions(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of functions
    pub fn count(&self) -> usize {
        self.functions.len()
    }
}

impl fmt::Debug for NativeModule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("NativeModule")
            .field("name", &self.name)
            .field("functions", &self.list_functions())
            .finish()
    }
}

/// Looks up native modules by the name a script declares
pub trait ModuleResolver: Send + Sync {
    /// Returns the module, or `None` if no such module exists
    fn resolve(&self, name: &str) -> Option<Arc<NativeModule>>;
}

/// In-memory [`ModuleResolver`]
#[derive(Debug, Clone)]
pub struct ModuleRegistry {
    modules: HashMap<String, Arc<NativeModule>>,
}

impl ModuleRegistry {
    /// Create new registry with the bundled modules
    pub fn new() -> Self {
        let mut registry = ModuleRegistry::empty();
        stdlib::register_all(&mut registry);
        registry
    }

    /// Create empty registry (for testing)
    pub fn empty() -> Self {
        ModuleRegistry {
            modules: HashMap::new(),
        }
    }

    /// Register a module, replacing any module of the same name
    pub fn register(&mut self, module: NativeModule) {
        debug!(module = %module.name(), functions = module.count(), "register native module");
        self.modules
            .insert(module.name().to_string(), Arc::new(module));
    }

    /// Check if a module exists
    pub fn has(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    /// Sorted module names
    pub fn list_modules(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.modules.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleResolver for ModuleRegistry {
    fn resolve(&self, name: &str) -> Option<Arc<NativeModule>> {
        self.modules.get(name).cloned()
    }
}

/// Builds the error a native function reports for a bad call
pub fn native_error(function: &str, reason: impl Into<String>) -> Error {
    Error::NativeFunctionError {
        function: function.to_string(),
        reason: reason.into(),
    }
}

/// Reads argument `index` as a number
pub fn number_arg(function: &str, args: &[Value], index: usize) -> Result<f64> {
    match args.get(index) {
        Some(value) if value.is_number() => value.as_float(),
        Some(value) => Err(native_error(
            function,
            format!("argument {} must be a number, got {}", index + 1, value.type_name()),
        )),
        None => Err(native_error(
            function,
            format!("missing argument {}", index + 1),
        )),
    }
}

/// Reads argument `index` as a string
pub fn string_arg<'a>(function: &str, args: &'a [Value], index: usize) -> Result<&'a str> {
    match args.get(index) {
        Some(Value::String(s)) => Ok(s),
        Some(value) => Err(native_error(
            function,
            format!("argument {} must be a string, got {}", index + 1, value.type_name()),
        )),
        None => Err(native_error(
            function,
            format!("missing argument {}", index + 1),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_has_bundled_modules() {
        let registry = ModuleRegistry::new();
        assert_eq!(registry.list_modules(), vec!["math", "text"]);
        let math = registry.resolve("math").unwrap();
        assert!(math.has("sqrtFn"));
        assert!(registry.resolve("audio").is_none());
    }

    #[test]
    fn test_empty_registry() {
        let registry = ModuleRegistry::empty();
        assert!(!registry.has("math"));
        assert!(registry.list_modules().is_empty());
    }

    #[test]
    fn test_closure_functions() {
        let module = NativeModule::new("audio")
            .with_fn("silence", Some(0), |_| Ok(Value::Null))
            .with_fn("twice", Some(1), |args| {
                Ok(Value::Float(number_arg("twice", args, 0)? * 2.0))
            });
        assert_eq!(module.count(), 2);
        assert_eq!(module.list_functions(), vec!["silence", "twice"]);

        let twice = module.function("twice").unwrap();
        assert_eq!(twice.arity(), Some(1));
        assert_eq!(twice.call(&[Value::Int(4)]).unwrap(), Value::Int(8));
    }

    #[test]
    fn test_argument_helpers_report_native_errors() {
        let args = [Value::String("x".to_string())];
        assert!(matches!(
            number_arg("f", &args, 0),
            Err(Error::NativeFunctionError { .. })
        ));
        assert!(matches!(
            string_arg("f", &args, 1),
            Err(Error::NativeFunctionError { .. })
        ));
        assert_eq!(string_arg("f", &args, 0).unwrap(), "x");
    }
}
