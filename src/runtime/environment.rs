use indexmap::IndexMap;
use tracing::trace;

use crate::runtime::symbol::{BuiltinTypeSymbol, Symbol};
use crate::runtime::{Type, TypedValue};

/// Index of a scope in the [`Environment`] arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(usize);

impl ScopeId {
    /// Position of the scope in the arena
    pub fn index(self) -> usize {
        self.0
    }
}

/// What opened a scope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// Program scope, seeded with the builtin types
    Global,
    /// `{ ... }`, `if` and `while` bodies
    Block,
    /// One function call
    Function,
}

/// Single scope: its own symbol table plus a link to the enclosing scope
#[derive(Debug, Clone)]
pub struct Scope {
    name: String,
    level: usize,
    kind: ScopeKind,
    parent: Option<ScopeId>,
    symbols: IndexMap<String, Symbol>,
}

impl Scope {
    fn new(name: impl Into<String>, level: usize, kind: ScopeKind, parent: Option<ScopeId>) -> Self {
        Scope {
            name: name.into(),
            level,
            kind,
            parent,
            symbols: IndexMap::new(),
        }
    }

    /// Scope label (`global`, `block`, or the function name)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Nesting depth; the global scope is level 1
    pub fn level(&self) -> usize {
        self.level
    }

    /// What opened the scope
    pub fn kind(&self) -> ScopeKind {
        self.kind
    }

    /// Enclosing scope, `None` for the global scope
    pub fn parent(&self) -> Option<ScopeId> {
        self.parent
    }

    /// Binds a symbol under its own name, replacing any binding of that name in this scope
    pub fn insert(&mut self, symbol: Symbol) {
        trace!(scope = %self.name, symbol = %symbol, "insert");
        self.symbols.insert(symbol.name().to_string(), symbol);
    }

    /// Looks a name up in this scope only
    pub fn lookup_local(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    /// Symbols in declaration order
    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.values()
    }
}

/// Arena of scopes plus the cursor marking the current one
///
/// Scopes are created and destroyed strictly LIFO, so the arena is a stack:
/// the most recently pushed scope is always the one popped next. The current
/// scope, however, need not be the top's lexical child. Function call scopes
/// point at the scope the function was declared in rather than at the caller.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    scopes: Vec<Scope>,
    current: Option<ScopeId>,
}

impl Environment {
    /// Creates an environment with no scopes
    pub fn new() -> Self {
        Environment {
            scopes: Vec::new(),
            current: None,
        }
    }

    /// Opens the global scope, seeded with `NUMBER`, `STRING` and `VAR`
    pub fn push_global(&mut self) -> ScopeId {
        let id = self.push(Scope::new("global", 1, ScopeKind::Global, None));
        for ty in [Type::Number, Type::String, Type::Var] {
            self.insert(Symbol::BuiltinType(BuiltinTypeSymbol::new(ty.name())));
        }
        id
    }

    /// Opens a scope nested in `parent` and makes it current
    pub fn push_scope(&mut self, name: impl Into<String>, kind: ScopeKind, parent: ScopeId) -> ScopeId {
        let level = self.scope(parent).level + 1;
        self.push(Scope::new(name, level, kind, Some(parent)))
    }

    fn push(&mut self, scope: Scope) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        trace!(scope = %scope.name, level = scope.level, "enter scope");
        self.scopes.push(scope);
        self.current = Some(id);
        id
    }

    /// Destroys the most recently opened scope and moves the cursor to `restore`
    pub fn pop_scope(&mut self, restore: Option<ScopeId>) -> Option<Scope> {
        let scope = self.scopes.pop();
        if let Some(scope) = &scope {
            trace!(scope = %scope.name, level = scope.level, "exit scope");
        }
        self.current = restore.filter(|id| id.0 < self.scopes.len());
        scope
    }

    /// The current scope id
    pub fn current(&self) -> Option<ScopeId> {
        self.current
    }

    /// Borrows a scope by id
    ///
    /// Ids are only handed out for live scopes; holding one past its scope's
    /// exit is a caller bug.
    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0]
    }

    /// Number of live scopes
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Binds a symbol in the current scope
    ///
    /// Does nothing when no scope is open.
    pub fn insert(&mut self, symbol: Symbol) {
        if let Some(id) = self.current {
            self.scopes[id.0].insert(symbol);
        }
    }

    /// Resolves a name from the current scope outward
    ///
    /// With `current_scope_only` set, only the current scope is searched.
    pub fn lookup(&self, name: &str, current_scope_only: bool) -> Option<&Symbol> {
        let mut id = self.current?;
        loop {
            let scope = &self.scopes[id.0];
            if let Some(symbol) = scope.lookup_local(name) {
                return Some(symbol);
            }
            if current_scope_only {
                return None;
            }
            id = scope.parent?;
        }
    }

    /// Mutable access to the nearest binding of `name`
    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut Symbol> {
        let id = self.resolve(name)?;
        self.scopes[id.0].symbols.get_mut(name)
    }

    /// Id of the scope holding the nearest binding of `name`
    pub fn resolve(&self, name: &str) -> Option<ScopeId> {
        let mut id = self.current?;
        loop {
            let scope = &self.scopes[id.0];
            if scope.symbols.contains_key(name) {
                return Some(id);
            }
            id = scope.parent?;
        }
    }

    /// Whether the current scope chain passes through a function call scope
    pub fn in_function(&self) -> bool {
        let mut next = self.current;
        while let Some(id) = next {
            let scope = &self.scopes[id.0];
            if scope.kind == ScopeKind::Function {
                return true;
            }
            next = scope.parent;
        }
        false
    }

    /// Variables bound directly in the current scope, in declaration order
    pub fn variables(&self) -> IndexMap<String, Option<TypedValue>> {
        let Some(id) = self.current else {
            return IndexMap::new();
        };
        self.scopes[id.0]
            .symbols()
            .filter_map(|symbol| match symbol {
                Symbol::Var(var) => Some((var.name.clone(), var.value.clone())),
                _ => None,
            })
            .collect()
    }
}
