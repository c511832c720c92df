//! Lexical scopes for the load-time checker

use std::collections::HashMap;

use crate::types::ResolvedType;
use crate::utils::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct ScopeId(usize);

/// A local binding: parameter, `let` or pattern binding
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub ty: ResolvedType,
    pub span: Span,
}

#[derive(Debug)]
struct Scope {
    parent: Option<ScopeId>,
    symbols: HashMap<String, Symbol>,
}

/// Symbol table with nested scopes
pub struct SymbolTable {
    scopes: Vec<Scope>,
    current: ScopeId,
}

impl SymbolTable {
    pub fn new() -> Self {
        let root = Scope { parent: None, symbols: HashMap::new() };
        Self { scopes: vec![root], current: ScopeId(0) }
    }

    /// Enter a new scope
    pub fn enter_scope(&mut self) {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope { parent: Some(self.current), symbols: HashMap::new() });
        self.current = id;
    }

    /// Exit the current scope
    pub fn exit_scope(&mut self) {
        if let Some(parent) = self.scopes[self.current.0].parent {
            self.current = parent;
        }
    }

    /// Define a symbol in the current scope; a later `let` shadows an earlier one
    pub fn define(&mut self, symbol: Symbol) {
        self.scopes[self.current.0].symbols.insert(symbol.name.clone(), symbol);
    }

    /// Look up a symbol, searching from current scope upward
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        let mut scope_id = Some(self.current);
        while let Some(id) = scope_id {
            if let Some(symbol) = self.scopes[id.0].symbols.get(name) {
                return Some(symbol);
            }
            scope_id = self.scopes[id.0].parent;
        }
        None
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
