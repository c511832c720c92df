//! Call frames
//!
//! A frame is the environment chain of one call: nested local scopes on top
//! of the implicit receiver, whose fields are visible as bare names.

use std::collections::HashMap;

use crate::interp::value::Value;
use crate::types::ResolvedType;

/// The implicit receiver of a member body
#[derive(Debug, Clone, PartialEq)]
pub struct Receiver {
    pub value: Value,
    /// Concrete type the member was dispatched on; trait-default bodies
    /// resolve the members they use against it
    pub ty: ResolvedType,
}

impl Receiver {
    pub fn new(value: Value, ty: ResolvedType) -> Self {
        Self { value, ty }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        match &self.value {
            Value::Struct(s) => s.get(name),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct Frame {
    scopes: Vec<HashMap<String, Value>>,
    receiver: Option<Receiver>,
}

impl Frame {
    pub fn new(receiver: Option<Receiver>) -> Self {
        Self { scopes: vec![HashMap::new()], receiver }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.into(), value);
        }
    }

    /// Innermost local binding named `name`
    pub fn local(&self, name: &str) -> Option<&Value> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    pub fn receiver(&self) -> Option<&Receiver> {
        self.receiver.as_ref()
    }
}
