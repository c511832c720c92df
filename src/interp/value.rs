//! Runtime values

use std::fmt;

use crate::frontend::ast::LitValue;
use crate::types::{ResolvedType, NONE, SOME};

/// Tag of a sum-type value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariantTag {
    Some,
    None,
}

impl VariantTag {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            SOME => Some(Self::Some),
            NONE => Some(Self::None),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Some => SOME,
            Self::None => NONE,
        }
    }
}

/// Struct instance; fields are kept in declaration order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructValue {
    pub name: String,
    pub fields: Vec<(String, Value)>,
}

impl StructValue {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.iter().find(|(name, _)| name == field).map(|(_, v)| v)
    }
}

/// Sum-type instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantValue {
    pub tag: VariantTag,
    pub payload: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Int(i64),
    Str(String),
    Bool(bool),
    Unit,
    Struct(StructValue),
    Variant(VariantValue),
}

impl Value {
    pub fn some(payload: Value) -> Self {
        Value::Variant(VariantValue { tag: VariantTag::Some, payload: vec![payload] })
    }

    pub fn none() -> Self {
        Value::Variant(VariantValue { tag: VariantTag::None, payload: Vec::new() })
    }

    pub fn from_lit(lit: &LitValue) -> Self {
        match lit {
            LitValue::Bool(b) => Value::Bool(*b),
            LitValue::Int(n) => Value::Int(*n),
            LitValue::Str(s) => Value::Str(s.clone()),
        }
    }

    /// Name used in runtime type-mismatch messages
    pub fn type_name(&self) -> String {
        self.runtime_type().to_string()
    }

    /// Structural type of the value. `None` carries no type argument.
    pub fn runtime_type(&self) -> ResolvedType {
        match self {
            Value::Int(_) => ResolvedType::INT,
            Value::Str(_) => ResolvedType::STRING,
            Value::Bool(_) => ResolvedType::BOOL,
            Value::Unit => ResolvedType::UNIT,
            Value::Struct(s) => ResolvedType::Struct(s.name.clone()),
            Value::Variant(v) => match v.payload.first() {
                Some(payload) if v.tag == VariantTag::Some => ResolvedType::option(payload.runtime_type()),
                _ => ResolvedType::option(ResolvedType::Unknown),
            },
        }
    }

    pub fn is_unit(&self) -> bool {
        matches!(self, Value::Unit)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Str(s) => f.write_str(s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Unit => f.write_str("()"),
            Value::Struct(s) => {
                write!(f, "{}(", s.name)?;
                for (i, (name, value)) in s.fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}={}", name, value)?;
                }
                f.write_str(")")
            }
            Value::Variant(v) => {
                f.write_str(v.tag.name())?;
                if !v.payload.is_empty() {
                    let parts: Vec<String> = v.payload.iter().map(|p| p.to_string()).collect();
                    write!(f, "({})", parts.join(", "))?;
                }
                Ok(())
            }
        }
    }
}
