//! Type System for Lumen

use std::fmt;

use serde::Serialize;

/// Name of the built-in two-variant sum type
pub const OPTION: &str = "Option";
pub const SOME: &str = "Some";
pub const NONE: &str = "None";

/// Primitive types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum PrimitiveType {
    Int,
    String,
    Bool,
    Unit,
}

impl PrimitiveType {
    /// Look up a primitive by its source name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "int" => Some(Self::Int),
            "string" => Some(Self::String),
            "bool" => Some(Self::Bool),
            "unit" => Some(Self::Unit),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::String => "string",
            Self::Bool => "bool",
            Self::Unit => "unit",
        }
    }
}

/// Resolved type (after validation against the registry)
///
/// The rendered form (`Display`) doubles as the key for extension-method and
/// impl lookup, so `Option<Person>` keys on the pair (base, argument).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ResolvedType {
    Primitive(PrimitiveType),
    Struct(String),
    /// Static type of a receiver known only to implement a trait
    Trait(String),
    /// The built-in sum type applied to its type argument
    Option(Box<ResolvedType>),
    /// Not inferable statically; resolution is deferred to run time
    Unknown,
}

impl ResolvedType {
    pub const INT: Self = Self::Primitive(PrimitiveType::Int);
    pub const STRING: Self = Self::Primitive(PrimitiveType::String);
    pub const BOOL: Self = Self::Primitive(PrimitiveType::Bool);
    pub const UNIT: Self = Self::Primitive(PrimitiveType::Unit);

    pub fn option(inner: ResolvedType) -> Self {
        Self::Option(Box::new(inner))
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    /// True when no part of the type is unknown
    pub fn is_concrete(&self) -> bool {
        match self {
            Self::Unknown => false,
            Self::Option(inner) => inner.is_concrete(),
            _ => true,
        }
    }

    /// Key used by the registry for extension and impl targets
    pub fn key(&self) -> String {
        self.to_string()
    }

    /// The more specific of two compatible types, where `Unknown` matches
    /// anything. `None` when they disagree.
    pub fn unify(&self, other: &ResolvedType) -> Option<ResolvedType> {
        match (self, other) {
            (Self::Unknown, t) | (t, Self::Unknown) => Some(t.clone()),
            (Self::Option(a), Self::Option(b)) => a.unify(b).map(Self::option),
            (a, b) if a == b => Some(a.clone()),
            _ => None,
        }
    }
}

impl fmt::Display for ResolvedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(p) => f.write_str(p.name()),
            Self::Struct(name) | Self::Trait(name) => f.write_str(name),
            Self::Option(inner) => write!(f, "{}<{}>", OPTION, inner),
            Self::Unknown => f.write_str("_"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_matches_type_expr_rendering() {
        let ty = ResolvedType::option(ResolvedType::Struct("Person".into()));
        assert_eq!(ty.key(), "Option<Person>");
        assert!(ty.is_concrete());
        assert!(!ResolvedType::option(ResolvedType::Unknown).is_concrete());
    }

    #[test]
    fn test_primitive_names_round_trip() {
        for p in [PrimitiveType::Int, PrimitiveType::String, PrimitiveType::Bool, PrimitiveType::Unit] {
            assert_eq!(PrimitiveType::from_name(p.name()), Some(p));
        }
        assert_eq!(PrimitiveType::from_name("Person"), None);
    }

    #[test]
    fn test_unify_fills_unknown_parts() {
        let person = ResolvedType::Struct("Person".into());
        let declared = ResolvedType::option(person.clone());

        assert_eq!(declared.unify(&ResolvedType::option(ResolvedType::Unknown)), Some(declared.clone()));
        assert_eq!(ResolvedType::option(ResolvedType::Unknown).unify(&declared), Some(declared.clone()));
        assert_eq!(person.unify(&person), Some(person.clone()));
        assert_eq!(declared.unify(&ResolvedType::option(ResolvedType::INT)), None);
        assert_eq!(declared.unify(&person), None);
    }
}
