//! Type & Generic Resolver
//!
//! Validates type expressions against the registry and answers shape
//! questions (struct fields, sum-type variants) for the checker, the pattern
//! compiler and the interpreter. `Option<T>` is the only parametric type.

use std::collections::HashSet;

use crate::frontend::ast::{Ident, StructDef, TypeExpr};
use crate::semantic::registry::Registry;
use crate::types::{PrimitiveType, ResolvedType, NONE, OPTION, SOME};
use crate::utils::{Error, Result, Span};

/// Shape of one sum-type variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantShape {
    pub arity: usize,
    pub payload: Option<ResolvedType>,
}

#[derive(Clone, Copy)]
pub struct TypeResolver<'r> {
    registry: &'r Registry,
}

impl<'r> TypeResolver<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    /// Validate a type expression
    pub fn resolve_type(&self, ty: &TypeExpr) -> Result<ResolvedType> {
        let name = ty.name.name.as_str();
        let unknown = || Error::UnknownType { name: ty.to_string(), span: ty.span };

        if name == OPTION {
            return match ty.args.as_slice() {
                [arg] => Ok(ResolvedType::option(self.resolve_type(arg)?)),
                _ => Err(unknown()),
            };
        }
        if !ty.args.is_empty() {
            return Err(unknown());
        }
        if let Some(prim) = PrimitiveType::from_name(name) {
            return Ok(ResolvedType::Primitive(prim));
        }
        if self.registry.lookup_struct(name).is_some() {
            return Ok(ResolvedType::Struct(name.to_string()));
        }
        if self.registry.lookup_trait(name).is_some() {
            return Ok(ResolvedType::Trait(name.to_string()));
        }
        Err(unknown())
    }

    /// Like `resolve_type`, but an absent annotation means unit
    pub fn resolve_ret_type(&self, ty: Option<&TypeExpr>) -> Result<ResolvedType> {
        ty.map(|t| self.resolve_type(t)).transpose().map(|t| t.unwrap_or(ResolvedType::UNIT))
    }

    /// Check the field names of a struct literal; order is irrelevant
    pub fn resolve_struct_literal(&self, name: &Ident, provided: &[&Ident]) -> Result<&'r StructDef> {
        let def = self.registry.lookup_struct(&name.name).ok_or_else(|| Error::UnknownType {
            name: name.name.clone(),
            span: name.span,
        })?;

        let mut seen = HashSet::new();
        for field in provided {
            if def.field(&field.name).is_none() {
                return Err(Error::UnknownField {
                    structure: def.name.name.clone(),
                    field: field.name.clone(),
                    span: field.span,
                });
            }
            if !seen.insert(field.name.as_str()) {
                return Err(Error::DuplicateField { field: field.name.clone(), span: field.span });
            }
        }
        if let Some(missing) = def.fields.iter().find(|f| !seen.contains(f.name.name.as_str())) {
            return Err(Error::MissingField {
                structure: def.name.name.clone(),
                field: missing.name.name.clone(),
                span: name.span,
            });
        }
        Ok(def)
    }

    /// Map a variant name of the built-in sum type to its shape
    pub fn resolve_variant(&self, sum_type: &ResolvedType, variant: &Ident) -> Result<VariantShape> {
        let unknown = || Error::UnknownVariant {
            sum_type: sum_type.to_string(),
            variant: variant.name.clone(),
            span: variant.span,
        };
        let ResolvedType::Option(payload) = sum_type else {
            return Err(unknown());
        };
        match variant.name.as_str() {
            SOME => Ok(VariantShape { arity: 1, payload: Some((**payload).clone()) }),
            NONE => Ok(VariantShape { arity: 0, payload: None }),
            _ => Err(unknown()),
        }
    }

    /// Declared fields of a struct with their types, in declaration order.
    /// Field types that fail to resolve come back as `Unknown`; the
    /// declaration check reports them.
    pub fn struct_fields(&self, name: &str) -> Option<Vec<(String, ResolvedType)>> {
        let def = self.registry.lookup_struct(name)?;
        Some(
            def.fields
                .iter()
                .map(|f| {
                    let ty = self.resolve_type(&f.ty).unwrap_or(ResolvedType::Unknown);
                    (f.name.name.clone(), ty)
                })
                .collect(),
        )
    }

    pub fn field_type(&self, structure: &str, field: &str) -> Option<ResolvedType> {
        let def = self.registry.lookup_struct(structure)?;
        let field = def.field(field)?;
        Some(self.resolve_type(&field.ty).unwrap_or(ResolvedType::Unknown))
    }

    /// Type named by a constructor pattern when the subject type is unknown
    pub fn constructor_type(&self, name: &str, span: Span) -> Result<ResolvedType> {
        match name {
            SOME | NONE => Ok(ResolvedType::option(ResolvedType::Unknown)),
            _ if self.registry.lookup_struct(name).is_some() => Ok(ResolvedType::Struct(name.to_string())),
            _ => Err(Error::UnknownType { name: name.to_string(), span }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::build::*;
    use crate::semantic::registry::RegistryBuilder;
    use pretty_assertions::assert_eq;

    fn registry() -> Registry {
        let mut builder = RegistryBuilder::new();
        for item in person_program() {
            builder.register(item).unwrap();
        }
        builder.close()
    }

    fn person_literal_fields(names: &[&str]) -> Vec<Ident> {
        names.iter().map(|n| Ident::from(*n)).collect()
    }

    #[test]
    fn test_resolve_types() {
        let reg = registry();
        let resolver = TypeResolver::new(&reg);
        assert_eq!(resolver.resolve_type(&ty("int")).unwrap(), ResolvedType::INT);
        assert_eq!(
            resolver.resolve_type(&ty("Option<Person>")).unwrap(),
            ResolvedType::option(ResolvedType::Struct("Person".into()))
        );
        assert_eq!(
            resolver.resolve_type(&ty("PersonInfo")).unwrap(),
            ResolvedType::Trait("PersonInfo".into())
        );
    }

    #[test]
    fn test_resolve_type_rejects_bad_arity_and_unknown_names() {
        let reg = registry();
        let resolver = TypeResolver::new(&reg);
        for bad in ["Option", "Option<int, int>", "Person<int>", "Animal", "Option<Animal>"] {
            let err = resolver.resolve_type(&ty(bad)).unwrap_err();
            assert!(matches!(err, Error::UnknownType { .. }), "{}: {:?}", bad, err);
        }
    }

    #[test]
    fn test_struct_literal_any_field_order() {
        let reg = registry();
        let resolver = TypeResolver::new(&reg);
        for order in [["name", "age"], ["age", "name"]] {
            let fields = person_literal_fields(&order);
            let refs: Vec<&Ident> = fields.iter().collect();
            let def = resolver.resolve_struct_literal(&Ident::from("Person"), &refs).unwrap();
            assert_eq!(def.name.name, "Person");
        }
    }

    #[test]
    fn test_struct_literal_missing_and_unknown_fields() {
        let reg = registry();
        let resolver = TypeResolver::new(&reg);
        let person = Ident::from("Person");

        let fields = person_literal_fields(&["name"]);
        let refs: Vec<&Ident> = fields.iter().collect();
        let err = resolver.resolve_struct_literal(&person, &refs).unwrap_err();
        assert!(matches!(err, Error::MissingField { ref field, .. } if field == "age"));

        let fields = person_literal_fields(&["name", "age", "email"]);
        let refs: Vec<&Ident> = fields.iter().collect();
        let err = resolver.resolve_struct_literal(&person, &refs).unwrap_err();
        assert!(matches!(err, Error::UnknownField { ref field, .. } if field == "email"));

        let err = resolver.resolve_struct_literal(&Ident::from("Robot"), &[]).unwrap_err();
        assert!(matches!(err, Error::UnknownType { .. }));
    }

    #[test]
    fn test_resolve_variant() {
        let reg = registry();
        let resolver = TypeResolver::new(&reg);
        let opt = ResolvedType::option(ResolvedType::Struct("Person".into()));

        let some = resolver.resolve_variant(&opt, &Ident::from("Some")).unwrap();
        assert_eq!(some, VariantShape { arity: 1, payload: Some(ResolvedType::Struct("Person".into())) });
        let none = resolver.resolve_variant(&opt, &Ident::from("None")).unwrap();
        assert_eq!(none.arity, 0);

        let err = resolver.resolve_variant(&opt, &Ident::from("Ok")).unwrap_err();
        assert!(matches!(err, Error::UnknownVariant { .. }));
    }

    #[test]
    fn test_struct_fields_in_declaration_order() {
        let mut builder = RegistryBuilder::new();
        builder.register(struct_item("Pair", &[("b", "int"), ("a", "Ghost")])).unwrap();
        let reg = builder.close();
        let resolver = TypeResolver::new(&reg);
        assert_eq!(
            resolver.struct_fields("Pair").unwrap(),
            vec![("b".to_string(), ResolvedType::INT), ("a".to_string(), ResolvedType::Unknown)]
        );
        assert!(resolver.struct_fields("Nope").is_none());
    }
}
