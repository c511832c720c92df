//! Lowering of match arms into decision procedures

use std::collections::HashSet;

use crate::frontend::ast::{FieldPattern, Ident, LitValue, MatchArm, Pattern};
use crate::interp::value::VariantTag;
use crate::patterns::decision::{CompiledArm, Coverage, DecisionProcedure, Test};
use crate::patterns::usefulness::{Pat, Usefulness};
use crate::semantic::resolver::TypeResolver;
use crate::types::{PrimitiveType, ResolvedType, SOME};
use crate::utils::{Error, Result, Span};

/// Positional payload field of `Some`
const PAYLOAD: &str = "0";

#[derive(Clone, Copy)]
pub struct PatternCompiler<'r> {
    resolver: TypeResolver<'r>,
}

impl<'r> PatternCompiler<'r> {
    pub fn new(resolver: TypeResolver<'r>) -> Self {
        Self { resolver }
    }

    /// Compile `arms` over a subject of static type `subject`.
    ///
    /// Fails on the first malformed arm or when the arms are not exhaustive.
    /// Arms covered by earlier ones are kept but marked unreachable.
    pub fn compile(&self, subject: &ResolvedType, arms: &[MatchArm], span: Span) -> Result<DecisionProcedure> {
        let subject_type = self.subject_type(subject, arms)?;

        let mut compiled = Vec::with_capacity(arms.len());
        for arm in arms {
            let mut bindings = Vec::new();
            let test = self.lower(&arm.pattern, &subject_type, &mut bindings)?;
            compiled.push(CompiledArm { test, bindings, reachable: true, span: arm.span });
        }

        let usefulness = Usefulness::new(self.resolver);
        let rows: Vec<Vec<Pat>> = compiled
            .iter()
            .map(|arm| vec![usefulness.lower(&arm.test, &subject_type)])
            .collect();

        for (index, arm) in compiled.iter_mut().enumerate() {
            arm.reachable = usefulness.is_useful(&rows[..index], &rows[index], &subject_type);
        }
        if let Some(witness) = usefulness.missing(&rows, &subject_type) {
            return Err(Error::NonExhaustiveMatch { missing: usefulness.render(&witness), span });
        }

        let procedure = DecisionProcedure { subject_type, arms: compiled };
        log::debug!(
            "compiled match over {} with {} arm(s), {} unreachable",
            procedure.subject_type,
            procedure.arms.len(),
            procedure.unreachable_arms().count()
        );
        Ok(procedure)
    }

    /// Use the first constructor pattern to name the type of an unannotated subject
    fn subject_type(&self, subject: &ResolvedType, arms: &[MatchArm]) -> Result<ResolvedType> {
        if !subject.is_unknown() {
            return Ok(subject.clone());
        }
        for arm in arms {
            if let Pattern::Constructor { name, span, .. } = &arm.pattern {
                return self.resolver.constructor_type(&name.name, *span);
            }
        }
        Ok(ResolvedType::Unknown)
    }

    fn lower(&self, pattern: &Pattern, ty: &ResolvedType, bindings: &mut Vec<String>) -> Result<Test> {
        match pattern {
            Pattern::Wildcard { .. } => Ok(Test::Any),
            Pattern::Binding { name } => {
                if bindings.contains(&name.name) {
                    return Err(Error::DuplicateBinding { name: name.name.clone(), span: name.span });
                }
                bindings.push(name.name.clone());
                Ok(Test::Bind(name.name.clone()))
            }
            Pattern::Literal { value, span } => {
                let literal_type = match value {
                    LitValue::Bool(_) => PrimitiveType::Bool,
                    LitValue::Int(_) => PrimitiveType::Int,
                    LitValue::Str(_) => PrimitiveType::String,
                };
                match ty {
                    ResolvedType::Unknown => {}
                    ResolvedType::Primitive(p) if *p == literal_type => {}
                    _ => {
                        return Err(Error::PatternMismatch {
                            expected: ty.to_string(),
                            got: literal_type.name().to_string(),
                            span: *span,
                        })
                    }
                }
                Ok(Test::Literal(value.clone()))
            }
            Pattern::Constructor { name, fields, has_rest, span } => {
                let ty = match ty {
                    ResolvedType::Unknown => self.resolver.constructor_type(&name.name, *span)?,
                    other => other.clone(),
                };
                match &ty {
                    ResolvedType::Option(_) => self.lower_variant(&ty, name, fields, *has_rest, bindings),
                    ResolvedType::Struct(structure) if *structure == name.name => {
                        self.lower_struct(structure, fields, *has_rest, *span, bindings)
                    }
                    _ => Err(Error::PatternMismatch { expected: ty.to_string(), got: name.name.clone(), span: *span }),
                }
            }
        }
    }

    fn lower_variant(
        &self,
        ty: &ResolvedType,
        name: &Ident,
        fields: &[FieldPattern],
        has_rest: bool,
        bindings: &mut Vec<String>,
    ) -> Result<Test> {
        let shape = self.resolver.resolve_variant(ty, name)?;
        let tag = VariantTag::from_name(&name.name).ok_or_else(|| Error::UnknownVariant {
            sum_type: ty.to_string(),
            variant: name.name.clone(),
            span: name.span,
        })?;

        check_field_names(fields, &name.name, |f| shape.arity == 1 && f == PAYLOAD)?;
        if !has_rest && shape.arity == 1 && fields.is_empty() {
            return Err(Error::MissingField { structure: SOME.to_string(), field: PAYLOAD.to_string(), span: name.span });
        }

        let payload = match (fields.first(), shape.payload) {
            (Some(field), Some(payload_type)) => {
                Some(Box::new(self.lower(&field.sub_pattern(), &payload_type, bindings)?))
            }
            _ => None,
        };
        Ok(Test::Variant { tag, payload })
    }

    fn lower_struct(
        &self,
        structure: &str,
        fields: &[FieldPattern],
        has_rest: bool,
        span: Span,
        bindings: &mut Vec<String>,
    ) -> Result<Test> {
        let declared = self.resolver.struct_fields(structure).ok_or_else(|| Error::UnknownType {
            name: structure.to_string(),
            span,
        })?;

        check_field_names(fields, structure, |f| declared.iter().any(|(d, _)| d == f))?;
        if !has_rest {
            if let Some((missing, _)) = declared.iter().find(|(d, _)| !fields.iter().any(|f| f.name.name == *d)) {
                return Err(Error::MissingField { structure: structure.to_string(), field: missing.clone(), span });
            }
        }

        let mut tests = Vec::with_capacity(fields.len());
        for field in fields {
            let field_type = declared
                .iter()
                .find(|(d, _)| *d == field.name.name)
                .map(|(_, t)| t.clone())
                .unwrap_or(ResolvedType::Unknown);
            tests.push((field.name.name.clone(), self.lower(&field.sub_pattern(), &field_type, bindings)?));
        }
        let coverage = if has_rest { Coverage::Open } else { Coverage::Exact };
        Ok(Test::Struct { name: structure.to_string(), fields: tests, coverage })
    }
}

fn check_field_names(fields: &[FieldPattern], structure: &str, known: impl Fn(&str) -> bool) -> Result<()> {
    let mut seen = HashSet::new();
    for field in fields {
        let name = &field.name;
        if !known(&name.name) {
            return Err(Error::UnknownField { structure: structure.to_string(), field: name.name.clone(), span: name.span });
        }
        if !seen.insert(name.name.as_str()) {
            return Err(Error::DuplicateField { field: name.name.clone(), span: name.span });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::ast::Expr;
    use crate::frontend::build::*;
    use crate::interp::value::{StructValue, Value};
    use crate::semantic::registry::{Registry, RegistryBuilder};
    use pretty_assertions::assert_eq;

    fn registry() -> Registry {
        let mut builder = RegistryBuilder::new();
        for item in person_program() {
            builder.register(item).unwrap();
        }
        builder.close()
    }

    fn arms(patterns: Vec<Pattern>) -> Vec<MatchArm> {
        patterns
            .into_iter()
            .enumerate()
            .map(|(i, pattern)| MatchArm { pattern, body: int(i as i64), span: Span::dummy() })
            .collect()
    }

    fn opt_person() -> ResolvedType {
        ResolvedType::option(ResolvedType::Struct("Person".into()))
    }

    fn person_value(name: &str, age: i64) -> Value {
        Value::Struct(StructValue {
            name: "Person".into(),
            fields: vec![("name".into(), Value::Str(name.into())), ("age".into(), Value::Int(age))],
        })
    }

    #[test]
    fn test_some_and_none_are_exhaustive() {
        let reg = registry();
        let compiler = PatternCompiler::new(TypeResolver::new(&reg));
        let procedure = compiler
            .compile(&opt_person(), &arms(vec![psome(wild()), pnone()]), Span::dummy())
            .unwrap();
        assert_eq!(procedure.arms.len(), 2);
        assert!(procedure.arms.iter().all(|a| a.reachable));
    }

    #[test]
    fn test_some_only_is_not_exhaustive() {
        let reg = registry();
        let compiler = PatternCompiler::new(TypeResolver::new(&reg));
        let err = compiler.compile(&opt_person(), &arms(vec![psome(wild())]), Span::dummy()).unwrap_err();
        assert_eq!(err, Error::NonExhaustiveMatch { missing: "None".into(), span: Span::dummy() });
    }

    #[test]
    fn test_binding_then_wildcard_flags_second_arm() {
        let reg = registry();
        let compiler = PatternCompiler::new(TypeResolver::new(&reg));
        let procedure = compiler
            .compile(&ResolvedType::INT, &arms(vec![bind("x"), wild()]), Span::dummy())
            .unwrap();
        assert_eq!(procedure.unreachable_arms().map(|(i, _)| i).collect::<Vec<_>>(), vec![1]);
        let selection = procedure.select(&Value::Int(5), Span::dummy()).unwrap().unwrap();
        assert_eq!(selection.arm, 0);
    }

    #[test]
    fn test_nested_destructuring_with_rest() {
        let reg = registry();
        let compiler = PatternCompiler::new(TypeResolver::new(&reg));
        let some_person = psome(ctor("Person", vec![("age", None)], true));
        let procedure = compiler.compile(&opt_person(), &arms(vec![some_person, pnone()]), Span::dummy()).unwrap();

        assert_eq!(procedure.arms[0].bindings, vec!["age".to_string()]);
        let selection = procedure.select(&Value::some(person_value("X", 42)), Span::dummy()).unwrap().unwrap();
        assert_eq!(selection.bindings, vec![("age".to_string(), Value::Int(42))]);
    }

    #[test]
    fn test_exact_struct_pattern_requires_every_field() {
        let reg = registry();
        let compiler = PatternCompiler::new(TypeResolver::new(&reg));
        let partial = ctor("Person", vec![("age", None)], false);
        let err = compiler
            .compile(&ResolvedType::Struct("Person".into()), &arms(vec![partial]), Span::dummy())
            .unwrap_err();
        assert!(matches!(err, Error::MissingField { ref field, .. } if field == "name"));
    }

    #[test]
    fn test_duplicate_binding_in_one_arm() {
        let reg = registry();
        let compiler = PatternCompiler::new(TypeResolver::new(&reg));
        let pattern = ctor("Person", vec![("name", Some(bind("x"))), ("age", Some(bind("x")))], false);
        let err = compiler
            .compile(&ResolvedType::Struct("Person".into()), &arms(vec![pattern]), Span::dummy())
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateBinding { ref name, .. } if name == "x"));
    }

    #[test]
    fn test_unknown_variant_and_field() {
        let reg = registry();
        let compiler = PatternCompiler::new(TypeResolver::new(&reg));

        let err = compiler
            .compile(&opt_person(), &arms(vec![ctor("Ok", vec![], false), wild()]), Span::dummy())
            .unwrap_err();
        assert!(matches!(err, Error::UnknownVariant { .. }));

        let err = compiler
            .compile(
                &ResolvedType::Struct("Person".into()),
                &arms(vec![ctor("Person", vec![("email", None)], true)]),
                Span::dummy(),
            )
            .unwrap_err();
        assert!(matches!(err, Error::UnknownField { .. }));
    }

    #[test]
    fn test_pattern_type_mismatch() {
        let reg = registry();
        let compiler = PatternCompiler::new(TypeResolver::new(&reg));
        let err = compiler
            .compile(&ResolvedType::INT, &arms(vec![psome(wild()), wild()]), Span::dummy())
            .unwrap_err();
        assert!(matches!(err, Error::PatternMismatch { .. }));

        let err = compiler
            .compile(&opt_person(), &arms(vec![plit(LitValue::Int(1)), wild()]), Span::dummy())
            .unwrap_err();
        assert!(matches!(err, Error::PatternMismatch { .. }));
    }

    #[test]
    fn test_unannotated_subject_takes_type_from_patterns() {
        let reg = registry();
        let compiler = PatternCompiler::new(TypeResolver::new(&reg));
        let procedure = compiler
            .compile(&ResolvedType::Unknown, &arms(vec![pnone(), psome(bind("p"))]), Span::dummy())
            .unwrap();
        assert_eq!(procedure.subject_type, ResolvedType::option(ResolvedType::Unknown));
    }

    #[test]
    fn test_match_arm_bodies_are_untouched() {
        let reg = registry();
        let compiler = PatternCompiler::new(TypeResolver::new(&reg));
        let input = arms(vec![wild()]);
        compiler.compile(&ResolvedType::BOOL, &input, Span::dummy()).unwrap();
        assert!(matches!(input[0].body, Expr::Literal { .. }));
    }
}
