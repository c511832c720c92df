//! Decision procedures: compiled match arms and their runtime evaluation

use crate::frontend::ast::LitValue;
use crate::interp::value::{Value, VariantTag};
use crate::types::ResolvedType;
use crate::utils::{Error, Result, Span};

/// Field coverage of a constructor test
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coverage {
    /// Every field of the value is named by the pattern
    Exact,
    /// Trailing `..`: unnamed fields are ignored
    Open,
}

/// Guarded test tree for one arm
#[derive(Debug, Clone, PartialEq)]
pub enum Test {
    Any,
    Bind(String),
    Literal(LitValue),
    /// `payload` is `None` for `None` and for `Some(..)`
    Variant {
        tag: VariantTag,
        payload: Option<Box<Test>>,
    },
    Struct {
        name: String,
        fields: Vec<(String, Test)>,
        coverage: Coverage,
    },
}

impl Test {
    /// Whether the test accepts every value of the subject type
    pub fn is_irrefutable(&self) -> bool {
        matches!(self, Test::Any | Test::Bind(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledArm {
    pub test: Test,
    /// Names introduced by the arm, in pattern order
    pub bindings: Vec<String>,
    pub reachable: bool,
    pub span: Span,
}

/// Ordered arms of one match expression, tried first to last
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionProcedure {
    pub subject_type: ResolvedType,
    pub arms: Vec<CompiledArm>,
}

/// The arm a value selected and the bindings it produced
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub arm: usize,
    pub bindings: Vec<(String, Value)>,
}

impl DecisionProcedure {
    /// Run the arms against `value`; the first arm whose test succeeds wins
    pub fn select(&self, value: &Value, span: Span) -> Result<Option<Selection>> {
        for (index, arm) in self.arms.iter().enumerate() {
            let mut bindings = Vec::with_capacity(arm.bindings.len());
            if run_test(&arm.test, value, &mut bindings, span)? {
                log::trace!("match at {}..{} took arm {}", span.start, span.end, index);
                return Ok(Some(Selection { arm: index, bindings }));
            }
        }
        Ok(None)
    }

    pub fn unreachable_arms(&self) -> impl Iterator<Item = (usize, &CompiledArm)> {
        self.arms.iter().enumerate().filter(|(_, arm)| !arm.reachable)
    }
}

fn run_test(test: &Test, value: &Value, out: &mut Vec<(String, Value)>, span: Span) -> Result<bool> {
    match test {
        Test::Any => Ok(true),
        Test::Bind(name) => {
            out.push((name.clone(), value.clone()));
            Ok(true)
        }
        Test::Literal(lit) => Ok(Value::from_lit(lit) == *value),
        Test::Variant { tag, payload } => {
            let Value::Variant(v) = value else {
                return Err(mismatch(tag.name(), value, span));
            };
            if v.tag != *tag {
                return Ok(false);
            }
            match (payload, v.payload.first()) {
                (Some(inner), Some(item)) => run_test(inner, item, out, span),
                (Some(_), None) => Err(mismatch(tag.name(), value, span)),
                (None, _) => Ok(true),
            }
        }
        Test::Struct { name, fields, coverage } => {
            let Value::Struct(s) = value else {
                return Err(mismatch(name, value, span));
            };
            if s.name != *name {
                return Ok(false);
            }
            if *coverage == Coverage::Exact && s.fields.len() != fields.len() {
                return Err(Error::RuntimeTypeMismatch {
                    expected: format!("{} with {} field(s)", name, fields.len()),
                    got: format!("{} with {} field(s)", s.name, s.fields.len()),
                    span,
                });
            }
            for (field, sub) in fields {
                let item = s.get(field).ok_or_else(|| Error::RuntimeTypeMismatch {
                    expected: format!("{} with field `{}`", name, field),
                    got: value.type_name(),
                    span,
                })?;
                if !run_test(sub, item, out, span)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
    }
}

fn mismatch(expected: &str, value: &Value, span: Span) -> Error {
    Error::RuntimeTypeMismatch { expected: expected.to_string(), got: value.type_name(), span }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::value::StructValue;
    use pretty_assertions::assert_eq;

    fn person(name: &str, age: i64) -> Value {
        Value::Struct(StructValue {
            name: "Person".into(),
            fields: vec![("name".into(), Value::Str(name.into())), ("age".into(), Value::Int(age))],
        })
    }

    fn arm(test: Test, bindings: &[&str]) -> CompiledArm {
        CompiledArm {
            test,
            bindings: bindings.iter().map(|b| b.to_string()).collect(),
            reachable: true,
            span: Span::dummy(),
        }
    }

    fn opt_age() -> DecisionProcedure {
        let some_person = Test::Variant {
            tag: VariantTag::Some,
            payload: Some(Box::new(Test::Struct {
                name: "Person".into(),
                fields: vec![("age".into(), Test::Bind("age".into()))],
                coverage: Coverage::Open,
            })),
        };
        DecisionProcedure {
            subject_type: ResolvedType::option(ResolvedType::Struct("Person".into())),
            arms: vec![
                arm(some_person, &["age"]),
                arm(Test::Variant { tag: VariantTag::None, payload: None }, &[]),
            ],
        }
    }

    #[test]
    fn test_nested_destructuring_binds_payload_field() {
        let selection = opt_age().select(&Value::some(person("X", 42)), Span::dummy()).unwrap().unwrap();
        assert_eq!(selection.arm, 0);
        assert_eq!(selection.bindings, vec![("age".to_string(), Value::Int(42))]);

        let selection = opt_age().select(&Value::none(), Span::dummy()).unwrap().unwrap();
        assert_eq!(selection.arm, 1);
        assert!(selection.bindings.is_empty());
    }

    #[test]
    fn test_first_match_wins() {
        let procedure = DecisionProcedure {
            subject_type: ResolvedType::INT,
            arms: vec![arm(Test::Bind("x".into()), &["x"]), arm(Test::Any, &[])],
        };
        for v in [Value::Int(0), Value::Int(-7), Value::Int(99)] {
            let selection = procedure.select(&v, Span::dummy()).unwrap().unwrap();
            assert_eq!(selection.arm, 0);
            assert_eq!(selection.bindings, vec![("x".to_string(), v.clone())]);
        }
    }

    #[test]
    fn test_literal_and_failed_arm_bindings_are_discarded() {
        let procedure = DecisionProcedure {
            subject_type: ResolvedType::Struct("Person".into()),
            arms: vec![
                arm(
                    Test::Struct {
                        name: "Person".into(),
                        fields: vec![
                            ("name".into(), Test::Bind("n".into())),
                            ("age".into(), Test::Literal(LitValue::Int(1))),
                        ],
                        coverage: Coverage::Exact,
                    },
                    &["n"],
                ),
                arm(Test::Any, &[]),
            ],
        };
        let selection = procedure.select(&person("Ann", 30), Span::dummy()).unwrap().unwrap();
        assert_eq!(selection.arm, 1);
        assert!(selection.bindings.is_empty());
    }

    #[test]
    fn test_exact_coverage_rejects_different_field_set() {
        let procedure = DecisionProcedure {
            subject_type: ResolvedType::Struct("Person".into()),
            arms: vec![arm(
                Test::Struct {
                    name: "Person".into(),
                    fields: vec![("age".into(), Test::Any)],
                    coverage: Coverage::Exact,
                },
                &[],
            )],
        };
        let err = procedure.select(&person("Ann", 30), Span::dummy()).unwrap_err();
        assert!(matches!(err, Error::RuntimeTypeMismatch { .. }));
    }
}
