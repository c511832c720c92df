//! Exhaustiveness and reachability
//!
//! Classic pattern-matrix usefulness: a row `q` is useful with respect to a
//! matrix `P` when some value matches `q` but no row of `P`. A match is
//! exhaustive iff the wildcard row is not useful against all arms, and an arm
//! is reachable iff it is useful against the arms above it. The search
//! returns a witness so the error can name a value nobody covers.

use std::fmt;

use crate::frontend::ast::LitValue;
use crate::interp::value::VariantTag;
use crate::patterns::decision::Test;
use crate::semantic::resolver::TypeResolver;
use crate::types::{PrimitiveType, ResolvedType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ctor {
    Variant(VariantTag),
    Struct(String),
    Bool(bool),
    Int(i64),
    Str(String),
}

/// Matrix cell; struct arguments are laid out in declaration order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pat {
    Wild,
    Ctor(Ctor, Vec<Pat>),
}

type Row = Vec<Pat>;

pub struct Usefulness<'r> {
    resolver: TypeResolver<'r>,
}

impl<'r> Usefulness<'r> {
    pub fn new(resolver: TypeResolver<'r>) -> Self {
        Self { resolver }
    }

    /// Flatten a test tree into a matrix cell for a column of type `ty`
    pub fn lower(&self, test: &Test, ty: &ResolvedType) -> Pat {
        match test {
            Test::Any | Test::Bind(_) => Pat::Wild,
            Test::Literal(LitValue::Bool(b)) => Pat::Ctor(Ctor::Bool(*b), Vec::new()),
            Test::Literal(LitValue::Int(n)) => Pat::Ctor(Ctor::Int(*n), Vec::new()),
            Test::Literal(LitValue::Str(s)) => Pat::Ctor(Ctor::Str(s.clone()), Vec::new()),
            Test::Variant { tag: VariantTag::None, .. } => Pat::Ctor(Ctor::Variant(VariantTag::None), Vec::new()),
            Test::Variant { tag: VariantTag::Some, payload } => {
                let inner = match ty {
                    ResolvedType::Option(inner) => (**inner).clone(),
                    _ => ResolvedType::Unknown,
                };
                let arg = payload.as_ref().map(|p| self.lower(p, &inner)).unwrap_or(Pat::Wild);
                Pat::Ctor(Ctor::Variant(VariantTag::Some), vec![arg])
            }
            Test::Struct { name, fields, .. } => {
                let declared = self.resolver.struct_fields(name).unwrap_or_default();
                let args = declared
                    .iter()
                    .map(|(field, field_ty)| {
                        fields
                            .iter()
                            .find(|(f, _)| f == field)
                            .map(|(_, sub)| self.lower(sub, field_ty))
                            .unwrap_or(Pat::Wild)
                    })
                    .collect();
                Pat::Ctor(Ctor::Struct(name.clone()), args)
            }
        }
    }

    /// A value of type `ty` matched by no row, if one exists
    pub fn missing(&self, rows: &[Row], ty: &ResolvedType) -> Option<Pat> {
        self.useful(rows, &[Pat::Wild], std::slice::from_ref(ty))
            .and_then(|mut witness| witness.pop())
    }

    /// Whether `row` matches some value the rows above it do not
    pub fn is_useful(&self, above: &[Row], row: &[Pat], ty: &ResolvedType) -> bool {
        self.useful(above, row, std::slice::from_ref(ty)).is_some()
    }

    fn useful(&self, rows: &[Row], q: &[Pat], tys: &[ResolvedType]) -> Option<Row> {
        let Some((head, rest)) = q.split_first() else {
            return rows.is_empty().then(Vec::new);
        };
        let ty = self.column_type(&tys[0], rows, head);

        match head {
            Pat::Ctor(ctor, args) => {
                let sub_tys = self.ctor_fields(ctor, &ty);
                let rows = specialize(rows, ctor, sub_tys.len());
                let q: Row = args.iter().chain(rest).cloned().collect();
                let tys: Vec<ResolvedType> = sub_tys.iter().chain(&tys[1..]).cloned().collect();
                self.useful(&rows, &q, &tys).map(|w| rebuild(ctor, sub_tys.len(), w))
            }
            Pat::Wild => {
                let used = head_ctors(rows);
                match all_ctors(&ty) {
                    Some(all) if all.iter().all(|c| used.contains(c)) => {
                        for ctor in &all {
                            let sub_tys = self.ctor_fields(ctor, &ty);
                            let specialized = specialize(rows, ctor, sub_tys.len());
                            let q: Row = std::iter::repeat(Pat::Wild)
                                .take(sub_tys.len())
                                .chain(rest.iter().cloned())
                                .collect();
                            let tys: Vec<ResolvedType> = sub_tys.iter().chain(&tys[1..]).cloned().collect();
                            if let Some(w) = self.useful(&specialized, &q, &tys) {
                                return Some(rebuild(ctor, sub_tys.len(), w));
                            }
                        }
                        None
                    }
                    all => {
                        let defaults: Vec<Row> = rows
                            .iter()
                            .filter(|r| matches!(r[0], Pat::Wild))
                            .map(|r| r[1..].to_vec())
                            .collect();
                        let mut witness = self.useful(&defaults, rest, &tys[1..])?;
                        let head = match all {
                            Some(all) if !used.is_empty() => all
                                .into_iter()
                                .find(|c| !used.contains(c))
                                .map(|c| {
                                    let arity = self.ctor_fields(&c, &ty).len();
                                    Pat::Ctor(c, vec![Pat::Wild; arity])
                                })
                                .unwrap_or(Pat::Wild),
                            _ => Pat::Wild,
                        };
                        witness.insert(0, head);
                        Some(witness)
                    }
                }
            }
        }
    }

    /// The column's type, recovered from its constructors when unannotated
    fn column_type(&self, declared: &ResolvedType, rows: &[Row], head: &Pat) -> ResolvedType {
        if !declared.is_unknown() {
            return declared.clone();
        }
        let heads = rows.iter().map(|r| &r[0]).chain(std::iter::once(head));
        for pat in heads {
            match pat {
                Pat::Ctor(Ctor::Variant(_), _) => return ResolvedType::option(ResolvedType::Unknown),
                Pat::Ctor(Ctor::Struct(name), _) => return ResolvedType::Struct(name.clone()),
                Pat::Ctor(Ctor::Bool(_), _) => return ResolvedType::BOOL,
                _ => {}
            }
        }
        ResolvedType::Unknown
    }

    fn ctor_fields(&self, ctor: &Ctor, ty: &ResolvedType) -> Vec<ResolvedType> {
        match ctor {
            Ctor::Variant(VariantTag::Some) => match ty {
                ResolvedType::Option(inner) => vec![(**inner).clone()],
                _ => vec![ResolvedType::Unknown],
            },
            Ctor::Struct(name) => self
                .resolver
                .struct_fields(name)
                .unwrap_or_default()
                .into_iter()
                .map(|(_, t)| t)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Render a witness the way a user would write the pattern
    pub fn render(&self, pat: &Pat) -> String {
        Rendered { pat, resolver: self.resolver }.to_string()
    }
}

/// Closed constructor set of a type; `None` for open types
fn all_ctors(ty: &ResolvedType) -> Option<Vec<Ctor>> {
    match ty {
        ResolvedType::Option(_) => Some(vec![Ctor::Variant(VariantTag::Some), Ctor::Variant(VariantTag::None)]),
        ResolvedType::Struct(name) => Some(vec![Ctor::Struct(name.clone())]),
        ResolvedType::Primitive(PrimitiveType::Bool) => Some(vec![Ctor::Bool(true), Ctor::Bool(false)]),
        _ => None,
    }
}

fn head_ctors(rows: &[Row]) -> Vec<Ctor> {
    let mut used: Vec<Ctor> = Vec::new();
    for row in rows {
        if let Pat::Ctor(c, _) = &row[0] {
            if !used.contains(c) {
                used.push(c.clone());
            }
        }
    }
    used
}

fn specialize(rows: &[Row], ctor: &Ctor, arity: usize) -> Vec<Row> {
    rows.iter()
        .filter_map(|row| match &row[0] {
            Pat::Ctor(c, args) if c == ctor => Some(args.iter().chain(&row[1..]).cloned().collect()),
            Pat::Ctor(..) => None,
            Pat::Wild => Some(std::iter::repeat(Pat::Wild).take(arity).chain(row[1..].iter().cloned()).collect()),
        })
        .collect()
}

fn rebuild(ctor: &Ctor, arity: usize, mut witness: Row) -> Row {
    let rest = witness.split_off(arity.min(witness.len()));
    let mut out = vec![Pat::Ctor(ctor.clone(), witness)];
    out.extend(rest);
    out
}

struct Rendered<'a, 'r> {
    pat: &'a Pat,
    resolver: TypeResolver<'r>,
}

impl<'a, 'r> Rendered<'a, 'r> {
    fn nested(&self, pat: &'a Pat) -> Rendered<'a, 'r> {
        Rendered { pat, resolver: self.resolver }
    }
}

impl fmt::Display for Rendered<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.pat {
            Pat::Wild => f.write_str("_"),
            Pat::Ctor(Ctor::Bool(b), _) => write!(f, "{}", b),
            Pat::Ctor(Ctor::Int(n), _) => write!(f, "{}", n),
            Pat::Ctor(Ctor::Str(s), _) => write!(f, "{:?}", s),
            Pat::Ctor(Ctor::Variant(tag), args) => {
                f.write_str(tag.name())?;
                match args.first() {
                    Some(arg) => write!(f, "({})", self.nested(arg)),
                    None => Ok(()),
                }
            }
            Pat::Ctor(Ctor::Struct(name), args) => {
                let names = self.resolver.struct_fields(name).unwrap_or_default();
                let named: Vec<String> = names
                    .iter()
                    .zip(args)
                    .filter(|(_, arg)| **arg != Pat::Wild)
                    .map(|((field, _), arg)| format!("{}: {}", field, self.nested(arg)))
                    .collect();
                if named.len() == args.len() && !args.is_empty() {
                    write!(f, "{} {{ {} }}", name, named.join(", "))
                } else if named.is_empty() {
                    write!(f, "{} {{ .. }}", name)
                } else {
                    write!(f, "{} {{ {}, .. }}", name, named.join(", "))
                }
            }
        }
    }
}
