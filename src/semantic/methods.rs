//! Method Resolution Engine
//!
//! Resolution order for `(receiver type, member)`:
//! 1. an extension method registered for exactly that receiver type
//! 2. the member supplied by an impl of some trait for the receiver type
//! 3. the default body of that trait
//!
//! Candidates from steps 2/3 in more than one trait are rejected as
//! ambiguous. After the registry closes, every answer is precomputed into a
//! `CapabilityTable` so lookups during checking and evaluation are map reads.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::frontend::ast::{Block, ImplBlock, ImplMember, Param, TraitMember, TypeExpr};
use crate::semantic::registry::Registry;
use crate::types::ResolvedType;
use crate::utils::{Error, Result, Span};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    Property,
    Method,
}

/// The implementation a member access resolves to
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum Binding {
    /// Extension method declared for the receiver type
    Extension { target: String, member: String },
    /// Member supplied by `impl trait_name for target`
    ImplMember {
        trait_name: String,
        target: String,
        member: String,
        kind: MemberKind,
    },
    /// Default body declared in the trait itself
    TraitDefault {
        trait_name: String,
        target: String,
        member: String,
        kind: MemberKind,
    },
}

impl Binding {
    pub fn member(&self) -> &str {
        match self {
            Binding::Extension { member, .. }
            | Binding::ImplMember { member, .. }
            | Binding::TraitDefault { member, .. } => member,
        }
    }

    pub fn kind(&self) -> MemberKind {
        match self {
            Binding::Extension { .. } => MemberKind::Method,
            Binding::ImplMember { kind, .. } | Binding::TraitDefault { kind, .. } => *kind,
        }
    }

    pub fn trait_name(&self) -> Option<&str> {
        match self {
            Binding::Extension { .. } => None,
            Binding::ImplMember { trait_name, .. } | Binding::TraitDefault { trait_name, .. } => {
                Some(trait_name)
            }
        }
    }
}

/// Declared shape of a resolved member
#[derive(Debug, Clone, Copy)]
pub struct MemberSignature<'r> {
    pub kind: MemberKind,
    pub params: &'r [Param],
    pub ret_type: Option<&'r TypeExpr>,
}

/// Executable body of a resolved member
#[derive(Debug, Clone, Copy)]
pub struct Callable<'r> {
    pub params: &'r [Param],
    pub body: &'r Block,
}

#[derive(Clone, Copy)]
pub struct MethodResolver<'r> {
    registry: &'r Registry,
}

impl<'r> MethodResolver<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    /// Resolve `member` on a receiver of static type `receiver`
    pub fn resolve(&self, receiver: &ResolvedType, member: &str) -> Result<Binding> {
        self.resolve_key(&receiver.key(), member)
    }

    fn resolve_key(&self, target: &str, member: &str) -> Result<Binding> {
        if self.registry.lookup_extension(target, member).is_some() {
            return Ok(Binding::Extension { target: target.to_string(), member: member.to_string() });
        }

        let mut candidates: Vec<Binding> = self
            .registry
            .lookup_impls(target)
            .into_iter()
            .filter_map(|imp| self.impl_candidate(imp, member))
            .collect();

        match candidates.len() {
            0 => Err(unresolved(target, member)),
            1 => Ok(candidates.remove(0)),
            _ => {
                let mut traits: Vec<String> = candidates
                    .iter()
                    .filter_map(|c| c.trait_name().map(str::to_string))
                    .collect();
                traits.sort();
                Err(Error::AmbiguousMember {
                    receiver: target.to_string(),
                    member: member.to_string(),
                    traits,
                    span: Span::dummy(),
                })
            }
        }
    }

    /// Resolve a member used inside a default body of `trait_name`, for a
    /// concrete receiver. Other traits of the receiver are not consulted.
    pub fn resolve_in_trait(&self, receiver: &ResolvedType, trait_name: &str, member: &str) -> Result<Binding> {
        let target = receiver.key();
        if self.registry.lookup_extension(&target, member).is_some() {
            return Ok(Binding::Extension { target, member: member.to_string() });
        }
        self.registry
            .lookup_impl(trait_name, &target)
            .and_then(|imp| self.impl_candidate(imp, member))
            .ok_or_else(|| unresolved(&target, member))
    }

    /// What `imp` contributes for `member`: its own member, else the trait default
    fn impl_candidate(&self, imp: &ImplBlock, member: &str) -> Option<Binding> {
        let decl = self.registry.lookup_trait(&imp.trait_name.name)?;
        let sig = decl.member(member)?;
        let kind = if sig.is_property() { MemberKind::Property } else { MemberKind::Method };
        let trait_name = decl.name.name.clone();
        let target = imp.target.to_string();
        let member = member.to_string();
        if imp.member(&member).is_some() {
            Some(Binding::ImplMember { trait_name, target, member, kind })
        } else if sig.has_default() {
            Some(Binding::TraitDefault { trait_name, target, member, kind })
        } else {
            None
        }
    }

    /// Signature of a resolved member
    pub fn signature(&self, binding: &Binding) -> Option<MemberSignature<'r>> {
        match binding {
            Binding::Extension { target, member } => {
                let ext = self.registry.lookup_extension(target, member)?;
                Some(MemberSignature {
                    kind: MemberKind::Method,
                    params: &ext.method.params,
                    ret_type: ext.method.ret_type.as_ref(),
                })
            }
            Binding::ImplMember { trait_name, target, member, .. } => {
                let sig = self.registry.lookup_trait(trait_name)?.member(member)?;
                let imp = self.registry.lookup_impl(trait_name, target)?;
                match (imp.member(member)?, sig) {
                    (ImplMember::Property(p), TraitMember::Property(s)) => Some(MemberSignature {
                        kind: MemberKind::Property,
                        params: &[],
                        ret_type: p.ty.as_ref().or(Some(&s.ty)),
                    }),
                    (ImplMember::Method(f), TraitMember::Method(s)) => Some(MemberSignature {
                        kind: MemberKind::Method,
                        params: &f.params,
                        ret_type: f.ret_type.as_ref().or(s.ret_type.as_ref()),
                    }),
                    _ => None,
                }
            }
            Binding::TraitDefault { trait_name, member, .. } => {
                Some(trait_signature(self.registry.lookup_trait(trait_name)?.member(member)?))
            }
        }
    }

    /// Body to execute for a resolved member
    pub fn callable(&self, binding: &Binding) -> Option<Callable<'r>> {
        match binding {
            Binding::Extension { target, member } => {
                let ext = self.registry.lookup_extension(target, member)?;
                Some(Callable { params: &ext.method.params, body: &ext.method.body })
            }
            Binding::ImplMember { trait_name, target, member, .. } => {
                match self.registry.lookup_impl(trait_name, target)?.member(member)? {
                    ImplMember::Property(p) => Some(Callable { params: &[], body: &p.getter }),
                    ImplMember::Method(f) => Some(Callable { params: &f.params, body: &f.body }),
                }
            }
            Binding::TraitDefault { trait_name, member, .. } => {
                match self.registry.lookup_trait(trait_name)?.member(member)? {
                    TraitMember::Property(p) => Some(Callable { params: &[], body: p.default.as_ref()? }),
                    TraitMember::Method(m) => Some(Callable { params: &m.params, body: m.default.as_ref()? }),
                }
            }
        }
    }
}

fn unresolved(target: &str, member: &str) -> Error {
    Error::UnresolvedMember {
        receiver: target.to_string(),
        member: member.to_string(),
        span: Span::dummy(),
    }
}

/// Signature as declared by a trait member
pub fn trait_signature(member: &TraitMember) -> MemberSignature<'_> {
    match member {
        TraitMember::Property(p) => MemberSignature {
            kind: MemberKind::Property,
            params: &[],
            ret_type: Some(&p.ty),
        },
        TraitMember::Method(m) => MemberSignature {
            kind: MemberKind::Method,
            params: &m.params,
            ret_type: m.ret_type.as_ref(),
        },
    }
}

// ==================== Capability Table ====================

/// Precomputed member → resolution mapping per receiver type key
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CapabilityTable {
    types: BTreeMap<String, BTreeMap<String, Result<Binding>>>,
}

impl CapabilityTable {
    /// Resolve every member name reachable on every extended or implementing type
    pub fn build(registry: &Registry) -> Self {
        let resolver = MethodResolver::new(registry);

        let mut members: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for ext in registry.extensions() {
            members
                .entry(ext.target.to_string())
                .or_default()
                .insert(ext.method.name.name.clone());
        }
        for imp in registry.impls() {
            let names = members.entry(imp.target.to_string()).or_default();
            if let Some(decl) = registry.lookup_trait(&imp.trait_name.name) {
                names.extend(decl.members.iter().map(|m| m.name().name.clone()));
            }
        }

        let types = members
            .into_iter()
            .map(|(target, names)| {
                let resolved = names
                    .into_iter()
                    .map(|name| {
                        let result = resolver.resolve_key(&target, &name);
                        (name, result)
                    })
                    .collect();
                (target, resolved)
            })
            .collect::<BTreeMap<_, _>>();

        log::debug!("capability table built for {} types", types.len());
        Self { types }
    }

    pub fn lookup(&self, receiver: &ResolvedType, member: &str) -> Result<Binding> {
        let key = receiver.key();
        match self.types.get(&key).and_then(|m| m.get(member)) {
            Some(result) => result.clone(),
            None => Err(unresolved(&key, member)),
        }
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }
}
