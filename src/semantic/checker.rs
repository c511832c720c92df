//! Load-time checker
//!
//! Runs once the registry is closed:
//! - validates the types named by every declaration and impl coverage
//! - resolves every identifier, member access and call inside every body
//! - compiles every match expression into a decision procedure
//!
//! Results are recorded by `NodeId` in an [`Analysis`] for the interpreter.
//! An error aborts the declaration (or impl/trait member) being checked; the
//! remaining declarations are still checked.

use std::collections::HashMap;

use crate::frontend::ast::*;
use crate::frontend::template;
use crate::patterns::{DecisionProcedure, PatternCompiler, Test};
use crate::semantic::methods::{trait_signature, Binding, CapabilityTable, MemberKind, MemberSignature, MethodResolver};
use crate::semantic::registry::Registry;
use crate::semantic::resolver::TypeResolver;
use crate::semantic::scope::{Symbol, SymbolTable};
use crate::types::{ResolvedType, NONE, OPTION, SOME};
use crate::utils::{Diagnostic, Diagnostics, Error, Result, Span};

/// Functions provided by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Print,
    Println,
}

impl Builtin {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "print" => Some(Self::Print),
            "println" => Some(Self::Println),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Print => "print",
            Self::Println => "println",
        }
    }

    pub fn arity(&self) -> usize {
        1
    }
}

/// What a name, member access or call was bound to at load time
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Parameter, `let` or pattern binding
    Local,
    /// Field of the receiver or of a struct-typed expression
    Field,
    /// Member bound statically against `receiver`
    Member { binding: Binding, receiver: ResolvedType },
    /// Member of `trait_name`, bound on each call against the concrete receiver
    Deferred { trait_name: String },
    /// Receiver type unknown until run time
    Dynamic,
    Function,
    Builtin(Builtin),
}

/// Load-time results consumed by the interpreter
#[derive(Debug, Clone, Default)]
pub struct Analysis {
    pub resolutions: HashMap<NodeId, Resolution>,
    /// Template placeholders, keyed by (literal, byte offset of the `$`)
    pub placeholders: HashMap<(NodeId, usize), Resolution>,
    pub matches: HashMap<NodeId, DecisionProcedure>,
}

impl Analysis {
    pub fn resolution(&self, id: NodeId) -> Option<&Resolution> {
        self.resolutions.get(&id)
    }

    pub fn placeholder(&self, literal: NodeId, offset: usize) -> Option<&Resolution> {
        self.placeholders.get(&(literal, offset))
    }

    pub fn procedure(&self, id: NodeId) -> Option<&DecisionProcedure> {
        self.matches.get(&id)
    }

    pub fn match_count(&self) -> usize {
        self.matches.len()
    }
}

pub struct Checker<'r> {
    registry: &'r Registry,
    types: TypeResolver<'r>,
    methods: MethodResolver<'r>,
    capabilities: &'r CapabilityTable,
    patterns: PatternCompiler<'r>,
    symbols: SymbolTable,
    /// Static type of the implicit receiver of the body being checked
    receiver: Option<ResolvedType>,
    /// Declaration being checked, for diagnostics
    origin: String,
    analysis: Analysis,
    diagnostics: Diagnostics,
}

impl<'r> Checker<'r> {
    pub fn new(registry: &'r Registry, capabilities: &'r CapabilityTable) -> Self {
        let types = TypeResolver::new(registry);
        Self {
            registry,
            types,
            methods: MethodResolver::new(registry),
            capabilities,
            patterns: PatternCompiler::new(types),
            symbols: SymbolTable::new(),
            receiver: None,
            origin: String::new(),
            analysis: Analysis::default(),
            diagnostics: Diagnostics::new(),
        }
    }

    /// Check every declaration of the registry
    pub fn check(mut self) -> (Analysis, Diagnostics) {
        let registry = self.registry;

        for s in registry.structs() {
            self.origin = format!("struct {}", s.name);
            let result = self.check_struct(s);
            self.report(result);
        }
        for t in registry.traits() {
            self.origin = format!("trait {}", t.name);
            for member in &t.members {
                let result = self.check_trait_member(t, member);
                self.report(result);
            }
        }
        for imp in registry.impls() {
            self.origin = format!("impl {} for {}", imp.trait_name, imp.target);
            self.check_impl(imp);
        }
        for ext in registry.extensions() {
            self.origin = format!("fn {}.{}", ext.target, ext.method.name);
            let result = self.check_extension(ext);
            self.report(result);
        }
        for func in registry.functions() {
            self.origin = format!("fn {}", func.name);
            let result = self.check_function(func);
            self.report(result);
        }

        log::debug!(
            "checked program: {} resolutions, {} matches, {} diagnostics",
            self.analysis.resolutions.len(),
            self.analysis.matches.len(),
            self.diagnostics.items.len()
        );
        (self.analysis, self.diagnostics)
    }

    fn report(&mut self, result: Result<()>) {
        if let Err(error) = result {
            self.diagnostics.push_error(&self.origin, &error);
        }
    }

    // ==================== Declarations ====================

    fn check_struct(&mut self, def: &StructDef) -> Result<()> {
        for field in &def.fields {
            self.types.resolve_type(&field.ty)?;
        }
        Ok(())
    }

    fn check_trait_member(&mut self, def: &TraitDef, member: &TraitMember) -> Result<()> {
        let receiver = ResolvedType::Trait(def.name.name.clone());
        match member {
            TraitMember::Property(p) => {
                self.types.resolve_type(&p.ty)?;
                match &p.default {
                    Some(body) => self.check_body(Some(receiver), &[], body),
                    None => Ok(()),
                }
            }
            TraitMember::Method(m) => {
                self.types.resolve_ret_type(m.ret_type.as_ref())?;
                match &m.default {
                    Some(body) => self.check_body(Some(receiver), &m.params, body),
                    None => self.check_params(&m.params).map(|_| ()),
                }
            }
        }
    }

    fn check_impl(&mut self, imp: &ImplBlock) {
        let Some(def) = self.registry.lookup_trait(&imp.trait_name.name) else {
            let error = Error::UnknownType { name: imp.trait_name.name.clone(), span: imp.trait_name.span };
            self.report(Err(error));
            return;
        };
        let target = match self.types.resolve_type(&imp.target) {
            Ok(target) => target,
            Err(error) => {
                self.report(Err(error));
                return;
            }
        };

        for sig in &def.members {
            let name = &sig.name().name;
            if !sig.has_default() && imp.member(name).is_none() {
                self.report(Err(Error::MissingTraitMember {
                    trait_name: def.name.name.clone(),
                    target: imp.target.to_string(),
                    member: name.clone(),
                    span: imp.span,
                }));
            }
        }
        for member in &imp.members {
            let result = self.check_impl_member(def, &target, member);
            self.report(result);
        }
    }

    fn check_impl_member(&mut self, def: &TraitDef, target: &ResolvedType, member: &ImplMember) -> Result<()> {
        let name = member.name();
        let supplied = match member {
            ImplMember::Property(_) => "property",
            ImplMember::Method(_) => "method",
        };
        let unexpected = || Error::UnexpectedImplMember {
            trait_name: def.name.name.clone(),
            member: name.name.clone(),
            expected: supplied.to_string(),
            span: member.span(),
        };

        match (member, def.member(&name.name).ok_or_else(unexpected)?) {
            (ImplMember::Property(p), TraitMember::Property(_)) => {
                if let Some(ty) = &p.ty {
                    self.types.resolve_type(ty)?;
                }
                self.check_body(Some(target.clone()), &[], &p.getter)
            }
            (ImplMember::Method(f), TraitMember::Method(sig)) => {
                if f.params.len() != sig.params.len() {
                    return Err(Error::ArgCountMismatch {
                        callee: format!("{}.{}", def.name, f.name),
                        expected: sig.params.len(),
                        got: f.params.len(),
                        span: f.span,
                    });
                }
                self.types.resolve_ret_type(f.ret_type.as_ref())?;
                self.check_body(Some(target.clone()), &f.params, &f.body)
            }
            _ => Err(unexpected()),
        }
    }

    fn check_extension(&mut self, ext: &ExtensionMethod) -> Result<()> {
        let target = self.types.resolve_type(&ext.target)?;
        self.types.resolve_ret_type(ext.method.ret_type.as_ref())?;
        self.check_body(Some(target), &ext.method.params, &ext.method.body)
    }

    fn check_function(&mut self, func: &Function) -> Result<()> {
        self.types.resolve_ret_type(func.ret_type.as_ref())?;
        self.check_body(None, &func.params, &func.body)
    }

    fn check_params(&self, params: &[Param]) -> Result<Vec<Symbol>> {
        let mut symbols: Vec<Symbol> = Vec::with_capacity(params.len());
        for param in params {
            if symbols.iter().any(|s| s.name == param.name.name) {
                return Err(Error::DuplicateDeclaration {
                    name: format!("parameter {}", param.name),
                    span: param.span,
                });
            }
            let ty = self.types.resolve_type(&param.ty)?;
            symbols.push(Symbol { name: param.name.name.clone(), ty, span: param.span });
        }
        Ok(symbols)
    }

    fn check_body(&mut self, receiver: Option<ResolvedType>, params: &[Param], body: &Block) -> Result<()> {
        let params = self.check_params(params)?;
        self.symbols = SymbolTable::new();
        self.receiver = receiver;
        for symbol in params {
            self.symbols.define(symbol);
        }
        let result = self.check_block(body);
        self.receiver = None;
        result.map(|_| ())
    }

    // ==================== Statements ====================

    fn check_block(&mut self, block: &Block) -> Result<ResolvedType> {
        let mut last_ty = ResolvedType::UNIT;
        for stmt in &block.stmts {
            last_ty = self.check_stmt(stmt)?;
        }
        Ok(last_ty)
    }

    fn check_scoped_block(&mut self, block: &Block) -> Result<ResolvedType> {
        self.symbols.enter_scope();
        let result = self.check_block(block);
        self.symbols.exit_scope();
        result
    }

    fn check_stmt(&mut self, stmt: &Stmt) -> Result<ResolvedType> {
        match stmt {
            Stmt::Let { name, ty, value, span } => {
                let value_ty = self.check_expr(value)?;
                let final_ty = match ty {
                    Some(t) => self.types.resolve_type(t)?,
                    None => value_ty,
                };
                self.symbols.define(Symbol { name: name.name.clone(), ty: final_ty, span: *span });
                Ok(ResolvedType::UNIT)
            }
            Stmt::Expr { expr } => self.check_expr(expr),
            Stmt::Return { value, .. } => {
                if let Some(expr) = value {
                    self.check_expr(expr)?;
                }
                Ok(ResolvedType::UNIT)
            }
        }
    }

    // ==================== Expressions ====================

    fn check_expr(&mut self, expr: &Expr) -> Result<ResolvedType> {
        match expr {
            Expr::Literal { value, id, span } => match value {
                LitValue::Bool(_) => Ok(ResolvedType::BOOL),
                LitValue::Int(_) => Ok(ResolvedType::INT),
                LitValue::Str(text) => {
                    self.check_template(text, *id, *span)?;
                    Ok(ResolvedType::STRING)
                }
            },

            Expr::Ident { name, id } => {
                let (resolution, ty) = self.check_ident(name)?;
                self.record(*id, resolution);
                Ok(ty)
            }

            Expr::This { span } => self
                .receiver
                .clone()
                .ok_or_else(|| Error::UnboundIdentifier { name: "this".to_string(), span: *span }),

            Expr::Field { expr, field, id, span } => {
                let ty = self.check_expr(expr)?;
                if let ResolvedType::Struct(structure) = &ty {
                    if let Some(field_ty) = self.types.field_type(structure, &field.name) {
                        self.record(*id, Resolution::Field);
                        return Ok(field_ty);
                    }
                }
                let (resolution, ret) = self.member_on(&ty, &field.name, 0, *span)?;
                self.record(*id, resolution);
                Ok(ret)
            }

            Expr::MethodCall { receiver, method, args, id, span } => {
                let ty = self.check_expr(receiver)?;
                for arg in args {
                    self.check_expr(arg)?;
                }
                let (resolution, ret) = self.member_on(&ty, &method.name, args.len(), *span)?;
                self.record(*id, resolution);
                Ok(ret)
            }

            Expr::Call { func, args, id, span } => {
                for arg in args {
                    self.check_expr(arg)?;
                }
                let (resolution, ret) = self.resolve_call(func, args.len(), *span)?;
                self.record(*id, resolution);
                Ok(ret)
            }

            Expr::StructLit { name, fields, .. } => {
                let names: Vec<&Ident> = fields.iter().map(|f| &f.name).collect();
                self.types.resolve_struct_literal(name, &names)?;
                for field in fields {
                    self.check_expr(&field.value)?;
                }
                Ok(ResolvedType::Struct(name.name.clone()))
            }

            Expr::Variant { variant, args, span } => {
                let expected = match variant.name.as_str() {
                    SOME => 1,
                    NONE => 0,
                    _ => {
                        return Err(Error::UnknownVariant {
                            sum_type: OPTION.to_string(),
                            variant: variant.name.clone(),
                            span: variant.span,
                        })
                    }
                };
                if args.len() != expected {
                    return Err(Error::ArgCountMismatch {
                        callee: variant.name.clone(),
                        expected,
                        got: args.len(),
                        span: *span,
                    });
                }
                let payload = match args.first() {
                    Some(arg) => self.check_expr(arg)?,
                    None => ResolvedType::Unknown,
                };
                Ok(ResolvedType::option(payload))
            }

            Expr::Binary { op, left, right, .. } => {
                let left_ty = self.check_expr(left)?;
                let right_ty = self.check_expr(right)?;
                Ok(if op.is_comparison() || op.is_logical() {
                    ResolvedType::BOOL
                } else if *op == BinOp::Add && (left_ty == ResolvedType::STRING || right_ty == ResolvedType::STRING) {
                    ResolvedType::STRING
                } else if left_ty.is_unknown() || right_ty.is_unknown() {
                    ResolvedType::Unknown
                } else {
                    ResolvedType::INT
                })
            }

            Expr::Unary { op, expr, .. } => {
                self.check_expr(expr)?;
                Ok(match op {
                    UnOp::Neg => ResolvedType::INT,
                    UnOp::Not => ResolvedType::BOOL,
                })
            }

            Expr::If { cond, then_block, else_block, .. } => {
                self.check_expr(cond)?;
                let then_ty = self.check_scoped_block(then_block)?;
                match else_block {
                    Some(block) => {
                        let else_ty = self.check_scoped_block(block)?;
                        Ok(if then_ty == else_ty { then_ty } else { ResolvedType::Unknown })
                    }
                    None => Ok(ResolvedType::UNIT),
                }
            }

            Expr::Match { subject, arms, id, span } => {
                let subject_ty = self.check_expr(subject)?;
                let procedure = self.patterns.compile(&subject_ty, arms, *span)?;
                for (index, arm) in procedure.unreachable_arms() {
                    self.diagnostics.push(Diagnostic::unreachable_arm(&self.origin, index, arm.span));
                }

                let mut result_ty = ResolvedType::Unknown;
                for (arm, compiled) in arms.iter().zip(&procedure.arms) {
                    let mut bound = Vec::new();
                    self.binding_types(&compiled.test, &procedure.subject_type, &mut bound);

                    self.symbols.enter_scope();
                    for (name, ty) in bound {
                        self.symbols.define(Symbol { name, ty, span: arm.span });
                    }
                    let arm_ty = self.check_expr(&arm.body);
                    self.symbols.exit_scope();

                    let arm_ty = arm_ty?;
                    if result_ty.is_unknown() {
                        result_ty = arm_ty;
                    }
                }
                self.analysis.matches.insert(*id, procedure);
                Ok(result_ty)
            }

            Expr::Block { block } => self.check_scoped_block(block),
        }
    }

    fn record(&mut self, id: NodeId, resolution: Resolution) {
        self.analysis.resolutions.insert(id, resolution);
    }

    /// Placeholders resolve like unqualified identifiers
    fn check_template(&mut self, text: &str, literal: NodeId, span: Span) -> Result<()> {
        for (name, offset) in template::placeholders(text) {
            let (resolution, _) = self.check_ident(&Ident::new(name, span))?;
            self.analysis.placeholders.insert((literal, offset), resolution);
        }
        Ok(())
    }

    /// Local binding, then receiver field, then zero-argument receiver member
    fn check_ident(&self, name: &Ident) -> Result<(Resolution, ResolvedType)> {
        if let Some(symbol) = self.symbols.lookup(&name.name) {
            return Ok((Resolution::Local, symbol.ty.clone()));
        }
        let unbound = || Error::UnboundIdentifier { name: name.name.clone(), span: name.span };
        let Some(receiver) = &self.receiver else {
            return Err(unbound());
        };
        if let ResolvedType::Struct(structure) = receiver {
            if let Some(ty) = self.types.field_type(structure, &name.name) {
                return Ok((Resolution::Field, ty));
            }
        }
        match self.member_on(receiver, &name.name, 0, name.span) {
            Err(Error::UnresolvedMember { .. }) => Err(unbound()),
            other => other,
        }
    }

    /// Receiver member, then free function, then builtin
    fn resolve_call(&self, func: &Ident, argc: usize, span: Span) -> Result<(Resolution, ResolvedType)> {
        if let Some(receiver) = &self.receiver {
            match self.member_on(receiver, &func.name, argc, span) {
                Err(Error::UnresolvedMember { .. }) => {}
                other => return other,
            }
        }
        if let Some(f) = self.registry.lookup_function(&func.name) {
            if f.params.len() != argc {
                return Err(Error::ArgCountMismatch {
                    callee: func.name.clone(),
                    expected: f.params.len(),
                    got: argc,
                    span,
                });
            }
            let ret = self.types.resolve_ret_type(f.ret_type.as_ref()).unwrap_or(ResolvedType::Unknown);
            return Ok((Resolution::Function, ret));
        }
        if let Some(builtin) = Builtin::from_name(&func.name) {
            if builtin.arity() != argc {
                return Err(Error::ArgCountMismatch {
                    callee: func.name.clone(),
                    expected: builtin.arity(),
                    got: argc,
                    span,
                });
            }
            return Ok((Resolution::Builtin(builtin), ResolvedType::UNIT));
        }
        Err(Error::UnboundIdentifier { name: func.name.clone(), span: func.span })
    }

    /// Resolve `member` on a receiver of static type `receiver`
    fn member_on(&self, receiver: &ResolvedType, member: &str, argc: usize, span: Span) -> Result<(Resolution, ResolvedType)> {
        let unresolved = || Error::UnresolvedMember {
            receiver: receiver.to_string(),
            member: member.to_string(),
            span,
        };
        match receiver {
            ResolvedType::Trait(trait_name) => {
                let sig = self
                    .registry
                    .lookup_trait(trait_name)
                    .and_then(|def| def.member(member))
                    .map(trait_signature)
                    .ok_or_else(unresolved)?;
                let ret = self.check_arity(member, &sig, argc, span)?;
                Ok((Resolution::Deferred { trait_name: trait_name.clone() }, ret))
            }
            ty if !ty.is_concrete() => Ok((Resolution::Dynamic, ResolvedType::Unknown)),
            ty => {
                let binding = self.capabilities.lookup(ty, member).map_err(|e| e.or_span(span))?;
                let sig = self.methods.signature(&binding).ok_or_else(unresolved)?;
                let ret = self.check_arity(member, &sig, argc, span)?;
                Ok((Resolution::Member { binding, receiver: ty.clone() }, ret))
            }
        }
    }

    fn check_arity(&self, member: &str, sig: &MemberSignature<'_>, argc: usize, span: Span) -> Result<ResolvedType> {
        let expected = match sig.kind {
            MemberKind::Property => 0,
            MemberKind::Method => sig.params.len(),
        };
        if expected != argc {
            return Err(Error::ArgCountMismatch { callee: member.to_string(), expected, got: argc, span });
        }
        Ok(self.types.resolve_ret_type(sig.ret_type).unwrap_or(ResolvedType::Unknown))
    }

    /// Static types of the names an arm binds
    fn binding_types(&self, test: &Test, ty: &ResolvedType, out: &mut Vec<(String, ResolvedType)>) {
        match test {
            Test::Any | Test::Literal(_) => {}
            Test::Bind(name) => out.push((name.clone(), ty.clone())),
            Test::Variant { payload, .. } => {
                if let Some(inner_test) = payload {
                    let inner = match ty {
                        ResolvedType::Option(inner) => (**inner).clone(),
                        _ => ResolvedType::Unknown,
                    };
                    self.binding_types(inner_test, &inner, out);
                }
            }
            Test::Struct { name, fields, .. } => {
                for (field, sub) in fields {
                    let field_ty = self.types.field_type(name, field).unwrap_or(ResolvedType::Unknown);
                    self.binding_types(sub, &field_ty, out);
                }
            }
        }
    }
}
