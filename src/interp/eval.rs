//! Tree-walking evaluator
//!
//! Executes bodies using the resolutions the checker recorded. Members bound
//! at load time are invoked directly. Deferred members are resolved within
//! their trait, dynamic ones through the capability table, both against the
//! receiver's concrete type.

use crate::frontend::ast::*;
use crate::frontend::template::{self, Segment};
use crate::interp::env::{Frame, Receiver};
use crate::interp::sink::OutputSink;
use crate::interp::value::{StructValue, Value};
use crate::patterns::PatternCompiler;
use crate::semantic::checker::{Analysis, Builtin, Resolution};
use crate::semantic::methods::{Binding, CapabilityTable, MethodResolver};
use crate::semantic::registry::Registry;
use crate::semantic::resolver::TypeResolver;
use crate::types::{ResolvedType, SOME};
use crate::utils::{Error, Result, Span};

/// Outcome of evaluating a statement or expression
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Value(Value),
    /// `return` unwinding to the enclosing call
    Return(Value),
}

/// Unwrap a `Flow`, propagating `return` to the caller
macro_rules! value {
    ($flow:expr) => {
        match $flow? {
            Flow::Value(v) => v,
            ret @ Flow::Return(_) => return Ok(ret),
        }
    };
}

pub struct Interpreter<'p, 's> {
    registry: &'p Registry,
    types: TypeResolver<'p>,
    methods: MethodResolver<'p>,
    capabilities: &'p CapabilityTable,
    analysis: &'p Analysis,
    sink: &'s mut dyn OutputSink,
}

impl<'p, 's> Interpreter<'p, 's> {
    pub fn new(
        registry: &'p Registry,
        capabilities: &'p CapabilityTable,
        analysis: &'p Analysis,
        sink: &'s mut dyn OutputSink,
    ) -> Self {
        Self {
            registry,
            types: TypeResolver::new(registry),
            methods: MethodResolver::new(registry),
            capabilities,
            analysis,
            sink,
        }
    }

    // ==================== Calls ====================

    /// Call a free function
    pub fn call_function(&mut self, name: &str, args: Vec<Value>) -> Result<Value> {
        let registry = self.registry;
        let func = registry.lookup_function(name).ok_or_else(|| Error::UnboundIdentifier {
            name: name.to_string(),
            span: Span::dummy(),
        })?;
        log::trace!("call fn {}", name);
        let mut frame = Frame::new(None);
        bind_params(&mut frame, name, &func.params, args, func.span)?;
        self.run_body(&func.body, &mut frame)
    }

    /// Invoke `member` on `receiver`, dispatching on `receiver_type`
    pub fn call_member(
        &mut self,
        receiver: Value,
        receiver_type: &ResolvedType,
        member: &str,
        args: Vec<Value>,
    ) -> Result<Value> {
        let binding = self.capabilities.lookup(receiver_type, member)?;
        self.invoke(&binding, Receiver::new(receiver, receiver_type.clone()), args, Span::dummy())
    }

    fn invoke(&mut self, binding: &Binding, receiver: Receiver, args: Vec<Value>, span: Span) -> Result<Value> {
        let callable = self.methods.callable(binding).ok_or_else(|| Error::UnresolvedMember {
            receiver: receiver.ty.to_string(),
            member: binding.member().to_string(),
            span,
        })?;
        log::trace!("invoke {} on {} via {:?}", binding.member(), receiver.ty, binding);
        let mut frame = Frame::new(Some(receiver));
        bind_params(&mut frame, binding.member(), callable.params, args, span)?;
        self.run_body(callable.body, &mut frame)
    }

    /// Dispatch a member whose binding may only be known now
    fn dispatch(
        &mut self,
        resolution: Option<&Resolution>,
        receiver: Receiver,
        member: &str,
        args: Vec<Value>,
        span: Span,
    ) -> Result<Value> {
        let binding = match resolution {
            Some(Resolution::Member { binding, .. }) => binding.clone(),
            Some(Resolution::Deferred { trait_name }) => self
                .methods
                .resolve_in_trait(&receiver.ty, trait_name, member)
                .map_err(|e| e.or_span(span))?,
            _ => self.capabilities.lookup(&receiver.ty, member).map_err(|e| e.or_span(span))?,
        };
        self.invoke(&binding, receiver, args, span)
    }

    fn run_body(&mut self, body: &Block, frame: &mut Frame) -> Result<Value> {
        match self.eval_block(body, frame)? {
            Flow::Value(v) | Flow::Return(v) => Ok(v),
        }
    }

    fn implicit_receiver(frame: &Frame, name: &str, span: Span) -> Result<Receiver> {
        frame
            .receiver()
            .cloned()
            .ok_or_else(|| Error::UnboundIdentifier { name: name.to_string(), span })
    }

    /// Dispatch type of an explicit receiver; `this` keeps the type of the frame
    fn receiver_type(expr: &Expr, value: &Value, resolution: Option<&Resolution>, frame: &Frame) -> ResolvedType {
        match (resolution, expr) {
            (Some(Resolution::Member { receiver, .. }), _) => receiver.clone(),
            (_, Expr::This { .. }) => frame.receiver().map(|r| r.ty.clone()).unwrap_or_else(|| value.runtime_type()),
            _ => value.runtime_type(),
        }
    }

    // ==================== Statements ====================

    fn eval_block(&mut self, block: &Block, frame: &mut Frame) -> Result<Flow> {
        let mut last = Value::Unit;
        for stmt in &block.stmts {
            last = match stmt {
                Stmt::Let { name, value, .. } => {
                    let v = value!(self.eval_expr(value, frame));
                    frame.define(name.name.clone(), v);
                    Value::Unit
                }
                Stmt::Expr { expr } => value!(self.eval_expr(expr, frame)),
                Stmt::Return { value, .. } => {
                    let v = match value {
                        Some(expr) => value!(self.eval_expr(expr, frame)),
                        None => Value::Unit,
                    };
                    return Ok(Flow::Return(v));
                }
            };
        }
        Ok(Flow::Value(last))
    }

    fn eval_scoped_block(&mut self, block: &Block, frame: &mut Frame) -> Result<Flow> {
        frame.push_scope();
        let flow = self.eval_block(block, frame);
        frame.pop_scope();
        flow
    }

    // ==================== Expressions ====================

    pub fn eval_expr(&mut self, expr: &Expr, frame: &mut Frame) -> Result<Flow> {
        let analysis = self.analysis;
        let value = match expr {
            Expr::Literal { value, id, span } => match value {
                LitValue::Str(text) => Value::Str(self.render_template(text, *id, frame, *span)?),
                other => Value::from_lit(other),
            },

            Expr::Ident { name, id } => self.eval_name(name, analysis.resolution(*id), frame)?,

            Expr::This { span } => Self::implicit_receiver(frame, "this", *span)?.value,

            Expr::Field { expr: target, field, id, span } => {
                let resolution = analysis.resolution(*id);
                let value = value!(self.eval_expr(target, frame));
                let direct = match resolution {
                    Some(Resolution::Field) | None => field_of(&value, &field.name).cloned(),
                    _ => None,
                };
                match direct {
                    Some(v) => v,
                    None => {
                        let ty = Self::receiver_type(target, &value, resolution, frame);
                        self.dispatch(resolution, Receiver::new(value, ty), &field.name, Vec::new(), *span)?
                    }
                }
            }

            Expr::MethodCall { receiver, method, args, id, span } => {
                let resolution = analysis.resolution(*id);
                let value = value!(self.eval_expr(receiver, frame));
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(value!(self.eval_expr(arg, frame)));
                }
                let ty = Self::receiver_type(receiver, &value, resolution, frame);
                self.dispatch(resolution, Receiver::new(value, ty), &method.name, values, *span)?
            }

            Expr::Call { func, args, id, span } => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(value!(self.eval_expr(arg, frame)));
                }
                self.eval_call(func, analysis.resolution(*id), values, frame, *span)?
            }

            Expr::StructLit { name, fields, span } => {
                let mut provided = Vec::with_capacity(fields.len());
                for field in fields {
                    provided.push((field.name.name.as_str(), value!(self.eval_expr(&field.value, frame))));
                }
                self.build_struct(name, provided, *span)?
            }

            Expr::Variant { variant, args, .. } => match args.first() {
                Some(arg) if variant.name == SOME => Value::some(value!(self.eval_expr(arg, frame))),
                _ => Value::none(),
            },

            Expr::Binary { op: BinOp::And, left, right, span } => {
                let l = value!(self.eval_expr(left, frame));
                if !as_bool(&l, *span)? {
                    Value::Bool(false)
                } else {
                    Value::Bool(as_bool(&value!(self.eval_expr(right, frame)), *span)?)
                }
            }

            Expr::Binary { op: BinOp::Or, left, right, span } => {
                let l = value!(self.eval_expr(left, frame));
                if as_bool(&l, *span)? {
                    Value::Bool(true)
                } else {
                    Value::Bool(as_bool(&value!(self.eval_expr(right, frame)), *span)?)
                }
            }

            Expr::Binary { op, left, right, span } => {
                let l = value!(self.eval_expr(left, frame));
                let r = value!(self.eval_expr(right, frame));
                binary_op(*op, l, r, *span)?
            }

            Expr::Unary { op, expr: operand, span } => {
                let v = value!(self.eval_expr(operand, frame));
                match (op, v) {
                    (UnOp::Neg, Value::Int(n)) => Value::Int(n.wrapping_neg()),
                    (UnOp::Not, Value::Bool(b)) => Value::Bool(!b),
                    (UnOp::Neg, other) => return Err(type_mismatch("int", &other, *span)),
                    (UnOp::Not, other) => return Err(type_mismatch("bool", &other, *span)),
                }
            }

            Expr::If { cond, then_block, else_block, span } => {
                let c = value!(self.eval_expr(cond, frame));
                if as_bool(&c, *span)? {
                    return self.eval_scoped_block(then_block, frame);
                }
                match else_block {
                    Some(block) => return self.eval_scoped_block(block, frame),
                    None => Value::Unit,
                }
            }

            Expr::Match { subject, arms, id, span } => {
                let scrutinee = value!(self.eval_expr(subject, frame));
                return self.eval_match(scrutinee, arms, *id, frame, *span);
            }

            Expr::Block { block } => return self.eval_scoped_block(block, frame),
        };
        Ok(Flow::Value(value))
    }

    fn eval_call(
        &mut self,
        func: &Ident,
        resolution: Option<&Resolution>,
        args: Vec<Value>,
        frame: &mut Frame,
        span: Span,
    ) -> Result<Value> {
        match resolution {
            Some(Resolution::Member { .. } | Resolution::Deferred { .. } | Resolution::Dynamic) => {
                let receiver = Self::implicit_receiver(frame, &func.name, span)?;
                self.dispatch(resolution, receiver, &func.name, args, span)
            }
            Some(Resolution::Function) => self.call_function(&func.name, args).map_err(|e| e.or_span(span)),
            Some(Resolution::Builtin(builtin)) => self.call_builtin(*builtin, args),
            _ => {
                if let Some(receiver) = frame.receiver().cloned() {
                    if let Ok(binding) = self.capabilities.lookup(&receiver.ty, &func.name) {
                        return self.invoke(&binding, receiver, args, span);
                    }
                }
                if self.registry.lookup_function(&func.name).is_some() {
                    return self.call_function(&func.name, args);
                }
                match Builtin::from_name(&func.name) {
                    Some(builtin) => self.call_builtin(builtin, args),
                    None => Err(unbound(func)),
                }
            }
        }
    }

    fn call_builtin(&mut self, builtin: Builtin, args: Vec<Value>) -> Result<Value> {
        match builtin {
            Builtin::Print | Builtin::Println => {
                let line: Vec<String> = args.iter().map(Value::to_string).collect();
                self.sink.write_line(&line.join(" "));
                Ok(Value::Unit)
            }
        }
    }

    fn eval_match(&mut self, scrutinee: Value, arms: &[MatchArm], id: NodeId, frame: &mut Frame, span: Span) -> Result<Flow> {
        let analysis = self.analysis;
        let compiled;
        let procedure = match analysis.procedure(id) {
            Some(procedure) => procedure,
            None => {
                compiled = PatternCompiler::new(self.types).compile(&scrutinee.runtime_type(), arms, span)?;
                &compiled
            }
        };
        let selection = procedure.select(&scrutinee, span)?.ok_or_else(|| Error::RuntimeTypeMismatch {
            expected: procedure.subject_type.to_string(),
            got: scrutinee.type_name(),
            span,
        })?;

        let arm = arms.get(selection.arm).ok_or_else(|| Error::RuntimeTypeMismatch {
            expected: format!("{} arm(s)", arms.len()),
            got: format!("arm {}", selection.arm + 1),
            span,
        })?;
        frame.push_scope();
        for (name, value) in selection.bindings {
            frame.define(name, value);
        }
        let flow = self.eval_expr(&arm.body, frame);
        frame.pop_scope();
        flow
    }

    /// Unqualified name without a recorded resolution: local, receiver
    /// field, then zero-argument receiver member
    fn lookup_name(&mut self, name: &Ident, frame: &mut Frame) -> Result<Value> {
        if let Some(v) = frame.local(&name.name) {
            return Ok(v.clone());
        }
        let Some(receiver) = frame.receiver().cloned() else {
            return Err(unbound(name));
        };
        if let Some(v) = receiver.field(&name.name) {
            return Ok(v.clone());
        }
        match self.capabilities.lookup(&receiver.ty, &name.name) {
            Ok(binding) => self.invoke(&binding, receiver, Vec::new(), name.span),
            Err(_) => Err(unbound(name)),
        }
    }

    /// Unqualified name, evaluated the way the checker bound it
    fn eval_name(&mut self, name: &Ident, resolution: Option<&Resolution>, frame: &mut Frame) -> Result<Value> {
        match resolution {
            Some(Resolution::Local) => frame.local(&name.name).cloned().ok_or_else(|| unbound(name)),
            Some(Resolution::Field) => {
                let receiver = Self::implicit_receiver(frame, &name.name, name.span)?;
                receiver.field(&name.name).cloned().ok_or_else(|| unbound(name))
            }
            Some(Resolution::Member { .. } | Resolution::Deferred { .. } | Resolution::Dynamic) => {
                let receiver = Self::implicit_receiver(frame, &name.name, name.span)?;
                self.dispatch(resolution, receiver, &name.name, Vec::new(), name.span)
            }
            _ => self.lookup_name(name, frame),
        }
    }

    fn render_template(&mut self, text: &str, literal: NodeId, frame: &mut Frame, span: Span) -> Result<String> {
        let analysis = self.analysis;
        let mut out = String::with_capacity(text.len());
        for segment in template::parse(text) {
            match segment {
                Segment::Text(s) => out.push_str(&s),
                Segment::Placeholder { name, offset } => {
                    let resolution = analysis.placeholder(literal, offset);
                    let value = self.eval_name(&Ident::new(name, span), resolution, frame)?;
                    out.push_str(&value.to_string());
                }
            }
        }
        Ok(out)
    }

    /// Build an instance with fields in declaration order
    fn build_struct(&self, name: &Ident, mut provided: Vec<(&str, Value)>, span: Span) -> Result<Value> {
        let def = self.registry.lookup_struct(&name.name).ok_or_else(|| Error::UnknownType {
            name: name.name.clone(),
            span,
        })?;
        let mut fields = Vec::with_capacity(def.fields.len());
        for field in &def.fields {
            let index = provided
                .iter()
                .position(|(n, _)| *n == field.name.name)
                .ok_or_else(|| Error::MissingField {
                    structure: name.name.clone(),
                    field: field.name.name.clone(),
                    span,
                })?;
            let (_, value) = provided.swap_remove(index);
            fields.push((field.name.name.clone(), value));
        }
        Ok(Value::Struct(StructValue { name: name.name.clone(), fields }))
    }
}

fn bind_params(frame: &mut Frame, callee: &str, params: &[Param], args: Vec<Value>, span: Span) -> Result<()> {
    if params.len() != args.len() {
        return Err(Error::ArgCountMismatch {
            callee: callee.to_string(),
            expected: params.len(),
            got: args.len(),
            span,
        });
    }
    for (param, arg) in params.iter().zip(args) {
        frame.define(param.name.name.clone(), arg);
    }
    Ok(())
}

fn field_of<'v>(value: &'v Value, name: &str) -> Option<&'v Value> {
    match value {
        Value::Struct(s) => s.get(name),
        _ => None,
    }
}

fn unbound(name: &Ident) -> Error {
    Error::UnboundIdentifier { name: name.name.clone(), span: name.span }
}

fn type_mismatch(expected: &str, got: &Value, span: Span) -> Error {
    Error::RuntimeTypeMismatch { expected: expected.to_string(), got: got.type_name(), span }
}

fn as_bool(value: &Value, span: Span) -> Result<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        other => Err(type_mismatch("bool", other, span)),
    }
}

fn binary_op(op: BinOp, l: Value, r: Value, span: Span) -> Result<Value> {
    match (op, l, r) {
        (BinOp::Eq, l, r) => Ok(Value::Bool(l == r)),
        (BinOp::Ne, l, r) => Ok(Value::Bool(l != r)),
        (BinOp::Add, l @ Value::Str(_), r) | (BinOp::Add, l, r @ Value::Str(_)) => {
            Ok(Value::Str(format!("{}{}", l, r)))
        }
        (_, Value::Int(_), Value::Int(0)) if matches!(op, BinOp::Div | BinOp::Mod) => Err(Error::DivisionByZero { span }),
        (op, Value::Int(a), Value::Int(b)) => Ok(match op {
            BinOp::Add => Value::Int(a.wrapping_add(b)),
            BinOp::Sub => Value::Int(a.wrapping_sub(b)),
            BinOp::Mul => Value::Int(a.wrapping_mul(b)),
            BinOp::Div => Value::Int(a.wrapping_div(b)),
            BinOp::Mod => Value::Int(a.wrapping_rem(b)),
            BinOp::Lt => Value::Bool(a < b),
            BinOp::Le => Value::Bool(a <= b),
            BinOp::Gt => Value::Bool(a > b),
            BinOp::Ge => Value::Bool(a >= b),
            _ => return Err(Error::RuntimeTypeMismatch { expected: "bool".into(), got: "int".into(), span }),
        }),
        (op, Value::Str(a), Value::Str(b)) if op.is_comparison() => Ok(Value::Bool(match op {
            BinOp::Lt => a < b,
            BinOp::Le => a <= b,
            BinOp::Gt => a > b,
            _ => a >= b,
        })),
        (_, l, _) => Err(type_mismatch("int", &l, span)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::build::*;
    use crate::interp::sink::CaptureSink;
    use crate::semantic::checker::Checker;
    use crate::semantic::registry::RegistryBuilder;
    use pretty_assertions::assert_eq;

    fn run(items: Vec<Item>, entry: &str) -> (Result<Value>, Vec<String>) {
        let mut builder = RegistryBuilder::new();
        for item in items {
            builder.register(item).unwrap();
        }
        let registry = builder.close();
        let capabilities = CapabilityTable::build(&registry);
        let (analysis, diagnostics) = Checker::new(&registry, &capabilities).check();
        assert!(!diagnostics.has_errors(), "{:?}", diagnostics);

        let mut sink = CaptureSink::new();
        let result = Interpreter::new(&registry, &capabilities, &analysis, &mut sink).call_function(entry, vec![]);
        (result, sink.lines)
    }

    fn main_item(stmts: Vec<Stmt>) -> Item {
        function_item("main", &[], None, block(stmts))
    }

    #[test]
    fn test_arithmetic_and_concatenation() {
        let body = vec![
            let_stmt("x", None, binary(BinOp::Mul, int(6), int(7))),
            expr_stmt(binary(BinOp::Add, string("x = "), ident("x"))),
        ];
        let (result, _) = run(vec![main_item(body)], "main");
        assert_eq!(result.unwrap(), Value::Str("x = 42".into()));
    }

    #[test]
    fn test_division_by_zero() {
        let (result, _) = run(vec![main_item(vec![expr_stmt(binary(BinOp::Div, int(1), int(0)))])], "main");
        assert!(matches!(result.unwrap_err(), Error::DivisionByZero { .. }));
    }

    #[test]
    fn test_return_leaves_the_call_early() {
        let body = vec![
            expr_stmt(if_else(boolean(true), block(vec![return_stmt(Some(int(1)))]), None)),
            expr_stmt(call("println", vec![string("unreachable")])),
            expr_stmt(int(2)),
        ];
        let (result, lines) = run(vec![main_item(body)], "main");
        assert_eq!(result.unwrap(), Value::Int(1));
        assert!(lines.is_empty());
    }

    #[test]
    fn test_short_circuit() {
        let body = vec![expr_stmt(binary(
            BinOp::Or,
            boolean(true),
            binary(BinOp::Eq, binary(BinOp::Div, int(1), int(0)), int(0)),
        ))];
        let (result, _) = run(vec![main_item(body)], "main");
        assert_eq!(result.unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_struct_literal_field_order_is_irrelevant() {
        let mut items = person_program();
        items.push(main_item(vec![expr_stmt(binary(
            BinOp::Eq,
            struct_lit("Person", vec![("name", string("A")), ("age", int(1))]),
            struct_lit("Person", vec![("age", int(1)), ("name", string("A"))]),
        ))]));
        let (result, _) = run(items, "main");
        assert_eq!(result.unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_trait_default_dispatches_on_concrete_receiver() {
        let items = vec![
            struct_item("Dog", &[("name", "string")]),
            struct_item("Cat", &[("lives", "int")]),
            trait_item(
                "Named",
                vec![
                    prop_sig("label", "string", None),
                    method_sig(
                        "shout",
                        &[],
                        None,
                        Some(block(vec![expr_stmt(call("print", vec![string("I am $label")]))])),
                    ),
                ],
            ),
            impl_item("Named", "Dog", vec![prop_def("label", block(vec![expr_stmt(ident("name"))]))]),
            impl_item("Named", "Cat", vec![prop_def("label", block(vec![expr_stmt(string("cat with $lives lives"))]))]),
            main_item(vec![
                expr_stmt(method_call(struct_lit("Dog", vec![("name", string("Rex"))]), "shout", vec![])),
                expr_stmt(method_call(struct_lit("Cat", vec![("lives", int(9))]), "shout", vec![])),
            ]),
        ];
        let (result, lines) = run(items, "main");
        assert_eq!(result.unwrap(), Value::Unit);
        assert_eq!(lines, vec!["I am Rex".to_string(), "I am cat with 9 lives".to_string()]);
    }

    #[test]
    fn test_side_effects_before_fault_remain() {
        let body = vec![
            expr_stmt(call("print", vec![string("before")])),
            expr_stmt(binary(BinOp::Mod, int(1), int(0))),
            expr_stmt(call("print", vec![string("after")])),
        ];
        let (result, lines) = run(vec![main_item(body)], "main");
        assert!(result.is_err());
        assert_eq!(lines, vec!["before".to_string()]);
    }

    fn labelled_dog(extra: Vec<Item>, main: Vec<Stmt>) -> Vec<Item> {
        let mut items = vec![
            struct_item("Dog", &[("label", "string")]),
            trait_item(
                "Named",
                vec![
                    prop_sig("label", "string", None),
                    method_sig("viaTemplate", &[], Some("string"), Some(block(vec![expr_stmt(string("$label"))]))),
                    method_sig("viaIdent", &[], Some("string"), Some(block(vec![expr_stmt(ident("label"))]))),
                ],
            ),
            impl_item("Named", "Dog", vec![prop_def("label", block(vec![expr_stmt(string("from-impl"))]))]),
        ];
        items.extend(extra);
        items.push(main_item(main));
        items
    }

    fn dog() -> Expr {
        struct_lit("Dog", vec![("label", string("from-field"))])
    }

    #[test]
    fn test_template_placeholder_follows_checked_resolution() {
        let items = labelled_dog(
            vec![],
            vec![
                expr_stmt(call("print", vec![method_call(dog(), "viaTemplate", vec![])])),
                expr_stmt(call("print", vec![method_call(dog(), "viaIdent", vec![])])),
            ],
        );
        let (result, lines) = run(items, "main");
        assert_eq!(result.unwrap(), Value::Unit);
        assert_eq!(lines, vec!["from-impl".to_string(), "from-impl".to_string()]);
    }

    #[test]
    fn test_default_body_stays_within_its_trait() {
        let tagged = vec![
            trait_item("Tagged", vec![prop_sig("label", "string", None)]),
            impl_item("Tagged", "Dog", vec![prop_def("label", block(vec![expr_stmt(string("from-tagged"))]))]),
        ];
        let items = labelled_dog(tagged, vec![expr_stmt(method_call(dog(), "viaIdent", vec![]))]);
        let (result, _) = run(items, "main");
        assert_eq!(result.unwrap(), Value::Str("from-impl".into()));
    }
}
