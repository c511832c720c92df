//! AST construction helpers for tests

use super::ast::*;
use crate::utils::Span;

pub fn ty(text: &str) -> TypeExpr {
    TypeExpr::parse(text).expect("valid type expression")
}

// ==================== Expressions ====================

pub fn int(n: i64) -> Expr {
    Expr::Literal { value: LitValue::Int(n), id: NodeId::default(), span: Span::dummy() }
}

pub fn string(s: &str) -> Expr {
    Expr::Literal { value: LitValue::Str(s.to_string()), id: NodeId::default(), span: Span::dummy() }
}

pub fn boolean(b: bool) -> Expr {
    Expr::Literal { value: LitValue::Bool(b), id: NodeId::default(), span: Span::dummy() }
}

pub fn ident(name: &str) -> Expr {
    Expr::Ident { name: Ident::from(name), id: NodeId::default() }
}

pub fn this() -> Expr {
    Expr::This { span: Span::dummy() }
}

pub fn field(expr: Expr, name: &str) -> Expr {
    Expr::Field {
        expr: Box::new(expr),
        field: Ident::from(name),
        id: NodeId::default(),
        span: Span::dummy(),
    }
}

pub fn method_call(receiver: Expr, method: &str, args: Vec<Expr>) -> Expr {
    Expr::MethodCall {
        receiver: Box::new(receiver),
        method: Ident::from(method),
        args,
        id: NodeId::default(),
        span: Span::dummy(),
    }
}

pub fn call(func: &str, args: Vec<Expr>) -> Expr {
    Expr::Call { func: Ident::from(func), args, id: NodeId::default(), span: Span::dummy() }
}

pub fn struct_lit(name: &str, fields: Vec<(&str, Expr)>) -> Expr {
    Expr::StructLit {
        name: Ident::from(name),
        fields: fields
            .into_iter()
            .map(|(name, value)| FieldInit { name: Ident::from(name), value })
            .collect(),
        span: Span::dummy(),
    }
}

pub fn some(expr: Expr) -> Expr {
    Expr::Variant { variant: Ident::from("Some"), args: vec![expr], span: Span::dummy() }
}

pub fn none() -> Expr {
    Expr::Variant { variant: Ident::from("None"), args: vec![], span: Span::dummy() }
}

pub fn binary(op: BinOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary { op, left: Box::new(left), right: Box::new(right), span: Span::dummy() }
}

pub fn neg(expr: Expr) -> Expr {
    Expr::Unary { op: UnOp::Neg, expr: Box::new(expr), span: Span::dummy() }
}

pub fn if_else(cond: Expr, then_block: Block, else_block: Option<Block>) -> Expr {
    Expr::If { cond: Box::new(cond), then_block, else_block, span: Span::dummy() }
}

pub fn match_expr(subject: Expr, arms: Vec<(Pattern, Expr)>) -> Expr {
    Expr::Match {
        subject: Box::new(subject),
        arms: arms
            .into_iter()
            .map(|(pattern, body)| MatchArm { pattern, body, span: Span::dummy() })
            .collect(),
        id: NodeId::default(),
        span: Span::dummy(),
    }
}

// ==================== Statements ====================

pub fn block(stmts: Vec<Stmt>) -> Block {
    Block { stmts, span: Span::dummy() }
}

pub fn expr_stmt(expr: Expr) -> Stmt {
    Stmt::Expr { expr }
}

pub fn let_stmt(name: &str, annotation: Option<&str>, value: Expr) -> Stmt {
    Stmt::Let { name: Ident::from(name), ty: annotation.map(ty), value, span: Span::dummy() }
}

pub fn return_stmt(value: Option<Expr>) -> Stmt {
    Stmt::Return { value, span: Span::dummy() }
}

// ==================== Patterns ====================

pub fn wild() -> Pattern {
    Pattern::Wildcard { span: Span::dummy() }
}

pub fn bind(name: &str) -> Pattern {
    Pattern::Binding { name: Ident::from(name) }
}

pub fn plit(value: LitValue) -> Pattern {
    Pattern::Literal { value, span: Span::dummy() }
}

/// Constructor pattern; a `None` sub-pattern is the field shorthand
pub fn ctor(name: &str, fields: Vec<(&str, Option<Pattern>)>, has_rest: bool) -> Pattern {
    Pattern::Constructor {
        name: Ident::from(name),
        fields: fields
            .into_iter()
            .map(|(name, pattern)| FieldPattern { name: Ident::from(name), pattern })
            .collect(),
        has_rest,
        span: Span::dummy(),
    }
}

pub fn psome(inner: Pattern) -> Pattern {
    ctor("Some", vec![("0", Some(inner))], false)
}

pub fn pnone() -> Pattern {
    ctor("None", vec![], false)
}

// ==================== Items ====================

fn params(list: &[(&str, &str)]) -> Vec<Param> {
    list.iter()
        .map(|(name, t)| Param { name: Ident::from(*name), ty: ty(t), span: Span::dummy() })
        .collect()
}

pub fn struct_item(name: &str, fields: &[(&str, &str)]) -> Item {
    Item::Struct(StructDef {
        name: Ident::from(name),
        fields: fields
            .iter()
            .map(|(name, t)| Field { name: Ident::from(*name), ty: ty(t), span: Span::dummy() })
            .collect(),
        span: Span::dummy(),
    })
}

pub fn function(name: &str, param_list: &[(&str, &str)], ret: Option<&str>, body: Block) -> Function {
    Function {
        name: Ident::from(name),
        params: params(param_list),
        ret_type: ret.map(ty),
        body,
        span: Span::dummy(),
    }
}

pub fn function_item(name: &str, param_list: &[(&str, &str)], ret: Option<&str>, body: Block) -> Item {
    Item::Function(function(name, param_list, ret, body))
}

pub fn extension(target: &str, method: Function) -> Item {
    Item::Extension(ExtensionMethod { target: ty(target), method, span: Span::dummy() })
}

pub fn trait_item(name: &str, members: Vec<TraitMember>) -> Item {
    Item::Trait(TraitDef { name: Ident::from(name), members, span: Span::dummy() })
}

pub fn prop_sig(name: &str, t: &str, default: Option<Block>) -> TraitMember {
    TraitMember::Property(PropertySig { name: Ident::from(name), ty: ty(t), default, span: Span::dummy() })
}

pub fn method_sig(name: &str, param_list: &[(&str, &str)], ret: Option<&str>, default: Option<Block>) -> TraitMember {
    TraitMember::Method(MethodSig {
        name: Ident::from(name),
        params: params(param_list),
        ret_type: ret.map(ty),
        default,
        span: Span::dummy(),
    })
}

pub fn impl_item(trait_name: &str, target: &str, members: Vec<ImplMember>) -> Item {
    Item::Impl(ImplBlock {
        trait_name: Ident::from(trait_name),
        target: ty(target),
        members,
        span: Span::dummy(),
    })
}

pub fn prop_def(name: &str, getter: Block) -> ImplMember {
    ImplMember::Property(PropertyDef { name: Ident::from(name), ty: None, getter, span: Span::dummy() })
}

pub fn method_def(method: Function) -> ImplMember {
    ImplMember::Method(method)
}

// ==================== Sample program ====================

/// The `Person` sample: a struct, an extension method with a template, a trait
/// implemented for it, and an extension on `Option<Person>` that matches.
pub fn person_program() -> Vec<Item> {
    vec![
        struct_item("Person", &[("name", "string"), ("age", "int")]),
        extension(
            "Person",
            function("greeting", &[], Some("string"), Block::expr(string("Hello, $name"))),
        ),
        trait_item(
            "PersonInfo",
            vec![
                prop_sig("infomationString", "string", None),
                method_sig("printInfo", &[], None, None),
            ],
        ),
        impl_item(
            "PersonInfo",
            "Person",
            vec![
                prop_def("infomationString", Block::expr(string("Name: $name, Age: $age"))),
                method_def(function(
                    "printInfo",
                    &[],
                    None,
                    Block::expr(call("print", vec![ident("infomationString")])),
                )),
            ],
        ),
        extension(
            "Option<Person>",
            function(
                "optAge",
                &[],
                Some("int"),
                Block::expr(match_expr(
                    this(),
                    vec![
                        (psome(ctor("Person", vec![("age", None)], true)), ident("age")),
                        (pnone(), neg(int(1))),
                    ],
                )),
            ),
        ),
    ]
}

pub fn person(name: &str, age: i64) -> Expr {
    struct_lit("Person", vec![("name", string(name)), ("age", int(age))])
}
