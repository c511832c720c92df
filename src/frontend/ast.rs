//! Abstract Syntax Tree definitions for Lumen
//!
//! The tree is produced by an external parser and handed to the registry.
//! It also round-trips through JSON: enums are tagged by a `kind` field,
//! identifiers and type expressions are plain strings.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::utils::Span;

/// A complete program (compilation unit)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub items: Vec<Item>,
}

/// Top-level declarations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Item {
    Struct(StructDef),
    Trait(TraitDef),
    Impl(ImplBlock),
    Extension(ExtensionMethod),
    Function(Function),
}

impl Item {
    /// Short human description used to attribute diagnostics
    pub fn describe(&self) -> String {
        match self {
            Item::Struct(s) => format!("struct {}", s.name),
            Item::Trait(t) => format!("trait {}", t.name),
            Item::Impl(i) => format!("impl {} for {}", i.trait_name, i.target),
            Item::Extension(e) => format!("fn {}.{}", e.target, e.method.name),
            Item::Function(f) => format!("fn {}", f.name),
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Item::Struct(s) => s.span,
            Item::Trait(t) => t.span,
            Item::Impl(i) => i.span,
            Item::Extension(e) => e.span,
            Item::Function(f) => f.span,
        }
    }
}

/// Function definition; also the shape of methods
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub name: Ident,
    #[serde(default)]
    pub params: Vec<Param>,
    #[serde(default)]
    pub ret_type: Option<TypeExpr>,
    pub body: Block,
    #[serde(default)]
    pub span: Span,
}

/// Function parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: Ident,
    pub ty: TypeExpr,
    #[serde(default)]
    pub span: Span,
}

/// Struct definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructDef {
    pub name: Ident,
    pub fields: Vec<Field>,
    #[serde(default)]
    pub span: Span,
}

impl StructDef {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name.name == name)
    }
}

/// Struct field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: Ident,
    pub ty: TypeExpr,
    #[serde(default)]
    pub span: Span,
}

/// Trait definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraitDef {
    pub name: Ident,
    pub members: Vec<TraitMember>,
    #[serde(default)]
    pub span: Span,
}

impl TraitDef {
    pub fn member(&self, name: &str) -> Option<&TraitMember> {
        self.members.iter().find(|m| m.name().name == name)
    }
}

/// Member signature declared by a trait
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TraitMember {
    Property(PropertySig),
    Method(MethodSig),
}

impl TraitMember {
    pub fn name(&self) -> &Ident {
        match self {
            TraitMember::Property(p) => &p.name,
            TraitMember::Method(m) => &m.name,
        }
    }

    pub fn has_default(&self) -> bool {
        match self {
            TraitMember::Property(p) => p.default.is_some(),
            TraitMember::Method(m) => m.default.is_some(),
        }
    }

    pub fn is_property(&self) -> bool {
        matches!(self, TraitMember::Property(_))
    }
}

/// Property signature with an optional default getter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySig {
    pub name: Ident,
    pub ty: TypeExpr,
    #[serde(default)]
    pub default: Option<Block>,
    #[serde(default)]
    pub span: Span,
}

/// Method signature with an optional default body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodSig {
    pub name: Ident,
    #[serde(default)]
    pub params: Vec<Param>,
    #[serde(default)]
    pub ret_type: Option<TypeExpr>,
    #[serde(default)]
    pub default: Option<Block>,
    #[serde(default)]
    pub span: Span,
}

/// Impl block binding one trait to one target type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImplBlock {
    pub trait_name: Ident,
    pub target: TypeExpr,
    #[serde(default)]
    pub members: Vec<ImplMember>,
    #[serde(default)]
    pub span: Span,
}

impl ImplBlock {
    pub fn member(&self, name: &str) -> Option<&ImplMember> {
        self.members.iter().find(|m| m.name().name == name)
    }
}

/// Member supplied by an impl block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImplMember {
    Property(PropertyDef),
    Method(Function),
}

impl ImplMember {
    pub fn name(&self) -> &Ident {
        match self {
            ImplMember::Property(p) => &p.name,
            ImplMember::Method(m) => &m.name,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            ImplMember::Property(p) => p.span,
            ImplMember::Method(m) => m.span,
        }
    }
}

/// Property with a computed getter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDef {
    pub name: Ident,
    #[serde(default)]
    pub ty: Option<TypeExpr>,
    pub getter: Block,
    #[serde(default)]
    pub span: Span,
}

/// Method declared outside its target type (`fun Person.greeting()`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtensionMethod {
    pub target: TypeExpr,
    pub method: Function,
    #[serde(default)]
    pub span: Span,
}

/// Code block; evaluates to its final expression statement
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    #[serde(default)]
    pub span: Span,
}

impl Block {
    /// Block holding a single expression, the `= expr` body form
    pub fn expr(expr: Expr) -> Self {
        let span = expr.span();
        Self { stmts: vec![Stmt::Expr { expr }], span }
    }
}

/// Statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Stmt {
    /// let name [: type] = expr
    Let {
        name: Ident,
        #[serde(default)]
        ty: Option<TypeExpr>,
        value: Expr,
        #[serde(default)]
        span: Span,
    },
    /// Expression statement
    Expr { expr: Expr },
    /// return [expr]
    Return {
        #[serde(default)]
        value: Option<Expr>,
        #[serde(default)]
        span: Span,
    },
}

/// Identity of an expression node that carries static resolution results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(pub u32);

/// Expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expr {
    /// Literal value; string literals are templates
    Literal {
        value: LitValue,
        /// Keys the placeholder resolutions of a template
        #[serde(skip)]
        id: NodeId,
        #[serde(default)]
        span: Span,
    },
    /// Unqualified identifier
    Ident {
        name: Ident,
        #[serde(skip)]
        id: NodeId,
    },
    /// The implicit receiver
    This {
        #[serde(default)]
        span: Span,
    },
    /// Field or property access (expr.field)
    Field {
        expr: Box<Expr>,
        field: Ident,
        #[serde(skip)]
        id: NodeId,
        #[serde(default)]
        span: Span,
    },
    /// Method call (expr.method(args))
    MethodCall {
        receiver: Box<Expr>,
        method: Ident,
        #[serde(default)]
        args: Vec<Expr>,
        #[serde(skip)]
        id: NodeId,
        #[serde(default)]
        span: Span,
    },
    /// Unqualified call: receiver member, free function or builtin
    Call {
        func: Ident,
        #[serde(default)]
        args: Vec<Expr>,
        #[serde(skip)]
        id: NodeId,
        #[serde(default)]
        span: Span,
    },
    /// Struct literal
    StructLit {
        name: Ident,
        fields: Vec<FieldInit>,
        #[serde(default)]
        span: Span,
    },
    /// Sum-type constructor (`Some(x)`, `None`)
    Variant {
        variant: Ident,
        #[serde(default)]
        args: Vec<Expr>,
        #[serde(default)]
        span: Span,
    },
    /// Binary operation
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
        #[serde(default)]
        span: Span,
    },
    /// Unary operation
    Unary {
        op: UnOp,
        expr: Box<Expr>,
        #[serde(default)]
        span: Span,
    },
    /// If expression
    If {
        cond: Box<Expr>,
        then_block: Block,
        #[serde(default)]
        else_block: Option<Block>,
        #[serde(default)]
        span: Span,
    },
    /// Match expression
    Match {
        subject: Box<Expr>,
        arms: Vec<MatchArm>,
        #[serde(skip)]
        id: NodeId,
        #[serde(default)]
        span: Span,
    },
    /// Block expression
    Block { block: Block },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Literal { span, .. }
            | Expr::This { span }
            | Expr::Field { span, .. }
            | Expr::MethodCall { span, .. }
            | Expr::Call { span, .. }
            | Expr::StructLit { span, .. }
            | Expr::Variant { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Unary { span, .. }
            | Expr::If { span, .. }
            | Expr::Match { span, .. } => *span,
            Expr::Ident { name, .. } => name.span,
            Expr::Block { block } => block.span,
        }
    }
}

/// `name: value` inside a struct literal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldInit {
    pub name: Ident,
    pub value: Expr,
}

/// Match arm; order is significant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchArm {
    pub pattern: Pattern,
    pub body: Expr,
    #[serde(default)]
    pub span: Span,
}

/// Pattern for matching
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Pattern {
    /// Wildcard (_)
    Wildcard {
        #[serde(default)]
        span: Span,
    },
    /// Binding (name)
    Binding { name: Ident },
    /// Literal
    Literal {
        value: LitValue,
        #[serde(default)]
        span: Span,
    },
    /// Struct or variant pattern; variant payloads are named "0", "1", ...
    Constructor {
        name: Ident,
        #[serde(default)]
        fields: Vec<FieldPattern>,
        /// Trailing `..`: unmentioned fields are ignored
        #[serde(default)]
        has_rest: bool,
        #[serde(default)]
        span: Span,
    },
}

impl Pattern {
    pub fn span(&self) -> Span {
        match self {
            Pattern::Wildcard { span }
            | Pattern::Literal { span, .. }
            | Pattern::Constructor { span, .. } => *span,
            Pattern::Binding { name } => name.span,
        }
    }
}

/// `field: pattern`, or the shorthand `field` binding the field's own name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldPattern {
    pub name: Ident,
    #[serde(default)]
    pub pattern: Option<Pattern>,
}

impl FieldPattern {
    /// The effective sub-pattern, expanding the shorthand form
    pub fn sub_pattern(&self) -> Pattern {
        match &self.pattern {
            Some(p) => p.clone(),
            None => Pattern::Binding { name: self.name.clone() },
        }
    }
}

/// Literal value (untagged in JSON: `true`, `42`, `"text"`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LitValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl fmt::Display for LitValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LitValue::Bool(b) => write!(f, "{}", b),
            LitValue::Int(n) => write!(f, "{}", n),
            LitValue::Str(s) => write!(f, "{:?}", s),
        }
    }
}

/// Identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: &str, span: Span) -> Self {
        Self { name: name.to_string(), span }
    }
}

impl From<String> for Ident {
    fn from(name: String) -> Self {
        Self { name, span: Span::dummy() }
    }
}

impl From<&str> for Ident {
    fn from(name: &str) -> Self {
        Self::from(name.to_string())
    }
}

impl From<Ident> for String {
    fn from(ident: Ident) -> Self {
        ident.name
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Binary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
    #[serde(rename = "%")]
    Mod,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "&&")]
    And,
    #[serde(rename = "||")]
    Or,
}

impl BinOp {
    pub fn is_comparison(self) -> bool {
        matches!(self, BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge)
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinOp::And | BinOp::Or)
    }
}

/// Unary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnOp {
    /// Negation (-)
    #[serde(rename = "-")]
    Neg,
    /// Logical not (!)
    #[serde(rename = "!")]
    Not,
}

/// Type expression, written `Person` or `Option<Person>` in JSON
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TypeExpr {
    pub name: Ident,
    pub args: Vec<TypeExpr>,
    pub span: Span,
}

impl TypeExpr {
    pub fn named(name: &str) -> Self {
        Self { name: Ident::from(name), args: Vec::new(), span: Span::dummy() }
    }

    pub fn generic(name: &str, args: Vec<TypeExpr>) -> Self {
        Self { name: Ident::from(name), args, span: Span::dummy() }
    }

    /// Parse the textual form `Name` / `Name<Arg, ...>`
    pub fn parse(text: &str) -> Result<Self, String> {
        let mut rest = text.trim();
        let ty = Self::parse_inner(&mut rest)?;
        if !rest.trim().is_empty() {
            return Err(format!("unexpected `{}` after type `{}`", rest.trim(), ty));
        }
        Ok(ty)
    }

    fn parse_inner(rest: &mut &str) -> Result<Self, String> {
        *rest = rest.trim_start();
        let end = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        if end == 0 {
            return Err(format!("expected type name at `{}`", rest));
        }
        let name = &rest[..end];
        *rest = rest[end..].trim_start();

        let mut args = Vec::new();
        if let Some(after) = rest.strip_prefix('<') {
            *rest = after;
            loop {
                args.push(Self::parse_inner(rest)?);
                *rest = rest.trim_start();
                if let Some(after) = rest.strip_prefix(',') {
                    *rest = after;
                } else if let Some(after) = rest.strip_prefix('>') {
                    *rest = after;
                    break;
                } else {
                    return Err(format!("expected `,` or `>` in type arguments of `{}`", name));
                }
            }
        }
        Ok(Self::generic(name, args))
    }
}

impl TryFrom<String> for TypeExpr {
    type Error = String;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        Self::parse(&text)
    }
}

impl From<TypeExpr> for String {
    fn from(ty: TypeExpr) -> Self {
        ty.to_string()
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.args.is_empty() {
            let args: Vec<String> = self.args.iter().map(|a| a.to_string()).collect();
            write!(f, "<{}>", args.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_type_expr_parse() {
        let ty = TypeExpr::parse("Option< Person >").unwrap();
        assert_eq!(ty, TypeExpr::generic("Option", vec![TypeExpr::named("Person")]));
        assert_eq!(ty.to_string(), "Option<Person>");
        assert!(TypeExpr::parse("Option<Person").is_err());
        assert!(TypeExpr::parse("Person extra").is_err());
        assert!(TypeExpr::parse("").is_err());
    }

    #[test]
    fn test_pattern_shorthand_field() {
        let json = r#"{
            "kind": "constructor",
            "name": "Person",
            "fields": [{ "name": "age" }],
            "has_rest": true
        }"#;
        let pattern: Pattern = serde_json::from_str(json).unwrap();
        let Pattern::Constructor { fields, has_rest, .. } = pattern else {
            panic!("expected constructor pattern");
        };
        assert!(has_rest);
        assert_eq!(fields[0].sub_pattern(), Pattern::Binding { name: Ident::from("age") });
    }

    #[test]
    fn test_expr_json_shape() {
        let json = r#"{
            "kind": "binary",
            "op": "+",
            "left": { "kind": "literal", "value": 1 },
            "right": { "kind": "ident", "name": "age" }
        }"#;
        let expr: Expr = serde_json::from_str(json).unwrap();
        assert_eq!(
            expr,
            Expr::Binary {
                op: BinOp::Add,
                left: Box::new(Expr::Literal { value: LitValue::Int(1), id: NodeId::default(), span: Span::dummy() }),
                right: Box::new(Expr::Ident { name: Ident::from("age"), id: NodeId::default() }),
                span: Span::dummy(),
            }
        );
    }

    #[test]
    fn test_item_describe() {
        let item = Item::Impl(ImplBlock {
            trait_name: Ident::from("PersonInfo"),
            target: TypeExpr::named("Person"),
            members: vec![],
            span: Span::dummy(),
        });
        assert_eq!(item.describe(), "impl PersonInfo for Person");
    }
}
