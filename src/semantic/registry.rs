//! Declaration Registry
//!
//! Ingests top-level declarations during the load phase and exposes
//! side-effect-free lookup tables once closed. The open/closed phases are two
//! types: `RegistryBuilder` accepts registrations, `close` turns it into a
//! read-only `Registry`.

use std::collections::BTreeMap;
use std::collections::HashSet;

use crate::frontend::ast::*;
use crate::types::{PrimitiveType, OPTION};
use crate::utils::{Error, Result};

/// Read-only declaration tables
#[derive(Debug, Clone, Default)]
pub struct Registry {
    structs: BTreeMap<String, StructDef>,
    traits: BTreeMap<String, TraitDef>,
    /// Impl blocks in registration order
    impls: Vec<ImplBlock>,
    /// Keyed by (target type key, method name)
    extensions: BTreeMap<(String, String), ExtensionMethod>,
    functions: BTreeMap<String, Function>,
    node_count: u32,
}

impl Registry {
    pub fn lookup_struct(&self, name: &str) -> Option<&StructDef> {
        self.structs.get(name)
    }

    pub fn lookup_trait(&self, name: &str) -> Option<&TraitDef> {
        self.traits.get(name)
    }

    /// All impls whose target renders to `target`
    pub fn lookup_impls(&self, target: &str) -> Vec<&ImplBlock> {
        self.impls
            .iter()
            .filter(|i| i.target.to_string() == target)
            .collect()
    }

    pub fn lookup_impl(&self, trait_name: &str, target: &str) -> Option<&ImplBlock> {
        self.impls
            .iter()
            .find(|i| i.trait_name.name == trait_name && i.target.to_string() == target)
    }

    pub fn lookup_extension(&self, target: &str, method: &str) -> Option<&ExtensionMethod> {
        self.extensions.get(&(target.to_string(), method.to_string()))
    }

    pub fn lookup_function(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    pub fn structs(&self) -> impl Iterator<Item = &StructDef> {
        self.structs.values()
    }

    pub fn traits(&self) -> impl Iterator<Item = &TraitDef> {
        self.traits.values()
    }

    pub fn impls(&self) -> impl Iterator<Item = &ImplBlock> {
        self.impls.iter()
    }

    pub fn extensions(&self) -> impl Iterator<Item = &ExtensionMethod> {
        self.extensions.values()
    }

    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        self.functions.values()
    }

    /// Number of node ids handed out while loading
    pub fn node_count(&self) -> u32 {
        self.node_count
    }
}

/// Mutable registry used during the load phase
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    registry: Registry,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one declaration. On error nothing of the declaration is kept.
    pub fn register(&mut self, mut item: Item) -> Result<()> {
        self.check_unique(&item)?;
        self.number_item(&mut item);
        log::debug!("registered {}", item.describe());

        let reg = &mut self.registry;
        match item {
            Item::Struct(s) => {
                reg.structs.insert(s.name.name.clone(), s);
            }
            Item::Trait(t) => {
                reg.traits.insert(t.name.name.clone(), t);
            }
            Item::Impl(i) => reg.impls.push(i),
            Item::Extension(e) => {
                let key = (e.target.to_string(), e.method.name.name.clone());
                reg.extensions.insert(key, e);
            }
            Item::Function(f) => {
                reg.functions.insert(f.name.name.clone(), f);
            }
        }
        Ok(())
    }

    /// End the load phase
    pub fn close(self) -> Registry {
        log::debug!(
            "registry closed: {} structs, {} traits, {} impls, {} extensions, {} functions",
            self.registry.structs.len(),
            self.registry.traits.len(),
            self.registry.impls.len(),
            self.registry.extensions.len(),
            self.registry.functions.len()
        );
        self.registry
    }

    fn check_unique(&self, item: &Item) -> Result<()> {
        let reg = &self.registry;
        match item {
            Item::Struct(s) => {
                self.check_type_name(&s.name)?;
                let mut seen = HashSet::new();
                for field in &s.fields {
                    if !seen.insert(field.name.name.as_str()) {
                        return Err(Error::DuplicateField {
                            field: field.name.name.clone(),
                            span: field.span,
                        });
                    }
                }
            }
            Item::Trait(t) => {
                self.check_type_name(&t.name)?;
                let mut seen = HashSet::new();
                for member in &t.members {
                    let name = member.name();
                    if !seen.insert(name.name.as_str()) {
                        return Err(Error::DuplicateDeclaration {
                            name: format!("{}.{}", t.name, name),
                            span: name.span,
                        });
                    }
                }
            }
            Item::Impl(i) => {
                if reg.lookup_impl(&i.trait_name.name, &i.target.to_string()).is_some() {
                    return Err(Error::DuplicateDeclaration {
                        name: item.describe(),
                        span: i.span,
                    });
                }
                let mut seen = HashSet::new();
                for member in &i.members {
                    let name = member.name();
                    if !seen.insert(name.name.as_str()) {
                        return Err(Error::DuplicateDeclaration {
                            name: format!("{}.{}", i.trait_name, name),
                            span: name.span,
                        });
                    }
                }
            }
            Item::Extension(e) => {
                if reg.lookup_extension(&e.target.to_string(), &e.method.name.name).is_some() {
                    return Err(Error::DuplicateDeclaration {
                        name: format!("{}.{}", e.target, e.method.name),
                        span: e.method.name.span,
                    });
                }
            }
            Item::Function(f) => {
                if reg.functions.contains_key(&f.name.name) {
                    return Err(Error::DuplicateDeclaration {
                        name: f.name.name.clone(),
                        span: f.name.span,
                    });
                }
            }
        }
        Ok(())
    }

    /// Structs and traits share one namespace with the built-in types
    fn check_type_name(&self, name: &Ident) -> Result<()> {
        let taken = self.registry.structs.contains_key(&name.name)
            || self.registry.traits.contains_key(&name.name)
            || PrimitiveType::from_name(&name.name).is_some()
            || name.name == OPTION;
        if taken {
            return Err(Error::DuplicateDeclaration {
                name: name.name.clone(),
                span: name.span,
            });
        }
        Ok(())
    }

    // ==================== Node numbering ====================

    fn next_id(&mut self) -> NodeId {
        let id = NodeId(self.registry.node_count);
        self.registry.node_count += 1;
        id
    }

    fn number_item(&mut self, item: &mut Item) {
        match item {
            Item::Struct(_) => {}
            Item::Trait(t) => {
                for member in &mut t.members {
                    let default = match member {
                        TraitMember::Property(p) => p.default.as_mut(),
                        TraitMember::Method(m) => m.default.as_mut(),
                    };
                    if let Some(block) = default {
                        self.number_block(block);
                    }
                }
            }
            Item::Impl(i) => {
                for member in &mut i.members {
                    match member {
                        ImplMember::Property(p) => self.number_block(&mut p.getter),
                        ImplMember::Method(m) => self.number_block(&mut m.body),
                    }
                }
            }
            Item::Extension(e) => self.number_block(&mut e.method.body),
            Item::Function(f) => self.number_block(&mut f.body),
        }
    }

    fn number_block(&mut self, block: &mut Block) {
        for stmt in &mut block.stmts {
            match stmt {
                Stmt::Let { value, .. } => self.number_expr(value),
                Stmt::Expr { expr } => self.number_expr(expr),
                Stmt::Return { value, .. } => {
                    if let Some(value) = value {
                        self.number_expr(value);
                    }
                }
            }
        }
    }

    fn number_expr(&mut self, expr: &mut Expr) {
        match expr {
            Expr::This { .. } => {}
            Expr::Literal { id, .. } | Expr::Ident { id, .. } => *id = self.next_id(),
            Expr::Field { expr, id, .. } => {
                *id = self.next_id();
                self.number_expr(expr);
            }
            Expr::MethodCall { receiver, args, id, .. } => {
                *id = self.next_id();
                self.number_expr(receiver);
                for arg in args {
                    self.number_expr(arg);
                }
            }
            Expr::Call { args, id, .. } => {
                *id = self.next_id();
                for arg in args {
                    self.number_expr(arg);
                }
            }
            Expr::StructLit { fields, .. } => {
                for field in fields {
                    self.number_expr(&mut field.value);
                }
            }
            Expr::Variant { args, .. } => {
                for arg in args {
                    self.number_expr(arg);
                }
            }
            Expr::Binary { left, right, .. } => {
                self.number_expr(left);
                self.number_expr(right);
            }
            Expr::Unary { expr, .. } => self.number_expr(expr),
            Expr::If { cond, then_block, else_block, .. } => {
                self.number_expr(cond);
                self.number_block(then_block);
                if let Some(block) = else_block {
                    self.number_block(block);
                }
            }
            Expr::Match { subject, arms, id, .. } => {
                *id = self.next_id();
                self.number_expr(subject);
                for arm in arms {
                    self.number_expr(&mut arm.body);
                }
            }
            Expr::Block { block } => self.number_block(block),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::build::*;
    use pretty_assertions::assert_eq;

    fn load(items: Vec<Item>) -> (Registry, Vec<Error>) {
        let mut builder = RegistryBuilder::new();
        let errors = items
            .into_iter()
            .filter_map(|item| builder.register(item).err())
            .collect();
        (builder.close(), errors)
    }

    #[test]
    fn test_register_person_program() {
        let (registry, errors) = load(person_program());
        assert!(errors.is_empty(), "{:?}", errors);
        assert!(registry.lookup_struct("Person").is_some());
        assert!(registry.lookup_trait("PersonInfo").is_some());
        assert_eq!(registry.lookup_impls("Person").len(), 1);
        assert!(registry.lookup_extension("Person", "greeting").is_some());
        assert!(registry.lookup_extension("Option<Person>", "optAge").is_some());
        assert!(registry.lookup_extension("Person", "optAge").is_none());
        assert!(registry.lookup_function("foo").is_none());
    }

    #[test]
    fn test_duplicate_struct_and_trait_names() {
        let (registry, errors) = load(vec![
            struct_item("Person", &[("name", "string")]),
            trait_item("Person", vec![]),
            struct_item("Option", &[]),
        ]);
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| matches!(e, Error::DuplicateDeclaration { .. })));
        assert_eq!(registry.structs().count(), 1);
        assert!(registry.lookup_trait("Person").is_none());
    }

    #[test]
    fn test_duplicate_extension_key() {
        let greeting = || function("greeting", &[], None, Block::expr(string("hi")));
        let (_, errors) = load(vec![
            struct_item("Person", &[]),
            extension("Person", greeting()),
            extension("Person", greeting()),
            extension("Option<Person>", greeting()),
        ]);
        assert_eq!(
            errors,
            vec![Error::DuplicateDeclaration {
                name: "Person.greeting".into(),
                span: Default::default(),
            }]
        );
    }

    #[test]
    fn test_duplicate_trait_member() {
        let (_, errors) = load(vec![trait_item(
            "Info",
            vec![prop_sig("text", "string", None), method_sig("text", &[], None, None)],
        )]);
        assert_eq!(
            errors,
            vec![Error::DuplicateDeclaration { name: "Info.text".into(), span: Default::default() }]
        );
    }

    #[test]
    fn test_duplicate_struct_field() {
        let (_, errors) = load(vec![struct_item("P", &[("a", "int"), ("a", "string")])]);
        assert!(matches!(&errors[0], Error::DuplicateField { field, .. } if field == "a"));
    }

    #[test]
    fn test_node_ids_are_unique() {
        let (registry, _) = load(person_program());
        let ext = registry.lookup_extension("Option<Person>", "optAge").unwrap();
        let Stmt::Expr { expr: Expr::Match { id, arms, .. } } = &ext.method.body.stmts[0] else {
            panic!("expected match body");
        };
        let Expr::Ident { id: arm_id, .. } = &arms[0].body else {
            panic!("expected identifier arm");
        };
        assert_ne!(id, arm_id);
        assert!(registry.node_count() >= 4);
    }
}
