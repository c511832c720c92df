//! Semantic analysis: declaration registry, type and member resolution,
//! and the load-time checker

pub mod checker;
pub mod methods;
pub mod registry;
pub mod resolver;
pub mod scope;

pub use checker::{Analysis, Builtin, Checker, Resolution};
pub use methods::{Binding, CapabilityTable, MemberKind, MethodResolver};
pub use registry::{Registry, RegistryBuilder};
pub use resolver::TypeResolver;
