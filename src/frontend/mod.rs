//! Frontend module: the AST handed to the core and template scanning

pub mod ast;
pub mod template;

#[cfg(test)]
pub mod build;
