//! Lumen language core
//!
//! Declaration registry, member resolution, pattern-match compilation and a
//! tree-walking evaluator for programs handed over as an AST.

pub mod feedback;
pub mod frontend;
pub mod interp;
pub mod patterns;
pub mod semantic;
pub mod session;
pub mod types;
pub mod utils;

pub use session::{CompiledProgram, Options, Session};
