//! Pattern Match Compiler
//!
//! Lowers match arms into guarded test trees (`compile`), checks them for
//! exhaustiveness and reachability (`usefulness`) and evaluates them against
//! runtime values (`decision`).

pub mod compile;
pub mod decision;
pub mod usefulness;

pub use compile::PatternCompiler;
pub use decision::{CompiledArm, Coverage, DecisionProcedure, Selection, Test};
