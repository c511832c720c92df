//! Utility module

mod span;
mod error;
mod diagnostic;

pub use span::Span;
pub use error::{Error, Result};
pub use diagnostic::{Diagnostic, Diagnostics, Severity};
