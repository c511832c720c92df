//! Batch diagnostics collected while loading a program

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::utils::{Error, Span};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Error,
    Warning,
}

/// One reported problem, attributed to the declaration (or arm) it came from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Offending declaration, e.g. `impl PersonInfo for Person`
    pub origin: String,
    pub code: String,
    pub kind: String,
    pub message: String,
    pub span: Option<Span>,
}

impl Diagnostic {
    pub fn error(origin: &str, error: &Error) -> Self {
        Self {
            severity: Severity::Error,
            origin: origin.to_string(),
            code: error.code().to_string(),
            kind: error.kind().to_string(),
            message: error.to_string(),
            span: error.span(),
        }
    }

    pub fn unreachable_arm(origin: &str, arm: usize, span: Span) -> Self {
        Self {
            severity: Severity::Warning,
            origin: origin.to_string(),
            code: "W0001".to_string(),
            kind: "UnreachablePattern".to_string(),
            message: format!("unreachable pattern: arm {} is covered by earlier arms", arm + 1),
            span: if span.is_empty() { None } else { Some(span) },
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}[{}]: {} (in {})", level, self.code, self.message, self.origin)?;
        if let Some(span) = self.span {
            write!(f, " at {}..{}", span.start, span.end)?;
        }
        Ok(())
    }
}

/// Ordered list of diagnostics; an `Err` of `load` when it holds any error
#[derive(Error, Debug, Clone, Default, PartialEq, Serialize)]
#[error("{} error(s), {} warning(s)", count_errors(.items), .items.len() - count_errors(.items))]
pub struct Diagnostics {
    pub items: Vec<Diagnostic>,
}

fn count_errors(items: &[Diagnostic]) -> usize {
    items.iter().filter(|d| d.is_error()).count()
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    pub fn push_error(&mut self, origin: &str, error: &Error) {
        log::debug!("{}: {}", origin, error);
        self.items.push(Diagnostic::error(origin, error));
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self) -> usize {
        count_errors(&self.items)
    }

    pub fn warning_count(&self) -> usize {
        self.items.len() - self.error_count()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(|d| d.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(|d| !d.is_error())
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_split_by_severity() {
        let mut diags = Diagnostics::new();
        diags.push_error(
            "struct Person",
            &Error::DuplicateDeclaration { name: "Person".into(), span: Span::new(0, 6, 0) },
        );
        diags.push(Diagnostic::unreachable_arm("fn foo", 1, Span::dummy()));

        assert!(diags.has_errors());
        assert_eq!(diags.error_count(), 1);
        assert_eq!(diags.warning_count(), 1);
        assert_eq!(diags.to_string(), "1 error(s), 1 warning(s)");
        assert_eq!(
            diags.items[0].to_string(),
            "error[E0001]: Duplicate declaration: Person (in struct Person) at 0..6"
        );
    }
}
