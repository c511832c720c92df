//! Error handling for Lumen

use crate::utils::Span;
use serde::Serialize;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Compile-time and run-time errors of the language core
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Error {
    // ==================== Registration Errors ====================

    #[error("Duplicate declaration: {name}")]
    DuplicateDeclaration { name: String, span: Span },

    // ==================== Type Errors ====================

    #[error("Unknown type: {name}")]
    UnknownType { name: String, span: Span },

    #[error("Unknown variant `{variant}` of {sum_type}")]
    UnknownVariant {
        sum_type: String,
        variant: String,
        span: Span,
    },

    #[error("Missing field `{field}` in literal of struct {structure}")]
    MissingField {
        structure: String,
        field: String,
        span: Span,
    },

    #[error("Struct {structure} has no field `{field}`")]
    UnknownField {
        structure: String,
        field: String,
        span: Span,
    },

    #[error("Field `{field}` is given more than once")]
    DuplicateField { field: String, span: Span },

    // ==================== Member Resolution Errors ====================

    #[error("Member `{member}` of {receiver} is ambiguous between traits {}", .traits.join(", "))]
    AmbiguousMember {
        receiver: String,
        member: String,
        traits: Vec<String>,
        span: Span,
    },

    #[error("No member `{member}` found for {receiver}")]
    UnresolvedMember {
        receiver: String,
        member: String,
        span: Span,
    },

    #[error("Impl of {trait_name} for {target} is missing member `{member}`")]
    MissingTraitMember {
        trait_name: String,
        target: String,
        member: String,
        span: Span,
    },

    #[error("`{member}` is not a {expected} of trait {trait_name}")]
    UnexpectedImplMember {
        trait_name: String,
        member: String,
        expected: String,
        span: Span,
    },

    // ==================== Pattern Errors ====================

    #[error("Non-exhaustive match: pattern `{missing}` not covered")]
    NonExhaustiveMatch { missing: String, span: Span },

    #[error("Identifier `{name}` is bound more than once in the same pattern")]
    DuplicateBinding { name: String, span: Span },

    #[error("Pattern mismatch: expected {expected}, got {got}")]
    PatternMismatch {
        expected: String,
        got: String,
        span: Span,
    },

    // ==================== Scope Errors ====================

    #[error("Unbound identifier: {name}")]
    UnboundIdentifier { name: String, span: Span },

    #[error("Argument count mismatch for `{callee}`: expected {expected}, got {got}")]
    ArgCountMismatch {
        callee: String,
        expected: usize,
        got: usize,
        span: Span,
    },

    // ==================== Runtime Errors ====================

    #[error("Runtime type mismatch: expected {expected}, got {got}")]
    RuntimeTypeMismatch {
        expected: String,
        got: String,
        span: Span,
    },

    #[error("Division by zero")]
    DivisionByZero { span: Span },
}

impl Error {
    /// Get the span associated with this error
    pub fn span(&self) -> Option<Span> {
        let span = match self {
            Self::DuplicateDeclaration { span, .. }
            | Self::UnknownType { span, .. }
            | Self::UnknownVariant { span, .. }
            | Self::MissingField { span, .. }
            | Self::UnknownField { span, .. }
            | Self::DuplicateField { span, .. }
            | Self::AmbiguousMember { span, .. }
            | Self::UnresolvedMember { span, .. }
            | Self::MissingTraitMember { span, .. }
            | Self::UnexpectedImplMember { span, .. }
            | Self::NonExhaustiveMatch { span, .. }
            | Self::DuplicateBinding { span, .. }
            | Self::PatternMismatch { span, .. }
            | Self::UnboundIdentifier { span, .. }
            | Self::ArgCountMismatch { span, .. }
            | Self::RuntimeTypeMismatch { span, .. }
            | Self::DivisionByZero { span } => *span,
        };
        if span.is_empty() { None } else { Some(span) }
    }

    /// Attach a span if the error does not carry one yet
    pub fn or_span(mut self, at: Span) -> Self {
        if self.span().is_none() {
            match &mut self {
                Self::DuplicateDeclaration { span, .. }
                | Self::UnknownType { span, .. }
                | Self::UnknownVariant { span, .. }
                | Self::MissingField { span, .. }
                | Self::UnknownField { span, .. }
                | Self::DuplicateField { span, .. }
                | Self::AmbiguousMember { span, .. }
                | Self::UnresolvedMember { span, .. }
                | Self::MissingTraitMember { span, .. }
                | Self::UnexpectedImplMember { span, .. }
                | Self::NonExhaustiveMatch { span, .. }
                | Self::DuplicateBinding { span, .. }
                | Self::PatternMismatch { span, .. }
                | Self::UnboundIdentifier { span, .. }
                | Self::ArgCountMismatch { span, .. }
                | Self::RuntimeTypeMismatch { span, .. }
                | Self::DivisionByZero { span } => *span = at,
            }
        }
        self
    }

    /// Stable diagnostic code
    pub fn code(&self) -> &'static str {
        match self {
            Self::DuplicateDeclaration { .. } => "E0001",
            Self::UnknownType { .. } => "E0002",
            Self::UnknownVariant { .. } => "E0003",
            Self::MissingField { .. } => "E0004",
            Self::UnknownField { .. } => "E0005",
            Self::DuplicateField { .. } => "E0006",
            Self::AmbiguousMember { .. } => "E0007",
            Self::UnresolvedMember { .. } => "E0008",
            Self::MissingTraitMember { .. } => "E0009",
            Self::UnexpectedImplMember { .. } => "E0010",
            Self::NonExhaustiveMatch { .. } => "E0011",
            Self::DuplicateBinding { .. } => "E0012",
            Self::PatternMismatch { .. } => "E0013",
            Self::UnboundIdentifier { .. } => "E0014",
            Self::ArgCountMismatch { .. } => "E0015",
            Self::RuntimeTypeMismatch { .. } => "E0101",
            Self::DivisionByZero { .. } => "E0102",
        }
    }

    /// Error kind name as reported to hosts
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DuplicateDeclaration { .. } => "DuplicateDeclarationError",
            Self::UnknownType { .. } => "UnknownTypeError",
            Self::UnknownVariant { .. } => "UnknownVariantError",
            Self::MissingField { .. } => "MissingFieldError",
            Self::UnknownField { .. } => "UnknownFieldError",
            Self::DuplicateField { .. } => "DuplicateFieldError",
            Self::AmbiguousMember { .. } => "AmbiguousMemberError",
            Self::UnresolvedMember { .. } => "UnresolvedMemberError",
            Self::MissingTraitMember { .. } => "MissingTraitMemberError",
            Self::UnexpectedImplMember { .. } => "UnexpectedImplMemberError",
            Self::NonExhaustiveMatch { .. } => "NonExhaustiveMatchError",
            Self::DuplicateBinding { .. } => "DuplicateBindingError",
            Self::PatternMismatch { .. } => "PatternMismatchError",
            Self::UnboundIdentifier { .. } => "UnboundIdentifierError",
            Self::ArgCountMismatch { .. } => "ArgCountMismatchError",
            Self::RuntimeTypeMismatch { .. } => "RuntimeTypeMismatchError",
            Self::DivisionByZero { .. } => "DivisionByZeroError",
        }
    }

    /// Runtime-only errors; everything else is detected while loading
    pub fn is_runtime(&self) -> bool {
        matches!(self, Self::RuntimeTypeMismatch { .. } | Self::DivisionByZero { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_span_is_filled_once() {
        let err = Error::UnboundIdentifier { name: "x".into(), span: Span::dummy() };
        assert_eq!(err.span(), None);

        let err = err.or_span(Span::new(2, 3, 0));
        assert_eq!(err.span(), Some(Span::new(2, 3, 0)));

        let err = err.or_span(Span::new(10, 20, 0));
        assert_eq!(err.span(), Some(Span::new(2, 3, 0)));
    }

    #[test]
    fn test_ambiguous_message_lists_traits() {
        let err = Error::AmbiguousMember {
            receiver: "Person".into(),
            member: "describe".into(),
            traits: vec!["Named".into(), "Printable".into()],
            span: Span::dummy(),
        };
        assert_eq!(
            err.to_string(),
            "Member `describe` of Person is ambiguous between traits Named, Printable"
        );
        assert_eq!(err.kind(), "AmbiguousMemberError");
        assert!(!err.is_runtime());
    }
}
