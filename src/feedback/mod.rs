//! Structured Feedback Module
//!
//! Machine-readable output of a load:
//! - JSON diagnostic reports with fix suggestions
//! - Declaration statistics

use serde::{Deserialize, Serialize};

use crate::utils::{Diagnostic, Diagnostics, Severity};

// ==================== Structured Error Report ====================

/// A structured diagnostic report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReport {
    /// Diagnostic code (e.g., "E0001")
    pub code: String,

    /// "error" or "warning"
    pub severity: String,

    /// Error kind name (e.g., "MissingFieldError")
    pub kind: String,

    /// Offending declaration
    pub origin: String,

    /// Human-readable message
    pub message: String,

    /// Location information
    pub location: Option<Location>,

    /// Suggested fixes
    pub suggestions: Vec<Suggestion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub file: String,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    /// Description of the fix
    pub message: String,

    /// Confidence in this suggestion (0.0 - 1.0)
    pub confidence: f64,
}

impl ErrorReport {
    /// Create a report from a load diagnostic
    pub fn from_diagnostic(diagnostic: &Diagnostic, file_name: &str) -> Self {
        let location = diagnostic.span.map(|s| Location {
            file: file_name.to_string(),
            start: s.start,
            end: s.end,
        });
        let severity = match diagnostic.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };

        let mut report = Self {
            code: diagnostic.code.clone(),
            severity: severity.to_string(),
            kind: diagnostic.kind.clone(),
            origin: diagnostic.origin.clone(),
            message: diagnostic.message.clone(),
            location,
            suggestions: vec![],
        };
        for (message, confidence) in suggestions_for(&diagnostic.kind) {
            report.add_suggestion(message, *confidence);
        }
        report.sort_suggestions();
        report
    }

    pub fn add_suggestion(&mut self, message: &str, confidence: f64) {
        self.suggestions.push(Suggestion { message: message.to_string(), confidence });
    }

    /// Sort suggestions by confidence (highest first)
    pub fn sort_suggestions(&mut self) {
        self.suggestions.sort_by(|a, b| {
            b.confidence.partial_cmp(&a.confidence).unwrap_or(std::cmp::Ordering::Equal)
        });
    }
}

/// Canned fixes per error kind
fn suggestions_for(kind: &str) -> &'static [(&'static str, f64)] {
    match kind {
        "DuplicateDeclarationError" => &[
            ("Rename one of the declarations", 0.8),
            ("Remove the duplicate declaration", 0.6),
        ],
        "UnknownTypeError" => &[
            ("Declare the struct or trait before using it", 0.7),
            ("Check the spelling of the type name", 0.6),
        ],
        "UnknownVariantError" => &[("Use `Some` or `None`", 0.9)],
        "MissingFieldError" => &[
            ("Supply every declared field", 0.8),
            ("In a pattern, add `..` to ignore the remaining fields", 0.7),
        ],
        "UnknownFieldError" => &[("Remove the field or declare it on the struct", 0.7)],
        "DuplicateFieldError" => &[("Name each field once", 0.9)],
        "AmbiguousMemberError" => &[
            ("Rename the member in one of the traits", 0.6),
            ("Declare an extension method with this name to take precedence", 0.5),
        ],
        "UnresolvedMemberError" => &[
            ("Declare an extension method for the receiver type", 0.6),
            ("Implement a trait declaring this member for the receiver type", 0.5),
        ],
        "MissingTraitMemberError" => &[
            ("Implement the member in the impl block", 0.8),
            ("Give the member a default body in the trait", 0.5),
        ],
        "UnexpectedImplMemberError" => &[
            ("Declare the member in the trait", 0.6),
            ("Move the member into an extension method", 0.5),
        ],
        "NonExhaustiveMatchError" => &[
            ("Add an arm for the missing pattern", 0.9),
            ("Add a trailing `_` arm", 0.7),
        ],
        "DuplicateBindingError" => &[("Use a different name for one of the bindings", 0.9)],
        "PatternMismatchError" => &[("Match on the subject's own type", 0.6)],
        "UnboundIdentifierError" => &[
            ("Define the name with `let` before using it", 0.7),
            ("Check the spelling against the receiver's fields", 0.5),
        ],
        "ArgCountMismatchError" => &[("Pass one argument per declared parameter", 0.9)],
        "UnreachablePattern" => &[("Remove the arm or move it above the arm that covers it", 0.8)],
        _ => &[],
    }
}

// ==================== Check Report ====================

/// Complete result of `lumenc check`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckReport {
    /// Load status
    pub success: bool,

    /// Source file
    pub source_file: String,

    /// All errors and warnings
    pub diagnostics: Vec<ErrorReport>,

    /// Declaration statistics (zero when the load failed)
    pub stats: ProgramStats,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramStats {
    pub structs: usize,
    pub traits: usize,
    pub impls: usize,
    pub extensions: usize,
    pub functions: usize,
    /// Compiled match expressions
    pub matches: usize,
}

impl CheckReport {
    /// Create a successful report; warnings are still listed
    pub fn success(source_file: String, warnings: &[Diagnostic], stats: ProgramStats) -> Self {
        Self {
            success: true,
            diagnostics: warnings.iter().map(|d| ErrorReport::from_diagnostic(d, &source_file)).collect(),
            source_file,
            stats,
        }
    }

    /// Create a failed report
    pub fn failure(source_file: String, diagnostics: &Diagnostics) -> Self {
        Self {
            success: false,
            diagnostics: diagnostics
                .items
                .iter()
                .map(|d| ErrorReport::from_diagnostic(d, &source_file))
                .collect(),
            source_file,
            stats: ProgramStats::default(),
        }
    }

    /// Output as JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Output as compact JSON (single line)
    pub fn to_json_compact(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}
