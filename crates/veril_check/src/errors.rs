//! Diagnostic codes and helpers for integrity checking.
//!
//! Codes `E501`--`E510` cover post-elaboration invariant violations. The
//! checker only reports; the IR is never repaired in place.

use veril_diagnostics::{Category, Diagnostic, DiagnosticCode};
use veril_source::Span;

/// A required source location is absent.
pub const E501: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 501,
};

/// A required name is absent.
pub const E502: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 502,
};

/// A non-top entity has no parent.
pub const E503: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 503,
};

/// A required file reference is absent.
pub const E504: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 504,
};

/// A reference survived elaboration without a resolution.
pub const E505: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 505,
};

/// An entity that needs a typespec has none (or an unresolved one).
pub const E506: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 506,
};

/// An unsupported typespec is reachable from the design.
pub const E507: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 507,
};

/// A foreach statement iterates without loop variables.
pub const E508: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 508,
};

/// The same entity appears twice in one collection.
pub const E509: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 509,
};

/// A location range is unordered or escapes its containing scope.
pub const E510: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 510,
};

/// Creates the missing-location diagnostic.
pub fn error_missing_location(name: &str, span: Span) -> Diagnostic {
    Diagnostic::error(E501, format!("`{name}` has no source location"), span)
}

/// Creates the missing-name diagnostic.
pub fn error_missing_name(what: &str, span: Span) -> Diagnostic {
    Diagnostic::error(E502, format!("{what} has no name"), span)
}

/// Creates the missing-parent diagnostic.
pub fn error_missing_parent(name: &str, span: Span) -> Diagnostic {
    Diagnostic::error(E503, format!("`{name}` has no parent"), span)
}

/// Creates the missing-file diagnostic.
pub fn error_missing_file(name: &str, span: Span) -> Diagnostic {
    Diagnostic::error(E504, format!("`{name}` has no source file"), span)
}

/// Creates the null-actual diagnostic.
pub fn error_null_actual(name: &str, span: Span) -> Diagnostic {
    Diagnostic::error(
        E505,
        format!("unresolved reference `{name}` after elaboration"),
        span,
    )
}

/// Creates the null-typespec diagnostic.
pub fn error_null_typespec(name: &str, span: Span) -> Diagnostic {
    Diagnostic::error(E506, format!("`{name}` has no resolved typespec"), span)
}

/// Creates the unsupported-typespec diagnostic.
pub fn error_unsupported_typespec(name: &str, span: Span) -> Diagnostic {
    Diagnostic::error(
        E507,
        format!("`{name}` carries an unsupported typespec"),
        span,
    )
}

/// Creates the invalid-foreach diagnostic.
pub fn error_invalid_foreach(span: Span) -> Diagnostic {
    Diagnostic::error(E508, "foreach statement has no loop variable", span)
}

/// Creates the duplicate-in-collection diagnostic.
pub fn error_duplicate_in_collection(what: &str, span: Span) -> Diagnostic {
    Diagnostic::error(E509, format!("duplicate entry in {what}"), span)
}

/// Creates the invalid-location diagnostic.
pub fn error_invalid_location(name: &str, span: Span) -> Diagnostic {
    Diagnostic::error(
        E510,
        format!("`{name}` has an unordered or escaping source range"),
        span,
    )
}
