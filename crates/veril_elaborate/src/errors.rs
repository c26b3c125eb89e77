//! Diagnostic codes and helpers for binding and elaboration.
//!
//! Codes `E401`--`E406` cover late-binding and instantiation failures.
//! All are reported and allowed: the elaborated IR may carry null
//! references, which the integrity checker surfaces.

use veril_diagnostics::{Category, Diagnostic, DiagnosticCode};
use veril_source::Span;

/// A parameter binding names no declared parameter.
pub const E401: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 401,
};

/// A type (or instantiation target) could not be resolved.
pub const E402: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 402,
};

/// An identifier use could not be resolved.
pub const E403: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 403,
};

/// A class extends an unknown base.
pub const E404: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 404,
};

/// A constant expression required by elaboration did not reduce.
pub const E405: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 405,
};

/// A component directly or indirectly instantiates itself.
pub const E406: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 406,
};

/// Creates the unknown-parameter-binding diagnostic.
pub fn error_unknown_param_binding(param: &str, target: &str, span: Span) -> Diagnostic {
    Diagnostic::error(
        E401,
        format!("`{param}` is not a parameter of `{target}`"),
        span,
    )
}

/// Creates the undefined-type diagnostic.
pub fn error_undefined_type(name: &str, span: Span) -> Diagnostic {
    Diagnostic::error(E402, format!("undefined type `{name}`"), span)
}

/// Creates the undefined-variable diagnostic.
pub fn error_undefined_variable(name: &str, span: Span) -> Diagnostic {
    Diagnostic::error(E403, format!("undefined variable `{name}`"), span)
}

/// Creates the no-base-class diagnostic.
pub fn error_no_base_class(base: &str, class: &str, span: Span) -> Diagnostic {
    Diagnostic::error(
        E404,
        format!("class `{class}` extends unknown base `{base}`"),
        span,
    )
}

/// Creates the constant-expression-not-reducible diagnostic.
pub fn error_not_reducible(what: &str, span: Span) -> Diagnostic {
    Diagnostic::error(
        E405,
        format!("{what} does not reduce to a constant in this context"),
        span,
    )
}

/// Creates the circular-instantiation diagnostic.
pub fn error_circular_instantiation(name: &str, span: Span) -> Diagnostic {
    Diagnostic::error(
        E406,
        format!("circular instantiation of `{name}`"),
        span,
    )
    .with_note("the component directly or indirectly instantiates itself")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_formats() {
        assert_eq!(format!("{E401}"), "E401");
        assert_eq!(format!("{E406}"), "E406");
    }

    #[test]
    fn unknown_param_binding_names_both() {
        let d = error_unknown_param_binding("WIDTH", "counter", Span::DUMMY);
        assert!(d.message.contains("WIDTH"));
        assert!(d.message.contains("counter"));
    }

    #[test]
    fn circular_instantiation_has_note() {
        let d = error_circular_instantiation("top", Span::DUMMY);
        assert_eq!(d.code, E406);
        assert!(!d.notes.is_empty());
    }
}
