//! Preprocessor error kinds and diagnostic constructors.
//!
//! Fatal per-file conditions are [`PreprocError`] values returned with `?`;
//! the driver records them and drops the file. Recoverable conditions go
//! straight to the diagnostic sink through the helpers below. Codes
//! `E101`--`E110` and `W106`/`W109` belong to the preprocessor stage.

use veril_diagnostics::{Category, Diagnostic, DiagnosticCode, Label};
use veril_source::Span;

/// A fatal preprocessing failure that drops the file from downstream passes.
#[derive(Debug, thiserror::Error)]
pub enum PreprocError {
    /// An `include target could not be located in the include path list.
    #[error("cannot resolve include `{name}`")]
    UnresolvedInclude {
        /// The include target as written.
        name: String,
        /// The span of the `include directive.
        span: Span,
    },
    /// An `include target is already on the include stack.
    #[error("recursive include of `{name}`")]
    RecursiveInclude {
        /// The include target closing the cycle.
        name: String,
        /// The span of the second `include in the cycle.
        span: Span,
    },
    /// A macro expansion re-entered a macro already being expanded.
    #[error("recursive expansion of macro `{name}`")]
    MacroRecursion {
        /// The macro closing the cycle.
        name: String,
        /// The span of the offending instance.
        span: Span,
    },
    /// A conditional block was still open at end of file.
    #[error("unterminated `{directive} at end of file")]
    UnterminatedConditional {
        /// The directive that opened the dangling block.
        directive: String,
        /// The span of the opening directive.
        span: Span,
    },
    /// An included file could not be read from disk.
    #[error("cannot read include `{name}`: {message}")]
    IncludeIo {
        /// The include target as written.
        name: String,
        /// The underlying I/O error message.
        message: String,
        /// The span of the `include directive.
        span: Span,
    },
}

impl PreprocError {
    /// The span this error points at.
    pub fn span(&self) -> Span {
        match self {
            PreprocError::UnresolvedInclude { span, .. }
            | PreprocError::RecursiveInclude { span, .. }
            | PreprocError::MacroRecursion { span, .. }
            | PreprocError::UnterminatedConditional { span, .. }
            | PreprocError::IncludeIo { span, .. } => *span,
        }
    }

    /// Converts this error into the diagnostic recorded before the file is dropped.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let code = match self {
            PreprocError::UnresolvedInclude { .. } => E101,
            PreprocError::RecursiveInclude { .. } => E102,
            PreprocError::MacroRecursion { .. } => E103,
            PreprocError::UnterminatedConditional { .. } => E105,
            PreprocError::IncludeIo { .. } => E101,
        };
        Diagnostic::error(code, self.to_string(), self.span())
    }
}

/// Unresolved or unreadable include target.
pub const E101: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 101,
};

/// Recursive include.
pub const E102: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 102,
};

/// Recursive macro expansion.
pub const E103: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 103,
};

/// Macro called with the wrong number of arguments, or without required parens.
pub const E104: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 104,
};

/// Conditional still open at end of file.
pub const E105: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 105,
};

/// Use of an undefined macro (error form, under `complain_undefined_macro`).
pub const E106: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 106,
};

/// Use of an undefined macro (default warning form).
pub const W106: DiagnosticCode = DiagnosticCode {
    category: Category::Warning,
    number: 106,
};

/// Malformed `include filename.
pub const E107: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 107,
};

/// Malformed `timescale operand.
pub const E108: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 108,
};

/// Bad operand to `unconnected_drive or `default_nettype.
pub const W109: DiagnosticCode = DiagnosticCode {
    category: Category::Warning,
    number: 109,
};

/// Stray `elsif/`else/`endif with no opening conditional.
pub const E110: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 110,
};

/// Creates a diagnostic for a macro arity mismatch.
pub fn error_macro_arity(name: &str, expected: usize, got: usize, span: Span) -> Diagnostic {
    Diagnostic::error(
        E104,
        format!("macro `{name}` expects {expected} argument(s), got {got}"),
        span,
    )
}

/// Creates a diagnostic for a parametric macro used without parentheses,
/// pointing at the definition.
pub fn error_macro_needs_parens(name: &str, span: Span, def_span: Span) -> Diagnostic {
    Diagnostic::error(
        E104,
        format!("macro `{name}` takes arguments but is used without parentheses"),
        span,
    )
    .with_label(Label::secondary(def_span, "macro defined here"))
}

/// Creates a diagnostic for the use of an undefined macro.
///
/// Severity depends on the `complain_undefined_macro` configuration.
pub fn undefined_macro(name: &str, complain: bool, span: Span) -> Diagnostic {
    if complain {
        Diagnostic::error(E106, format!("undefined macro `{name}`"), span)
    } else {
        Diagnostic::warning(W106, format!("undefined macro `{name}`"), span)
    }
}

/// Creates a diagnostic for a malformed `include filename.
pub fn error_invalid_include_filename(span: Span) -> Diagnostic {
    Diagnostic::error(
        E107,
        "`include expects a filename in double quotes or angle brackets",
        span,
    )
}

/// Creates a diagnostic for a malformed `timescale operand.
pub fn error_invalid_timescale(text: &str, span: Span) -> Diagnostic {
    Diagnostic::error(E108, format!("invalid `timescale `{text}`"), span)
        .with_note("expected the form `1ns / 1ps` with magnitude 1, 10, or 100")
}

/// Creates a diagnostic for a bad `unconnected_drive or `default_nettype operand.
pub fn warn_bad_drive_value(directive: &str, text: &str, span: Span) -> Diagnostic {
    Diagnostic::warning(
        W109,
        format!("invalid operand `{text}` for `{directive}"),
        span,
    )
}

/// Creates a diagnostic for a stray `elsif/`else/`endif.
pub fn error_stray_conditional(directive: &str, span: Span) -> Diagnostic {
    Diagnostic::error(
        E110,
        format!("`{directive} without a matching `ifdef/`ifndef"),
        span,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_error_to_diagnostic() {
        let err = PreprocError::UnresolvedInclude {
            name: "defs.svh".to_string(),
            span: Span::DUMMY,
        };
        let d = err.to_diagnostic();
        assert_eq!(d.code, E101);
        assert!(d.message.contains("defs.svh"));
    }

    #[test]
    fn recursive_include_message() {
        let err = PreprocError::RecursiveInclude {
            name: "a.svh".to_string(),
            span: Span::DUMMY,
        };
        assert_eq!(format!("{err}"), "recursive include of `a.svh`");
        assert_eq!(err.to_diagnostic().code, E102);
    }

    #[test]
    fn macro_recursion_code() {
        let err = PreprocError::MacroRecursion {
            name: "LOOP".to_string(),
            span: Span::DUMMY,
        };
        assert_eq!(err.to_diagnostic().code, E103);
    }

    #[test]
    fn undefined_macro_severity_tracks_config() {
        let warn = undefined_macro("FOO", false, Span::DUMMY);
        assert_eq!(warn.code, W106);
        let err = undefined_macro("FOO", true, Span::DUMMY);
        assert_eq!(err.code, E106);
    }

    #[test]
    fn needs_parens_has_definition_label() {
        let d = error_macro_needs_parens("MAX", Span::DUMMY, Span::DUMMY);
        assert_eq!(d.labels.len(), 1);
    }
}
