//! Diagnostic codes and helpers for component compilation.
//!
//! Codes `E301`--`E315` cover declaration-level problems found while
//! filling component IR. All of them are reported and allowed: compilation
//! continues and elaboration may see null references.

use veril_diagnostics::{Category, Diagnostic, DiagnosticCode, Label};
use veril_ir::SourceLoc;
use veril_source::Span;

/// An output or inout port has no net declaration under `default_nettype none`.
pub const E301: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 301,
};

/// An ANSI port has no direction and none to inherit.
pub const E302: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 302,
};

/// A port named in a non-ANSI header has no declaration in the body.
pub const E303: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 303,
};

/// A property or sequence name is defined more than once.
pub const E304: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 304,
};

/// A task name is defined more than once.
pub const E305: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 305,
};

/// A function name is defined more than once.
pub const E306: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 306,
};

/// A constraint name is defined more than once.
pub const E307: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 307,
};

/// A covergroup name is defined more than once.
pub const E308: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 308,
};

/// An inner class name is defined more than once.
pub const E309: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 309,
};

/// A class method redefines a built-in method.
pub const E310: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 310,
};

/// A modport names a signal the interface does not declare.
pub const E311: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 311,
};

/// A modport references a clocking block the interface does not declare.
pub const E312: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 312,
};

/// A modport declaration appears inside a generate construct.
pub const E313: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 313,
};

/// An interface port references an undefined interface.
pub const E314: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 314,
};

/// A design element name is defined more than once in a library.
pub const E315: DiagnosticCode = DiagnosticCode {
    category: Category::Error,
    number: 315,
};

/// Converts an IR location back to a span for diagnostics.
///
/// IR locations are line/column ranges; diagnostics carry byte spans, so
/// this rebuilds a one-character span at the location's start from the
/// owning file's line map. Falls back to a dummy span for unknown files.
pub fn loc_span(loc: SourceLoc, source_db: &veril_source::SourceDb) -> Span {
    if loc.is_unknown() {
        return Span::DUMMY;
    }
    let file = source_db.get_file(loc.file);
    match file.line_offset(loc.line) {
        Some(start) => {
            let offset = start + u32::from(loc.col.saturating_sub(1));
            Span::new(loc.file, offset, offset + 1)
        }
        None => Span::DUMMY,
    }
}

/// Creates the port-missing-type diagnostic with an offender count.
pub fn error_port_missing_type(count: usize, first: &str, span: Span) -> Diagnostic {
    Diagnostic::error(
        E301,
        format!("{count} port(s) without a net declaration under `default_nettype none (first: `{first}`)"),
        span,
    )
}

/// Creates the port-missing-direction diagnostic.
pub fn error_port_missing_direction(name: &str, span: Span) -> Diagnostic {
    Diagnostic::error(E302, format!("port `{name}` has no direction"), span)
}

/// Creates the unspecified-port diagnostic.
pub fn error_unspecified_port(name: &str, span: Span) -> Diagnostic {
    Diagnostic::error(
        E303,
        format!("port `{name}` is listed in the header but never declared"),
        span,
    )
}

/// Creates a multiply-defined diagnostic with a secondary label.
pub fn error_multiply_defined(
    code: DiagnosticCode,
    what: &str,
    name: &str,
    span: Span,
    prev: Span,
) -> Diagnostic {
    Diagnostic::error(code, format!("{what} `{name}` is already defined"), span)
        .with_label(Label::secondary(prev, "previous definition"))
}

/// Creates the builtin-method-redefinition diagnostic.
pub fn error_redefine_builtin(name: &str, span: Span) -> Diagnostic {
    Diagnostic::error(
        E310,
        format!("cannot redefine built-in method `{name}`"),
        span,
    )
}

/// Creates the modport-undefined-port diagnostic.
pub fn error_modport_undefined_port(port: &str, modport: &str, span: Span) -> Diagnostic {
    Diagnostic::error(
        E311,
        format!("modport `{modport}` names `{port}`, which the interface does not declare"),
        span,
    )
}

/// Creates the modport-undefined-clocking-block diagnostic.
pub fn error_modport_undefined_clocking(cb: &str, modport: &str, span: Span) -> Diagnostic {
    Diagnostic::error(
        E312,
        format!("modport `{modport}` references undeclared clocking block `{cb}`"),
        span,
    )
}

/// Creates the no-modport-in-generate diagnostic.
pub fn error_modport_in_generate(span: Span) -> Diagnostic {
    Diagnostic::error(E313, "modport declarations are not allowed inside generate constructs", span)
}

/// Creates the undefined-interface diagnostic.
pub fn error_undefined_interface(name: &str, span: Span) -> Diagnostic {
    Diagnostic::error(E314, format!("undefined interface `{name}`"), span)
}

/// Creates the duplicate-design-element diagnostic.
pub fn error_duplicate_design_element(name: &str, span: Span) -> Diagnostic {
    Diagnostic::error(
        E315,
        format!("design element `{name}` is already defined in this library"),
        span,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_formats() {
        assert_eq!(format!("{E301}"), "E301");
        assert_eq!(format!("{E315}"), "E315");
    }

    #[test]
    fn missing_type_carries_count() {
        let d = error_port_missing_type(3, "data", Span::DUMMY);
        assert_eq!(d.code, E301);
        assert!(d.message.contains('3'));
        assert!(d.message.contains("data"));
    }

    #[test]
    fn multiply_defined_has_label() {
        let d = error_multiply_defined(E306, "function", "f", Span::DUMMY, Span::DUMMY);
        assert_eq!(d.labels.len(), 1);
        assert!(d.message.contains("already defined"));
    }

    #[test]
    fn modport_diagnostics() {
        let d = error_modport_undefined_port("data", "slave", Span::DUMMY);
        assert_eq!(d.code, E311);
        let d = error_modport_undefined_clocking("cb", "slave", Span::DUMMY);
        assert_eq!(d.code, E312);
    }
}
