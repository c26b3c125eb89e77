//! Fixed-format diagnostic rendering.
//!
//! Diagnostics are emitted one per line as `FILE:LINE:COL: kind[CODE]: msg`,
//! with secondary labels and notes on indented continuation lines, followed
//! by an `(errors=N, warnings=M)` summary.

use crate::diagnostic::Diagnostic;
use crate::label::LabelStyle;
use crate::sink::DiagnosticSink;
use veril_source::SourceDb;

/// Renders a single diagnostic into the fixed single-line format.
pub fn render_one(diag: &Diagnostic, source_db: &SourceDb) -> String {
    let mut out = String::new();

    if diag.primary_span.is_dummy() {
        out.push_str(&format!(
            "<unknown>: {}[{}]: {}",
            diag.severity, diag.code, diag.message
        ));
    } else {
        let loc = source_db.resolve_span(diag.primary_span);
        out.push_str(&format!(
            "{}:{}:{}: {}[{}]: {}",
            loc.file_path.display(),
            loc.start_line,
            loc.start_col,
            diag.severity,
            diag.code,
            diag.message
        ));
    }

    for label in &diag.labels {
        if label.style == LabelStyle::Secondary && !label.span.is_dummy() {
            let loc = source_db.resolve_span(label.span);
            out.push_str(&format!(
                "\n  {}:{}:{}: note: {}",
                loc.file_path.display(),
                loc.start_line,
                loc.start_col,
                label.message
            ));
        }
    }
    for note in &diag.notes {
        out.push_str(&format!("\n  note: {note}"));
    }

    out
}

/// Renders the end-of-run summary line.
pub fn render_summary(sink: &DiagnosticSink) -> String {
    format!(
        "(errors={}, warnings={})",
        sink.error_count(),
        sink.warning_count()
    )
}

/// Renders all diagnostics in the sink, sorted by source position, with the
/// trailing summary line.
pub fn render_all(sink: &DiagnosticSink, source_db: &SourceDb) -> String {
    let mut out = String::new();
    for diag in sink.sorted() {
        out.push_str(&render_one(&diag, source_db));
        out.push('\n');
    }
    out.push_str(&render_summary(sink));
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::{Category, DiagnosticCode};
    use crate::label::Label;
    use veril_source::Span;

    #[test]
    fn render_error_with_span() {
        let mut source_db = SourceDb::new();
        let file_id = source_db.add_source("top.sv", "module top\nendmodule\n".to_string());

        let code = DiagnosticCode::new(Category::Error, 201);
        let span = Span::new(file_id, 11, 20);
        let diag = Diagnostic::error(code, "expected ';'", span);

        let output = render_one(&diag, &source_db);
        assert_eq!(output, "top.sv:2:1: error[E201]: expected ';'");
    }

    #[test]
    fn render_with_secondary_label() {
        let mut source_db = SourceDb::new();
        let file_id = source_db.add_source("a.sv", "module m; endmodule\nmodule m; endmodule\n".to_string());

        let code = DiagnosticCode::new(Category::Error, 310);
        let diag = Diagnostic::error(code, "duplicate module `m`", Span::new(file_id, 20, 26))
            .with_label(Label::secondary(
                Span::new(file_id, 0, 6),
                "previously defined here",
            ));

        let output = render_one(&diag, &source_db);
        assert!(output.starts_with("a.sv:2:1: error[E310]: duplicate module `m`"));
        assert!(output.contains("a.sv:1:1: note: previously defined here"));
    }

    #[test]
    fn render_dummy_span() {
        let source_db = SourceDb::new();
        let code = DiagnosticCode::new(Category::Error, 999);
        let diag = Diagnostic::error(code, "general error", Span::DUMMY);
        let output = render_one(&diag, &source_db);
        assert_eq!(output, "<unknown>: error[E999]: general error");
    }

    #[test]
    fn summary_counts() {
        let mut source_db = SourceDb::new();
        let file_id = source_db.add_source("x.sv", "abc\n".to_string());
        let sink = DiagnosticSink::new();
        sink.emit(Diagnostic::error(
            DiagnosticCode::new(Category::Error, 201),
            "bad",
            Span::new(file_id, 0, 1),
        ));
        sink.emit(Diagnostic::warning(
            DiagnosticCode::new(Category::Warning, 105),
            "meh",
            Span::new(file_id, 1, 2),
        ));
        assert_eq!(render_summary(&sink), "(errors=1, warnings=1)");
        let all = render_all(&sink, &source_db);
        assert!(all.ends_with("(errors=1, warnings=1)\n"));
        // error at offset 0 renders before warning at offset 1
        let err_pos = all.find("error[").unwrap();
        let warn_pos = all.find("warning[").unwrap();
        assert!(err_pos < warn_pos);
    }
}
