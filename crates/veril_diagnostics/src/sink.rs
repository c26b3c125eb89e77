//! Thread-safe diagnostic accumulator for parallel compilation stages.

use crate::diagnostic::Diagnostic;
use crate::severity::Severity;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// A thread-safe accumulator for diagnostics emitted during compilation.
///
/// Multiple workers emit diagnostics concurrently via [`emit`](Self::emit).
/// The error count is tracked atomically for fast `has_errors` checks without
/// locking the diagnostic vector. Output order is made deterministic by
/// [`sorted`](Self::sorted), which orders by `(file, offset)` regardless of
/// which worker emitted first.
pub struct DiagnosticSink {
    diagnostics: Mutex<Vec<Diagnostic>>,
    error_count: AtomicUsize,
    warning_count: AtomicUsize,
}

impl DiagnosticSink {
    /// Creates a new empty diagnostic sink.
    pub fn new() -> Self {
        Self {
            diagnostics: Mutex::new(Vec::new()),
            error_count: AtomicUsize::new(0),
            warning_count: AtomicUsize::new(0),
        }
    }

    /// Emits a diagnostic into the sink.
    pub fn emit(&self, diag: Diagnostic) {
        match diag.severity {
            Severity::Error => {
                self.error_count.fetch_add(1, Ordering::Relaxed);
            }
            Severity::Warning => {
                self.warning_count.fetch_add(1, Ordering::Relaxed);
            }
            Severity::Note => {}
        }
        let mut diagnostics = self.diagnostics.lock().unwrap();
        diagnostics.push(diag);
    }

    /// Returns `true` if any error-severity diagnostics have been emitted.
    pub fn has_errors(&self) -> bool {
        self.error_count.load(Ordering::Relaxed) > 0
    }

    /// Returns the number of error-severity diagnostics emitted so far.
    pub fn error_count(&self) -> usize {
        self.error_count.load(Ordering::Relaxed)
    }

    /// Returns the number of warning-severity diagnostics emitted so far.
    pub fn warning_count(&self) -> usize {
        self.warning_count.load(Ordering::Relaxed)
    }

    /// Takes all accumulated diagnostics, leaving the sink empty.
    pub fn take_all(&self) -> Vec<Diagnostic> {
        let mut diagnostics = self.diagnostics.lock().unwrap();
        std::mem::take(&mut *diagnostics)
    }

    /// Returns a snapshot of all accumulated diagnostics without draining.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let diagnostics = self.diagnostics.lock().unwrap();
        diagnostics.clone()
    }

    /// Returns a snapshot sorted by `(file, start offset)`.
    ///
    /// Sorting by byte offset within a file is equivalent to sorting by
    /// `(line, column)` since offsets increase monotonically with position.
    /// The sort is stable so same-location diagnostics keep emission order.
    pub fn sorted(&self) -> Vec<Diagnostic> {
        let mut diags = self.diagnostics();
        diags.sort_by_key(|d| (d.primary_span.file, d.primary_span.start));
        diags
    }
}

impl Default for DiagnosticSink {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::{Category, DiagnosticCode};
    use veril_source::{FileId, Span};

    fn make_error_at(file: u32, start: u32) -> Diagnostic {
        Diagnostic::error(
            DiagnosticCode::new(Category::Error, 201),
            "test error",
            Span::new(FileId::from_raw(file), start, start + 1),
        )
    }

    fn make_warning() -> Diagnostic {
        Diagnostic::warning(
            DiagnosticCode::new(Category::Warning, 105),
            "test warning",
            Span::DUMMY,
        )
    }

    #[test]
    fn empty_sink() {
        let sink = DiagnosticSink::new();
        assert!(!sink.has_errors());
        assert_eq!(sink.error_count(), 0);
        assert_eq!(sink.warning_count(), 0);
        assert!(sink.take_all().is_empty());
    }

    #[test]
    fn emit_counts_by_severity() {
        let sink = DiagnosticSink::new();
        sink.emit(make_error_at(0, 0));
        sink.emit(make_warning());
        assert!(sink.has_errors());
        assert_eq!(sink.error_count(), 1);
        assert_eq!(sink.warning_count(), 1);
    }

    #[test]
    fn take_all_drains() {
        let sink = DiagnosticSink::new();
        sink.emit(make_error_at(0, 0));
        sink.emit(make_warning());
        let all = sink.take_all();
        assert_eq!(all.len(), 2);
        assert!(sink.take_all().is_empty());
        // Counters are NOT reset by take_all
        assert_eq!(sink.error_count(), 1);
    }

    #[test]
    fn sorted_orders_by_file_then_offset() {
        let sink = DiagnosticSink::new();
        sink.emit(make_error_at(1, 5));
        sink.emit(make_error_at(0, 90));
        sink.emit(make_error_at(0, 10));
        let sorted = sink.sorted();
        let keys: Vec<_> = sorted
            .iter()
            .map(|d| (d.primary_span.file.as_raw(), d.primary_span.start))
            .collect();
        assert_eq!(keys, vec![(0, 10), (0, 90), (1, 5)]);
    }

    #[test]
    fn thread_safety() {
        use std::sync::Arc;
        use std::thread;

        let sink = Arc::new(DiagnosticSink::new());
        let mut handles = Vec::new();

        for _ in 0..10 {
            let sink = Arc::clone(&sink);
            handles.push(thread::spawn(move || {
                for i in 0..100 {
                    sink.emit(make_error_at(0, i));
                }
            }));
        }

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(sink.error_count(), 1000);
        assert_eq!(sink.diagnostics().len(), 1000);
    }
}
