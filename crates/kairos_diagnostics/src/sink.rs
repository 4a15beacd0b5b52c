//! Thread-safe diagnostic accumulator.

use crate::code::DiagnosticCode;
use crate::diagnostic::Diagnostic;
use crate::severity::Severity;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Collects the diagnostics of one analysis run.
///
/// Emission takes `&self`, so build workers on the rayon pool can report
/// directly. The error count is kept outside the lock.
#[derive(Debug)]
pub struct DiagnosticSink {
    held: Mutex<Vec<Diagnostic>>,
    errors: AtomicUsize,
}

impl DiagnosticSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self {
            held: Mutex::new(Vec::new()),
            errors: AtomicUsize::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Diagnostic>> {
        self.held.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Records a diagnostic.
    pub fn emit(&self, diag: Diagnostic) {
        if diag.severity.is_error() {
            self.errors.fetch_add(1, Ordering::Relaxed);
        }
        self.lock().push(diag);
    }

    /// Whether any error has been emitted, including already drained ones.
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// Errors emitted over the sink's lifetime.
    pub fn error_count(&self) -> usize {
        self.errors.load(Ordering::Relaxed)
    }

    /// Held diagnostics carrying `code`.
    pub fn count(&self, code: DiagnosticCode) -> usize {
        self.lock().iter().filter(|d| d.code == code).count()
    }

    /// The highest severity among held diagnostics.
    pub fn worst_severity(&self) -> Option<Severity> {
        self.lock().iter().map(|d| d.severity).max()
    }

    /// Drains the sink, most severe first. Equal severities keep emission
    /// order.
    pub fn take_all(&self) -> Vec<Diagnostic> {
        let mut out = std::mem::take(&mut *self.lock());
        out.sort_by(|a, b| b.severity.cmp(&a.severity));
        out
    }

    /// A copy of the held diagnostics in emission order.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.lock().clone()
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

    fn parse_error() -> Diagnostic {
        Diagnostic::error(DiagnosticCode::DATA_PARSE, "bad line")
    }

    fn skipped() -> Diagnostic {
        Diagnostic::warning(DiagnosticCode::SKIPPED_SINKS, "skipped 1 sinks")
    }

    #[test]
    fn empty_sink() {
        let sink = DiagnosticSink::new();
        assert!(!sink.has_errors());
        assert_eq!(sink.worst_severity(), None);
        assert!(sink.take_all().is_empty());
    }

    #[test]
    fn counts_by_code() {
        let sink = DiagnosticSink::new();
        sink.emit(skipped());
        sink.emit(skipped());
        sink.emit(Diagnostic::note(DiagnosticCode::SKIPPED_NETS, "n"));
        assert_eq!(sink.count(DiagnosticCode::SKIPPED_SINKS), 2);
        assert_eq!(sink.count(DiagnosticCode::LOOKUP_ERRORS), 0);
        assert_eq!(sink.worst_severity(), Some(Severity::Warning));
        assert!(!sink.has_errors());
    }

    #[test]
    fn take_all_orders_by_severity() {
        let sink = DiagnosticSink::new();
        sink.emit(Diagnostic::note(DiagnosticCode::SKIPPED_NETS, "first note"));
        sink.emit(skipped());
        sink.emit(parse_error());
        sink.emit(Diagnostic::note(DiagnosticCode::SKIPPED_NETS, "second note"));
        let all = sink.take_all();
        let order: Vec<Severity> = all.iter().map(|d| d.severity).collect();
        assert_eq!(
            order,
            [Severity::Error, Severity::Warning, Severity::Note, Severity::Note]
        );
        assert_eq!(all[2].message, "first note");
        assert!(sink.take_all().is_empty());
        assert_eq!(sink.error_count(), 1);
    }

    #[test]
    fn snapshot_keeps_emission_order() {
        let sink = DiagnosticSink::new();
        sink.emit(skipped());
        sink.emit(parse_error());
        let snap = sink.diagnostics();
        assert_eq!(snap[0].code, DiagnosticCode::SKIPPED_SINKS);
        assert_eq!(sink.diagnostics().len(), 2);
    }

    #[test]
    fn emit_from_rayon_style_workers() {
        use std::sync::Arc;
        use std::thread;

        let sink = Arc::new(DiagnosticSink::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let sink = Arc::clone(&sink);
                thread::spawn(move || {
                    for _ in 0..50 {
                        sink.emit(skipped());
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(sink.count(DiagnosticCode::SKIPPED_SINKS), 400);
    }
}
