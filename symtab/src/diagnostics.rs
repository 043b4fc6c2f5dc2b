// The diagnostic sink: accepts warnings/errors with source locations and a
// severity. Treated as an abstract external collaborator by spec.md (the
// engine only needs *a* sink, not a particular one); `StderrSink` below is
// the concrete implementation this crate ships, built the way the teacher's
// `report_error`/`report_warning` free functions in grammar.rs do it.
use std::cell::Cell;
use std::io::{stderr, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Fatal,
    Complaint,
    Wyacc,
    Wprecedence,
    Wother,
}

/// Accepts diagnostics produced while building and finalizing a symbol
/// table. `fatal` never returns -- the engine has no process boundary of
/// its own to exit from, so it panics; a caller at the process boundary
/// (the demo binary, or a future grammar-file driver) is expected to catch
/// that the way the teacher's `main.rs` matches on `grammar::Error` and
/// calls `std::process::exit`.
pub trait DiagnosticSink {
    fn report(&self, severity: Severity, location: Option<&lexan::Location>, message: &str);

    /// A primary diagnostic followed by an indented "previous declaration"
    /// note at `other_location`. When `other_location` sorts before
    /// `location` the two are swapped so the earlier one prints first,
    /// matching spec.md §4.3's "Failure semantics". The two calls are one
    /// logical diagnostic: only `report` bumps `error_count`/
    /// `warning_count`, `report_indented` must not count it a second time.
    fn report_with_previous(
        &self,
        severity: Severity,
        location: &lexan::Location,
        other_location: &lexan::Location,
        message: &str,
        previous_message: &str,
    ) {
        let (first_loc, first_msg, second_loc, second_msg) = if other_location < location {
            (other_location, previous_message, location, message)
        } else {
            (location, message, other_location, previous_message)
        };
        self.report(severity, Some(first_loc), first_msg);
        self.report_indented(severity, second_loc, second_msg);
    }

    /// The secondary half of a two-location diagnostic raised through
    /// `report_with_previous`. Must not bump `error_count`/`warning_count`
    /// itself -- `report` already counted the diagnostic once.
    fn report_indented(&self, severity: Severity, location: &lexan::Location, message: &str);

    fn fatal(&self, location: Option<&lexan::Location>, message: &str) -> ! {
        self.report(Severity::Fatal, location, message);
        panic!("fatal: {}", message);
    }

    fn complaint(&self, location: &lexan::Location, message: &str) {
        self.report(Severity::Complaint, Some(location), message);
    }

    fn warn_yacc(&self, location: &lexan::Location, message: &str) {
        self.report(Severity::Wyacc, Some(location), message);
    }

    fn warn_precedence(&self, location: &lexan::Location, message: &str) {
        self.report(Severity::Wprecedence, Some(location), message);
    }

    fn warn_other(&self, location: Option<&lexan::Location>, message: &str) {
        self.report(Severity::Wother, location, message);
    }

    fn error_count(&self) -> u32;
    fn warning_count(&self) -> u32;
}

#[derive(Debug, Default)]
pub struct StderrSink {
    errors: Cell<u32>,
    warnings: Cell<u32>,
}

impl StderrSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn label(severity: Severity) -> &'static str {
        match severity {
            Severity::Fatal => "Fatal error",
            Severity::Complaint => "Error",
            Severity::Wyacc => "Warning (POSIX Yacc)",
            Severity::Wprecedence => "Warning",
            Severity::Wother => "Warning",
        }
    }

    fn bump(&self, severity: Severity) {
        match severity {
            Severity::Fatal | Severity::Complaint => self.errors.set(self.errors.get() + 1),
            _ => self.warnings.set(self.warnings.get() + 1),
        }
    }
}

impl DiagnosticSink for StderrSink {
    fn report(&self, severity: Severity, location: Option<&lexan::Location>, message: &str) {
        self.bump(severity);
        if let Some(location) = location {
            writeln!(stderr(), "{}: {}: {}.", location, Self::label(severity), message)
                .expect("nowhere to go here");
        } else {
            writeln!(stderr(), "{}: {}.", Self::label(severity), message).expect("nowhere to go here");
        }
    }

    fn report_indented(&self, severity: Severity, location: &lexan::Location, message: &str) {
        writeln!(stderr(), "    {}: {}: {}.", location, Self::label(severity), message)
            .expect("nowhere to go here");
    }

    fn error_count(&self) -> u32 {
        self.errors.get()
    }

    fn warning_count(&self) -> u32 {
        self.warnings.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_errors_and_warnings_separately() {
        let sink = StderrSink::new();
        let loc = lexan::Location::new("test");
        sink.complaint(&loc, "redeclared");
        sink.warn_other(Some(&loc), "unused");
        assert_eq!(sink.error_count(), 1);
        assert_eq!(sink.warning_count(), 1);
    }
}
