//! C2 — the error sink every later pass reports into, plus the ambient
//! `CompileOutcome` the driver hands back to callers (§4.2a, §7).

use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

/// Where a diagnostic points. The string table isn't available yet when
/// most diagnostics are raised, so this carries an owned path rather than
/// an interned one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub file_abs_path: PathBuf,
    pub line: u32,
    pub severity: Severity,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(
            f,
            "{}:{}: {}: {}",
            self.file_abs_path.display(),
            self.line,
            tag,
            self.message
        )
    }
}

/// Every distinct shape of diagnostic the pipeline can raise, per §7. Each
/// variant carries exactly the fields needed to render its message; the
/// sink turns a `CompilerMessage` plus a source location into a
/// [`Diagnostic`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompilerMessage {
    UnresolvedSymbol { name: String, scope: String },
    TypeError { expected: String, found: String, context: String },
    AccessViolation { member: String, owner: String, accessor: String },
    Redefinition { name: String, first_kind: String, second_kind: String },
    SignatureMismatch { function: String, base: String, reason: String },
    EnumInconsistency { enum_name: String, reason: String },
    OverloadAmbiguity { call: String, candidates: Vec<String> },
    ConstantOverflow { value: String, target_type: String },
    CyclicImport { module: String },
    InternalError { detail: String },
}

impl fmt::Display for CompilerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompilerMessage::UnresolvedSymbol { name, scope } => {
                write!(f, "unresolved symbol `{name}` in {scope}")
            }
            CompilerMessage::TypeError { expected, found, context } => {
                write!(f, "type mismatch in {context}: expected `{expected}`, found `{found}`")
            }
            CompilerMessage::AccessViolation { member, owner, accessor } => {
                write!(f, "`{accessor}` cannot access `{member}` of `{owner}`")
            }
            CompilerMessage::Redefinition { name, first_kind, second_kind } => {
                write!(f, "`{name}` redefined as {second_kind}, first declared as {first_kind}")
            }
            CompilerMessage::SignatureMismatch { function, base, reason } => {
                write!(f, "`{function}` does not match `{base}`: {reason}")
            }
            CompilerMessage::EnumInconsistency { enum_name, reason } => {
                write!(f, "enum `{enum_name}` is inconsistent: {reason}")
            }
            CompilerMessage::OverloadAmbiguity { call, candidates } => {
                write!(f, "call to `{call}` is ambiguous between {}", candidates.join(", "))
            }
            CompilerMessage::ConstantOverflow { value, target_type } => {
                write!(f, "constant `{value}` does not fit in `{target_type}`")
            }
            CompilerMessage::CyclicImport { module } => {
                write!(f, "module `{module}` imports itself, directly or indirectly")
            }
            CompilerMessage::InternalError { detail } => {
                write!(f, "internal compiler error: {detail}")
            }
        }
    }
}

/// Thread-safe collection point for diagnostics. C6 may push into this
/// from several `rayon` worker threads at once (§5), so both the vectors
/// and the fast-path counters need to be safe to share.
#[derive(Default)]
pub struct ErrorSink {
    errors: Mutex<Vec<Diagnostic>>,
    warnings: Mutex<Vec<Diagnostic>>,
    error_count: AtomicU32,
    warning_count: AtomicU32,
}

impl ErrorSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report_error(&self, file_abs_path: PathBuf, line: u32, message: impl fmt::Display) {
        self.errors.lock().unwrap().push(Diagnostic {
            file_abs_path,
            line,
            severity: Severity::Error,
            message: message.to_string(),
        });
        self.error_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn report_warning(&self, file_abs_path: PathBuf, line: u32, message: impl fmt::Display) {
        self.warnings.lock().unwrap().push(Diagnostic {
            file_abs_path,
            line,
            severity: Severity::Warning,
            message: message.to_string(),
        });
        self.warning_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Lock-free check used at phase boundaries: later passes must not run
    /// over a stub library that already failed to resolve (§7).
    pub fn has_errors(&self) -> bool {
        self.error_count.load(Ordering::Relaxed) > 0
    }

    pub fn error_count(&self) -> u32 {
        self.error_count.load(Ordering::Relaxed)
    }

    pub fn warning_count(&self) -> u32 {
        self.warning_count.load(Ordering::Relaxed)
    }

    /// Drains the sink into a [`CompileOutcome`]. Diagnostics are sorted by
    /// file then line so output is deterministic regardless of which
    /// worker thread reported first.
    pub fn into_outcome(self) -> CompileOutcome {
        let mut errors = self.errors.into_inner().unwrap();
        let mut warnings = self.warnings.into_inner().unwrap();
        errors.sort_by(|a, b| (&a.file_abs_path, a.line).cmp(&(&b.file_abs_path, b.line)));
        warnings.sort_by(|a, b| (&a.file_abs_path, a.line).cmp(&(&b.file_abs_path, b.line)));
        CompileOutcome { errors, warnings }
    }

    /// Same as [`Self::into_outcome`] but borrows instead of consuming,
    /// for the driver, which still needs the library (and the sink on
    /// it) after building the outcome to hand back to its caller.
    pub fn to_outcome(&self) -> CompileOutcome {
        let mut errors = self.errors.lock().unwrap().clone();
        let mut warnings = self.warnings.lock().unwrap().clone();
        errors.sort_by(|a, b| (&a.file_abs_path, a.line).cmp(&(&b.file_abs_path, b.line)));
        warnings.sort_by(|a, b| (&a.file_abs_path, a.line).cmp(&(&b.file_abs_path, b.line)));
        CompileOutcome { errors, warnings }
    }
}

/// What the driver hands back to callers of [`crate::driver::compile_module`]
/// (§7).
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CompileOutcome {
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
}

impl CompileOutcome {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_tracks_counts_independently_of_vectors() {
        let sink = ErrorSink::new();
        sink.report_error(PathBuf::from("a.script"), 10, "boom");
        sink.report_warning(PathBuf::from("a.script"), 2, "hmm");
        assert!(sink.has_errors());
        assert_eq!(sink.error_count(), 1);
        assert_eq!(sink.warning_count(), 1);
    }

    #[test]
    fn outcome_sorts_by_file_then_line() {
        let sink = ErrorSink::new();
        sink.report_error(PathBuf::from("b.script"), 5, "second file");
        sink.report_error(PathBuf::from("a.script"), 20, "later line");
        sink.report_error(PathBuf::from("a.script"), 3, "earlier line");
        let outcome = sink.into_outcome();
        assert_eq!(outcome.errors[0].message, "earlier line");
        assert_eq!(outcome.errors[1].message, "later line");
        assert_eq!(outcome.errors[2].message, "second file");
    }

    #[test]
    fn message_display_matches_expected_shape() {
        let msg = CompilerMessage::UnresolvedSymbol {
            name: "foo".into(),
            scope: "function `bar`".into(),
        };
        assert_eq!(msg.to_string(), "unresolved symbol `foo` in function `bar`");
    }
}
