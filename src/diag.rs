//! Per-object diagnostics.
//!
//! Every anomaly found while decoding one object is logged through the `log`
//! facade (so it reaches standard error via `env_logger`) and recorded here,
//! so the caller can decide the exit status once the object is finished.

use std::cell::RefCell;
use std::fmt;

/// How bad a reported anomaly is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Recoverable: a placeholder or fallback was used and decoding went on.
    Warning,
    /// The object (or a table it cannot be summarised without) is unusable.
    Error,
}

/// One recorded anomaly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

/// Collector for the anomalies of a single object.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: RefCell<Vec<Diagnostic>>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report a recoverable anomaly.
    pub fn warn(&self, message: impl fmt::Display) {
        let message = message.to_string();
        log::warn!("{message}");
        self.push(Severity::Warning, message);
    }

    /// Report an anomaly that makes the object's output incomplete.
    pub fn error(&self, message: impl fmt::Display) {
        let message = message.to_string();
        log::error!("{message}");
        self.push(Severity::Error, message);
    }

    fn push(&self, severity: Severity, message: String) {
        self.entries.borrow_mut().push(Diagnostic { severity, message });
    }

    /// True once any [`Severity::Error`] has been reported.
    pub fn has_errors(&self) -> bool {
        self.entries
            .borrow()
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A snapshot of everything reported so far.
    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries.borrow().clone()
    }

    /// True if some recorded message contains `needle`.
    pub fn mentions(&self, needle: &str) -> bool {
        self.entries
            .borrow()
            .iter()
            .any(|d| d.message.contains(needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warnings_do_not_count_as_errors() {
        let diag = Diagnostics::new();
        diag.warn("odd but harmless");
        assert!(!diag.has_errors());
        diag.error(format_args!("section {} unreadable", 3));
        assert!(diag.has_errors());
        assert_eq!(diag.len(), 2);
        assert!(diag.mentions("section 3"));
        assert_eq!(diag.entries()[0].severity, Severity::Warning);
    }
}
