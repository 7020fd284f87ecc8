//! Structured error reports for unrecoverable conditions.
//!
//! Both clients describe terminal failures with an [`ErrorReport`]. Libraries only
//! [`emit`](ErrorReport::emit) it; a binary decides whether to [`exit`](ErrorReport::exit).

use std::fmt;

/// Prefix of the console line printed by [`ErrorReport::exit`]
pub const REPORT_PREFIX: &str = "!!";

/// Exit status used by [`ErrorReport::exit`]
pub const EXIT_STATUS: i32 = 1;

/// One failure, described by what went wrong, which client saw it and where
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    /// Failure category, e.g. `transport` or `config`
    pub kind: &'static str,
    /// Component that observed the failure, e.g. `ha` or `mqtt`
    pub source: &'static str,
    /// URI or endpoint the component was talking to
    pub target: String,
    pub message: String,
}

impl ErrorReport {
    pub fn new(
        kind: &'static str,
        source: &'static str,
        target: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            source,
            target: target.into(),
            message: message.into(),
        }
    }

    /// Log the report through `tracing`
    pub fn emit(&self) {
        tracing::error!(
            kind = self.kind,
            source = self.source,
            target = %self.target,
            error = %self.message,
            "unrecoverable failure"
        );
    }

    /// Print the report to stderr and terminate the process with a nonzero status
    pub fn exit(&self) -> ! {
        eprintln!("{} {}", REPORT_PREFIX, self);
        std::process::exit(EXIT_STATUS)
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "type={} source={} target={} message={:?}",
            self.kind, self.source, self.target, self.message
        )
    }
}
