//! How bad a declarative-input problem is.

use std::fmt;

use log::Level;

/// Severity of a [`Diagnostic`](super::Diagnostic).
///
/// Ordered so that `Error > Warning`; the worst severity of a stage is the
/// maximum over its diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Non-fatal, e.g. a description whose domain type can never match.
    /// The stage still succeeds.
    Warning,

    /// The stage fails and yields a [`BuildError`](super::BuildError).
    Error,
}

impl Severity {
    pub fn is_error(&self) -> bool {
        matches!(self, Severity::Error)
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, Severity::Warning)
    }

    /// Log level used when a diagnostic of this severity is logged instead of
    /// returned.
    pub fn log_level(&self) -> Level {
        match self {
            Severity::Warning => Level::Warn,
            Severity::Error => Level::Error,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}
