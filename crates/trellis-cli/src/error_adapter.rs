//! Error adapter for converting TrellisError to miette diagnostics.
//!
//! This module provides the bridge between the library's standard error types
//! and miette's rich diagnostic formatting used in the CLI.
//!
//! # Multi-Error Support
//!
//! When a [`TrellisError`] carries several [`Diagnostic`]s, each diagnostic is
//! rendered independently.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, Severity as MietteSeverity};

use trellis::{
    TrellisError,
    error::{Diagnostic, Severity},
};

/// Adapter for a single trellis diagnostic.
pub struct DiagnosticAdapter<'a> {
    diag: &'a Diagnostic,
}

impl<'a> DiagnosticAdapter<'a> {
    /// Create a new diagnostic adapter.
    pub fn new(diag: &'a Diagnostic) -> Self {
        Self { diag }
    }
}

impl fmt::Debug for DiagnosticAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagnosticAdapter")
            .field("diag", &self.diag)
            .finish()
    }
}

impl fmt::Display for DiagnosticAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.diag.message())?;
        if let Some(subject) = self.diag.subject() {
            write!(f, " (at {subject})")?;
        }
        Ok(())
    }
}

impl std::error::Error for DiagnosticAdapter<'_> {}

impl MietteDiagnostic for DiagnosticAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.diag
            .code()
            .map(|c| Box::new(c) as Box<dyn fmt::Display>)
    }

    fn severity(&self) -> Option<MietteSeverity> {
        Some(match self.diag.severity() {
            Severity::Error => MietteSeverity::Error,
            Severity::Warning => MietteSeverity::Warning,
        })
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.diag
            .help()
            .map(|h| Box::new(h) as Box<dyn fmt::Display>)
    }
}

/// Adapter for non-diagnostic [`TrellisError`] variants.
pub struct ErrorAdapter<'a>(pub &'a TrellisError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match &self.0 {
            TrellisError::Io(_) => "trellis::io",
            TrellisError::Registry(_) => "trellis::registry",
            TrellisError::Load(_) => "trellis::load",
            TrellisError::Wiring(_) => "trellis::wiring",
            TrellisError::Diagram(_) => "trellis::diagram",
            TrellisError::Config(_) => "trellis::config",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match &self.0 {
            TrellisError::Wiring(_) => Some(Box::new(
                "add an endpoint rule under [[routing.endpoints]] for the listed types",
            )),
            _ => None,
        }
    }
}

/// A reportable error that can be rendered by miette.
#[derive(Debug)]
pub enum Reportable<'a> {
    /// A diagnostic about declarative input.
    Diagnostic(DiagnosticAdapter<'a>),
    /// Any other error.
    Error(ErrorAdapter<'a>),
}

impl fmt::Display for Reportable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reportable::Diagnostic(d) => fmt::Display::fmt(d, f),
            Reportable::Error(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl std::error::Error for Reportable<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Reportable::Diagnostic(_) => None,
            Reportable::Error(e) => e.source(),
        }
    }
}

impl MietteDiagnostic for Reportable<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Diagnostic(d) => d.code(),
            Reportable::Error(e) => e.code(),
        }
    }

    fn severity(&self) -> Option<MietteSeverity> {
        match self {
            Reportable::Diagnostic(d) => d.severity(),
            Reportable::Error(e) => e.severity(),
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Diagnostic(d) => d.help(),
            Reportable::Error(e) => e.help(),
        }
    }
}

/// Convert a [`TrellisError`] into a list of reportable errors.
///
/// Errors carrying diagnostics yield one [`Reportable`] per diagnostic; every
/// other variant yields a single [`Reportable`].
pub fn to_reportables(err: &TrellisError) -> Vec<Reportable<'_>> {
    match err.diagnostics() {
        [] => vec![Reportable::Error(ErrorAdapter(err))],
        diagnostics => diagnostics
            .iter()
            .map(|d| Reportable::Diagnostic(DiagnosticAdapter::new(d)))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use trellis::error::{BuildError, ErrorCode};

    use super::*;

    #[test]
    fn test_single_diagnostic() {
        let diag = Diagnostic::error("description name is blank")
            .with_code(ErrorCode::E001)
            .with_subject("Class Diagram/")
            .with_help("give every description a non-blank name");
        let err = TrellisError::Registry(BuildError::from(diag));

        let reportables = to_reportables(&err);
        assert_eq!(reportables.len(), 1);

        match &reportables[0] {
            Reportable::Diagnostic(d) => {
                assert_eq!(d.to_string(), "description name is blank (at Class Diagram/)");
                assert_eq!(d.code().map(|c| c.to_string()), Some("E001".to_string()));
            }
            Reportable::Error(_) => panic!("Expected Diagnostic"),
        }
    }

    #[test]
    fn test_multiple_diagnostics() {
        let diags = vec![
            Diagnostic::error("first error").with_code(ErrorCode::E200),
            Diagnostic::warning("a warning").with_code(ErrorCode::E005),
            Diagnostic::error("second error").with_code(ErrorCode::E201),
        ];
        let err = TrellisError::Load(BuildError::from(diags));

        let reportables = to_reportables(&err);
        assert_eq!(reportables.len(), 3);
        assert_eq!(reportables[1].severity(), Some(MietteSeverity::Warning));
        assert_eq!(reportables[2].to_string(), "second error");
    }

    #[test]
    fn test_non_diagnostic_error() {
        let err = TrellisError::Wiring("no endpoint provider for relationship-like types: Message".to_string());

        let reportables = to_reportables(&err);
        assert_eq!(reportables.len(), 1);

        match &reportables[0] {
            Reportable::Error(e) => {
                assert_eq!(e.code().map(|c| c.to_string()), Some("trellis::wiring".to_string()));
                assert!(e.help().is_some());
            }
            Reportable::Diagnostic(_) => panic!("Expected Error"),
        }
    }
}
