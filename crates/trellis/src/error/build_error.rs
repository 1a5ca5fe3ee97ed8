//! Failure of a build stage (metamodel, registry, model or scenario).

use std::fmt;

use crate::error::{Diagnostic, Severity};

/// Every diagnostic reported by a build stage that failed.
///
/// Warnings emitted by the same stage are kept alongside the errors, in
/// emission order, so a caller can report the whole stage at once.
#[derive(Debug)]
pub struct BuildError {
    diagnostics: Vec<Diagnostic>,
}

impl BuildError {
    pub fn new(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }

    /// All diagnostics, in emission order.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|diagnostic| diagnostic.severity().is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|diagnostic| diagnostic.severity().is_warning())
    }

    /// Worst severity reported, `None` if the stage reported nothing.
    pub fn severity(&self) -> Option<Severity> {
        self.diagnostics.iter().map(Diagnostic::severity).max()
    }
}

/// Leads with the first error, even when a warning was emitted before it.
impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(lead) = self.errors().next().or_else(|| self.diagnostics.first()) else {
            return write!(f, "build stage failed without diagnostics");
        };
        write!(f, "{lead}")?;
        if self.diagnostics.len() > 1 {
            write!(f, " (+{} more)", self.diagnostics.len() - 1)?;
        }
        Ok(())
    }
}

impl std::error::Error for BuildError {}

impl From<Diagnostic> for BuildError {
    fn from(diagnostic: Diagnostic) -> Self {
        Self::new(vec![diagnostic])
    }
}

impl From<Vec<Diagnostic>> for BuildError {
    fn from(diagnostics: Vec<Diagnostic>) -> Self {
        Self::new(diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_display_counts_the_rest() {
        let err: BuildError = vec![
            Diagnostic::error("first error"),
            Diagnostic::error("second error"),
            Diagnostic::error("third error"),
        ]
        .into();

        assert_eq!(err.to_string(), "error: first error (+2 more)");
    }

    #[test]
    fn test_display_leads_with_first_error() {
        let err: BuildError = vec![
            Diagnostic::warning("`CD_Ghost` can never match"),
            Diagnostic::error("duplicate description").with_code(ErrorCode::E002),
        ]
        .into();

        assert!(err.to_string().contains("duplicate description"));
        assert!(err.to_string().ends_with("(+1 more)"));
        assert_eq!(err.severity(), Some(Severity::Error));
    }

    #[test]
    fn test_errors_and_warnings_partition_diagnostics() {
        let err: BuildError = vec![
            Diagnostic::error("unknown supertype").with_code(ErrorCode::E100),
            Diagnostic::warning("unreachable description"),
            Diagnostic::error("unknown container").with_code(ErrorCode::E202),
        ]
        .into();

        let codes: Vec<_> = err.errors().filter_map(Diagnostic::code).collect();
        assert_eq!(codes, vec![ErrorCode::E100, ErrorCode::E202]);
        assert_eq!(err.warnings().count(), 1);
    }

    #[test]
    fn test_empty_build_error() {
        let err = BuildError::new(Vec::new());

        assert_eq!(err.severity(), None);
        assert_eq!(err.to_string(), "build stage failed without diagnostics");
    }
}
