//! Collector for accumulating diagnostics during a build stage.
//!
//! The [`DiagnosticCollector`] lets a stage report every problem in the
//! declarative input instead of failing on the first one.

use log::{debug, log};

use crate::error::{BuildError, Diagnostic};

/// A collector for accumulating diagnostics during a build stage.
#[derive(Debug, Default)]
pub(crate) struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
    has_errors: bool,
}

impl DiagnosticCollector {
    /// Create a new empty collector.
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Emit a diagnostic to this collector.
    pub(crate) fn emit(&mut self, diagnostic: Diagnostic) {
        if diagnostic.severity().is_error() {
            self.has_errors = true;
        }
        self.diagnostics.push(diagnostic);
    }

    /// Returns `true` if an error-severity diagnostic was emitted.
    pub(crate) fn has_errors(&self) -> bool {
        self.has_errors
    }

    /// Finish collection.
    ///
    /// - If there are errors, returns `Err(BuildError)` with all diagnostics.
    /// - Otherwise logs the warnings and returns `Ok(())`.
    pub(crate) fn finish(self) -> Result<(), BuildError> {
        if self.has_errors() {
            let err = BuildError::new(self.diagnostics);
            debug!(
                errors_count = err.errors().count(),
                warnings_count = err.warnings().count();
                "Build stage failed"
            );
            return Err(err);
        }
        for diagnostic in &self.diagnostics {
            log!(diagnostic.severity().log_level(), diagnostic:% = diagnostic; "Declarative input diagnostic");
        }
        Ok(())
    }
}
