//! The core diagnostic type for the Trellis error system.
//!
//! A [`Diagnostic`] represents a single error or warning with an optional
//! error code, the subject it is about, and help text.

use std::fmt;

use crate::error::{Severity, error_code::ErrorCode};

/// A diagnostic message about declarative input.
///
/// Diagnostics carry:
/// - A severity level
/// - An optional error code for documentation and searchability
/// - A primary message describing the issue
/// - An optional subject, the path of the offending declaration
/// - Optional help text with suggestions
///
/// # Example
///
/// ```text
/// error[E002]: description `CD_Class` is declared more than once
///   at Class Diagram/CD_Package/CD_Class
///   = help: description names must be unique within a diagram kind
/// ```
#[derive(Debug, Clone)]
pub struct Diagnostic {
    severity: Severity,
    code: Option<ErrorCode>,
    message: String,
    subject: Option<String>,
    help: Option<String>,
}

impl Diagnostic {
    /// Create an error diagnostic.
    ///
    /// # Example
    ///
    /// ```
    /// # use trellis::error::{Diagnostic, ErrorCode};
    /// let diag = Diagnostic::error("description name is blank")
    ///     .with_code(ErrorCode::E001)
    ///     .with_subject("Class Diagram/CD_Package")
    ///     .with_help("give the description a name");
    /// assert!(diag.severity().is_error());
    /// ```
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// Create a warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    /// Get the severity of this diagnostic.
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Get the error code, if any.
    pub fn code(&self) -> Option<ErrorCode> {
        self.code
    }

    /// Get the primary message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the subject path, if any.
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// Get the help text, if any.
    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// Set the error code.
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Set the subject path.
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Set the help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: None,
            message: message.into(),
            subject: None,
            help: None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Format: "error[E001]: message" or "error: message"
        write!(f, "{}", self.severity)?;
        if let Some(code) = self.code {
            write!(f, "[{code}]")?;
        }
        write!(f, ": {}", self.message)?;
        if let Some(subject) = &self.subject {
            write!(f, " (at {subject})")?;
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostic {}
