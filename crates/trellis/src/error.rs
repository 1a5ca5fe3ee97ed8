//! Error and diagnostic system for the Trellis engine.
//!
//! Two layers of errors exist:
//! - [`Diagnostic`]s describe problems in declarative input (metamodel,
//!   mapping declarations, semantic model, scenarios). Each carries an
//!   [`ErrorCode`], a severity and an optional subject path. A build stage
//!   collects all of them and fails with a [`BuildError`].
//! - [`TrellisError`] is the top-level error returned by the public API.
//!
//! Recoverable runtime outcomes (no compatible mapping, duplicate creation,
//! identity failure) are never errors; they surface as return values and log
//! records.
//!
//! # Example
//!
//! ```
//! # use trellis::error::{Diagnostic, ErrorCode};
//! let diag = Diagnostic::error("description `CD_Class` is declared more than once")
//!     .with_code(ErrorCode::E002)
//!     .with_subject("Class Diagram/CD_Package/CD_Class")
//!     .with_help("description names must be unique within a diagram kind");
//! assert_eq!(diag.code(), Some(ErrorCode::E002));
//! ```

mod build_error;
mod collector;
mod diagnostic;
mod error_code;
mod severity;

pub(crate) use collector::DiagnosticCollector;

pub use build_error::BuildError;
pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use severity::Severity;

use std::io;

use thiserror::Error;

use trellis_core::diagram::DiagramError;

/// The main error type for Trellis operations.
///
/// # Diagnostic Variants
///
/// `Registry` and `Load` hold every diagnostic reported by the failing build
/// stage, for rich error reporting.
#[derive(Debug, Error)]
pub enum TrellisError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Registry error: {0}")]
    Registry(BuildError),

    #[error("Load error: {0}")]
    Load(BuildError),

    #[error("Wiring error: {0}")]
    Wiring(String),

    #[error("Diagram error: {0}")]
    Diagram(#[from] DiagramError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl TrellisError {
    /// Diagnostics carried by the error; empty for non-diagnostic variants.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            Self::Registry(err) | Self::Load(err) => err.diagnostics(),
            _ => &[],
        }
    }
}
