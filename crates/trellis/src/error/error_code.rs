//! Error codes for the Trellis diagnostic system.
//!
//! Error codes are organized by the stage that reports them:
//! - `E0xx` - Mapping registry build
//! - `E1xx` - Metamodel declarations
//! - `E2xx` - Semantic model declarations
//! - `E3xx` - Scenario documents and drop requests

use std::fmt;

/// Error codes for categorizing diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Registry Errors (E0xx)
    // =========================================================================
    /// Blank description name.
    ///
    /// Every mapping description needs a non-blank name; ids derive from it.
    E001,

    /// Duplicate description name.
    ///
    /// Two descriptions in the same diagram kind share a name.
    E002,

    /// Description id mismatch.
    ///
    /// A declared id differs from the id recomputed from the description name.
    E003,

    /// Unknown reused description.
    ///
    /// A description reuses, or an edge connects, a name that is not declared
    /// in the same diagram kind.
    E004,

    /// Unknown domain type.
    ///
    /// The accepted domain type is not part of the metamodel; the description
    /// can never match a semantic element.
    E005,

    /// Unknown diagram kind.
    ///
    /// A diagram kind was requested that the registry does not contain.
    E006,

    // =========================================================================
    // Metamodel Errors (E1xx)
    // =========================================================================
    /// Unknown supertype.
    E100,

    /// Duplicate type declaration.
    E101,

    /// Unknown root concept.
    E102,

    /// Cyclic type hierarchy.
    E103,

    // =========================================================================
    // Semantic Model Errors (E2xx)
    // =========================================================================
    /// Duplicate element id.
    E200,

    /// Unknown element type.
    E201,

    /// Unknown container element.
    E202,

    /// Unknown reference target.
    E203,

    /// Unknown model root.
    E204,

    // =========================================================================
    // Scenario Errors (E3xx)
    // =========================================================================
    /// Malformed scenario document.
    E300,

    /// Drop request names an unknown semantic element.
    E301,

    /// Drop request targets an unknown semantic element.
    E302,
}

impl ErrorCode {
    /// Returns the numeric code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            ErrorCode::E003 => "E003",
            ErrorCode::E004 => "E004",
            ErrorCode::E005 => "E005",
            ErrorCode::E006 => "E006",
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E102 => "E102",
            ErrorCode::E103 => "E103",
            ErrorCode::E200 => "E200",
            ErrorCode::E201 => "E201",
            ErrorCode::E202 => "E202",
            ErrorCode::E203 => "E203",
            ErrorCode::E204 => "E204",
            ErrorCode::E300 => "E300",
            ErrorCode::E301 => "E301",
            ErrorCode::E302 => "E302",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "blank description name",
            ErrorCode::E002 => "duplicate description name",
            ErrorCode::E003 => "description id mismatch",
            ErrorCode::E004 => "unknown description reference",
            ErrorCode::E005 => "unknown domain type",
            ErrorCode::E006 => "unknown diagram kind",
            ErrorCode::E100 => "unknown supertype",
            ErrorCode::E101 => "duplicate type declaration",
            ErrorCode::E102 => "unknown root concept",
            ErrorCode::E103 => "cyclic type hierarchy",
            ErrorCode::E200 => "duplicate element",
            ErrorCode::E201 => "unknown element type",
            ErrorCode::E202 => "unknown container",
            ErrorCode::E203 => "unknown reference target",
            ErrorCode::E204 => "unknown model root",
            ErrorCode::E300 => "malformed scenario",
            ErrorCode::E301 => "unknown drop element",
            ErrorCode::E302 => "unknown drop target",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
