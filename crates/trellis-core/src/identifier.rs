//! Identifiers used across the semantic model, the mapping registry and the
//! graphical tree.
//!
//! - [`Id`] is a string-interned name used for semantic element ids, type
//!   names and reference names.
//! - [`DescriptionId`] identifies a mapping description. It is derived from the
//!   description name, so rebuilding a registry from the same declarative input
//!   always yields the same ids.
//! - [`ElementId`] identifies one element of a graphical tree.

use std::{
    fmt,
    sync::{Mutex, OnceLock},
};

use string_interner::{DefaultStringInterner, DefaultSymbol};
use uuid::Uuid;

/// Global string interner backing [`Id`].
///
/// # Thread Safety
///
/// Access goes through a `Mutex`; interning is the only write operation.
static INTERNER: OnceLock<Mutex<DefaultStringInterner>> = OnceLock::new();

/// Namespace for name-derived description ids.
const DESCRIPTION_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_2a4e_8d3b_4c71_9a55_0e27_b3d4_c910);

fn with_interner<R>(f: impl FnOnce(&mut DefaultStringInterner) -> R) -> R {
    let mut interner = INTERNER
        .get_or_init(|| Mutex::new(DefaultStringInterner::new()))
        .lock()
        .expect("Failed to acquire interner lock");
    f(&mut interner)
}

/// Interned identifier.
///
/// Cheap to copy and compare; two `Id`s are equal exactly when their strings
/// are equal.
///
/// # Examples
///
/// ```
/// use trellis_core::identifier::Id;
///
/// let class_type = Id::new("Class");
/// assert_eq!(class_type, Id::new("Class"));
/// assert_eq!(class_type, "Class");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Id(DefaultSymbol);

impl Id {
    /// Creates an `Id` from a string slice, interning it if needed.
    pub fn new(name: &str) -> Self {
        Self(with_interner(|interner| interner.get_or_intern(name)))
    }

    /// Returns an owned copy of the interned string.
    pub fn name(&self) -> String {
        with_interner(|interner| {
            interner
                .resolve(self.0)
                .expect("Symbol should exist in interner")
                .to_string()
        })
    }

    /// Returns `true` if the interned string is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        with_interner(|interner| {
            interner
                .resolve(self.0)
                .is_none_or(|value| value.trim().is_empty())
        })
    }

    /// Returns `true` if the interned string ends with `suffix`.
    pub fn ends_with(&self, suffix: &str) -> bool {
        with_interner(|interner| {
            interner
                .resolve(self.0)
                .is_some_and(|value| value.ends_with(suffix))
        })
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = self.name();
        f.write_str(&value)
    }
}

impl std::str::FromStr for Id {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for Id {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<&String> for Id {
    fn from(name: &String) -> Self {
        Self::new(name)
    }
}

impl PartialEq<str> for Id {
    /// Allows direct comparison with string slices: `id == "Class"`
    fn eq(&self, other: &str) -> bool {
        with_interner(|interner| interner.resolve(self.0) == Some(other))
    }
}

impl PartialEq<&str> for Id {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

/// Stable identifier of a mapping description.
///
/// Derived from the description name with a name-based UUID, so the same name
/// produces the same id in every process and on every registry rebuild.
///
/// # Examples
///
/// ```
/// use trellis_core::identifier::DescriptionId;
///
/// let first = DescriptionId::from_name("CD_Class");
/// let second = DescriptionId::from_name("CD_Class");
/// assert_eq!(first, second);
/// assert_ne!(first, DescriptionId::from_name("CD_Comment"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DescriptionId(Uuid);

impl DescriptionId {
    /// Computes the id for a description name.
    pub fn from_name(name: &str) -> Self {
        Self(Uuid::new_v5(&DESCRIPTION_NAMESPACE, name.as_bytes()))
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for DescriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for DescriptionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Identifier of an element in a graphical tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(Uuid);

impl ElementId {
    /// Creates a fresh random element id.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
