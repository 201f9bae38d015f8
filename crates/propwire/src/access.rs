#![forbid(unsafe_code)]

//! Access modes of the property variants.

use std::fmt;

/// How a property stores its value and who may write it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessMode {
    /// Read-only, no backing value; the owner's function runs on every read.
    Computed,
    /// Backing value, readable and writable by anyone.
    StoredPublic,
    /// Backing value, readable by anyone, writable only by the owner.
    StoredRestricted,
    /// No backing value; reads and writes go to owner accessors.
    Backed,
}

impl AccessMode {
    /// Stable lowercase name, used as a log field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Computed => "computed",
            Self::StoredPublic => "stored-public",
            Self::StoredRestricted => "stored-restricted",
            Self::Backed => "backed",
        }
    }

    /// Whether the property keeps a local value.
    #[must_use]
    pub const fn has_backing_value(self) -> bool {
        matches!(self, Self::StoredPublic | Self::StoredRestricted)
    }

    /// Whether the property has any write path at all.
    #[must_use]
    pub const fn is_mutable(self) -> bool {
        !matches!(self, Self::Computed)
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
