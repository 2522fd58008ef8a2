//! Entity identifiers.
//!
//! An [`Entity`] is a random 128-bit identifier with no inherent data. Minting
//! one never touches any registry; an entity only starts to "exist" once a
//! component is attached to it.

use std::fmt;

use uuid::Uuid;

/// A unique entity identifier.
///
/// Entities are pure identifiers: they carry no state of their own. All
/// component data lives in the component registry, keyed by this id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity(Uuid);

impl Entity {
    /// Mint a fresh random entity id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Parse an entity id from its hyphenated string form.
    ///
    /// # Errors
    ///
    /// Returns [`uuid::Error`] if `s` is not a valid UUID.
    pub fn parse_str(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(Self)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn uuid(self) -> Uuid {
        self.0
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}
