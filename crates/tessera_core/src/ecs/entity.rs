//! # Entity Identifiers
//!
//! Entities are opaque 64-bit ids. They carry no data of their own: everything
//! about an entity lives in the columns of the table that holds its row.

use std::fmt;

use bytemuck::{Pod, Zeroable};

/// Unique identifier for an entity.
///
/// Id `0` is reserved: it is the "not found" result of every lookup and the
/// synthetic root that anchors absolute paths.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Pod, Zeroable)]
#[repr(transparent)]
pub struct Entity(u64);

impl Entity {
    /// The "not found" sentinel.
    pub const NULL: Self = Self(0);

    /// The synthetic hierarchy root. Same id as [`Entity::NULL`].
    pub const ROOT: Self = Self(0);

    /// Wraps a raw id.
    #[inline]
    #[must_use]
    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw id.
    #[inline]
    #[must_use]
    pub const fn to_raw(self) -> u64 {
        self.0
    }

    /// Checks if this is the null/root id.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
