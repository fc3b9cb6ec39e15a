//! Type-safe astronaut identifier.
//!
//! [`AstronautId`] is a newtype wrapper around the `i64` surrogate key of the
//! identity table, so identity ids cannot be confused with snapshot ids.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of one astronaut identity record.
///
/// Assigned by the store when the identity is created, immutable and never
/// reused. Every snapshot of the astronaut references it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AstronautId(i64);

impl AstronautId {
    /// Wraps a raw identity key.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw identity key.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for AstronautId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for AstronautId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<AstronautId> for i64 {
    fn from(id: AstronautId) -> Self {
        id.0
    }
}
