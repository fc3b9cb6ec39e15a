//! Database models for identities and snapshots.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{AstronautDeserialized, AstronautId};

/// A row of the `astronaut` identity table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    /// Auto-increment identity key.
    pub id: AstronautId,
    /// Identity creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A row of the `astronaut_snapshot` table.
///
/// Snapshots are append-only: once inserted only `expired_at` is ever set,
/// and only from `None` to the time the snapshot was superseded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    /// Auto-increment snapshot key.
    pub id: i64,
    /// Owning identity.
    pub astronaut_id: AstronautId,
    /// Given name.
    pub name: String,
    /// Family name.
    pub surname: String,
    /// Superpower.
    pub superpower: String,
    /// Birth date.
    pub birthdate: NaiveDate,
    /// Deleted flag.
    pub is_deleted: bool,
    /// When this snapshot became active.
    pub created_at: DateTime<Utc>,
    /// When this snapshot was superseded; `None` while active.
    pub expired_at: Option<DateTime<Utc>>,
}

impl SnapshotRecord {
    /// Returns `true` while the snapshot is the current one of its identity.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.expired_at.is_none()
    }

    /// Returns the domain fields stored in this snapshot.
    #[must_use]
    pub fn fields(&self) -> AstronautDeserialized {
        AstronautDeserialized {
            name: self.name.clone(),
            surname: self.surname.clone(),
            superpower: self.superpower.clone(),
            birthdate: self.birthdate,
        }
    }
}
