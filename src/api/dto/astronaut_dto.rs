//! Astronaut DTOs for create, get, list, and history responses.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{AstronautId, AstronautInMemory};
use crate::persistence::models::SnapshotRecord;

/// Response body for `POST /astronauts` (201 Created).
#[derive(Debug, Serialize, ToSchema)]
pub struct CreateAstronautResponse {
    /// Identity assigned to the new astronaut.
    #[schema(value_type = i64, example = 1)]
    pub id: AstronautId,
}

/// Current state of one astronaut.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AstronautResponse {
    /// Identity key.
    #[schema(value_type = i64, example = 1)]
    pub id: AstronautId,
    /// Given name.
    pub name: String,
    /// Family name.
    pub surname: String,
    /// Superpower.
    pub superpower: String,
    /// Birth date.
    pub birthdate: NaiveDate,
    /// When the astronaut was first created.
    pub created_at: DateTime<Utc>,
    /// When the current state was stored.
    pub updated_at: DateTime<Utc>,
    /// Always `false` for current state.
    pub is_deleted: bool,
}

impl From<AstronautInMemory> for AstronautResponse {
    fn from(astronaut: AstronautInMemory) -> Self {
        Self {
            id: astronaut.id,
            name: astronaut.name,
            surname: astronaut.surname,
            superpower: astronaut.superpower,
            birthdate: astronaut.birthdate,
            created_at: astronaut.created_at,
            updated_at: astronaut.updated_at,
            is_deleted: astronaut.is_deleted,
        }
    }
}

/// One entry of an astronaut's snapshot history.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotResponse {
    /// Snapshot key.
    pub snapshot_id: i64,
    /// Owning identity.
    #[schema(value_type = i64)]
    pub astronaut_id: AstronautId,
    /// Given name.
    pub name: String,
    /// Family name.
    pub surname: String,
    /// Superpower.
    pub superpower: String,
    /// Birth date.
    pub birthdate: NaiveDate,
    /// Whether this snapshot marks the astronaut deleted.
    pub is_deleted: bool,
    /// Start of the validity window.
    pub created_at: DateTime<Utc>,
    /// End of the validity window; absent for the active snapshot.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expired_at: Option<DateTime<Utc>>,
}

impl From<SnapshotRecord> for SnapshotResponse {
    fn from(snapshot: SnapshotRecord) -> Self {
        Self {
            snapshot_id: snapshot.id,
            astronaut_id: snapshot.astronaut_id,
            name: snapshot.name,
            surname: snapshot.surname,
            superpower: snapshot.superpower,
            birthdate: snapshot.birthdate,
            is_deleted: snapshot.is_deleted,
            created_at: snapshot.created_at,
            expired_at: snapshot.expired_at,
        }
    }
}
