//! Astronaut representations and the conversions between them.
//!
//! An astronaut travels through the service in four shapes:
//!
//! - [`AstronautSerialized`]: wire form, `birthdate` as text.
//! - [`AstronautDeserialized`]: validated domain form used for writes.
//! - [`AstronautRow`]: a current-state row as read from the store, every
//!   temporal field as text.
//! - [`AstronautInMemory`]: read form with identity metadata and all temporal
//!   fields resolved.
//!
//! Conversions never mutate their input.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::AstronautId;
use super::temporal::{parse_date, parse_timestamp};
use crate::error::RegistryError;

/// Maximum length, in characters, of every textual domain field.
pub const MAX_FIELD_CHARS: usize = 20;

/// Astronaut in wire format, as submitted by clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AstronautSerialized {
    /// Given name (1–20 characters).
    #[schema(example = "Yuri")]
    pub name: String,
    /// Family name (1–20 characters).
    #[schema(example = "Gagarin")]
    pub surname: String,
    /// Superpower (1–20 characters).
    #[schema(example = "orbit")]
    pub superpower: String,
    /// Birth date, `YYYY-MM-DD` or RFC 3339.
    #[schema(example = "1934-03-09")]
    pub birthdate: String,
}

impl AstronautSerialized {
    /// Checks presence and length of the textual fields.
    ///
    /// The birthdate is checked by [`Self::to_deserialized`].
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidRequest`] naming the first offending field.
    pub fn validate(&self) -> Result<(), RegistryError> {
        for (field, value) in [
            ("name", &self.name),
            ("surname", &self.surname),
            ("superpower", &self.superpower),
        ] {
            let len = value.chars().count();
            if len == 0 {
                return Err(RegistryError::InvalidRequest(format!("{field} is required")));
            }
            if len > MAX_FIELD_CHARS {
                return Err(RegistryError::InvalidRequest(format!(
                    "{field} must be at most {MAX_FIELD_CHARS} characters"
                )));
            }
        }
        Ok(())
    }

    /// Resolves the textual birthdate into a structured date.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidTemporal`] if `birthdate` is not a date.
    pub fn to_deserialized(&self) -> Result<AstronautDeserialized, RegistryError> {
        Ok(AstronautDeserialized {
            name: self.name.clone(),
            surname: self.surname.clone(),
            superpower: self.superpower.clone(),
            birthdate: parse_date("birthdate", &self.birthdate)?,
        })
    }
}

/// Domain fields of an astronaut with a structured birthdate.
///
/// This is the payload of every write: one snapshot row stores exactly these
/// fields plus its deleted flag and validity window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AstronautDeserialized {
    /// Given name.
    pub name: String,
    /// Family name.
    pub surname: String,
    /// Superpower.
    pub superpower: String,
    /// Birth date.
    pub birthdate: NaiveDate,
}

/// Current state of an astronaut as returned by the store.
///
/// `created_at` is the identity creation time, `updated_at` the creation time
/// of the active snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AstronautRow {
    /// Identity key.
    pub id: i64,
    /// Identity creation timestamp, as text.
    pub created_at: String,
    /// Given name.
    pub name: String,
    /// Family name.
    pub surname: String,
    /// Superpower.
    pub superpower: String,
    /// Birth date, as text.
    pub birthdate: String,
    /// Active snapshot creation timestamp, as text.
    pub updated_at: String,
    /// Deleted flag of the active snapshot.
    pub is_deleted: bool,
}

impl AstronautRow {
    /// Resolves every temporal field; other fields pass through unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidTemporal`] if the store produced a
    /// value that is not a date or timestamp.
    pub fn to_in_memory(&self) -> Result<AstronautInMemory, RegistryError> {
        Ok(AstronautInMemory {
            id: AstronautId::new(self.id),
            name: self.name.clone(),
            surname: self.surname.clone(),
            superpower: self.superpower.clone(),
            birthdate: parse_date("birthdate", &self.birthdate)?,
            created_at: parse_timestamp("createdAt", &self.created_at)?,
            updated_at: parse_timestamp("updatedAt", &self.updated_at)?,
            is_deleted: self.is_deleted,
        })
    }
}

/// Current state of an astronaut with identity metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AstronautInMemory {
    /// Identity key.
    pub id: AstronautId,
    /// Given name.
    pub name: String,
    /// Family name.
    pub surname: String,
    /// Superpower.
    pub superpower: String,
    /// Birth date.
    pub birthdate: NaiveDate,
    /// When the identity was created.
    pub created_at: DateTime<Utc>,
    /// When the active snapshot was created.
    pub updated_at: DateTime<Utc>,
    /// Deleted flag of the active snapshot.
    pub is_deleted: bool,
}

impl AstronautInMemory {
    /// Projects out the domain fields, dropping identity and temporal metadata.
    ///
    /// Soft-delete uses this to re-submit the current field values.
    #[must_use]
    pub fn to_deserialized(&self) -> AstronautDeserialized {
        AstronautDeserialized::from(self)
    }
}

impl From<&AstronautInMemory> for AstronautDeserialized {
    fn from(astronaut: &AstronautInMemory) -> Self {
        Self {
            name: astronaut.name.clone(),
            surname: astronaut.surname.clone(),
            superpower: astronaut.superpower.clone(),
            birthdate: astronaut.birthdate,
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::temporal::format_date;

    fn gagarin() -> AstronautSerialized {
        AstronautSerialized {
            name: "Yuri".to_string(),
            surname: "Gagarin".to_string(),
            superpower: "orbit".to_string(),
            birthdate: "1934-03-09".to_string(),
        }
    }

    fn gagarin_row() -> AstronautRow {
        AstronautRow {
            id: 1,
            created_at: "2024-05-01 10:00:00.5+00".to_string(),
            name: "Yuri".to_string(),
            surname: "Gagarin".to_string(),
            superpower: "orbit".to_string(),
            birthdate: "1934-03-09".to_string(),
            updated_at: "2024-05-02T08:15:00Z".to_string(),
            is_deleted: false,
        }
    }

    #[test]
    fn serialized_to_deserialized_parses_birthdate() {
        let Ok(astronaut) = gagarin().to_deserialized() else {
            panic!("valid input rejected");
        };
        assert_eq!(astronaut.name, "Yuri");
        assert_eq!(format_date(astronaut.birthdate), "1934-03-09");
    }

    #[test]
    fn serialized_to_deserialized_propagates_parse_error() {
        let mut input = gagarin();
        input.birthdate = "not a date".to_string();
        let result = input.to_deserialized();
        assert!(matches!(
            result,
            Err(RegistryError::InvalidTemporal { field: "birthdate", .. })
        ));
    }

    #[test]
    fn row_to_in_memory_resolves_all_temporal_fields() {
        let row = gagarin_row();
        let Ok(astronaut) = row.to_in_memory() else {
            panic!("valid row rejected");
        };
        assert_eq!(astronaut.id, AstronautId::new(1));
        assert_eq!(astronaut.created_at.timestamp_millis() % 1000, 500);
        assert!(astronaut.updated_at > astronaut.created_at);
        assert!(!astronaut.is_deleted);
        // Input untouched.
        assert_eq!(row, gagarin_row());
    }

    #[test]
    fn row_with_bad_timestamp_is_rejected() {
        let mut row = gagarin_row();
        row.updated_at = "soon".to_string();
        assert!(matches!(
            row.to_in_memory(),
            Err(RegistryError::InvalidTemporal { field: "updatedAt", .. })
        ));
    }

    #[test]
    fn in_memory_round_trips_to_submitted_fields() {
        let Ok(submitted) = gagarin().to_deserialized() else {
            panic!("valid input rejected");
        };
        let Ok(in_memory) = gagarin_row().to_in_memory() else {
            panic!("valid row rejected");
        };
        assert_eq!(in_memory.to_deserialized(), submitted);
    }

    #[test]
    fn validate_accepts_well_formed_input() {
        assert!(gagarin().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_and_long_fields() {
        let mut empty = gagarin();
        empty.surname = String::new();
        let Err(RegistryError::InvalidRequest(msg)) = empty.validate() else {
            panic!("empty surname accepted");
        };
        assert_eq!(msg, "surname is required");

        let mut long = gagarin();
        long.superpower = "x".repeat(MAX_FIELD_CHARS + 1);
        assert!(long.validate().is_err());

        let mut multibyte = gagarin();
        multibyte.name = "Ю".repeat(MAX_FIELD_CHARS);
        assert!(multibyte.validate().is_ok());
    }

    #[test]
    fn serialized_uses_plain_field_names_on_the_wire() {
        let Ok(parsed) = serde_json::from_str::<AstronautSerialized>(
            r#"{"name":"Yuri","surname":"Gagarin","superpower":"orbit","birthdate":"1934-03-09"}"#,
        ) else {
            panic!("wire form rejected");
        };
        assert_eq!(parsed, gagarin());
    }
}
