//! Data Transfer Objects for REST request/response serialization.
//!
//! Response keys are camelCase to match the existing frontend client.
//! Request bodies reuse [`crate::domain::AstronautSerialized`].

pub mod astronaut_dto;

pub use astronaut_dto::*;
