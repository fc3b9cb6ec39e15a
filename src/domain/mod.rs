//! Domain layer: astronaut identity, representations, and transforms.
//!
//! This module holds the pure part of the service: the identifier newtype,
//! the wire / write / row / read representations of an astronaut, and the
//! conversions between them. Nothing here performs I/O.

pub mod astronaut;
pub mod astronaut_id;
pub mod temporal;

pub use astronaut::{AstronautDeserialized, AstronautInMemory, AstronautRow, AstronautSerialized};
pub use astronaut_id::AstronautId;
